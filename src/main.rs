//! Craft Planner
//!
//! A crafting chain planner for item-catalog bookmarks: standalone items and
//! whole recipes live in an ordered catalog, can be clustered into groups,
//! and a chain-mode group keeps the batch counts of supplying recipes in
//! step with the demand of the recipe at the top.

mod chain;
mod db;
mod groups;
mod import;
mod models;
mod quantity;
mod recipe;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use models::{EntryId, GroupId, Role, DEFAULT_GROUP_ID};
use store::BookmarkStore;

#[derive(Parser)]
#[command(name = "craft-planner")]
#[command(about = "Crafting chain planner for item-catalog bookmarks")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "craft_planner.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a standalone item to the default group
    AddItem {
        /// Item spec, e.g. "minecraft:gear" or "minecraft:gear*4"
        spec: String,
    },

    /// Add a recipe as a new group: the output first, then its inputs
    AddRecipe {
        /// Output spec, e.g. "minecraft:torch*4"
        output: String,

        /// Input specs, e.g. "minecraft:stick" "minecraft:coal"
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Set an entry's batch count
    SetCycles { entry_id: EntryId, cycles: u64 },

    /// Set an entry's total amount
    SetAmount { entry_id: EntryId, amount: u64 },

    /// Adjust an entry's batch count by a quantized step
    Shift {
        entry_id: EntryId,

        /// Step size; negative values step down
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Merge the groups touched by the given entries into one
    Merge {
        #[arg(required = true)]
        entry_ids: Vec<EntryId>,
    },

    /// Move entries back to the default group
    Detach {
        #[arg(required = true)]
        entry_ids: Vec<EntryId>,
    },

    /// Toggle chain mode for a group
    Chain { group_id: GroupId },

    /// Recompute a group's chain immediately
    Recompute { group_id: GroupId },

    /// Toggle a group's expanded flag
    Expand { group_id: GroupId },

    /// Remove an entry (an output takes its whole recipe block with it)
    Remove { entry_id: EntryId },

    /// Remove a group and its entries
    RemoveGroup { group_id: GroupId },

    /// Show the catalog
    Show,

    /// Import *.recipes definition files from a directory
    Import {
        /// Directory to scan
        dir: PathBuf,
    },

    /// Initialize empty database with schema
    Init,

    /// Load sample recipe data for experimenting
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;
    let mut store = db::load_catalog(&conn)?;

    match cli.command {
        Commands::AddItem { spec } => match import::parse_item_spec(&spec) {
            Some((key, factor)) => {
                let id = store.add_entry(DEFAULT_GROUP_ID, key, factor, Role::Standalone);
                println!("Added entry #{}", id);
            }
            None => println!("Invalid item spec '{}'", spec),
        },

        Commands::AddRecipe { output, inputs } => {
            let output = import::parse_item_spec(&output);
            let inputs: Option<Vec<(String, u64)>> = inputs
                .iter()
                .map(|spec| import::parse_item_spec(spec))
                .collect();
            match (output, inputs) {
                (Some(output), Some(inputs)) => {
                    let gid = store.add_recipe((&output.0, output.1), &inputs);
                    println!("Added recipe group {}", gid);
                }
                _ => println!("Invalid recipe spec"),
            }
        }

        Commands::SetCycles { entry_id, cycles } => {
            if quantity::set_cycles(&mut store, entry_id, cycles) {
                print_entry(&store, entry_id);
            } else {
                println!("No entry #{}", entry_id);
            }
        }

        Commands::SetAmount { entry_id, amount } => {
            if quantity::set_amount(&mut store, entry_id, amount) {
                print_entry(&store, entry_id);
            } else {
                println!("No entry #{}", entry_id);
            }
        }

        Commands::Shift { entry_id, delta } => match quantity::shift_cycles(&mut store, entry_id, delta) {
            Some(_) => print_entry(&store, entry_id),
            None => println!("No entry #{}", entry_id),
        },

        Commands::Merge { entry_ids } => match groups::merge_into_group(&mut store, &entry_ids) {
            Some(target) => println!("Merged into group {}", target),
            None => println!("Nothing to merge"),
        },

        Commands::Detach { entry_ids } => {
            groups::detach_from_group(&mut store, &entry_ids);
            println!("Detached {} entries", entry_ids.len());
        }

        Commands::Chain { group_id } => match groups::toggle_chain_mode(&mut store, group_id) {
            Some(true) => println!("Chain mode enabled for group {}", group_id),
            Some(false) => println!("Chain mode disabled for group {}", group_id),
            None => println!("No group {}", group_id),
        },

        Commands::Recompute { group_id } => {
            if store.group(group_id).is_some() {
                chain::recompute(&mut store, group_id);
                println!("Recomputed group {}", group_id);
            } else {
                println!("No group {}", group_id);
            }
        }

        Commands::Expand { group_id } => match groups::toggle_expanded(&mut store, group_id) {
            Some(true) => println!("Group {} expanded", group_id),
            Some(false) => println!("Group {} collapsed", group_id),
            None => println!("No group {}", group_id),
        },

        Commands::Remove { entry_id } => {
            if store.remove_entry(entry_id) {
                println!("Removed entry #{}", entry_id);
            } else {
                println!("No entry #{}", entry_id);
            }
        }

        Commands::RemoveGroup { group_id } => {
            if store.group(group_id).is_some() {
                store.remove_group(group_id);
                println!("Removed group {}", group_id);
            } else {
                println!("No group {}", group_id);
            }
        }

        Commands::Show => {
            print_catalog(&store);
        }

        Commands::Import { dir } => {
            let stats = import::import_directory(&mut store, &dir)?;
            println!("\n{}", stats);
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            load_sample_data(&mut store);
            println!("Sample data loaded successfully!");
            print_catalog(&store);
        }
    }

    db::save_catalog(&conn, &store)?;
    Ok(())
}

fn print_entry(store: &BookmarkStore, entry_id: EntryId) {
    if let Some(entry) = store.entry(entry_id) {
        println!(
            "#{} {} x{} ({} cycles of {})",
            entry.id(),
            entry.item_key(),
            entry.amount(),
            entry.cycles(),
            entry.unit_factor()
        );
    }
}

fn print_catalog(store: &BookmarkStore) {
    if store.entries().is_empty() {
        println!("No bookmarks. Run 'add-item', 'add-recipe' or 'load-sample' first.");
        return;
    }

    for group_id in store.active_group_ids() {
        let mut flags = String::new();
        if let Some(group) = store.group(group_id) {
            if group.chain_mode {
                flags.push_str(" [chain]");
            }
            if !group.expanded {
                flags.push_str(" [collapsed]");
            }
        }
        if group_id == DEFAULT_GROUP_ID {
            println!("Group 0 (default){}", flags);
        } else {
            println!("Group {}{}", group_id, flags);
        }

        for entry in store.group_entries(group_id) {
            println!(
                "  #{:<4} {:<5} {:<30} x{:<6} ({} cycles of {})",
                entry.id(),
                entry.role.tag(),
                entry.item_key(),
                entry.amount(),
                entry.cycles(),
                entry.unit_factor()
            );
        }
    }
}

/// Load a small crafting chain for experimenting without an import directory
fn load_sample_data(store: &mut BookmarkStore) {
    // torch <- stick + coal; stick <- plank; plank <- log
    store.add_recipe(
        ("minecraft:torch", 4),
        &[
            ("minecraft:stick".to_string(), 1),
            ("minecraft:coal".to_string(), 1),
        ],
    );
    store.add_recipe(
        ("minecraft:stick", 4),
        &[("minecraft:plank".to_string(), 2)],
    );
    store.add_recipe(
        ("minecraft:plank", 4),
        &[("minecraft:log".to_string(), 1)],
    );
    store.add_entry(DEFAULT_GROUP_ID, "minecraft:apple", 1, Role::Standalone);

    println!("Loaded 3 sample recipes and 1 standalone item");
    println!("Try: merge the recipe groups, then toggle chain mode on the result");
}
