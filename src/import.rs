//! Recipe definition file import
//!
//! Scans a directory for `*.recipes` files and loads their contents into
//! the catalog. Each line is either a recipe
//! (`output*count <- input*count, input*count`) or a standalone item
//! (`key*count`); `*count` defaults to 1 and `#` starts a comment.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::models::{Role, DEFAULT_GROUP_ID};
use crate::store::BookmarkStore;

/// One parsed line of a recipe file.
#[derive(Debug, PartialEq)]
enum Line {
    Recipe {
        output: (String, u64),
        inputs: Vec<(String, u64)>,
    },
    Item(String, u64),
    Blank,
}

/// `key` or `key*count`; keys allow namespaced ids like `minecraft:torch`.
const SPEC_PATTERN: &str = r"^([A-Za-z0-9_.:/-]+)(?:\s*\*\s*([0-9]+))?$";

/// Parses a single `key*count` spec the way recipe files do; used by the
/// CLI's add commands as well.
pub fn parse_item_spec(token: &str) -> Option<(String, u64)> {
    let pattern = Regex::new(SPEC_PATTERN).ok()?;
    parse_spec(token, &pattern)
}

fn parse_spec(token: &str, pattern: &Regex) -> Option<(String, u64)> {
    let caps = pattern.captures(token.trim())?;
    let key = caps[1].to_string();
    let count = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    Some((key, count.max(1)))
}

fn parse_line(line: &str, pattern: &Regex) -> Option<Line> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let line = line.trim();
    if line.is_empty() {
        return Some(Line::Blank);
    }

    match line.split_once("<-") {
        Some((output, inputs)) => {
            let output = parse_spec(output, pattern)?;
            let inputs = inputs
                .split(',')
                .map(|token| parse_spec(token, pattern))
                .collect::<Option<Vec<_>>>()?;
            if inputs.is_empty() {
                return None;
            }
            Some(Line::Recipe { output, inputs })
        }
        None => {
            let (key, count) = parse_spec(line, pattern)?;
            Some(Line::Item(key, count))
        }
    }
}

/// Find all recipe definition files under a directory
pub fn find_recipe_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "recipes") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

/// Import a single recipe file into the store
pub fn import_file(store: &mut BookmarkStore, path: &Path) -> Result<ImportStats> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let pattern = Regex::new(SPEC_PATTERN)?;
    let mut stats = ImportStats::default();

    for (number, line) in content.lines().enumerate() {
        match parse_line(line, &pattern) {
            Some(Line::Blank) => {}
            Some(Line::Recipe { output, inputs }) => {
                store.add_recipe((&output.0, output.1), &inputs);
                stats.recipes += 1;
            }
            Some(Line::Item(key, count)) => {
                store.add_entry(DEFAULT_GROUP_ID, key, count, Role::Standalone);
                stats.items += 1;
            }
            None => {
                eprintln!("  {}:{}: skipping malformed line", path.display(), number + 1);
                stats.skipped += 1;
            }
        }
    }
    Ok(stats)
}

/// Import every recipe file under a directory into the store
pub fn import_directory(store: &mut BookmarkStore, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();
    let files = find_recipe_files(dir);
    println!("Found {} recipe files in {}", files.len(), dir.display());

    for path in &files {
        match import_file(store, path) {
            Ok(file_stats) => {
                println!(
                    "  {}: {} recipes, {} items",
                    path.display(),
                    file_stats.recipes,
                    file_stats.items
                );
                stats.recipes += file_stats.recipes;
                stats.items += file_stats.items;
                stats.skipped += file_stats.skipped;
            }
            Err(e) => {
                eprintln!("  Error reading {}: {}", path.display(), e);
                stats.errors += 1;
            }
        }
    }
    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub recipes: usize,
    pub items: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} recipes and {} standalone items. Skipped: {}, Errors: {}",
            self.recipes, self.items, self.skipped, self.errors
        )
    }
}
