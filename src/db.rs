//! Database schema and operations
//!
//! The catalog persists as a flat record list in bookmark-position order
//! plus the group map and the next-group-id counter. Malformed rows are
//! rejected here, before entries reach the store; the in-memory core never
//! re-checks them.

use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::Connection;
use thiserror::Error;

use crate::models::{BookmarkEntry, BookmarkGroup, GroupId, Role};
use crate::store::BookmarkStore;

/// Validation failures at the persistence boundary.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("unknown role ordinal {0}")]
    UnknownRole(i64),
    #[error("unit factor must be positive, got {0}")]
    InvalidUnitFactor(i64),
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Saved selections, in catalog (display) order
        CREATE TABLE IF NOT EXISTS bookmarks (
            position INTEGER PRIMARY KEY,
            group_id INTEGER NOT NULL,
            item_key TEXT NOT NULL,
            unit_factor INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            role INTEGER NOT NULL
        );

        -- Group records keyed by group id
        CREATE TABLE IF NOT EXISTS groups (
            group_id INTEGER PRIMARY KEY,
            expanded INTEGER NOT NULL DEFAULT 1,
            chain_mode INTEGER NOT NULL DEFAULT 0
        );

        -- Counters (next_group_id)
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Rewrites the whole catalog: bookmark rows, group rows, and the counter.
pub fn save_catalog(conn: &Connection, store: &BookmarkStore) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM bookmarks;
        DELETE FROM groups;
        DELETE FROM meta;
        "#,
    )?;

    let mut insert_bookmark = conn.prepare(
        "INSERT INTO bookmarks (position, group_id, item_key, unit_factor, amount, role)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (position, entry) in store.entries().iter().enumerate() {
        insert_bookmark.execute((
            position as i64,
            entry.group_id,
            entry.item_key(),
            entry.unit_factor() as i64,
            entry.amount() as i64,
            entry.role.ordinal(),
        ))?;
    }

    let mut insert_group = conn.prepare(
        "INSERT INTO groups (group_id, expanded, chain_mode) VALUES (?1, ?2, ?3)",
    )?;
    for (group_id, group) in store.groups() {
        insert_group.execute((group_id, group.expanded, group.chain_mode))?;
    }

    conn.execute(
        "INSERT INTO meta (key, value) VALUES ('next_group_id', ?1)",
        [store.next_group_id() as i64],
    )?;
    Ok(())
}

/// Rebuilds the store from the database, rejecting malformed rows.
pub fn load_catalog(conn: &Connection) -> Result<BookmarkStore> {
    let mut groups: BTreeMap<GroupId, BookmarkGroup> = BTreeMap::new();
    let mut stmt = conn.prepare("SELECT group_id, expanded, chain_mode FROM groups")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, GroupId>(0)?,
            BookmarkGroup {
                expanded: row.get(1)?,
                chain_mode: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (group_id, group) = row?;
        groups.insert(group_id, group);
    }

    let mut stmt = conn.prepare(
        "SELECT group_id, item_key, unit_factor, amount, role
         FROM bookmarks ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, GroupId>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, i64>(4)?,
        ))
    })?;

    let mut entries = Vec::new();
    let mut next_entry_id = 1;
    for row in rows {
        let (group_id, item_key, unit_factor, amount, role_ordinal) = row?;
        if unit_factor < 1 {
            return Err(CatalogError::InvalidUnitFactor(unit_factor).into());
        }
        let role =
            Role::from_ordinal(role_ordinal).ok_or(CatalogError::UnknownRole(role_ordinal))?;
        let mut entry =
            BookmarkEntry::new(next_entry_id, group_id, item_key, unit_factor as u64, role);
        entry.set_amount(amount.max(0) as u64);
        entries.push(entry);
        next_entry_id += 1;
    }

    let next_group_id: GroupId = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'next_group_id'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(1);

    Ok(BookmarkStore::from_parts(entries, groups, next_group_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups;
    use crate::models::{Role, DEFAULT_GROUP_ID};

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn catalog_round_trips() {
        let conn = open();
        let mut store = BookmarkStore::new();
        store.add_entry(DEFAULT_GROUP_ID, "mod:gear", 1, Role::Standalone);
        let gid = store.add_recipe(
            ("mod:torch", 4),
            &[("mod:stick".into(), 1), ("mod:coal".into(), 1)],
        );
        groups::toggle_chain_mode(&mut store, gid);
        groups::toggle_expanded(&mut store, gid);
        save_catalog(&conn, &store).unwrap();

        let loaded = load_catalog(&conn).unwrap();
        assert_eq!(loaded.entries().len(), 4);
        let keys: Vec<&str> = loaded.entries().iter().map(|e| e.item_key()).collect();
        assert_eq!(keys, vec!["mod:gear", "mod:torch", "mod:stick", "mod:coal"]);
        let group = loaded.group(gid).unwrap();
        assert!(group.chain_mode);
        assert!(!group.expanded);
        assert_eq!(loaded.next_group_id(), store.next_group_id());
    }

    #[test]
    fn amounts_and_roles_survive_the_round_trip() {
        let conn = open();
        let mut store = BookmarkStore::new();
        let id = store.add_entry(5, "mod:plank", 4, Role::Output);
        store.entry_mut(id).unwrap().set_cycles(3);
        save_catalog(&conn, &store).unwrap();

        let loaded = load_catalog(&conn).unwrap();
        let entry = &loaded.entries()[0];
        assert_eq!(entry.role, Role::Output);
        assert_eq!(entry.unit_factor(), 4);
        assert_eq!(entry.amount(), 12);
        assert_eq!(entry.cycles(), 3);
        assert_eq!(entry.group_id, 5);
    }

    #[test]
    fn unknown_role_ordinal_is_rejected() {
        let conn = open();
        conn.execute(
            "INSERT INTO bookmarks (position, group_id, item_key, unit_factor, amount, role)
             VALUES (0, 0, 'mod:gear', 1, 1, 9)",
            [],
        )
        .unwrap();
        let err = load_catalog(&conn).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::UnknownRole(9))
        );
    }

    #[test]
    fn non_positive_unit_factor_is_rejected() {
        let conn = open();
        conn.execute(
            "INSERT INTO bookmarks (position, group_id, item_key, unit_factor, amount, role)
             VALUES (0, 0, 'mod:gear', 0, 1, 0)",
            [],
        )
        .unwrap();
        let err = load_catalog(&conn).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CatalogError>(),
            Some(&CatalogError::InvalidUnitFactor(0))
        );
    }

    #[test]
    fn undersized_amounts_are_clamped_on_load() {
        let conn = open();
        conn.execute(
            "INSERT INTO bookmarks (position, group_id, item_key, unit_factor, amount, role)
             VALUES (0, 0, 'mod:plank', 4, 2, 1)",
            [],
        )
        .unwrap();
        let loaded = load_catalog(&conn).unwrap();
        assert_eq!(loaded.entries()[0].amount(), 4);
    }

    #[test]
    fn empty_database_loads_an_empty_store() {
        let conn = open();
        let loaded = load_catalog(&conn).unwrap();
        assert!(loaded.entries().is_empty());
        assert!(loaded.group(DEFAULT_GROUP_ID).is_some());
    }
}
