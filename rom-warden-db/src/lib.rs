//! SQLite persistence layer for the collection catalog.
//!
//! Provides schema creation, CRUD over library entries, an append-only
//! audit log, and query APIs backed by SQLite (rusqlite with the bundled
//! feature, WAL journal mode).

pub use rusqlite;
pub use rusqlite::Connection;

pub mod entry;
pub mod operations;
pub mod queries;
pub mod schema;

pub use entry::{
    now_timestamp, ActionKind, ActionRecord, CatalogEntry, EntryStatus, HashKind,
};
pub use operations::{
    get_entry, log_action, quarantine_entry, remove_entry, update_entry_fields, upsert_batch,
    upsert_entry, EntryField, StoreError,
};
pub use queries::{
    all_paths, catalog_stats, count_entries, duplicate_hash_groups, query_entries, recent_actions,
    CatalogStats, EntryFilter, HashDupGroup,
};
pub use schema::{create_schema, open_database, open_memory, SchemaError};
