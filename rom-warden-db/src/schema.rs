//! SQLite schema creation and migration.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
}

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 1;

/// Create all tables and indexes if they don't exist.
///
/// Idempotent — safe to call on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Open or create a catalog database at the given path.
///
/// WAL journal mode lets concurrent readers proceed during writer
/// activity; each worker thread should open its own connection.
pub fn open_database(path: &std::path::Path) -> Result<Connection, SchemaError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

    let version = get_schema_version(&conn)?;
    if version == 0 {
        create_schema(&conn)?;
    } else if version < CURRENT_VERSION {
        migrate(&conn, version)?;
    } else if version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: version,
        });
    }

    Ok(conn)
}

/// Open an in-memory database with the full schema. Useful for testing.
pub fn open_memory() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

fn migrate(conn: &Connection, from_version: i32) -> Result<(), SchemaError> {
    let mut version = from_version;
    while version < CURRENT_VERSION {
        // No migrations yet; placeholder keeps the version chain honest.
        version += 1;
        set_schema_version(conn, version)?;
    }
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per physical file
CREATE TABLE IF NOT EXISTS library (
    path TEXT PRIMARY KEY,
    system TEXT NOT NULL,
    size INTEGER NOT NULL,
    mtime REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'UNKNOWN',
    crc32 TEXT,
    md5 TEXT,
    sha1 TEXT,
    sha256 TEXT,
    match_name TEXT,
    dat_name TEXT,
    extra_json TEXT NOT NULL DEFAULT '{}'
);

-- Partial indexes: most entries lack some hash types, so index only
-- rows where the value is present.
CREATE INDEX IF NOT EXISTS idx_library_crc32 ON library(crc32) WHERE crc32 IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_library_md5 ON library(md5) WHERE md5 IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_library_sha1 ON library(sha1) WHERE sha1 IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_library_sha256 ON library(sha256) WHERE sha256 IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_library_system_status ON library(system, status);

-- Append-only audit log; rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS library_actions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL,
    action TEXT NOT NULL,
    detail TEXT,
    ts REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_actions_ts ON library_actions(ts);
"#;
