//! Write operations on the catalog: upserts, validated field updates,
//! removal, and audit logging.

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::entry::{now_timestamp, ActionKind, CatalogEntry, EntryStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Entry not found: '{path}'")]
    NotFound { path: String },
}

/// Columns `update_entry_fields` may touch. A closed enum is the single
/// validated update path — column names can never be assembled from
/// untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    System,
    Size,
    Mtime,
    Status,
    Crc32,
    Md5,
    Sha1,
    Sha256,
    MatchName,
    DatName,
    ExtraJson,
}

impl EntryField {
    fn column(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Size => "size",
            Self::Mtime => "mtime",
            Self::Status => "status",
            Self::Crc32 => "crc32",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::MatchName => "match_name",
            Self::DatName => "dat_name",
            Self::ExtraJson => "extra_json",
        }
    }
}

/// Insert a new entry or update every mutable field of an existing one.
pub fn upsert_entry(conn: &Connection, entry: &CatalogEntry) -> Result<(), StoreError> {
    let extra_json = serde_json::to_string(&entry.extra)?;
    conn.execute(
        "INSERT INTO library (path, system, size, mtime, status, crc32, md5, sha1, sha256,
             match_name, dat_name, extra_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(path) DO UPDATE SET
             system = excluded.system,
             size = excluded.size,
             mtime = excluded.mtime,
             status = excluded.status,
             crc32 = excluded.crc32,
             md5 = excluded.md5,
             sha1 = excluded.sha1,
             sha256 = excluded.sha256,
             match_name = excluded.match_name,
             dat_name = excluded.dat_name,
             extra_json = excluded.extra_json",
        params![
            entry.path,
            entry.system,
            entry.size as i64,
            entry.mtime,
            entry.status.as_str(),
            entry.crc32,
            entry.md5,
            entry.sha1,
            entry.sha256,
            entry.match_name,
            entry.dat_name,
            extra_json,
        ],
    )?;
    Ok(())
}

/// Upsert a batch of entries inside one transaction.
///
/// Any failure rolls the whole batch back, so a scan commits atomically
/// per batch rather than per file.
pub fn upsert_batch(conn: &mut Connection, entries: &[CatalogEntry]) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    for entry in entries {
        let extra_json = serde_json::to_string(&entry.extra)?;
        tx.execute(
            "INSERT INTO library (path, system, size, mtime, status, crc32, md5, sha1, sha256,
                 match_name, dat_name, extra_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(path) DO UPDATE SET
                 system = excluded.system,
                 size = excluded.size,
                 mtime = excluded.mtime,
                 status = excluded.status,
                 crc32 = excluded.crc32,
                 md5 = excluded.md5,
                 sha1 = excluded.sha1,
                 sha256 = excluded.sha256,
                 match_name = excluded.match_name,
                 dat_name = excluded.dat_name,
                 extra_json = excluded.extra_json",
            params![
                entry.path,
                entry.system,
                entry.size as i64,
                entry.mtime,
                entry.status.as_str(),
                entry.crc32,
                entry.md5,
                entry.sha1,
                entry.sha256,
                entry.match_name,
                entry.dat_name,
                extra_json,
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Update selected fields of an existing entry.
pub fn update_entry_fields(
    conn: &Connection,
    path: &str,
    fields: &[(EntryField, &dyn rusqlite::ToSql)],
) -> Result<(), StoreError> {
    if fields.is_empty() {
        return Ok(());
    }

    let set_clause = fields
        .iter()
        .enumerate()
        .map(|(i, (field, _))| format!("{} = ?{}", field.column(), i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE library SET {set_clause} WHERE path = ?1");

    let mut values: Vec<&dyn rusqlite::ToSql> = vec![&path];
    values.extend(fields.iter().map(|(_, v)| *v));

    let changed = conn.execute(&sql, values.as_slice())?;
    if changed == 0 {
        return Err(StoreError::NotFound {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Fetch an entry by path.
pub fn get_entry(conn: &Connection, path: &str) -> Result<Option<CatalogEntry>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT path, system, size, mtime, status, crc32, md5, sha1, sha256,
                match_name, dat_name, extra_json
         FROM library WHERE path = ?1",
    )?;
    let result = stmt.query_row(params![path], row_to_entry);
    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Delete an entry. Deleting a missing path is not an error.
pub fn remove_entry(conn: &Connection, path: &str) -> Result<(), StoreError> {
    conn.execute("DELETE FROM library WHERE path = ?1", params![path])?;
    Ok(())
}

/// Flip an entry's status to quarantined and record the action.
pub fn quarantine_entry(
    conn: &Connection,
    path: &str,
    reason: &str,
) -> Result<(), StoreError> {
    update_entry_fields(
        conn,
        path,
        &[(EntryField::Status, &EntryStatus::Quarantined.as_str())],
    )?;
    log_action(conn, path, ActionKind::Quarantined, Some(reason))?;
    Ok(())
}

/// Append an audit record. Rows are never updated or deleted.
pub fn log_action(
    conn: &Connection,
    path: &str,
    action: ActionKind,
    detail: Option<&str>,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO library_actions (path, action, detail, ts) VALUES (?1, ?2, ?3, ?4)",
        params![path, action.as_str(), detail, now_timestamp()],
    )?;
    Ok(())
}

pub(crate) fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CatalogEntry> {
    let status_str: String = row.get(4)?;
    let extra_json: String = row.get(11)?;
    let size: i64 = row.get(2)?;
    Ok(CatalogEntry {
        path: row.get(0)?,
        system: row.get(1)?,
        size: size.max(0) as u64,
        mtime: row.get(3)?,
        status: EntryStatus::from_str_loose(&status_str),
        crc32: row.get(5)?,
        md5: row.get(6)?,
        sha1: row.get(7)?,
        sha256: row.get(8)?,
        match_name: row.get(9)?,
        dat_name: row.get(10)?,
        extra: serde_json::from_str(&extra_json).unwrap_or_default(),
    })
}
