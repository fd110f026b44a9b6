//! Read queries for the catalog: filtered listing with pagination,
//! duplicate-candidate grouping, audit history, and statistics.

use std::collections::HashMap;

use rusqlite::{params, Connection};

use crate::entry::{ActionKind, ActionRecord, CatalogEntry, EntryStatus, HashKind};
use crate::operations::{row_to_entry, StoreError};

/// Filters for [`query_entries`]. All fields optional; `limit` keeps the
/// query from materializing the whole catalog.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub system: Option<String>,
    pub status: Option<EntryStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// List entries matching a filter, paginated at the SQL level.
pub fn query_entries(
    conn: &Connection,
    filter: &EntryFilter,
) -> Result<Vec<CatalogEntry>, StoreError> {
    let mut sql = String::from(
        "SELECT path, system, size, mtime, status, crc32, md5, sha1, sha256,
                match_name, dat_name, extra_json
         FROM library",
    );
    let mut clauses = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref system) = filter.system {
        values.push(Box::new(system.clone()));
        clauses.push(format!("system = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", values.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY path");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
        if let Some(offset) = filter.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), row_to_entry)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Count entries matching a filter (ignoring pagination).
pub fn count_entries(conn: &Connection, filter: &EntryFilter) -> Result<u64, StoreError> {
    let mut sql = String::from("SELECT COUNT(*) FROM library");
    let mut clauses = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(ref system) = filter.system {
        values.push(Box::new(system.clone()));
        clauses.push(format!("system = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("status = ?{}", values.len()));
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    let refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count: i64 = conn.query_row(&sql, refs.as_slice(), |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

/// All paths currently in the catalog. Used by the scanner's prune pass.
pub fn all_paths(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT path FROM library")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// A set of entries sharing one hash value.
#[derive(Debug, Clone)]
pub struct HashDupGroup {
    pub kind: HashKind,
    /// The shared digest (lowercase hex).
    pub value: String,
    pub entries: Vec<CatalogEntry>,
}

/// Find groups of entries sharing a non-null hash, checking the given
/// hash kinds in order. Entries without that hash are simply absent from
/// that kind's groups. A path appears in at most one group per kind.
pub fn duplicate_hash_groups(
    conn: &Connection,
    prefer: &[HashKind],
) -> Result<Vec<HashDupGroup>, StoreError> {
    let mut groups = Vec::new();

    for &kind in prefer {
        let col = kind.column();
        // `col` comes from the closed HashKind enum, never from input.
        let dup_sql = format!(
            "SELECT {col} FROM library WHERE {col} IS NOT NULL
             GROUP BY {col} HAVING COUNT(*) > 1"
        );
        let mut stmt = conn.prepare(&dup_sql)?;
        let values: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let entry_sql = format!(
            "SELECT path, system, size, mtime, status, crc32, md5, sha1, sha256,
                    match_name, dat_name, extra_json
             FROM library WHERE {col} = ?1 ORDER BY path"
        );
        let mut entry_stmt = conn.prepare(&entry_sql)?;
        for value in values {
            let entries: Vec<CatalogEntry> = entry_stmt
                .query_map(params![value], row_to_entry)?
                .collect::<Result<Vec<_>, _>>()?;
            if entries.len() > 1 {
                groups.push(HashDupGroup {
                    kind,
                    value,
                    entries,
                });
            }
        }
    }

    Ok(groups)
}

/// Most recent audit records, newest first.
pub fn recent_actions(conn: &Connection, limit: u32) -> Result<Vec<ActionRecord>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT path, action, detail, ts FROM library_actions ORDER BY ts DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        let action_str: String = row.get(1)?;
        Ok(ActionRecord {
            path: row.get(0)?,
            action: ActionKind::from_str_loose(&action_str),
            detail: row.get(2)?,
            timestamp: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Aggregate catalog statistics for reporting.
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub total_entries: u64,
    pub total_bytes: u64,
    pub by_system: HashMap<String, u64>,
    pub by_status: HashMap<String, u64>,
}

pub fn catalog_stats(conn: &Connection) -> Result<CatalogStats, StoreError> {
    let mut stats = CatalogStats::default();

    let (count, bytes): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM library",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    stats.total_entries = count.max(0) as u64;
    stats.total_bytes = bytes.max(0) as u64;

    let mut stmt = conn.prepare("SELECT system, COUNT(*) FROM library GROUP BY system")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (system, n) = row?;
        stats.by_system.insert(system, n.max(0) as u64);
    }

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM library GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (status, n) = row?;
        stats.by_status.insert(status, n.max(0) as u64);
    }

    Ok(stats)
}
