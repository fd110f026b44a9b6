//! Flat report projections for external export.
//!
//! Read-only views over catalog entries and duplicate groups, writable as
//! CSV or JSON. No mutation happens here.

use std::io::Write;

use serde::Serialize;

use rom_warden_db::CatalogEntry;

use crate::dedup::DuplicateGroup;

/// One catalog entry flattened for export.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReportRow {
    pub path: String,
    pub system: String,
    pub size: u64,
    pub status: String,
    pub crc32: Option<String>,
    pub sha1: Option<String>,
    pub match_name: Option<String>,
    pub serial: Option<String>,
    pub title: Option<String>,
}

impl From<&CatalogEntry> for ScanReportRow {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            path: entry.path.clone(),
            system: entry.system.clone(),
            size: entry.size,
            status: entry.status.as_str().to_string(),
            crc32: entry.crc32.clone(),
            sha1: entry.sha1.clone(),
            match_name: entry.match_name.clone(),
            serial: entry.extra.get("serial").cloned(),
            title: entry.extra.get("title").cloned(),
        }
    }
}

/// One duplicate-group member flattened for export. Groups expand to one
/// row per member so the output stays rectangular.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReportRow {
    pub duplicate_type: String,
    pub group_key: String,
    pub path: String,
    pub size: u64,
    pub keep: bool,
    pub space_savings: u64,
    pub reason: String,
}

/// Project catalog entries into report rows.
pub fn scan_report(entries: &[CatalogEntry]) -> Vec<ScanReportRow> {
    entries.iter().map(ScanReportRow::from).collect()
}

/// Project duplicate groups into report rows.
pub fn duplicate_report(groups: &[DuplicateGroup]) -> Vec<DuplicateReportRow> {
    let mut rows = Vec::new();
    for group in groups {
        for entry in &group.entries {
            rows.push(DuplicateReportRow {
                duplicate_type: group.duplicate_type.as_str().to_string(),
                group_key: group.key.clone(),
                path: entry.path.clone(),
                size: entry.size,
                keep: entry.path == group.recommended_keep,
                space_savings: group.space_savings,
                reason: group.reason.clone(),
            });
        }
    }
    rows
}

/// Write rows as CSV with a header record.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

/// Write rows as a JSON array.
pub fn write_json<W: Write, T: Serialize>(
    writer: W,
    rows: &[T],
) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(writer, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::dedup::{find_all_duplicates, DedupOptions};
    use rom_warden_db::EntryStatus;

    fn sample_entries() -> Vec<CatalogEntry> {
        let mut a = CatalogEntry::new("/roms/snes/Game (USA).sfc", "snes", 1000, 0.0);
        a.status = EntryStatus::Verified;
        a.sha1 = Some("aaaa".into());
        a.extra.insert("title".into(), "Game".into());
        let mut b = CatalogEntry::new("/roms/snes/Game (Europe).sfc", "snes", 1000, 0.0);
        b.sha1 = Some("bbbb".into());
        vec![a, b]
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let entries = sample_entries();
        let rows = scan_report(&entries);

        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("path,system,size,status"));
        assert_eq!(lines.count(), 2);
        assert!(text.contains("VERIFIED"));
    }

    #[test]
    fn json_export_round_trips() {
        let entries = sample_entries();
        let rows = scan_report(&entries);

        let mut buf = Vec::new();
        write_json(&mut buf, &rows).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["system"], "snes");
    }

    #[test]
    fn duplicate_rows_mark_exactly_one_keeper_per_group() {
        let entries = sample_entries();
        let groups = find_all_duplicates(&entries, &DedupOptions::default(), &CancelToken::new());
        assert!(!groups.is_empty());

        let rows = duplicate_report(&groups);
        for group in &groups {
            let members: Vec<_> = rows
                .iter()
                .filter(|r| r.group_key == group.key && r.duplicate_type == group.duplicate_type.as_str())
                .collect();
            assert_eq!(members.iter().filter(|r| r.keep).count(), 1);
        }
    }
}
