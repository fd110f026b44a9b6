//! Catalog data model: library entries and audit actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Verification status of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntryStatus {
    #[default]
    Unknown,
    /// A cryptographic hash matched a loaded reference entry.
    Verified,
    /// The fast checksum matched a reference entry but the bytes differ.
    Mismatch,
    /// Structural checks found the file unusable.
    Corrupt,
    /// Moved aside pending manual review.
    Quarantined,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Verified => "VERIFIED",
            Self::Mismatch => "MISMATCH",
            Self::Corrupt => "CORRUPT",
            Self::Quarantined => "QUARANTINED",
        }
    }

    /// Parse leniently; unrecognized strings fall back to `Unknown`.
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "VERIFIED" => Self::Verified,
            "MISMATCH" => Self::Mismatch,
            "CORRUPT" => Self::Corrupt,
            "QUARANTINED" => Self::Quarantined,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One physical file in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Absolute path — the unique key.
    pub path: String,
    /// Platform short name (e.g. "snes").
    pub system: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, seconds since the epoch.
    pub mtime: f64,
    pub status: EntryStatus,
    /// Lowercase hex digests; absent when not computed.
    pub crc32: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    /// Canonical name from the matched reference entry.
    pub match_name: Option<String>,
    /// Serial or reference-database identifier.
    pub dat_name: Option<String>,
    /// Open map of system-specific metadata (serial, title, region, ...).
    pub extra: BTreeMap<String, String>,
}

impl CatalogEntry {
    pub fn new(path: impl Into<String>, system: impl Into<String>, size: u64, mtime: f64) -> Self {
        Self {
            path: path.into(),
            system: system.into(),
            size,
            mtime,
            status: EntryStatus::Unknown,
            crc32: None,
            md5: None,
            sha1: None,
            sha256: None,
            match_name: None,
            dat_name: None,
            extra: BTreeMap::new(),
        }
    }

    /// The name to group duplicates by: the matched reference name when
    /// verified, else the file name.
    pub fn display_name(&self) -> &str {
        if let Some(ref name) = self.match_name {
            return name;
        }
        std::path::Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }
}

/// Audit actions recorded in the append-only log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Renamed,
    Compressed,
    Quarantined,
    Skipped,
    Hashed,
    Pruned,
    Error,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Renamed => "RENAMED",
            Self::Compressed => "COMPRESSED",
            Self::Quarantined => "QUARANTINED",
            Self::Skipped => "SKIPPED",
            Self::Hashed => "HASHED",
            Self::Pruned => "PRUNED",
            Self::Error => "ERROR",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "RENAMED" => Self::Renamed,
            "COMPRESSED" => Self::Compressed,
            "QUARANTINED" => Self::Quarantined,
            "HASHED" => Self::Hashed,
            "PRUNED" => Self::Pruned,
            "ERROR" => Self::Error,
            _ => Self::Skipped,
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub path: String,
    pub action: ActionKind,
    pub detail: Option<String>,
    /// Seconds since the epoch.
    pub timestamp: f64,
}

/// Hash columns the duplicate-candidate query can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Crc32,
    Md5,
    Sha1,
    Sha256,
}

impl HashKind {
    /// The backing column name. A closed enum, so column names can never
    /// be built from untrusted input.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Crc32 => "crc32",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

/// Current wall-clock time as seconds since the epoch.
pub fn now_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
