//! In-memory reference index with the two-tier matching policy.
//!
//! The index is keyed primarily by cryptographic hash (sha1, with md5
//! accepted when sha1 was not computed) and secondarily by the fast crc32.
//! A crc32-only hit means "plausibly this game, but the bytes differ" —
//! the file may be modified or corrupt, so it is reported as a mismatch
//! rather than a verification.

use std::collections::HashMap;

use crate::dat::DatFile;

/// Checksums computed for a file, lowercase hex. Absent digests were not
/// requested or could not be computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDigests {
    pub crc32: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    /// Size of the hashed data in bytes.
    pub data_size: u64,
}

impl FileDigests {
    /// True when no digest was computed at all.
    pub fn is_empty(&self) -> bool {
        self.crc32.is_none() && self.md5.is_none() && self.sha1.is_none() && self.sha256.is_none()
    }
}

/// Result of looking a file up against the reference index.
///
/// Exactly one variant applies to any digest set; a miss is a normal
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefMatch {
    /// A cryptographic hash matched a reference entry exactly.
    Verified { name: String },
    /// Only the fast checksum matched: plausibly this game, but the bytes
    /// differ — possibly modified or corrupt.
    Mismatch { expected: String },
    /// No reference entry matched any computed digest.
    Unknown,
}

impl RefMatch {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// The reference name this result points at, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Verified { name } => Some(name),
            Self::Mismatch { expected } => Some(expected),
            Self::Unknown => None,
        }
    }
}

/// Read-only lookup table over one system's reference entries.
///
/// Built once per system from parsed DAT files; safe to share across
/// worker threads without locking.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_sha1: HashMap<String, String>,
    by_md5: HashMap<String, String>,
    by_crc32: HashMap<String, String>,
    by_serial: HashMap<String, String>,
    entries: usize,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a parsed DAT.
    pub fn from_dat(dat: &DatFile) -> Self {
        let mut index = Self::new();
        index.merge(dat);
        index
    }

    /// Merge another DAT's entries into this index. First writer wins on
    /// hash collisions (duplicate entries across DATs describe the same
    /// dump).
    pub fn merge(&mut self, dat: &DatFile) {
        for game in &dat.games {
            for rom in &game.roms {
                self.entries += 1;
                if let Some(ref sha1) = rom.sha1 {
                    self.by_sha1.entry(sha1.clone()).or_insert_with(|| game.name.clone());
                }
                if let Some(ref md5) = rom.md5 {
                    self.by_md5.entry(md5.clone()).or_insert_with(|| game.name.clone());
                }
                if let Some(ref crc) = rom.crc {
                    self.by_crc32.entry(crc.clone()).or_insert_with(|| game.name.clone());
                }
                if let Some(ref serial) = rom.serial {
                    self.by_serial
                        .entry(normalize_serial(serial))
                        .or_insert_with(|| game.name.clone());
                }
            }
        }
    }

    /// Number of reference entries loaded.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Match a digest set against the index.
    ///
    /// Policy: an exact cryptographic hit (sha1, else md5) verifies; a
    /// crc32-only hit is a mismatch; anything else is unknown.
    pub fn lookup(&self, digests: &FileDigests) -> RefMatch {
        if let Some(ref sha1) = digests.sha1 {
            if let Some(name) = self.by_sha1.get(sha1) {
                return RefMatch::Verified { name: name.clone() };
            }
        }
        if let Some(ref md5) = digests.md5 {
            if let Some(name) = self.by_md5.get(md5) {
                return RefMatch::Verified { name: name.clone() };
            }
        }
        if let Some(ref crc) = digests.crc32 {
            if let Some(name) = self.by_crc32.get(crc) {
                return RefMatch::Mismatch {
                    expected: name.clone(),
                };
            }
        }
        RefMatch::Unknown
    }

    /// Look up a reference name by serial number (normalized).
    pub fn lookup_serial(&self, serial: &str) -> Option<&str> {
        self.by_serial
            .get(&normalize_serial(serial))
            .map(String::as_str)
    }
}

/// Normalize a serial for matching: uppercase, spaces stripped. Hyphens
/// are kept since they're structurally significant (SLUS-00594).
fn normalize_serial(serial: &str) -> String {
    serial.to_uppercase().replace(' ', "")
}
