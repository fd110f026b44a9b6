use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Seek};

pub mod error;
pub mod filename;
pub mod platform;
pub mod provider;
pub mod region;
pub mod registry;

pub use error::IdentityError;
pub use platform::{Platform, PlatformParseError};
pub use provider::{
    ChecksumCheck, EmbeddedChecksumKind, HeaderReport, SizeRange, SystemProvider,
};
pub use region::Region;
pub use registry::{Classification, ProviderRegistry};

/// A reader that implements both Read and Seek.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Identity extracted from a ROM or disc image.
///
/// All fields are optional; an extractor that fails partway still returns
/// whatever it managed to read. System-specific fields that don't warrant a
/// dedicated field go into `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RomIdentity {
    /// Serial number (e.g., "SLUS-00594" for PS1, "NTR-AMCE-USA" for DS)
    pub serial: Option<String>,

    /// Title, from the internal header where the format has one,
    /// otherwise from the file name.
    pub title: Option<String>,

    /// Region(s) the dump is intended for
    pub regions: Vec<Region>,

    /// Version or revision string (e.g., "v1.1", "Rev A")
    pub version: Option<String>,

    /// Maker/publisher code
    pub maker_code: Option<String>,

    /// Expected file size in bytes, derived from header/metadata.
    /// Compare with the on-disk size to detect truncated or padded dumps.
    pub expected_size: Option<u64>,

    /// Platform the identity was extracted for
    pub platform: Option<Platform>,

    /// Additional system-specific metadata
    pub extra: HashMap<String, String>,
}

impl RomIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// True when no field carries any information.
    pub fn is_empty(&self) -> bool {
        self.serial.is_none()
            && self.title.is_none()
            && self.regions.is_empty()
            && self.version.is_none()
            && self.maker_code.is_none()
            && self.extra.is_empty()
    }

    /// Fill any field this identity is missing from `other`.
    ///
    /// Used to layer filename heuristics underneath header extraction:
    /// header-derived fields always win.
    pub fn merge_missing_from(&mut self, other: RomIdentity) {
        if self.serial.is_none() {
            self.serial = other.serial;
        }
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.regions.is_empty() {
            self.regions = other.regions;
        }
        if self.version.is_none() {
            self.version = other.version;
        }
        if self.maker_code.is_none() {
            self.maker_code = other.maker_code;
        }
        for (k, v) in other.extra {
            self.extra.entry(k).or_insert(v);
        }
    }
}
