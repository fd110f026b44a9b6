use crate::error::IdentityError;
use crate::platform::Platform;
use crate::{ReadSeek, RomIdentity};

/// Plausible on-disk size range for a system's dumps, in bytes.
///
/// Files below `min` fail basic sanity; files outside the range (but above
/// `min`) are flagged as suspicious rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
}

impl SizeRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, size: u64) -> bool {
        size >= self.min && size <= self.max
    }
}

/// Checksum algorithms that formats embed for self-verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddedChecksumKind {
    /// CRC-16 (NDS header checksum)
    Crc16,
    /// Simple additive checksum (Genesis, SNES)
    Additive,
    /// Subtractive complement checksum (Game Boy, GBA headers)
    Complement,
}

impl EmbeddedChecksumKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crc16 => "CRC-16",
            Self::Additive => "additive",
            Self::Complement => "complement",
        }
    }
}

/// Result of verifying a checksum the format itself embeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumCheck {
    pub kind: EmbeddedChecksumKind,
    /// Value stored in the header.
    pub expected: u32,
    /// Value recomputed from the data the checksum covers.
    pub actual: u32,
}

impl ChecksumCheck {
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

/// Structural verdict on a file's header, produced for the quality scorer.
#[derive(Debug, Clone, Default)]
pub struct HeaderReport {
    /// The format signature / magic bytes were present and valid.
    pub signature_ok: bool,
    /// Embedded header checksum verification, where the format has one.
    pub embedded_checksum: Option<ChecksumCheck>,
}

/// A system-specific provider: structural validation plus identity extraction.
///
/// Providers are registered into a [`ProviderRegistry`](crate::ProviderRegistry)
/// at startup; the classifier and extractor are generic engines driven
/// entirely by this trait. Implementations must be cheap to construct and
/// hold no per-file state.
pub trait SystemProvider: Send + Sync {
    /// The platform this provider handles.
    fn platform(&self) -> Platform;

    /// File extensions (lowercase, no dot) this provider claims.
    ///
    /// Multiple providers may claim the same extension (e.g. `iso`);
    /// [`validate`](Self::validate) disambiguates.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Quick structural check: does the content look like this system's format?
    ///
    /// Reads a bounded prefix or fixed offsets only. Must return `false`
    /// (never panic or error) for truncated, empty, or unreadable content —
    /// corruption is surfaced later as a quality issue, not here.
    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool;

    /// Extract serial / title / region / version from format headers.
    ///
    /// Returns whatever fields could be read; a structurally invalid file is
    /// an `Err` that the caller downgrades to partial metadata.
    fn extract(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<RomIdentity, IdentityError>;

    /// Plausible dump size range for this system.
    fn plausible_size(&self) -> SizeRange;

    /// Structural header verdict for the quality scorer.
    ///
    /// The default re-runs [`validate`](Self::validate) and reports no
    /// embedded checksum; providers whose format carries one override this.
    fn header_check(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<HeaderReport, IdentityError> {
        Ok(HeaderReport {
            signature_ok: self.validate(reader, file_size),
            embedded_checksum: None,
        })
    }

    /// Tie-break order among providers sharing an extension (higher wins).
    ///
    /// Systems with strong magic-byte confirmation should outrank generic
    /// disc formats.
    fn detection_priority(&self) -> u8 {
        0
    }

    fn short_name(&self) -> &'static str {
        self.platform().short_name()
    }

    fn display_name(&self) -> &'static str {
        self.platform().display_name()
    }
}
