//! Provider registry and the magic-byte classifier.
//!
//! Systems register a [`SystemProvider`]; classification is a generic engine
//! over the registry: candidate providers are selected by extension, then
//! disambiguated by their structural validators in priority order.

use std::collections::HashMap;
use std::fs::File;
use std::io::Seek;
use std::path::Path;

use crate::platform::Platform;
use crate::provider::SystemProvider;

/// Outcome of classifying a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A provider's structural validator confirmed the format.
    Matched(Platform),
    /// No validator succeeded; this is the first provider registered for
    /// the extension, used best-effort.
    Fallback(Platform),
    /// No provider is registered for the file's extension.
    Unknown,
}

impl Classification {
    /// The platform, if any provider claimed the file.
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Self::Matched(p) | Self::Fallback(p) => Some(*p),
            Self::Unknown => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Registry of system providers, keyed by extension for classification.
///
/// Populated explicitly at startup; read-only afterwards, so it can be
/// shared freely across worker threads.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn SystemProvider>>,
    /// extension (lowercase) → indexes into `providers`, in registration order
    by_extension: HashMap<&'static str, Vec<usize>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Register a provider. Registration order is the fallback order for
    /// extensions no validator confirms.
    pub fn register<P: SystemProvider + 'static>(&mut self, provider: P) -> &mut Self {
        let index = self.providers.len();
        for ext in provider.file_extensions() {
            self.by_extension.entry(ext).or_default().push(index);
        }
        self.providers.push(Box::new(provider));
        self
    }

    /// Get the provider for a platform.
    pub fn get(&self, platform: Platform) -> Option<&dyn SystemProvider> {
        self.providers
            .iter()
            .map(|p| p.as_ref())
            .find(|p| p.platform() == platform)
    }

    /// All registered providers.
    pub fn providers(&self) -> impl Iterator<Item = &dyn SystemProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    /// Providers claiming an extension, highest detection priority first.
    /// Ties keep registration order.
    pub fn candidates_for_extension(&self, ext: &str) -> Vec<&dyn SystemProvider> {
        let lower = ext.to_lowercase();
        let Some(indexes) = self.by_extension.get(lower.as_str()) else {
            return Vec::new();
        };
        let mut candidates: Vec<&dyn SystemProvider> = indexes
            .iter()
            .map(|&i| self.providers[i].as_ref())
            .collect();
        candidates.sort_by_key(|p| std::cmp::Reverse(p.detection_priority()));
        candidates
    }

    /// Classify a file by extension and magic bytes.
    ///
    /// Every candidate provider's validator is tried in priority order; the
    /// first to confirm wins. Zero-byte files never validate. Read errors
    /// during a candidate's validation count as "does not match" for that
    /// candidate only. When nothing validates, the first registered provider
    /// for the extension is returned as a logged best-effort fallback.
    pub fn classify(&self, path: &Path) -> Classification {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Classification::Unknown;
        };

        let candidates = self.candidates_for_extension(ext);
        if candidates.is_empty() {
            return Classification::Unknown;
        }

        let file_size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::debug!("classify: cannot stat {}: {}", path.display(), e);
                0
            }
        };

        if file_size > 0 {
            if let Ok(mut file) = File::open(path) {
                for provider in &candidates {
                    if file.seek(std::io::SeekFrom::Start(0)).is_err() {
                        break;
                    }
                    if provider.validate(&mut file, file_size) {
                        return Classification::Matched(provider.platform());
                    }
                }
            }
        }

        // Nothing validated: fall back to the first provider registered for
        // this extension (not the highest-priority one — registration order
        // encodes the historical default).
        let lower = ext.to_lowercase();
        let first = self.by_extension[lower.as_str()][0];
        let platform = self.providers[first].platform();
        log::warn!(
            "classify: no validator matched {} (ext .{}), falling back to {}",
            path.display(),
            lower,
            platform.short_name()
        );
        Classification::Fallback(platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SizeRange;
    use crate::{IdentityError, ReadSeek, RomIdentity};
    use std::io::Read;

    /// Validates only when the file starts with a fixed byte.
    struct ByteMagicProvider {
        platform: Platform,
        magic: u8,
        extensions: &'static [&'static str],
        priority: u8,
    }

    impl SystemProvider for ByteMagicProvider {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn file_extensions(&self) -> &'static [&'static str] {
            self.extensions
        }

        fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
            if file_size == 0 {
                return false;
            }
            let mut buf = [0u8; 1];
            reader.read_exact(&mut buf).map(|_| buf[0] == self.magic).unwrap_or(false)
        }

        fn extract(
            &self,
            _reader: &mut dyn ReadSeek,
            _file_size: u64,
        ) -> Result<RomIdentity, IdentityError> {
            Ok(RomIdentity::new().with_platform(self.platform))
        }

        fn plausible_size(&self) -> SizeRange {
            SizeRange::new(1, u64::MAX)
        }

        fn detection_priority(&self) -> u8 {
            self.priority
        }
    }

    fn registry() -> ProviderRegistry {
        let mut reg = ProviderRegistry::new();
        reg.register(ByteMagicProvider {
            platform: Platform::Ps2,
            magic: 0xAA,
            extensions: &["iso"],
            priority: 0,
        });
        reg.register(ByteMagicProvider {
            platform: Platform::GameCube,
            magic: 0xBB,
            extensions: &["iso"],
            priority: 5,
        });
        reg
    }

    fn temp_file(contents: &[u8], ext: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("rw-registry-test-{}-{}.{}", contents.len(), contents.first().copied().unwrap_or(0), ext));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn validator_disambiguates_shared_extension() {
        let reg = registry();
        let path = temp_file(&[0xBB, 0x00], "iso");
        assert_eq!(
            reg.classify(&path),
            Classification::Matched(Platform::GameCube)
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn falls_back_to_first_registered() {
        let reg = registry();
        let path = temp_file(&[0x00, 0x00], "iso");
        // Neither magic matches → first registered (Ps2), not highest priority
        assert_eq!(
            reg.classify(&path),
            Classification::Fallback(Platform::Ps2)
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn zero_byte_file_never_validates() {
        let reg = registry();
        let path = temp_file(&[], "iso");
        assert_eq!(
            reg.classify(&path),
            Classification::Fallback(Platform::Ps2)
        );
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unregistered_extension_is_unknown() {
        let reg = registry();
        let path = temp_file(&[0xAA], "xyz");
        assert_eq!(reg.classify(&path), Classification::Unknown);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn priority_orders_candidates() {
        let reg = registry();
        let candidates = reg.candidates_for_extension("iso");
        assert_eq!(candidates[0].platform(), Platform::GameCube);
        assert_eq!(candidates[1].platform(), Platform::Ps2);
    }
}
