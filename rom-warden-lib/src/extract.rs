//! Identity extraction with retry and filename fallback.
//!
//! The provider's header parser runs first (under bounded retry for
//! transient I/O); whatever it could not supply is filled from filename
//! heuristics. The result is always a well-formed identity, never an
//! error — a structurally invalid file just yields fewer fields.

use std::path::Path;

use rom_warden_core::filename::parse_file_name;
use rom_warden_core::{RomIdentity, SystemProvider};

use crate::retry::{retry_io, RetryPolicy};

/// Extract identity for a classified file.
pub fn extract_identity(
    provider: &dyn SystemProvider,
    path: &Path,
    file_size: u64,
    retry: &RetryPolicy,
) -> RomIdentity {
    let mut identity = header_identity(provider, path, file_size, retry).unwrap_or_else(|| {
        RomIdentity::new().with_platform(provider.platform())
    });
    identity.merge_missing_from(filename_identity(path));
    identity
}

/// Run the provider's extractor. I/O failures are retried; structural
/// failures are final and fall straight through to the filename layer.
fn header_identity(
    provider: &dyn SystemProvider,
    path: &Path,
    file_size: u64,
    retry: &RetryPolicy,
) -> Option<RomIdentity> {
    let label = format!("extract {}", path.display());
    let result = retry_io(retry, &label, || {
        let mut file = std::fs::File::open(path)?;
        match provider.extract(&mut file, file_size) {
            Ok(identity) => Ok(Some(identity)),
            Err(rom_warden_core::IdentityError::Io(io)) => Err(io),
            Err(structural) => {
                log::warn!("extract {}: {structural}", path.display());
                Ok(None)
            }
        }
    });

    match result {
        Ok(identity) => identity,
        Err(e) => {
            log::warn!(
                "extract {}: falling back to filename heuristics ({e})",
                path.display()
            );
            None
        }
    }
}

/// Identity derived purely from the file name.
pub fn filename_identity(path: &Path) -> RomIdentity {
    let mut identity = RomIdentity::new();
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return identity;
    };

    let parsed = parse_file_name(name);
    if !parsed.title.is_empty() {
        identity.title = Some(parsed.title);
    }
    identity.regions = parsed.regions;
    identity.version = parsed.version.or(parsed.revision);
    identity.serial = parsed.serial;
    identity
}

#[cfg(test)]
mod tests {
    use super::*;
    use rom_warden_core::{Platform, Region};

    #[test]
    fn filename_supplies_missing_fields() {
        let identity =
            filename_identity(Path::new("/roms/snes/Chrono Trigger (USA) (Rev 1).sfc"));
        assert_eq!(identity.title.as_deref(), Some("Chrono Trigger"));
        assert_eq!(identity.regions, vec![Region::Usa]);
        assert_eq!(identity.version.as_deref(), Some("Rev 1"));
    }

    #[test]
    fn merge_prefers_header_fields() {
        let mut header = RomIdentity::new()
            .with_platform(Platform::Snes)
            .with_title("CHRONO TRIGGER");
        header.merge_missing_from(filename_identity(Path::new(
            "/roms/snes/Chrono Trigger (USA).sfc",
        )));
        // Header title wins; filename region fills the gap
        assert_eq!(header.title.as_deref(), Some("CHRONO TRIGGER"));
        assert_eq!(header.regions, vec![Region::Usa]);
    }
}
