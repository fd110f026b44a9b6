//! PlayStation 2 provider.
//!
//! PS2 discs are ISO9660 images; the boot executable named in SYSTEM.CNF
//! (`BOOT2 = cdrom0:\SLUS_200.02;1`) carries the game serial.

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, Region, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{find_bytes, has_iso9660_pvd, read_prefix, scan_sony_serial};

/// How much of the image to scan for SYSTEM.CNF content.
const SERIAL_SCAN_LIMIT: usize = 4 * 1024 * 1024;

/// Cheap validation reads a smaller prefix.
const VALIDATE_SCAN_LIMIT: usize = 1024 * 1024;

const SERIAL_PREFIXES: &[&[u8; 4]] = &[
    b"SLUS", b"SCUS", b"SLES", b"SCES", b"SLPS", b"SLPM", b"SCPS", b"SCAJ", b"SCKA",
];

/// Map a Sony serial prefix to its release region.
pub(crate) fn region_from_sony_prefix(serial: &str) -> Option<Region> {
    match serial.get(0..4)? {
        "SLUS" | "SCUS" | "UCUS" | "ULUS" | "NPUH" => Some(Region::Usa),
        "SLES" | "SCES" | "UCES" | "ULES" | "NPEH" => Some(Region::Europe),
        "SLPS" | "SLPM" | "SCPS" | "SCPM" | "UCJS" | "ULJM" | "ULJS" | "NPJH" => {
            Some(Region::Japan)
        }
        "SCAJ" | "SCKA" => Some(Region::Asia),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct Ps2Provider;

impl Ps2Provider {
    pub fn new() -> Self {
        Self
    }
}

impl SystemProvider for Ps2Provider {
    fn platform(&self) -> Platform {
        Platform::Ps2
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["iso", "bin"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < 0x8006 {
            return false;
        }
        if !has_iso9660_pvd(reader) {
            return false;
        }
        // The PVD alone doesn't distinguish PS2 from other ISO9660-based
        // systems; require a PS2 boot marker in the leading megabyte.
        match read_prefix(reader, VALIDATE_SCAN_LIMIT.min(file_size as usize)) {
            Ok(prefix) => {
                find_bytes(&prefix, b"BOOT2").is_some()
                    || find_bytes(&prefix, b"SYSTEM.CNF").is_some()
            }
            Err(_) => false,
        }
    }

    fn extract(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<RomIdentity, IdentityError> {
        let limit = SERIAL_SCAN_LIMIT.min(file_size as usize);
        let data = read_prefix(reader, limit)?;

        let mut identity = RomIdentity::new().with_platform(Platform::Ps2);

        if let Some(serial) = scan_sony_serial(&data, SERIAL_PREFIXES) {
            if let Some(region) = region_from_sony_prefix(&serial) {
                identity.regions.push(region);
            }
            identity.serial = Some(serial);
        } else {
            log::debug!("ps2: no serial found in leading {limit} bytes");
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        // CD releases start around 200 MB; dual-layer DVD tops out at 8.5 GB.
        SizeRange::new(100 * 1024 * 1024, 9 * 1024 * 1024 * 1024)
    }

    fn detection_priority(&self) -> u8 {
        4
    }
}

#[cfg(test)]
#[path = "tests/ps2_tests.rs"]
mod tests;
