//! PlayStation Portable provider (UMD ISO and CSO images).

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, RomIdentity, SizeRange, SystemProvider,
};

use crate::ps2::region_from_sony_prefix;
use crate::util::{find_bytes, has_iso9660_pvd, read_exact_at, read_prefix, scan_sony_serial};

const SERIAL_SCAN_LIMIT: usize = 2 * 1024 * 1024;
const VALIDATE_SCAN_LIMIT: usize = 256 * 1024;

const SERIAL_PREFIXES: &[&[u8; 4]] = &[
    b"ULUS", b"ULES", b"ULJM", b"ULJS", b"UCUS", b"UCES", b"UCJS", b"NPUH", b"NPEH", b"NPJH",
];

#[derive(Debug, Default)]
pub struct PspProvider;

impl PspProvider {
    pub fn new() -> Self {
        Self
    }

    fn is_cso(reader: &mut dyn ReadSeek) -> bool {
        let mut magic = [0u8; 4];
        matches!(read_exact_at(reader, 0, &mut magic), Ok(())) && &magic == b"CISO"
    }
}

impl SystemProvider for PspProvider {
    fn platform(&self) -> Platform {
        Platform::Psp
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["iso", "cso"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < 0x10 {
            return false;
        }
        if Self::is_cso(reader) {
            return true;
        }
        if file_size < 0x8006 || !has_iso9660_pvd(reader) {
            return false;
        }
        // The UMD filesystem root names PSP_GAME early in the image.
        match read_prefix(reader, VALIDATE_SCAN_LIMIT.min(file_size as usize)) {
            Ok(prefix) => {
                find_bytes(&prefix, b"PSP_GAME").is_some()
                    || find_bytes(&prefix, b"UMD_DATA").is_some()
            }
            Err(_) => false,
        }
    }

    fn extract(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<RomIdentity, IdentityError> {
        let mut identity = RomIdentity::new().with_platform(Platform::Psp);

        if Self::is_cso(reader) {
            // Compressed sectors: the serial isn't reachable without
            // decompression, which belongs to the container-tool seam.
            identity.extra.insert("container".into(), "cso".into());
            return Ok(identity);
        }

        let limit = SERIAL_SCAN_LIMIT.min(file_size as usize);
        let data = read_prefix(reader, limit)?;

        if let Some(serial) = scan_sony_serial(&data, SERIAL_PREFIXES) {
            if let Some(region) = region_from_sony_prefix(&serial) {
                identity.regions.push(region);
            }
            identity.serial = Some(serial);
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(16 * 1024 * 1024, 2 * 1024 * 1024 * 1024)
    }

    fn detection_priority(&self) -> u8 {
        6
    }
}
