//! PlayStation provider (BIN/CUE, ISO, IMG dumps).
//!
//! Raw 2352-byte-per-sector dumps are recognized by the CD sync pattern;
//! cooked images by the ISO9660 PVD plus a PS1 boot line
//! (`BOOT = cdrom:\SLUS_005.94;1`). CUE sheets are validated textually.

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{
    find_bytes, has_iso9660_pvd, has_raw_sector_sync, read_prefix, scan_sony_serial,
};

use crate::ps2::region_from_sony_prefix;

/// PS1 serials live in SYSTEM.CNF near the start, but on raw dumps the
/// filesystem is scattered; scan generously.
const SERIAL_SCAN_LIMIT: usize = 8 * 1024 * 1024;

const VALIDATE_SCAN_LIMIT: usize = 1024 * 1024;

const SERIAL_PREFIXES: &[&[u8; 4]] = &[
    b"SLUS", b"SCUS", b"SLES", b"SCES", b"SLPS", b"SLPM", b"SCPS",
];

#[derive(Debug, Default)]
pub struct Ps1Provider;

impl Ps1Provider {
    pub fn new() -> Self {
        Self
    }

    fn validate_cue(reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        // CUE sheets are small text files referencing their data tracks.
        if file_size == 0 || file_size > 64 * 1024 {
            return false;
        }
        match read_prefix(reader, file_size as usize) {
            Ok(data) => {
                find_bytes(&data, b"FILE").is_some() && find_bytes(&data, b"TRACK").is_some()
            }
            Err(_) => false,
        }
    }
}

impl SystemProvider for Ps1Provider {
    fn platform(&self) -> Platform {
        Platform::Ps1
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["bin", "cue", "iso", "img"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size == 0 {
            return false;
        }
        // A raw sector sync at byte 0 is the strongest cheap signal.
        if has_raw_sector_sync(reader) {
            return true;
        }
        if Self::validate_cue(reader, file_size) {
            return true;
        }
        if file_size >= 0x8006 && has_iso9660_pvd(reader) {
            // Distinguish from PS2: PS1 boot lines use "BOOT =", PS2 "BOOT2 =".
            if let Ok(prefix) = read_prefix(reader, VALIDATE_SCAN_LIMIT.min(file_size as usize))
            {
                return find_bytes(&prefix, b"BOOT = cdrom").is_some()
                    || find_bytes(&prefix, b"Licensed by Sony").is_some();
            }
        }
        false
    }

    fn extract(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<RomIdentity, IdentityError> {
        let mut identity = RomIdentity::new().with_platform(Platform::Ps1);

        let limit = SERIAL_SCAN_LIMIT.min(file_size as usize);
        let data = read_prefix(reader, limit)?;

        if let Some(serial) = scan_sony_serial(&data, SERIAL_PREFIXES) {
            if let Some(region) = region_from_sony_prefix(&serial) {
                identity.regions.push(region);
            }
            identity.serial = Some(serial);
        }

        // Raw dumps must be whole sectors.
        if has_raw_sector_sync(reader) && file_size % 2352 != 0 {
            identity
                .extra
                .insert("partial_sector".into(), "true".into());
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        // CUE sheets are tiny; data tracks run to CD capacity. The floor
        // stays low so cue files pass basic sanity.
        SizeRange::new(64, 900 * 1024 * 1024)
    }

    fn detection_priority(&self) -> u8 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rom_warden_core::Region;
    use std::io::Cursor;

    fn make_raw_bin() -> Vec<u8> {
        let mut bin = vec![0u8; 2352 * 20];
        bin[0] = 0x00;
        for b in &mut bin[1..11] {
            *b = 0xFF;
        }
        bin[11] = 0x00;
        let boot = b"BOOT = cdrom:\\SLUS_005.94;1";
        bin[0x4000..0x4000 + boot.len()].copy_from_slice(boot);
        bin
    }

    #[test]
    fn validates_raw_sector_dump() {
        let bin = make_raw_bin();
        let mut cursor = Cursor::new(&bin);
        assert!(Ps1Provider::new().validate(&mut cursor, bin.len() as u64));
    }

    #[test]
    fn validates_cue_sheet() {
        let cue = b"FILE \"game.bin\" BINARY\n  TRACK 01 MODE2/2352\n    INDEX 01 00:00:00\n";
        let mut cursor = Cursor::new(cue.to_vec());
        assert!(Ps1Provider::new().validate(&mut cursor, cue.len() as u64));
    }

    #[test]
    fn extracts_serial_from_boot_line() {
        let bin = make_raw_bin();
        let mut cursor = Cursor::new(&bin);
        let identity = Ps1Provider::new()
            .extract(&mut cursor, bin.len() as u64)
            .unwrap();
        assert_eq!(identity.serial.as_deref(), Some("SLUS-00594"));
        assert_eq!(identity.regions, vec![Region::Usa]);
    }

    #[test]
    fn garbage_does_not_validate() {
        let data = vec![0x42u8; 4096];
        let mut cursor = Cursor::new(&data);
        assert!(!Ps1Provider::new().validate(&mut cursor, data.len() as u64));
    }
}
