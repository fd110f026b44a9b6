//! Nintendo Switch provider (NSP packages and XCI cartridge images).
//!
//! NSP is a PFS0 archive; XCI has a "HEAD" magic at 0x100. Content is
//! encrypted, so identity comes from the filename heuristic layer; this
//! provider only confirms structure.

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{read_exact_at, read_u32_le};

const MIN_FILE_SIZE: u64 = 0x110;

#[derive(Debug, Default)]
pub struct SwitchProvider;

impl SwitchProvider {
    pub fn new() -> Self {
        Self
    }

    fn is_pfs0(reader: &mut dyn ReadSeek) -> bool {
        let mut magic = [0u8; 4];
        matches!(read_exact_at(reader, 0, &mut magic), Ok(())) && &magic == b"PFS0"
    }

    fn is_xci(reader: &mut dyn ReadSeek) -> bool {
        let mut magic = [0u8; 4];
        matches!(read_exact_at(reader, 0x100, &mut magic), Ok(())) && &magic == b"HEAD"
    }
}

impl SystemProvider for SwitchProvider {
    fn platform(&self) -> Platform {
        Platform::Switch
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["nsp", "xci"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        Self::is_pfs0(reader) || Self::is_xci(reader)
    }

    fn extract(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<RomIdentity, IdentityError> {
        if file_size < MIN_FILE_SIZE {
            return Err(IdentityError::TooSmall {
                expected: MIN_FILE_SIZE,
                actual: file_size,
            });
        }

        let mut identity = RomIdentity::new().with_platform(Platform::Switch);

        if Self::is_pfs0(reader) {
            identity.extra.insert("format".into(), "nsp".into());
            let mut buf = [0u8; 8];
            read_exact_at(reader, 0, &mut buf)?;
            let num_files = read_u32_le(&buf, 4);
            identity
                .extra
                .insert("entries".into(), num_files.to_string());
            if num_files == 0 {
                log::warn!("switch: PFS0 package declares zero entries");
            }
        } else if Self::is_xci(reader) {
            identity.extra.insert("format".into(), "xci".into());
        } else {
            return Err(IdentityError::invalid_format(
                "neither PFS0 nor XCI signature present",
            ));
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(1024 * 1024, 32 * 1024 * 1024 * 1024)
    }

    fn detection_priority(&self) -> u8 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn validates_nsp() {
        let mut nsp = vec![0u8; 0x1000];
        nsp[0..4].copy_from_slice(b"PFS0");
        nsp[4..8].copy_from_slice(&3u32.to_le_bytes());
        let mut cursor = Cursor::new(&nsp);
        let provider = SwitchProvider::new();
        assert!(provider.validate(&mut cursor, nsp.len() as u64));

        let identity = provider.extract(&mut cursor, nsp.len() as u64).unwrap();
        assert_eq!(identity.extra.get("format").map(String::as_str), Some("nsp"));
        assert_eq!(identity.extra.get("entries").map(String::as_str), Some("3"));
    }

    #[test]
    fn validates_xci() {
        let mut xci = vec![0u8; 0x1000];
        xci[0x100..0x104].copy_from_slice(b"HEAD");
        let mut cursor = Cursor::new(&xci);
        let provider = SwitchProvider::new();
        assert!(provider.validate(&mut cursor, xci.len() as u64));

        let identity = provider.extract(&mut cursor, xci.len() as u64).unwrap();
        assert_eq!(identity.extra.get("format").map(String::as_str), Some("xci"));
    }

    #[test]
    fn rejects_unknown_content() {
        let junk = vec![0u8; 0x1000];
        let mut cursor = Cursor::new(&junk);
        assert!(!SwitchProvider::new().validate(&mut cursor, junk.len() as u64));
    }
}
