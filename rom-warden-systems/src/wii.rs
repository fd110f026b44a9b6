//! Nintendo Wii provider (ISO and WBFS images).
//!
//! Wii discs carry the magic word 0x5D1C9EA3 at 0x18. WBFS containers
//! prefix the disc with a 0x200-byte partition header.

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, Region, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at, read_u32_be};

const WII_MAGIC: u32 = 0x5D1C_9EA3;
const WII_MAGIC_OFFSET: usize = 0x18;
const WBFS_DISC_START: u64 = 0x200;
const HEADER_LEN: usize = 0x60;

#[derive(Debug, Default)]
pub struct WiiProvider;

impl WiiProvider {
    pub fn new() -> Self {
        Self
    }

    /// Locate the disc header: offset 0 for plain ISO, 0x200 inside WBFS.
    fn disc_header_offset(reader: &mut dyn ReadSeek) -> u64 {
        let mut magic = [0u8; 4];
        if read_exact_at(reader, 0, &mut magic).is_ok() && &magic == b"WBFS" {
            WBFS_DISC_START
        } else {
            0
        }
    }

    fn read_header(reader: &mut dyn ReadSeek, base: u64) -> std::io::Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];
        read_exact_at(reader, base, &mut buf)?;
        Ok(buf)
    }
}

impl SystemProvider for WiiProvider {
    fn platform(&self) -> Platform {
        Platform::Wii
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["iso", "wbfs"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < HEADER_LEN as u64 {
            return false;
        }
        let base = Self::disc_header_offset(reader);
        match Self::read_header(reader, base) {
            Ok(header) => read_u32_be(&header, WII_MAGIC_OFFSET) == WII_MAGIC,
            Err(_) => false,
        }
    }

    fn extract(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<RomIdentity, IdentityError> {
        if file_size < HEADER_LEN as u64 {
            return Err(IdentityError::TooSmall {
                expected: HEADER_LEN as u64,
                actual: file_size,
            });
        }
        let base = Self::disc_header_offset(reader);
        let header = Self::read_header(reader, base)?;
        if read_u32_be(&header, WII_MAGIC_OFFSET) != WII_MAGIC {
            return Err(IdentityError::invalid_format("missing Wii disc magic"));
        }

        let mut identity = RomIdentity::new().with_platform(Platform::Wii);

        let game_code = ascii_string(&header[0..6]);
        if game_code.len() == 6 {
            if let Some(region) = game_code.chars().nth(3).and_then(Region::from_code_char) {
                identity.regions.push(region);
            }
            identity.maker_code = Some(game_code[4..6].to_string());
            identity.serial = Some(game_code);
        }

        let title = ascii_string(&header[0x20..HEADER_LEN]);
        if !title.is_empty() {
            identity.title = Some(title);
        }

        if base == WBFS_DISC_START {
            identity.extra.insert("container".into(), "wbfs".into());
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(100 * 1024 * 1024, 9 * 1024 * 1024 * 1024)
    }

    fn detection_priority(&self) -> u8 {
        10
    }
}
