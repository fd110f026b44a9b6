//! Nintendo GameCube provider.
//!
//! GameCube discs carry the magic word 0xC2339F3D at 0x1C. The 6-byte
//! game code at offset 0 encodes console, game ID, region, and maker.

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, Region, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at, read_u32_be};

const MAGIC_OFFSET: usize = 0x1C;
const GC_MAGIC: u32 = 0xC233_9F3D;
const HEADER_LEN: usize = 0x60;
const MIN_FILE_SIZE: u64 = HEADER_LEN as u64;

#[derive(Debug, Default)]
pub struct GameCubeProvider;

impl GameCubeProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_header(reader: &mut dyn ReadSeek) -> std::io::Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];
        read_exact_at(reader, 0, &mut buf)?;
        Ok(buf)
    }
}

impl SystemProvider for GameCubeProvider {
    fn platform(&self) -> Platform {
        Platform::GameCube
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["iso", "gcm"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        match Self::read_header(reader) {
            Ok(header) => read_u32_be(&header, MAGIC_OFFSET) == GC_MAGIC,
            Err(_) => false,
        }
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
        let header = Self::read_header(reader)?;
        if read_u32_be(&header, MAGIC_OFFSET) != GC_MAGIC {
            return Err(IdentityError::invalid_format("missing GameCube disc magic"));
        }

        let mut identity = RomIdentity::new().with_platform(Platform::GameCube);

        let game_code = ascii_string(&header[0..6]);
        if game_code.len() == 6 {
            if let Some(region) = game_code.chars().nth(3).and_then(Region::from_code_char) {
                identity.regions.push(region);
            }
            identity.maker_code = Some(game_code[4..6].to_string());
            identity.serial = Some(game_code);
        }

        let version = header[7];
        if version > 0 {
            identity.version = Some(format!("Rev {version}"));
        }

        let title = ascii_string(&header[0x20..HEADER_LEN]);
        if !title.is_empty() {
            identity.title = Some(title);
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        // Full mini-DVD dumps are 1.46 GB; trimmed/compressed-sparse dumps
        // can be far smaller.
        SizeRange::new(16 * 1024 * 1024, 1_459_978_240 + 1024)
    }

    fn detection_priority(&self) -> u8 {
        10
    }
}
