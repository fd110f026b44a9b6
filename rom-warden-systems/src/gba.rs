//! Game Boy Advance provider.
//!
//! The GBA header is 192 bytes: an ARM branch at 0x00, the 156-byte
//! compressed Nintendo logo at 0x04, title at 0xA0, game code at 0xAC,
//! and a complement checksum at 0xBD covering 0xA0–0xBC.

use rom_warden_core::{
    ChecksumCheck, EmbeddedChecksumKind, HeaderReport, IdentityError, Platform, ReadSeek, Region,
    RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at};

const HEADER_LEN: usize = 192;
const MIN_FILE_SIZE: u64 = HEADER_LEN as u64;
const MAX_ROM_SIZE: u64 = 64 * 1024 * 1024;

/// Nintendo compressed logo bitmap (156 bytes at offset 0x04).
const NINTENDO_LOGO: [u8; 156] = [
    0x24, 0xFF, 0xAE, 0x51, 0x69, 0x9A, 0xA2, 0x21, 0x3D, 0x84, 0x82, 0x0A, 0x84, 0xE4, 0x09,
    0xAD, 0x11, 0x24, 0x8B, 0x98, 0xC0, 0x81, 0x7F, 0x21, 0xA3, 0x52, 0xBE, 0x19, 0x93, 0x09,
    0xCE, 0x20, 0x10, 0x46, 0x4A, 0x4A, 0xF8, 0x27, 0x31, 0xEC, 0x58, 0xC7, 0xE8, 0x33, 0x82,
    0xE3, 0xCE, 0xBF, 0x85, 0xF4, 0xDF, 0x94, 0xCE, 0x4B, 0x09, 0xC1, 0x94, 0x56, 0x8A, 0xC0,
    0x13, 0x72, 0xA7, 0xFC, 0x9F, 0x84, 0x4D, 0x73, 0xA3, 0xCA, 0x9A, 0x61, 0x58, 0x97, 0xA3,
    0x27, 0xFC, 0x03, 0x98, 0x76, 0x23, 0x1D, 0xC7, 0x61, 0x03, 0x04, 0xAE, 0x56, 0xBF, 0x38,
    0x84, 0x00, 0x40, 0xA7, 0x0E, 0xFD, 0xFF, 0x52, 0xFE, 0x03, 0x6F, 0x95, 0x30, 0xF1, 0x97,
    0xFB, 0xC0, 0x85, 0x60, 0xD6, 0x80, 0x25, 0xA9, 0x63, 0xBE, 0x03, 0x01, 0x4E, 0x38, 0xE2,
    0xF9, 0xA2, 0x34, 0xFF, 0xBB, 0x3E, 0x03, 0x44, 0x78, 0x00, 0x90, 0xCB, 0x88, 0x11, 0x3A,
    0x94, 0x65, 0xC0, 0x7C, 0x63, 0x87, 0xF0, 0x3C, 0xAF, 0xD6, 0x25, 0xE4, 0x8B, 0x38, 0x0A,
    0xAC, 0x72, 0x21, 0xD4, 0xF8, 0x07,
];

#[derive(Debug, Default)]
pub struct GbaProvider;

impl GbaProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_header(reader: &mut dyn ReadSeek) -> std::io::Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];
        read_exact_at(reader, 0, &mut buf)?;
        Ok(buf)
    }
}

/// Complement checksum at 0xBD over 0xA0..=0xBC: (0 - Σbytes - 0x19) & 0xFF.
fn header_checksum(header: &[u8; HEADER_LEN]) -> u8 {
    let mut x: u8 = 0;
    for &b in &header[0xA0..=0xBC] {
        x = x.wrapping_sub(b);
    }
    x.wrapping_sub(0x19)
}

impl SystemProvider for GbaProvider {
    fn platform(&self) -> Platform {
        Platform::Gba
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["gba", "agb", "mb"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        match Self::read_header(reader) {
            // The entry point's 4th byte must be an ARM B/BL opcode.
            Ok(header) => {
                header[0x04..0xA0] == NINTENDO_LOGO && matches!(header[3], 0xEA | 0xEB)
            }
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

        let mut identity = RomIdentity::new().with_platform(Platform::Gba);

        let title = ascii_string(&header[0xA0..0xAC]);
        if !title.is_empty() {
            identity.title = Some(title);
        }

        // Game code "AGB-XXXX"; the 4th character encodes the region.
        let game_code = ascii_string(&header[0xAC..0xB0]);
        if game_code.len() == 4 {
            if let Some(region) = game_code
                .chars()
                .nth(3)
                .and_then(Region::from_code_char)
            {
                identity.regions.push(region);
            }
            identity.serial = Some(format!("AGB-{game_code}"));
        }

        let maker = ascii_string(&header[0xB0..0xB2]);
        if !maker.is_empty() {
            identity.maker_code = Some(maker);
        }

        let version = header[0xBC];
        if version > 0 {
            identity.version = Some(format!("v1.{version}"));
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        // Smallest commercial carts are 1 MB, but multiboot images go
        // well below that; 32 KB is a safe floor.
        SizeRange::new(32 * 1024, MAX_ROM_SIZE)
    }

    fn header_check(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<HeaderReport, IdentityError> {
        if file_size < MIN_FILE_SIZE {
            return Ok(HeaderReport::default());
        }
        let header = Self::read_header(reader)?;
        Ok(HeaderReport {
            signature_ok: header[0x04..0xA0] == NINTENDO_LOGO,
            embedded_checksum: Some(ChecksumCheck {
                kind: EmbeddedChecksumKind::Complement,
                expected: header[0xBD] as u32,
                actual: header_checksum(&header) as u32,
            }),
        })
    }
}

#[cfg(test)]
#[path = "tests/gba_tests.rs"]
mod tests;
