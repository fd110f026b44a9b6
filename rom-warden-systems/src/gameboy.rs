//! Game Boy / Game Boy Color provider.
//!
//! The cartridge header occupies 0x100–0x14F. Detection uses the 48-byte
//! Nintendo logo bitmap at 0x104, which the boot ROM verifies on real
//! hardware. The header checksum at 0x14D covers bytes 0x134–0x14C.

use rom_warden_core::{
    ChecksumCheck, EmbeddedChecksumKind, HeaderReport, IdentityError, Platform, ReadSeek, Region,
    RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at};

/// Minimum file size: header ends at 0x150, smallest ROM is 32 KB.
const MIN_FILE_SIZE: u64 = 0x8000;

/// Largest licensed cartridge: 8 MB.
const MAX_ROM_SIZE: u64 = 8 * 1024 * 1024;

/// Nintendo logo bitmap at 0x104 (verified by the boot ROM).
const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00,
    0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD,
    0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB,
    0xB9, 0x33, 0x3E,
];

/// Full header region read for parsing: 0x100–0x14F.
const HEADER_START: u64 = 0x100;
const HEADER_LEN: usize = 0x50;

#[derive(Debug, Default)]
pub struct GameBoyProvider;

impl GameBoyProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_header(reader: &mut dyn ReadSeek) -> std::io::Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];
        read_exact_at(reader, HEADER_START, &mut buf)?;
        Ok(buf)
    }
}

/// Header checksum at 0x14D: x = x - byte - 1 over 0x134..=0x14C.
fn header_checksum(header: &[u8; HEADER_LEN]) -> u8 {
    let mut x: u8 = 0;
    for &b in &header[0x34..=0x4C] {
        x = x.wrapping_sub(b).wrapping_sub(1);
    }
    x
}

impl SystemProvider for GameBoyProvider {
    fn platform(&self) -> Platform {
        Platform::GameBoy
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["gb", "gbc", "sgb"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        match Self::read_header(reader) {
            Ok(header) => header[0x04..0x34] == NINTENDO_LOGO,
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

        let cgb_flag = header[0x43];
        // CGB carts use 0x143 as a flag byte, shortening the title field.
        let title_len = if cgb_flag == 0x80 || cgb_flag == 0xC0 {
            0x0F
        } else {
            0x10
        };
        let title = ascii_string(&header[0x34..0x34 + title_len]);

        let mut identity = RomIdentity::new().with_platform(Platform::GameBoy);
        if !title.is_empty() {
            identity.title = Some(title);
        }

        // Destination code: 0x00 = Japan, anything else = overseas.
        identity.regions.push(if header[0x4A] == 0 {
            Region::Japan
        } else {
            Region::World
        });

        let version = header[0x4C];
        if version > 0 {
            identity.version = Some(format!("v1.{version}"));
        }

        // ROM size code: 32 KB << n banks.
        let rom_size_code = header[0x48];
        if rom_size_code <= 0x08 {
            identity.expected_size = Some(0x8000u64 << rom_size_code);
        }

        identity
            .extra
            .insert("cartridge_type".into(), format!("0x{:02X}", header[0x47]));
        if cgb_flag == 0x80 || cgb_flag == 0xC0 {
            identity.extra.insert("cgb".into(), "true".into());
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(MIN_FILE_SIZE, MAX_ROM_SIZE)
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
            signature_ok: header[0x04..0x34] == NINTENDO_LOGO,
            embedded_checksum: Some(ChecksumCheck {
                kind: EmbeddedChecksumKind::Complement,
                expected: header[0x4D] as u32,
                actual: header_checksum(&header) as u32,
            }),
        })
    }
}

#[cfg(test)]
#[path = "tests/gameboy_tests.rs"]
mod tests;
