//! NES / Famicom provider (iNES and NES 2.0 containers).

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, Region, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::read_exact_at;

/// iNES magic: "NES" followed by MS-DOS EOF.
const INES_MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

const HEADER_LEN: usize = 16;
const MIN_FILE_SIZE: u64 = HEADER_LEN as u64 + 0x4000; // header + one PRG bank

#[derive(Debug, Default)]
pub struct NesProvider;

impl NesProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_header(reader: &mut dyn ReadSeek) -> std::io::Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];
        read_exact_at(reader, 0, &mut buf)?;
        Ok(buf)
    }
}

impl SystemProvider for NesProvider {
    fn platform(&self) -> Platform {
        Platform::Nes
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["nes", "unf", "fds"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        match Self::read_header(reader) {
            Ok(header) => header[0..4] == INES_MAGIC,
            Err(_) => false,
        }
    }

    fn extract(
        &self,
        reader: &mut dyn ReadSeek,
        _file_size: u64,
    ) -> Result<RomIdentity, IdentityError> {
        let header = Self::read_header(reader)?;
        if header[0..4] != INES_MAGIC {
            return Err(IdentityError::invalid_format("missing iNES magic"));
        }

        let mut identity = RomIdentity::new().with_platform(Platform::Nes);

        let prg_banks = header[4] as u64;
        let chr_banks = header[5] as u64;
        let flags6 = header[6];
        let flags7 = header[7];
        let is_nes2 = (flags7 & 0x0C) == 0x08;

        let trainer = if flags6 & 0x04 != 0 { 512 } else { 0 };
        identity.expected_size =
            Some(HEADER_LEN as u64 + trainer + prg_banks * 0x4000 + chr_banks * 0x2000);

        let mapper = u16::from((flags7 & 0xF0) | (flags6 >> 4));
        identity.extra.insert("mapper".into(), mapper.to_string());
        identity
            .extra
            .insert("prg_banks".into(), prg_banks.to_string());
        identity
            .extra
            .insert("chr_banks".into(), chr_banks.to_string());

        if is_nes2 {
            identity.extra.insert("nes2".into(), "true".into());
            // NES 2.0 byte 12: CPU/PPU timing — 0 NTSC, 1 PAL, 3 Dendy.
            match header[12] & 0x03 {
                0 => identity.regions.push(Region::Usa),
                1 => identity.regions.push(Region::Europe),
                _ => {}
            }
        } else if header[9] & 0x01 != 0 {
            // iNES byte 9 TV system bit (rarely set, best-effort)
            identity.regions.push(Region::Europe);
        }

        // The iNES header carries no title; the filename heuristic layer
        // supplies one.
        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(MIN_FILE_SIZE, 8 * 1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_nes_rom(prg: u8, chr: u8) -> Vec<u8> {
        let size = HEADER_LEN + prg as usize * 0x4000 + chr as usize * 0x2000;
        let mut rom = vec![0u8; size];
        rom[0..4].copy_from_slice(&INES_MAGIC);
        rom[4] = prg;
        rom[5] = chr;
        rom[6] = 0x10; // mapper low nibble 1
        rom
    }

    #[test]
    fn validates_ines_magic() {
        let rom = make_nes_rom(2, 1);
        let mut cursor = Cursor::new(&rom);
        assert!(NesProvider::new().validate(&mut cursor, rom.len() as u64));
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut rom = make_nes_rom(2, 1);
        rom[0] = b'X';
        let mut cursor = Cursor::new(&rom);
        assert!(!NesProvider::new().validate(&mut cursor, rom.len() as u64));
    }

    #[test]
    fn expected_size_from_bank_counts() {
        let rom = make_nes_rom(2, 1);
        let mut cursor = Cursor::new(&rom);
        let identity = NesProvider::new()
            .extract(&mut cursor, rom.len() as u64)
            .unwrap();
        assert_eq!(identity.expected_size, Some(rom.len() as u64));
        assert_eq!(identity.extra.get("mapper").map(String::as_str), Some("1"));
    }

    #[test]
    fn zero_byte_file_does_not_validate() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(!NesProvider::new().validate(&mut cursor, 0));
    }
}
