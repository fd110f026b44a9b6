//! Sega Genesis / Mega Drive provider.
//!
//! The header at 0x100 starts with a "SEGA" console string. The checksum
//! at 0x18E is an additive sum of big-endian words from 0x200 to the end
//! of the ROM.

use std::io::{Read, Seek, SeekFrom};

use rom_warden_core::{
    ChecksumCheck, EmbeddedChecksumKind, HeaderReport, IdentityError, Platform, ReadSeek, Region,
    RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at, read_u16_be};

const HEADER_START: u64 = 0x100;
const HEADER_LEN: usize = 0x100;
const MIN_FILE_SIZE: u64 = 0x200;
const MAX_ROM_SIZE: u64 = 16 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct GenesisProvider;

impl GenesisProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_header(reader: &mut dyn ReadSeek) -> std::io::Result<[u8; HEADER_LEN]> {
        let mut buf = [0u8; HEADER_LEN];
        read_exact_at(reader, HEADER_START, &mut buf)?;
        Ok(buf)
    }

    /// Additive sum of big-endian words from 0x200 to EOF (mod 0x10000).
    fn compute_checksum(reader: &mut dyn ReadSeek) -> std::io::Result<u16> {
        reader.seek(SeekFrom::Start(0x200))?;
        let mut sum: u16 = 0;
        let mut buf = vec![0u8; 64 * 1024];
        let mut carry: Option<u8> = None;

        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            let mut data = &buf[..n];
            if let Some(hi) = carry.take() {
                sum = sum.wrapping_add(u16::from_be_bytes([hi, data[0]]));
                data = &data[1..];
            }
            let mut chunks = data.chunks_exact(2);
            for word in &mut chunks {
                sum = sum.wrapping_add(u16::from_be_bytes([word[0], word[1]]));
            }
            if let [odd] = chunks.remainder() {
                carry = Some(*odd);
            }
        }
        // A trailing odd byte is summed as the high half of a final word
        if let Some(hi) = carry {
            sum = sum.wrapping_add(u16::from_be_bytes([hi, 0]));
        }
        Ok(sum)
    }
}

impl SystemProvider for GenesisProvider {
    fn platform(&self) -> Platform {
        Platform::Genesis
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["md", "gen", "smd", "bin"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        match Self::read_header(reader) {
            Ok(header) => &header[0..4] == b"SEGA",
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
        if &header[0..4] != b"SEGA" {
            return Err(IdentityError::invalid_format("missing SEGA console string"));
        }

        let mut identity = RomIdentity::new().with_platform(Platform::Genesis);

        // Overseas title at 0x150, domestic at 0x120; prefer overseas.
        let overseas = ascii_string(&header[0x50..0x80]);
        let domestic = ascii_string(&header[0x20..0x50]);
        let title = if !overseas.is_empty() { overseas } else { domestic };
        if !title.is_empty() {
            identity.title = Some(collapse_spaces(&title));
        }

        // Serial field at 0x180, e.g. "GM 00001009-00".
        let serial = ascii_string(&header[0x80..0x8E]);
        if !serial.is_empty() {
            identity.serial = Some(serial);
        }

        // Region characters at 0x1F0: any of J/U/E.
        let region_field = &header[0xF0..0xF3];
        for &b in region_field {
            let region = match b {
                b'J' => Some(Region::Japan),
                b'U' => Some(Region::Usa),
                b'E' => Some(Region::Europe),
                _ => None,
            };
            if let Some(r) = region {
                if !identity.regions.contains(&r) {
                    identity.regions.push(r);
                }
            }
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
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
        let signature_ok = &header[0..4] == b"SEGA";
        if !signature_ok {
            return Ok(HeaderReport::default());
        }

        let stored = read_u16_be(&header, 0x8E);
        let computed = Self::compute_checksum(reader)?;
        Ok(HeaderReport {
            signature_ok: true,
            embedded_checksum: Some(ChecksumCheck {
                kind: EmbeddedChecksumKind::Additive,
                expected: stored as u32,
                actual: computed as u32,
            }),
        })
    }

    fn detection_priority(&self) -> u8 {
        // .bin is contested with PS1 disc data; the SEGA string is a
        // stronger signal than sector-sync heuristics.
        3
    }
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "tests/genesis_tests.rs"]
mod tests;
