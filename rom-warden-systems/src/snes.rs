//! SNES / Super Famicom provider.
//!
//! SNES ROMs have no magic bytes; detection relies on the internal header
//! at 0x7FC0 (LoROM) or 0xFFC0 (HiROM), found by checking the checksum /
//! complement pair (`checksum ^ complement == 0xFFFF`) and a printable
//! title. Files whose size is 512 mod 1024 carry a copier header that
//! shifts every offset by 512 bytes.

use rom_warden_core::{
    ChecksumCheck, EmbeddedChecksumKind, HeaderReport, IdentityError, Platform, ReadSeek, Region,
    RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at, read_u16_le};

const HEADER_LEN: usize = 0x20;
const LOROM_OFFSET: u64 = 0x7FC0;
const HIROM_OFFSET: u64 = 0xFFC0;
const COPIER_HEADER: u64 = 512;
const MIN_FILE_SIZE: u64 = 0x8000;

#[derive(Debug, Default)]
pub struct SnesProvider;

struct SnesHeader {
    buf: [u8; HEADER_LEN],
    /// LOROM_OFFSET or HIROM_OFFSET, before any copier-header shift.
    base: u64,
}

impl SnesHeader {
    fn title(&self) -> String {
        ascii_string(&self.buf[0x00..0x15])
    }

    fn complement(&self) -> u16 {
        read_u16_le(&self.buf, 0x1C)
    }

    fn checksum(&self) -> u16 {
        read_u16_le(&self.buf, 0x1E)
    }

    fn pair_valid(&self) -> bool {
        self.checksum() ^ self.complement() == 0xFFFF
    }

    /// Country code at 0x19 in the internal header.
    fn region(&self) -> Option<Region> {
        match self.buf[0x19] {
            0x00 => Some(Region::Japan),
            0x01 => Some(Region::Usa),
            0x02..=0x0C => Some(Region::Europe),
            0x0D => Some(Region::Korea),
            _ => None,
        }
    }

    fn version(&self) -> u8 {
        self.buf[0x1B]
    }

    /// Score a candidate header: the checksum pair is the strong signal,
    /// a mostly-printable title breaks ties between mapping modes.
    fn plausibility(&self) -> u32 {
        let mut score = 0;
        if self.pair_valid() {
            score += 4;
        }
        let printable = self.buf[0x00..0x15]
            .iter()
            .filter(|&&b| (0x20..0x7F).contains(&b))
            .count();
        if printable >= 16 {
            score += 1;
        }
        score
    }
}

impl SnesProvider {
    pub fn new() -> Self {
        Self
    }

    fn copier_offset(file_size: u64) -> u64 {
        if file_size % 1024 == COPIER_HEADER {
            COPIER_HEADER
        } else {
            0
        }
    }

    /// Try LoROM then HiROM header locations; return the most plausible.
    fn find_header(reader: &mut dyn ReadSeek, file_size: u64) -> Option<SnesHeader> {
        let shift = Self::copier_offset(file_size);
        let mut best: Option<SnesHeader> = None;

        for base in [LOROM_OFFSET, HIROM_OFFSET] {
            let offset = base + shift;
            if offset + HEADER_LEN as u64 > file_size {
                continue;
            }
            let mut buf = [0u8; HEADER_LEN];
            if read_exact_at(reader, offset, &mut buf).is_err() {
                continue;
            }
            let candidate = SnesHeader { buf, base };
            let better = match &best {
                Some(b) => candidate.plausibility() > b.plausibility(),
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }

        best.filter(|h| h.plausibility() > 0)
    }
}

impl SystemProvider for SnesProvider {
    fn platform(&self) -> Platform {
        Platform::Snes
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["sfc", "smc", "swc", "fig"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        Self::find_header(reader, file_size).is_some()
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
        let header = Self::find_header(reader, file_size)
            .ok_or_else(|| IdentityError::corrupted_header("no plausible SNES header found"))?;

        let mut identity = RomIdentity::new().with_platform(Platform::Snes);

        let title = header.title();
        if !title.is_empty() {
            identity.title = Some(title);
        }
        if let Some(region) = header.region() {
            identity.regions.push(region);
        }
        if header.version() > 0 {
            identity.version = Some(format!("v1.{}", header.version()));
        }
        identity.extra.insert(
            "mapping".into(),
            if header.base == LOROM_OFFSET {
                "lorom".into()
            } else {
                "hirom".into()
            },
        );

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(MIN_FILE_SIZE, 8 * 1024 * 1024)
    }

    fn header_check(
        &self,
        reader: &mut dyn ReadSeek,
        file_size: u64,
    ) -> Result<HeaderReport, IdentityError> {
        if file_size < MIN_FILE_SIZE {
            return Ok(HeaderReport::default());
        }
        match Self::find_header(reader, file_size) {
            Some(header) => Ok(HeaderReport {
                signature_ok: true,
                embedded_checksum: Some(ChecksumCheck {
                    kind: EmbeddedChecksumKind::Additive,
                    expected: header.checksum() as u32,
                    actual: (header.complement() ^ 0xFFFF) as u32,
                }),
            }),
            None => Ok(HeaderReport::default()),
        }
    }
}

#[cfg(test)]
#[path = "tests/snes_tests.rs"]
mod tests;
