//! Nintendo 64 provider.
//!
//! N64 dumps exist in three byte orders, detected from the first word:
//! - `80 37 12 40` — .z64, big-endian (native)
//! - `37 80 40 12` — .v64, byte-swapped pairs
//! - `40 12 37 80` — .n64, little-endian words

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, Region, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at};

const HEADER_LEN: usize = 0x40;
const MIN_FILE_SIZE: u64 = 1024 * 1024;
const MAX_ROM_SIZE: u64 = 64 * 1024 * 1024;

const MAGIC_Z64: [u8; 4] = [0x80, 0x37, 0x12, 0x40];
const MAGIC_V64: [u8; 4] = [0x37, 0x80, 0x40, 0x12];
const MAGIC_N64: [u8; 4] = [0x40, 0x12, 0x37, 0x80];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    BigEndian,
    ByteSwapped,
    LittleEndian,
}

impl ByteOrder {
    fn detect(magic: &[u8; 4]) -> Option<Self> {
        match *magic {
            MAGIC_Z64 => Some(Self::BigEndian),
            MAGIC_V64 => Some(Self::ByteSwapped),
            MAGIC_N64 => Some(Self::LittleEndian),
            _ => None,
        }
    }

    /// Normalize a buffer to big-endian in place. Length must be a
    /// multiple of 4.
    fn normalize(&self, buf: &mut [u8]) {
        match self {
            Self::BigEndian => {}
            Self::ByteSwapped => {
                for pair in buf.chunks_exact_mut(2) {
                    pair.swap(0, 1);
                }
            }
            Self::LittleEndian => {
                for word in buf.chunks_exact_mut(4) {
                    word.reverse();
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct N64Provider;

impl N64Provider {
    pub fn new() -> Self {
        Self
    }

    /// Read the 0x40-byte header, normalized to big-endian.
    fn read_header(reader: &mut dyn ReadSeek) -> std::io::Result<Option<[u8; HEADER_LEN]>> {
        let mut buf = [0u8; HEADER_LEN];
        read_exact_at(reader, 0, &mut buf)?;

        let magic = [buf[0], buf[1], buf[2], buf[3]];
        let Some(order) = ByteOrder::detect(&magic) else {
            return Ok(None);
        };
        order.normalize(&mut buf);
        Ok(Some(buf))
    }
}

impl SystemProvider for N64Provider {
    fn platform(&self) -> Platform {
        Platform::N64
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["z64", "v64", "n64"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < HEADER_LEN as u64 {
            return false;
        }
        matches!(Self::read_header(reader), Ok(Some(_)))
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
        let header = Self::read_header(reader)?
            .ok_or_else(|| IdentityError::invalid_format("unrecognized N64 byte order"))?;

        let mut identity = RomIdentity::new().with_platform(Platform::N64);

        let title = ascii_string(&header[0x20..0x34]);
        if !title.is_empty() {
            identity.title = Some(title);
        }

        // Game code at 0x3B: category + 2-char ID + region character.
        let code = ascii_string(&header[0x3B..0x3F]);
        if code.len() == 4 {
            if let Some(region) = code.chars().nth(3).and_then(Region::from_code_char) {
                identity.regions.push(region);
            }
            identity.serial = Some(format!("NUS-{code}"));
        }

        let version = header[0x3F];
        if version > 0 {
            identity.version = Some(format!("Rev {version}"));
        }

        // CRC words the boot code checks against; recomputing them needs
        // the CIC seed, so only record the stored values.
        identity.extra.insert(
            "crc1".into(),
            format!("{:08x}", u32::from_be_bytes([header[0x10], header[0x11], header[0x12], header[0x13]])),
        );
        identity.extra.insert(
            "crc2".into(),
            format!("{:08x}", u32::from_be_bytes([header[0x14], header[0x15], header[0x16], header[0x17]])),
        );

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(MIN_FILE_SIZE, MAX_ROM_SIZE)
    }
}
