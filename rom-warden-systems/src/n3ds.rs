//! Nintendo 3DS provider (NCSD cartridge images).
//!
//! An NCSD image has its magic at 0x100 and a partition table at 0x120;
//! partition 0 is an NCCH whose product code ("CTR-P-XXXX") serves as the
//! serial.

use rom_warden_core::{
    IdentityError, Platform, ReadSeek, Region, RomIdentity, SizeRange, SystemProvider,
};

use crate::util::{ascii_string, read_exact_at, read_u32_le};

/// NCSD media unit: offsets and sizes in the header are in 0x200-byte units.
const MEDIA_UNIT: u64 = 0x200;
const MIN_FILE_SIZE: u64 = 0x200;

#[derive(Debug, Default)]
pub struct N3dsProvider;

impl N3dsProvider {
    pub fn new() -> Self {
        Self
    }

    fn read_ncsd(reader: &mut dyn ReadSeek) -> std::io::Result<[u8; 0x160]> {
        let mut buf = [0u8; 0x160];
        read_exact_at(reader, 0, &mut buf)?;
        Ok(buf)
    }
}

impl SystemProvider for N3dsProvider {
    fn platform(&self) -> Platform {
        Platform::N3ds
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["3ds", "cci"]
    }

    fn validate(&self, reader: &mut dyn ReadSeek, file_size: u64) -> bool {
        if file_size < MIN_FILE_SIZE {
            return false;
        }
        match Self::read_ncsd(reader) {
            Ok(header) => &header[0x100..0x104] == b"NCSD",
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
        let header = Self::read_ncsd(reader)?;
        if &header[0x100..0x104] != b"NCSD" {
            return Err(IdentityError::invalid_format("missing NCSD magic"));
        }

        let mut identity = RomIdentity::new().with_platform(Platform::N3ds);

        // Media size at 0x104, in media units.
        let media_size = read_u32_le(&header, 0x104) as u64;
        if media_size > 0 {
            identity.expected_size = Some(media_size * MEDIA_UNIT);
        }

        // Title ID at 0x108 (8 bytes, little-endian).
        let title_id = u64::from_le_bytes([
            header[0x108], header[0x109], header[0x10A], header[0x10B],
            header[0x10C], header[0x10D], header[0x10E], header[0x10F],
        ]);
        identity
            .extra
            .insert("title_id".into(), format!("{title_id:016x}"));

        // Partition 0 NCCH: offset at 0x120 in media units; the product
        // code sits at NCCH+0x150 and the magic at NCCH+0x100.
        let part0_offset = read_u32_le(&header, 0x120) as u64 * MEDIA_UNIT;
        if part0_offset > 0 && part0_offset + 0x160 <= file_size {
            let mut ncch = [0u8; 0x160];
            if read_exact_at(reader, part0_offset, &mut ncch).is_ok()
                && &ncch[0x100..0x104] == b"NCCH"
            {
                let product_code = ascii_string(&ncch[0x150..0x160]);
                if !product_code.is_empty() {
                    // Product codes look like CTR-P-AXXE; the last letter
                    // is the region.
                    if let Some(region) = product_code
                        .chars()
                        .last()
                        .and_then(Region::from_code_char)
                    {
                        identity.regions.push(region);
                    }
                    identity.serial = Some(product_code);
                }
            }
        }

        Ok(identity)
    }

    fn plausible_size(&self) -> SizeRange {
        SizeRange::new(MIN_FILE_SIZE, 8 * 1024 * 1024 * 1024)
    }

    fn detection_priority(&self) -> u8 {
        8
    }
}
