//! Shared byte-level helpers for provider implementations.

use std::io::{Read, Seek, SeekFrom};

use rom_warden_core::ReadSeek;

/// Read exactly `buf.len()` bytes at `offset`. Any failure (seek error,
/// short read) is returned to the caller; validators turn it into `false`.
pub fn read_exact_at(
    reader: &mut dyn ReadSeek,
    offset: u64,
    buf: &mut [u8],
) -> std::io::Result<()> {
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(buf)
}

/// Read up to `limit` bytes from the start of the reader.
pub fn read_prefix(reader: &mut dyn ReadSeek, limit: usize) -> std::io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Decode printable ASCII, stopping at the first NUL and trimming
/// trailing whitespace.
pub fn ascii_string(bytes: &[u8]) -> String {
    let s: String = bytes
        .iter()
        .take_while(|&&b| b != 0)
        .filter(|&&b| (0x20..0x7F).contains(&b))
        .map(|&b| b as char)
        .collect();
    s.trim_end().to_string()
}

/// Find the first occurrence of `needle` in `haystack`.
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Check for an ISO9660 Primary Volume Descriptor: type byte 0x01 followed
/// by "CD001" at sector 16 (offset 0x8000 with 2048-byte sectors).
pub fn has_iso9660_pvd(reader: &mut dyn ReadSeek) -> bool {
    let mut buf = [0u8; 6];
    match read_exact_at(reader, 0x8000, &mut buf) {
        Ok(()) => buf[0] == 0x01 && &buf[1..6] == b"CD001",
        Err(_) => false,
    }
}

/// Check for the 12-byte CD sector sync pattern at the start of a raw
/// 2352-byte-per-sector dump: 00 FF×10 00.
pub fn has_raw_sector_sync(reader: &mut dyn ReadSeek) -> bool {
    let mut buf = [0u8; 12];
    match read_exact_at(reader, 0, &mut buf) {
        Ok(()) => {
            buf[0] == 0x00 && buf[11] == 0x00 && buf[1..11].iter().all(|&b| b == 0xFF)
        }
        Err(_) => false,
    }
}

pub fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

pub fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Scan a buffer for a Sony-style serial: a known 4-letter prefix followed
/// by `_` or `-`, three digits, an optional `.`, and two more digits
/// (e.g. `SLUS_200.02` in SYSTEM.CNF). Returns the normalized
/// `XXXX-NNNNN` form.
pub fn scan_sony_serial(data: &[u8], prefixes: &[&[u8; 4]]) -> Option<String> {
    let mut i = 0;
    while i + 10 <= data.len() {
        let window = &data[i..];
        let prefix_hit = prefixes.iter().any(|p| window.starts_with(*p));
        if !prefix_hit {
            i += 1;
            continue;
        }
        if let Some(serial) = parse_serial_at(window) {
            return Some(serial);
        }
        i += 1;
    }
    None
}

fn parse_serial_at(window: &[u8]) -> Option<String> {
    // window[0..4] is the prefix; expect separator then digits
    if window.len() < 10 {
        return None;
    }
    let sep = window[4];
    if sep != b'_' && sep != b'-' {
        return None;
    }
    let d1 = &window[5..8];
    if !d1.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let (d2, _consumed) = if window.len() >= 11 && window[8] == b'.' {
        (&window[9..11], 11)
    } else {
        (&window[8..10], 10)
    };
    if !d2.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let prefix = std::str::from_utf8(&window[0..4]).ok()?;
    let digits1 = std::str::from_utf8(d1).ok()?;
    let digits2 = std::str::from_utf8(d2).ok()?;
    Some(format!("{prefix}-{digits1}{digits2}"))
}
