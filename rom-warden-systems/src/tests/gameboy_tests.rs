use super::*;
use std::io::Cursor;

/// Build a minimal synthetic GB ROM with a valid Nintendo logo.
/// Returns a 0x8000-byte (32 KB) buffer — the minimum ROM size (code 0x00).
fn make_gb_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];

    // Entry point: NOP + JP 0x0150
    rom[0x0100] = 0x00;
    rom[0x0101] = 0xC3;
    rom[0x0102] = 0x50;
    rom[0x0103] = 0x01;

    rom[0x0104..0x0134].copy_from_slice(&NINTENDO_LOGO);

    let title = b"TESTGAME";
    rom[0x0134..0x0134 + title.len()].copy_from_slice(title);

    rom[0x0143] = 0x00; // CGB flag: DMG only
    rom[0x0147] = 0x00; // ROM ONLY
    rom[0x0148] = 0x00; // 32 KB
    rom[0x014A] = 0x01; // International
    rom[0x014C] = 0x00; // Version

    // Compute and set header checksum
    let mut cksum: u8 = 0;
    for &b in &rom[0x0134..=0x014C] {
        cksum = cksum.wrapping_sub(b).wrapping_sub(1);
    }
    rom[0x014D] = cksum;

    rom
}

#[test]
fn validates_good_rom() {
    let rom = make_gb_rom();
    let mut cursor = Cursor::new(&rom);
    let provider = GameBoyProvider::new();
    assert!(provider.validate(&mut cursor, rom.len() as u64));
}

#[test]
fn rejects_corrupted_logo() {
    let mut rom = make_gb_rom();
    rom[0x0110] ^= 0xFF;
    let mut cursor = Cursor::new(&rom);
    let provider = GameBoyProvider::new();
    assert!(!provider.validate(&mut cursor, rom.len() as u64));
}

#[test]
fn rejects_truncated_file() {
    let rom = vec![0u8; 0x200];
    let mut cursor = Cursor::new(&rom);
    let provider = GameBoyProvider::new();
    assert!(!provider.validate(&mut cursor, rom.len() as u64));
}

#[test]
fn extracts_title_and_region() {
    let rom = make_gb_rom();
    let mut cursor = Cursor::new(&rom);
    let provider = GameBoyProvider::new();
    let identity = provider.extract(&mut cursor, rom.len() as u64).unwrap();
    assert_eq!(identity.title.as_deref(), Some("TESTGAME"));
    assert_eq!(identity.regions, vec![Region::World]);
    assert_eq!(identity.expected_size, Some(0x8000));
}

#[test]
fn japan_destination_code() {
    let mut rom = make_gb_rom();
    rom[0x014A] = 0x00;
    // Fix the checksum for the changed byte
    let mut cksum: u8 = 0;
    for &b in &rom[0x0134..=0x014C] {
        cksum = cksum.wrapping_sub(b).wrapping_sub(1);
    }
    rom[0x014D] = cksum;

    let mut cursor = Cursor::new(&rom);
    let provider = GameBoyProvider::new();
    let identity = provider.extract(&mut cursor, rom.len() as u64).unwrap();
    assert_eq!(identity.regions, vec![Region::Japan]);
}

#[test]
fn header_check_verifies_checksum() {
    let rom = make_gb_rom();
    let mut cursor = Cursor::new(&rom);
    let provider = GameBoyProvider::new();
    let report = provider
        .header_check(&mut cursor, rom.len() as u64)
        .unwrap();
    assert!(report.signature_ok);
    let check = report.embedded_checksum.unwrap();
    assert!(check.matches());
}

#[test]
fn header_check_catches_bad_checksum() {
    let mut rom = make_gb_rom();
    rom[0x014D] ^= 0xFF;
    let mut cursor = Cursor::new(&rom);
    let provider = GameBoyProvider::new();
    let report = provider
        .header_check(&mut cursor, rom.len() as u64)
        .unwrap();
    assert!(report.signature_ok);
    assert!(!report.embedded_checksum.unwrap().matches());
}
