use super::*;
use std::io::Cursor;

fn make_genesis_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x1000];
    rom[0x100..0x110].copy_from_slice(b"SEGA MEGA DRIVE ");
    rom[0x120..0x130].copy_from_slice(b"SONIC JP        ");
    rom[0x150..0x164].copy_from_slice(b"SONIC THE HEDGEHOG  ");
    rom[0x180..0x18E].copy_from_slice(b"GM 00001009-00");
    rom[0x1F0] = b'U';
    rom[0x1F1] = b'E';

    // Fill some payload and store its additive word checksum
    for (i, b) in rom[0x200..].iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
    let mut sum: u16 = 0;
    for word in rom[0x200..].chunks_exact(2) {
        sum = sum.wrapping_add(u16::from_be_bytes([word[0], word[1]]));
    }
    rom[0x18E..0x190].copy_from_slice(&sum.to_be_bytes());

    rom
}

#[test]
fn validates_sega_string() {
    let rom = make_genesis_rom();
    let mut cursor = Cursor::new(&rom);
    assert!(GenesisProvider::new().validate(&mut cursor, rom.len() as u64));
}

#[test]
fn extracts_overseas_title_and_serial() {
    let rom = make_genesis_rom();
    let mut cursor = Cursor::new(&rom);
    let identity = GenesisProvider::new()
        .extract(&mut cursor, rom.len() as u64)
        .unwrap();
    assert_eq!(identity.title.as_deref(), Some("SONIC THE HEDGEHOG"));
    assert_eq!(identity.serial.as_deref(), Some("GM 00001009-00"));
    assert_eq!(identity.regions, vec![Region::Usa, Region::Europe]);
}

#[test]
fn checksum_verifies() {
    let rom = make_genesis_rom();
    let mut cursor = Cursor::new(&rom);
    let report = GenesisProvider::new()
        .header_check(&mut cursor, rom.len() as u64)
        .unwrap();
    assert!(report.signature_ok);
    assert!(report.embedded_checksum.unwrap().matches());
}

#[test]
fn modified_payload_fails_checksum() {
    let mut rom = make_genesis_rom();
    rom[0x400] ^= 0x55;
    let mut cursor = Cursor::new(&rom);
    let report = GenesisProvider::new()
        .header_check(&mut cursor, rom.len() as u64)
        .unwrap();
    assert!(!report.embedded_checksum.unwrap().matches());
}

#[test]
fn rejects_non_sega_content() {
    let rom = vec![0u8; 0x1000];
    let mut cursor = Cursor::new(&rom);
    assert!(!GenesisProvider::new().validate(&mut cursor, rom.len() as u64));
}
