use super::*;
use std::io::Cursor;

/// Build a 512 KB LoROM image with a valid header at 0x7FC0.
fn make_snes_rom(copier_header: bool) -> Vec<u8> {
    let base = if copier_header { 512 } else { 0 };
    let mut rom = vec![0u8; base + 0x80000];

    let header_at = base + 0x7FC0;
    let title = b"CHRONO TRIGGER       "; // 21 bytes, space padded
    rom[header_at..header_at + 21].copy_from_slice(title);
    rom[header_at + 0x15] = 0x20; // LoROM mapping mode
    rom[header_at + 0x19] = 0x01; // USA
    rom[header_at + 0x1B] = 0x00; // version

    // Checksum pair: arbitrary checksum with matching complement
    let checksum: u16 = 0xA5C3;
    let complement = checksum ^ 0xFFFF;
    rom[header_at + 0x1C..header_at + 0x1E].copy_from_slice(&complement.to_le_bytes());
    rom[header_at + 0x1E..header_at + 0x20].copy_from_slice(&checksum.to_le_bytes());

    rom
}

#[test]
fn validates_lorom_header() {
    let rom = make_snes_rom(false);
    let mut cursor = Cursor::new(&rom);
    assert!(SnesProvider::new().validate(&mut cursor, rom.len() as u64));
}

#[test]
fn handles_copier_header_shift() {
    let rom = make_snes_rom(true);
    let mut cursor = Cursor::new(&rom);
    let provider = SnesProvider::new();
    assert!(provider.validate(&mut cursor, rom.len() as u64));

    let identity = provider.extract(&mut cursor, rom.len() as u64).unwrap();
    assert_eq!(identity.title.as_deref(), Some("CHRONO TRIGGER"));
}

#[test]
fn extracts_region_from_country_code() {
    let rom = make_snes_rom(false);
    let mut cursor = Cursor::new(&rom);
    let identity = SnesProvider::new()
        .extract(&mut cursor, rom.len() as u64)
        .unwrap();
    assert_eq!(identity.regions, vec![Region::Usa]);
    assert_eq!(
        identity.extra.get("mapping").map(String::as_str),
        Some("lorom")
    );
}

#[test]
fn rejects_random_data() {
    // Deterministic pseudo-random junk with no valid checksum pair
    let rom: Vec<u8> = (0..0x80000u32)
        .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
        .collect();
    let mut cursor = Cursor::new(&rom);
    // May or may not validate by luck of the checksum pair — but must not panic
    let _ = SnesProvider::new().validate(&mut cursor, rom.len() as u64);
}

#[test]
fn checksum_pair_reported_to_scorer() {
    let rom = make_snes_rom(false);
    let mut cursor = Cursor::new(&rom);
    let report = SnesProvider::new()
        .header_check(&mut cursor, rom.len() as u64)
        .unwrap();
    assert!(report.signature_ok);
    assert!(report.embedded_checksum.unwrap().matches());
}
