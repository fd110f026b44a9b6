use super::*;
use std::io::Cursor;

/// Build a minimal ISO9660-looking image with a SYSTEM.CNF boot line.
fn make_ps2_iso() -> Vec<u8> {
    let mut iso = vec![0u8; 0x10000];
    iso[0x8000] = 0x01;
    iso[0x8001..0x8006].copy_from_slice(b"CD001");
    let boot = b"BOOT2 = cdrom0:\\SLUS_200.02;1";
    iso[0x9000..0x9000 + boot.len()].copy_from_slice(boot);
    iso
}

#[test]
fn validates_with_boot_marker() {
    let iso = make_ps2_iso();
    let mut cursor = Cursor::new(&iso);
    assert!(Ps2Provider::new().validate(&mut cursor, iso.len() as u64));
}

#[test]
fn plain_iso9660_without_markers_does_not_validate() {
    let mut iso = vec![0u8; 0x10000];
    iso[0x8000] = 0x01;
    iso[0x8001..0x8006].copy_from_slice(b"CD001");
    let mut cursor = Cursor::new(&iso);
    assert!(!Ps2Provider::new().validate(&mut cursor, iso.len() as u64));
}

#[test]
fn extracts_normalized_serial() {
    let iso = make_ps2_iso();
    let mut cursor = Cursor::new(&iso);
    let identity = Ps2Provider::new()
        .extract(&mut cursor, iso.len() as u64)
        .unwrap();
    assert_eq!(identity.serial.as_deref(), Some("SLUS-20002"));
    assert_eq!(identity.regions, vec![Region::Usa]);
}

#[test]
fn missing_serial_still_returns_identity() {
    let mut iso = vec![0u8; 0x10000];
    iso[0x8000] = 0x01;
    iso[0x8001..0x8006].copy_from_slice(b"CD001");
    let mut cursor = Cursor::new(&iso);
    let identity = Ps2Provider::new()
        .extract(&mut cursor, iso.len() as u64)
        .unwrap();
    assert!(identity.serial.is_none());
    assert_eq!(identity.platform, Some(Platform::Ps2));
}

#[test]
fn prefix_region_table() {
    assert_eq!(region_from_sony_prefix("SLES-50003"), Some(Region::Europe));
    assert_eq!(region_from_sony_prefix("SLPM-62004"), Some(Region::Japan));
    assert_eq!(region_from_sony_prefix("XXXX-00000"), None);
}
