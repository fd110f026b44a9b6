use super::*;
use rom_warden_dat::{DatFile, DatGame, DatRom};
use rom_warden_db::open_memory;
use std::io::Cursor;

/// Nintendo logo bitmap used to synthesize valid Game Boy ROMs.
const GB_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00,
    0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD,
    0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB,
    0xB9, 0x33, 0x3E,
];

fn make_gb_rom(title: &[u8], filler: u8) -> Vec<u8> {
    let mut rom = vec![filler; 0x8000];
    rom[0x0100..0x0104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);
    rom[0x0104..0x0134].copy_from_slice(&GB_LOGO);
    rom[0x0134..0x0144].fill(0);
    rom[0x0134..0x0134 + title.len()].copy_from_slice(title);
    rom[0x014A] = 0x01;
    let mut cksum: u8 = 0;
    for &b in &rom[0x0134..=0x014C] {
        cksum = cksum.wrapping_sub(b).wrapping_sub(1);
    }
    rom[0x014D] = cksum;
    rom
}

fn scanner_with_refs(references: HashMap<Platform, ReferenceIndex>) -> Scanner {
    Scanner::new(
        Arc::new(rom_warden_systems::default_registry()),
        references,
        ScanOptions {
            workers: 2,
            ..Default::default()
        },
    )
}

fn sha1_of(data: &[u8]) -> String {
    let digests = crate::hasher::compute_digests(
        &mut Cursor::new(data),
        crate::hasher::HashAlgorithms::STANDARD,
    )
    .unwrap();
    digests.sha1.unwrap()
}

#[tokio::test]
async fn scan_catalogs_new_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Tetris (World).gb"),
        make_gb_rom(b"TETRIS", 0x11),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("Kirby (USA).gb"),
        make_gb_rom(b"KIRBY", 0x22),
    )
    .unwrap();
    // Unrecognized extension: skipped, not failed
    std::fs::write(dir.path().join("notes.txt"), b"not a rom").unwrap();

    let mut conn = open_memory().unwrap();
    let scanner = scanner_with_refs(HashMap::new());
    let summary = scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let entries = query_entries(&conn, &EntryFilter::default()).unwrap();
    assert_eq!(entries.len(), 2);
    let tetris = entries
        .iter()
        .find(|e| e.path.contains("Tetris"))
        .unwrap();
    assert_eq!(tetris.system, "gb");
    assert!(tetris.sha1.is_some());
    assert!(tetris.crc32.is_some());
    assert_eq!(tetris.extra.get("title").map(String::as_str), Some("TETRIS"));
}

#[tokio::test]
async fn rescan_skips_unchanged_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Tetris (World).gb"),
        make_gb_rom(b"TETRIS", 0x11),
    )
    .unwrap();

    let mut conn = open_memory().unwrap();
    let scanner = scanner_with_refs(HashMap::new());
    let first = scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(first.added, 1);

    let second = scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn verified_status_comes_from_reference_index() {
    let dir = tempfile::tempdir().unwrap();
    let rom = make_gb_rom(b"TETRIS", 0x11);
    std::fs::write(dir.path().join("Tetris (World).gb"), &rom).unwrap();

    let dat = DatFile {
        name: "Game Boy".into(),
        description: String::new(),
        version: "1".into(),
        games: vec![DatGame {
            name: "Tetris (World)".into(),
            roms: vec![DatRom {
                name: "Tetris (World).gb".into(),
                size: rom.len() as u64,
                crc: None,
                md5: None,
                sha1: Some(sha1_of(&rom)),
                serial: None,
            }],
        }],
    };
    let mut references = HashMap::new();
    references.insert(Platform::GameBoy, ReferenceIndex::from_dat(&dat));

    let mut conn = open_memory().unwrap();
    let scanner = scanner_with_refs(references);
    let summary = scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(summary.verified, 1);
    let entries = query_entries(&conn, &EntryFilter::default()).unwrap();
    assert_eq!(entries[0].status, EntryStatus::Verified);
    assert_eq!(entries[0].match_name.as_deref(), Some("Tetris (World)"));
}

#[tokio::test]
async fn removed_files_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let rom_path = dir.path().join("Tetris (World).gb");
    std::fs::write(&rom_path, make_gb_rom(b"TETRIS", 0x11)).unwrap();

    let mut conn = open_memory().unwrap();
    let scanner = scanner_with_refs(HashMap::new());
    scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();

    std::fs::remove_file(&rom_path).unwrap();
    let summary = scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(summary.removed, 1);
    assert!(query_entries(&conn, &EntryFilter::default())
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn invalid_root_fails_fast() {
    let mut conn = open_memory().unwrap();
    let scanner = scanner_with_refs(HashMap::new());
    let result = scanner
        .scan_library(
            &mut conn,
            Path::new("/definitely/not/a/real/root"),
            &CancelToken::new(),
        )
        .await;
    assert!(matches!(result, Err(ScanError::InvalidRoot(_))));
}

#[tokio::test]
async fn hidden_and_underscore_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".hidden.gb"), b"x").unwrap();
    std::fs::write(dir.path().join("_staging.gb"), b"x").unwrap();

    let mut conn = open_memory().unwrap();
    let scanner = scanner_with_refs(HashMap::new());
    let summary = scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(summary.scanned, 0);
}

#[tokio::test]
async fn cancelled_scan_returns_summary() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10 {
        std::fs::write(
            dir.path().join(format!("Game {i} (USA).gb")),
            make_gb_rom(b"GAME", i as u8),
        )
        .unwrap();
    }

    let mut conn = open_memory().unwrap();
    let scanner = scanner_with_refs(HashMap::new());
    let cancel = CancelToken::new();
    cancel.cancel();

    let summary = scanner
        .scan_library(&mut conn, dir.path(), &cancel)
        .await
        .unwrap();
    // Nothing processed, nothing pruned, but the summary still arrives
    assert_eq!(summary.scanned, 10);
    assert_eq!(summary.added, 0);
    assert_eq!(summary.removed, 0);
}

#[tokio::test]
async fn deep_verify_adds_sha256() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Tetris (World).gb"),
        make_gb_rom(b"TETRIS", 0x11),
    )
    .unwrap();

    let mut conn = open_memory().unwrap();
    let scanner = Scanner::new(
        Arc::new(rom_warden_systems::default_registry()),
        HashMap::new(),
        ScanOptions {
            workers: 1,
            deep_verify: true,
            ..Default::default()
        },
    );
    scanner
        .scan_library(&mut conn, dir.path(), &CancelToken::new())
        .await
        .unwrap();

    let entries = query_entries(&conn, &EntryFilter::default()).unwrap();
    assert!(entries[0].sha256.is_some());
    assert!(entries[0].md5.is_some());
}
