use rom_warden_db::*;

fn entry(path: &str, system: &str, size: u64, sha1: Option<&str>, crc: Option<&str>) -> CatalogEntry {
    let mut e = CatalogEntry::new(path, system, size, 1700000000.0);
    e.sha1 = sha1.map(String::from);
    e.crc32 = crc.map(String::from);
    e
}

fn seeded() -> rusqlite::Connection {
    let conn = open_memory().unwrap();
    let rows = [
        entry("/roms/snes/a.sfc", "snes", 100, Some("aaaa"), Some("1111")),
        entry("/roms/snes/b.sfc", "snes", 100, Some("aaaa"), Some("1111")),
        entry("/roms/snes/c.sfc", "snes", 200, Some("cccc"), None),
        entry("/roms/nes/d.nes", "nes", 300, None, Some("2222")),
        entry("/roms/nes/e.nes", "nes", 300, None, Some("2222")),
        entry("/roms/nes/f.nes", "nes", 400, None, None),
    ];
    for row in &rows {
        upsert_entry(&conn, row).unwrap();
    }
    conn
}

#[test]
fn filter_by_system() {
    let conn = seeded();
    let snes = query_entries(
        &conn,
        &EntryFilter {
            system: Some("snes".into()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(snes.len(), 3);
    assert!(snes.iter().all(|e| e.system == "snes"));
}

#[test]
fn filter_by_status() {
    let conn = seeded();
    update_entry_fields(
        &conn,
        "/roms/snes/a.sfc",
        &[(EntryField::Status, &EntryStatus::Verified.as_str())],
    )
    .unwrap();

    let verified = query_entries(
        &conn,
        &EntryFilter {
            status: Some(EntryStatus::Verified),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].path, "/roms/snes/a.sfc");
}

#[test]
fn pagination_limits_rows() {
    let conn = seeded();
    let page1 = query_entries(
        &conn,
        &EntryFilter {
            limit: Some(2),
            offset: Some(0),
            ..Default::default()
        },
    )
    .unwrap();
    let page2 = query_entries(
        &conn,
        &EntryFilter {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 2);
    assert_ne!(page1[0].path, page2[0].path);

    assert_eq!(count_entries(&conn, &EntryFilter::default()).unwrap(), 6);
}

#[test]
fn duplicate_groups_by_sha1_then_crc32() {
    let conn = seeded();
    let groups = duplicate_hash_groups(&conn, &[HashKind::Sha1, HashKind::Crc32]).unwrap();

    let sha1_groups: Vec<_> = groups.iter().filter(|g| g.kind == HashKind::Sha1).collect();
    assert_eq!(sha1_groups.len(), 1);
    assert_eq!(sha1_groups[0].value, "aaaa");
    assert_eq!(sha1_groups[0].entries.len(), 2);

    let crc_groups: Vec<_> = groups
        .iter()
        .filter(|g| g.kind == HashKind::Crc32)
        .collect();
    // "1111" (a,b) and "2222" (d,e)
    assert_eq!(crc_groups.len(), 2);
}

#[test]
fn entries_without_hashes_are_excluded_from_grouping() {
    let conn = seeded();
    let groups = duplicate_hash_groups(&conn, &[HashKind::Sha1]).unwrap();
    for group in &groups {
        assert!(group.entries.iter().all(|e| e.sha1.is_some()));
    }
}

#[test]
fn stats_aggregate_by_system_and_status() {
    let conn = seeded();
    let stats = catalog_stats(&conn).unwrap();
    assert_eq!(stats.total_entries, 6);
    assert_eq!(stats.total_bytes, 100 + 100 + 200 + 300 + 300 + 400);
    assert_eq!(stats.by_system.get("snes"), Some(&3));
    assert_eq!(stats.by_system.get("nes"), Some(&3));
    assert_eq!(stats.by_status.get("UNKNOWN"), Some(&6));
}

#[test]
fn all_paths_lists_every_row() {
    let conn = seeded();
    let paths = all_paths(&conn).unwrap();
    assert_eq!(paths.len(), 6);
    assert!(paths.contains(&"/roms/nes/f.nes".to_string()));
}
