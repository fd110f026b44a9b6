use rom_warden_db::*;

fn test_entry(path: &str) -> CatalogEntry {
    let mut entry = CatalogEntry::new(path, "snes", 524288, 1700000000.0);
    entry.crc32 = Some("b19ed489".into());
    entry.sha1 = Some("6b47bb75d16514b6a476aa0c73a683a2a4c18765".into());
    entry.extra.insert("serial".into(), "SNS-ZC-USA".into());
    entry.extra.insert("title".into(), "Chrono Trigger".into());
    entry
}

#[test]
fn upsert_then_get_round_trips() {
    let conn = open_memory().unwrap();
    let entry = test_entry("/roms/snes/ct.sfc");
    upsert_entry(&conn, &entry).unwrap();

    let fetched = get_entry(&conn, "/roms/snes/ct.sfc").unwrap().unwrap();
    assert_eq!(fetched, entry);
}

#[test]
fn upsert_updates_in_place() {
    let conn = open_memory().unwrap();
    let mut entry = test_entry("/roms/snes/ct.sfc");
    upsert_entry(&conn, &entry).unwrap();

    entry.status = EntryStatus::Verified;
    entry.match_name = Some("Chrono Trigger (USA)".into());
    entry.size = 524800;
    upsert_entry(&conn, &entry).unwrap();

    let fetched = get_entry(&conn, "/roms/snes/ct.sfc").unwrap().unwrap();
    assert_eq!(fetched.status, EntryStatus::Verified);
    assert_eq!(fetched.size, 524800);

    let count = count_entries(&conn, &EntryFilter::default()).unwrap();
    assert_eq!(count, 1, "path is the unique key");
}

#[test]
fn get_missing_entry_is_none() {
    let conn = open_memory().unwrap();
    assert!(get_entry(&conn, "/nope").unwrap().is_none());
}

#[test]
fn batch_upsert_commits_atomically() {
    let mut conn = open_memory().unwrap();
    let entries: Vec<CatalogEntry> = (0..50)
        .map(|i| test_entry(&format!("/roms/snes/game{i:02}.sfc")))
        .collect();
    upsert_batch(&mut conn, &entries).unwrap();
    assert_eq!(count_entries(&conn, &EntryFilter::default()).unwrap(), 50);
}

#[test]
fn update_fields_goes_through_whitelist() {
    let conn = open_memory().unwrap();
    upsert_entry(&conn, &test_entry("/roms/snes/ct.sfc")).unwrap();

    update_entry_fields(
        &conn,
        "/roms/snes/ct.sfc",
        &[
            (EntryField::Status, &EntryStatus::Mismatch.as_str()),
            (EntryField::MatchName, &"Chrono Trigger (USA)"),
        ],
    )
    .unwrap();

    let fetched = get_entry(&conn, "/roms/snes/ct.sfc").unwrap().unwrap();
    assert_eq!(fetched.status, EntryStatus::Mismatch);
    assert_eq!(fetched.match_name.as_deref(), Some("Chrono Trigger (USA)"));
}

#[test]
fn update_missing_path_is_not_found() {
    let conn = open_memory().unwrap();
    let result = update_entry_fields(
        &conn,
        "/nope",
        &[(EntryField::Status, &EntryStatus::Corrupt.as_str())],
    );
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[test]
fn remove_entry_deletes_row() {
    let conn = open_memory().unwrap();
    upsert_entry(&conn, &test_entry("/roms/snes/ct.sfc")).unwrap();
    remove_entry(&conn, "/roms/snes/ct.sfc").unwrap();
    assert!(get_entry(&conn, "/roms/snes/ct.sfc").unwrap().is_none());

    // Removing a path that isn't there is fine
    remove_entry(&conn, "/roms/snes/ct.sfc").unwrap();
}

#[test]
fn action_log_appends_in_order() {
    let conn = open_memory().unwrap();
    log_action(&conn, "/a", ActionKind::Hashed, None).unwrap();
    log_action(&conn, "/b", ActionKind::Renamed, Some("b -> c")).unwrap();
    log_action(&conn, "/c", ActionKind::Quarantined, Some("bad header")).unwrap();

    let actions = recent_actions(&conn, 10).unwrap();
    assert_eq!(actions.len(), 3);
    // Newest first
    assert_eq!(actions[0].path, "/c");
    assert_eq!(actions[0].action, ActionKind::Quarantined);
    assert_eq!(actions[2].path, "/a");
}

#[test]
fn quarantine_flips_status_and_logs() {
    let conn = open_memory().unwrap();
    upsert_entry(&conn, &test_entry("/roms/snes/sus.sfc")).unwrap();
    quarantine_entry(&conn, "/roms/snes/sus.sfc", "failed structural checks").unwrap();

    let fetched = get_entry(&conn, "/roms/snes/sus.sfc").unwrap().unwrap();
    assert_eq!(fetched.status, EntryStatus::Quarantined);

    let actions = recent_actions(&conn, 5).unwrap();
    assert_eq!(actions[0].action, ActionKind::Quarantined);
    assert_eq!(
        actions[0].detail.as_deref(),
        Some("failed structural checks")
    );
}
