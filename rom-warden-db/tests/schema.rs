use rom_warden_db::*;

#[test]
fn schema_creation_is_idempotent() {
    let conn = open_memory().unwrap();
    create_schema(&conn).unwrap();
    create_schema(&conn).unwrap();
}

#[test]
fn open_database_sets_wal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");
    let conn = open_database(&db_path).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn reopening_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");

    {
        let conn = open_database(&db_path).unwrap();
        let entry = CatalogEntry::new("/roms/gb/tetris.gb", "gb", 32768, 1700000000.0);
        upsert_entry(&conn, &entry).unwrap();
    }

    let conn = open_database(&db_path).unwrap();
    let entry = get_entry(&conn, "/roms/gb/tetris.gb").unwrap().unwrap();
    assert_eq!(entry.system, "gb");
}

#[test]
fn hash_indexes_are_partial() {
    let conn = open_memory().unwrap();
    let sql: String = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE name = 'idx_library_sha1'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(
        sql.contains("WHERE sha1 IS NOT NULL"),
        "sha1 index should be partial: {sql}"
    );
}

#[test]
fn concurrent_connections_see_writes() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("catalog.db");

    let writer = open_database(&db_path).unwrap();
    let reader = open_database(&db_path).unwrap();

    let entry = CatalogEntry::new("/roms/nes/smb.nes", "nes", 40976, 1700000000.0);
    upsert_entry(&writer, &entry).unwrap();

    // WAL lets the second connection read the committed row
    let seen = get_entry(&reader, "/roms/nes/smb.nes").unwrap();
    assert!(seen.is_some());
}
