use super::*;
use tempfile::tempdir;

#[test]
fn in_memory_opens_successfully() {
    let result = Database::in_memory();
    assert!(result.is_ok());
}

#[test]
fn schema_tables_exist() {
    let db = Database::in_memory().unwrap();

    let tables: Vec<String> = db
        .connection()
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();

    assert!(tables.contains(&"kv".to_string()));
    assert!(tables.contains(&"schema_migrations".to_string()));
}

#[test]
fn open_creates_database_file() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");

    let result = Database::open(&db_path);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn reopen_keeps_data() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");

    {
        let db = Database::open(&db_path).unwrap();
        db.put(b"note_work", b"{}").unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    assert_eq!(db.get(b"note_work").unwrap(), Some(b"{}".to_vec()));
}

#[test]
fn get_missing_key_returns_none() {
    let db = Database::in_memory().unwrap();
    assert_eq!(db.get(b"missing").unwrap(), None);
}

#[test]
fn put_replaces_existing_value() {
    let db = Database::in_memory().unwrap();
    db.put(b"config", b"old").unwrap();
    db.put(b"config", b"new").unwrap();

    assert_eq!(db.get(b"config").unwrap(), Some(b"new".to_vec()));
    assert_eq!(db.scan_all().unwrap().len(), 1);
}

#[test]
fn delete_missing_key_is_not_an_error() {
    let db = Database::in_memory().unwrap();
    assert!(db.delete(b"missing").is_ok());
}

#[test]
fn scan_all_returns_pairs_in_byte_order() {
    let db = Database::in_memory().unwrap();
    for key in ["note_b", "config", "item_a_000000002", "item_a_000000001", "note_a"] {
        db.put(key.as_bytes(), b"v").unwrap();
    }

    let keys: Vec<Vec<u8>> = db.scan_all().unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![
            b"config".to_vec(),
            b"item_a_000000001".to_vec(),
            b"item_a_000000002".to_vec(),
            b"note_a".to_vec(),
            b"note_b".to_vec(),
        ]
    );
}

#[test]
fn scan_prefix_only_returns_matching_keys() {
    let db = Database::in_memory().unwrap();
    db.put(b"item_work_000000001", b"1").unwrap();
    db.put(b"note_home", b"h").unwrap();
    db.put(b"note_work", b"w").unwrap();
    db.put(b"notes", b"x").unwrap();

    let pairs = db.scan_prefix(b"note_").unwrap();
    assert_eq!(
        pairs,
        vec![
            (b"note_home".to_vec(), b"h".to_vec()),
            (b"note_work".to_vec(), b"w".to_vec()),
        ]
    );
}

#[test]
fn scan_prefix_handles_trailing_max_byte() {
    let db = Database::in_memory().unwrap();
    db.put(&[0x61, 0xff, 0x01], b"in").unwrap();
    db.put(&[0x62], b"out").unwrap();

    let pairs = db.scan_prefix(&[0x61, 0xff]).unwrap();
    assert_eq!(pairs, vec![(vec![0x61, 0xff, 0x01], b"in".to_vec())]);
}

#[test]
fn prefix_upper_bound_increments_last_byte() {
    assert_eq!(prefix_upper_bound(b"note_"), Some(b"note`".to_vec()));
    assert_eq!(prefix_upper_bound(&[0x61, 0xff]), Some(vec![0x62]));
    assert_eq!(prefix_upper_bound(&[0xff, 0xff]), None);
    assert_eq!(prefix_upper_bound(b""), None);
}

#[test]
fn write_batch_applies_operations_in_order() {
    let mut db = Database::in_memory().unwrap();
    db.put(b"stale", b"x").unwrap();

    let mut batch = WriteBatch::new();
    batch.put("a", "1");
    batch.put("a", "2");
    batch.delete("stale");
    assert_eq!(batch.len(), 3);
    db.write_batch(batch).unwrap();

    assert_eq!(db.get(b"a").unwrap(), Some(b"2".to_vec()));
    assert_eq!(db.get(b"stale").unwrap(), None);
}

#[test]
fn empty_write_batch_is_a_no_op() {
    let mut db = Database::in_memory().unwrap();
    db.write_batch(WriteBatch::new()).unwrap();
    assert!(db.scan_all().unwrap().is_empty());
}
