use lesson_plan_core::{KvStore, RepoError, SqliteKvStore};

#[test]
fn load_returns_none_for_unknown_key() {
    let store = SqliteKvStore::open_in_memory().unwrap();
    assert_eq!(store.load("teaching-plan-v5").unwrap(), None);
}

#[test]
fn save_then_load_returns_latest_bytes() {
    let store = SqliteKvStore::open_in_memory().unwrap();

    store.save("plan", b"first").unwrap();
    store.save("plan", b"second").unwrap();

    assert_eq!(store.load("plan").unwrap().as_deref(), Some(&b"second"[..]));
    let rows: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn keys_are_trimmed_before_use() {
    let store = SqliteKvStore::open_in_memory().unwrap();

    store.save("  plan  ", b"value").unwrap();

    assert_eq!(store.load("plan").unwrap().as_deref(), Some(&b"value"[..]));
}

#[test]
fn blank_keys_are_rejected() {
    let store = SqliteKvStore::open_in_memory().unwrap();

    assert!(matches!(store.save(" ", b"x"), Err(RepoError::InvalidKey(_))));
    assert!(matches!(store.load(""), Err(RepoError::InvalidKey(_))));
}

#[test]
fn values_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans.sqlite3");

    {
        let store = SqliteKvStore::open(&path).unwrap();
        store.save("plan", &[0, 159, 146, 150]).unwrap();
    }

    let reopened = SqliteKvStore::open(&path).unwrap();
    assert_eq!(reopened.load("plan").unwrap(), Some(vec![0, 159, 146, 150]));
}
