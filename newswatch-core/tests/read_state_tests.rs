use std::collections::HashSet;

use newswatch_core::{FileStore, KeyValueStore, ReadStateStore, VISITED_ARTICLES_KEY};

fn ids(values: &[i64]) -> HashSet<i64> {
    values.iter().copied().collect()
}

#[test]
fn saved_ids_are_loaded_by_a_fresh_store() {
    let dir = tempfile::tempdir().unwrap();

    let store = ReadStateStore::new(FileStore::new(dir.path()));
    store.save(&ids(&[1, 2, 3])).unwrap();

    let reopened = ReadStateStore::new(FileStore::new(dir.path()));
    assert_eq!(reopened.load(), ids(&[1, 2, 3]));

    let raw = std::fs::read_to_string(dir.path().join("visitedNewsArticles.json")).unwrap();
    assert_eq!(raw, "[1,2,3]");
}

#[test]
fn nothing_stored_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = ReadStateStore::new(FileStore::new(dir.path().join("not-created-yet")));
    assert!(store.load().is_empty());
}

#[test]
fn save_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("newswatch").join("state");
    let store = ReadStateStore::new(FileStore::new(&nested));

    store.save(&ids(&[42])).unwrap();
    assert!(nested.join("visitedNewsArticles.json").exists());
}

#[test]
fn corrupt_file_falls_back_to_temp_copy() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::new(dir.path());
    let path = backend.path_for(VISITED_ARTICLES_KEY);

    std::fs::write(&path, b"[1, 2, ").unwrap();
    std::fs::write(path.with_extension("json.tmp"), b"[7, 8]").unwrap();

    assert_eq!(ReadStateStore::new(backend).load(), ids(&[7, 8]));
}

#[test]
fn valid_main_file_wins_over_leftover_temp_copy() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::new(dir.path());
    let path = backend.path_for(VISITED_ARTICLES_KEY);

    std::fs::write(&path, b"[1]").unwrap();
    std::fs::write(path.with_extension("json.tmp"), b"[1, 2]").unwrap();

    assert_eq!(ReadStateStore::new(backend).load(), ids(&[1]));
}

#[test]
fn corrupt_file_without_temp_copy_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::new(dir.path());
    std::fs::write(backend.path_for(VISITED_ARTICLES_KEY), b"{ this is not json ").unwrap();

    let store = ReadStateStore::new(backend);
    assert!(store.load().is_empty());

    // the next save replaces the corrupt value
    store.save(&ids(&[5])).unwrap();
    assert_eq!(store.load(), ids(&[5]));
}

#[test]
fn wrong_shape_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::new(dir.path());
    backend
        .set(VISITED_ARTICLES_KEY, r#"{"visited": [1, 2]}"#)
        .unwrap();
    assert!(ReadStateStore::new(backend).load().is_empty());
}

#[test]
fn save_of_loaded_value_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileStore::new(dir.path());
    backend.set(VISITED_ARTICLES_KEY, "[3,9,27]").unwrap();

    let store = ReadStateStore::new(backend.clone());
    store.save(&store.load()).unwrap();
    assert_eq!(
        backend.get(VISITED_ARTICLES_KEY).unwrap().as_deref(),
        Some("[3,9,27]")
    );
}
