use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use school_planner::{
    JsonFileStore, KeyValueStore, MemoryStore, Mood, PlannerError, PlannerSession, SchoolDay,
    StorageError, StorageResult, Timetable, default_subjects,
};
use tempfile::tempdir;

const TODAY: &str = "2025-03-10";

/// Memory store that also records every key written to it.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn take_writes(&self) -> Vec<String> {
        std::mem::take(&mut *self.writes.lock().unwrap())
    }
}

impl KeyValueStore for RecordingStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.writes.lock().unwrap().push(key.to_string());
        self.inner.set(key, value)
    }
}

/// Memory store whose writes start failing once `fail_writes` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("disk full")));
        }
        self.inner.set(key, value)
    }
}

fn open_shared<S: KeyValueStore + 'static>(store: &Arc<S>) -> PlannerSession {
    PlannerSession::open_at(Box::new(store.clone()), TODAY).expect("open session")
}

#[test]
fn open_on_empty_store_writes_defaults() {
    let store = Arc::new(MemoryStore::new());
    assert!(store.is_empty().unwrap());
    let session = open_shared(&store);
    assert_eq!(store.len().unwrap(), 4);

    assert_eq!(session.state().subjects(), default_subjects().as_slice());
    assert!(session.state().timetable().is_empty());
    assert!(session.state().planners().is_empty());
    assert_eq!(session.state().selected_day(), TODAY);

    let subjects: Vec<String> =
        serde_json::from_str(&store.get("subjects").unwrap().unwrap()).unwrap();
    assert_eq!(subjects, default_subjects());
    assert_eq!(store.get("planners").unwrap().as_deref(), Some("{}"));
    assert_eq!(store.get("selectedDay").unwrap().as_deref(), Some(TODAY));
    let timetable: Timetable =
        serde_json::from_str(&store.get("timetable").unwrap().unwrap()).unwrap();
    assert!(timetable.is_empty());
}

#[test]
fn each_action_commits_only_the_keys_it_changed() {
    let store = Arc::new(RecordingStore::default());
    let mut session = open_shared(&store);
    assert_eq!(
        store.take_writes(),
        ["subjects", "timetable", "planners", "selectedDay"]
    );

    session.set_lesson("Luni", 0, "Fizică").unwrap();
    assert_eq!(store.take_writes(), ["timetable"]);

    session.edit_notes("draft").unwrap();
    session.edit_priority(0, "Test").unwrap();
    session.set_mood(Some(Mood::Tired)).unwrap();
    session.clear_editable().unwrap();
    assert!(store.take_writes().is_empty());

    session.save_planner().unwrap();
    assert_eq!(store.take_writes(), ["planners"]);

    session.add_subject("Astronomie").unwrap();
    assert_eq!(store.take_writes(), ["subjects"]);

    session.select_day("2025-03-11").unwrap();
    assert_eq!(store.take_writes(), ["selectedDay"]);

    session.toggle_todo(7).unwrap();
    session.reset_timetable(false).unwrap();
    assert!(store.take_writes().is_empty());

    session.import_state(r#"{"subjects": ["Latină"]}"#).unwrap();
    assert_eq!(store.take_writes(), ["subjects", "timetable", "planners"]);

    assert!(session.import_state("{not json").is_err());
    assert!(store.take_writes().is_empty());
}

#[test]
fn failed_write_is_reported_after_the_change_is_applied() {
    let store = Arc::new(FlakyStore::default());
    let mut session = open_shared(&store);
    store.fail_writes.store(true, Ordering::SeqCst);

    let err = session.add_subject("Astronomie").unwrap_err();
    assert!(
        matches!(err, PlannerError::Storage(StorageError::Io(_))),
        "{err:?}"
    );
    assert!(err.to_string().contains("disk full"), "{err}");
    assert_eq!(
        session.state().subjects().last().map(String::as_str),
        Some("Astronomie")
    );
    let stored: Vec<String> =
        serde_json::from_str(&store.get("subjects").unwrap().unwrap()).unwrap();
    assert_eq!(stored, default_subjects());

    // Actions that change no stored key never touch the store.
    session.edit_notes("still fine").unwrap();
    session.toggle_todo(0).unwrap();

    store.fail_writes.store(false, Ordering::SeqCst);
    session.add_todo("Retry").unwrap();
    let reopened = open_shared(&store);
    assert_eq!(reopened.state().todos()[0].text, "Retry");
}

#[test]
fn open_fails_when_the_store_rejects_writes() {
    let store = Arc::new(FlakyStore::default());
    store.fail_writes.store(true, Ordering::SeqCst);
    let result = PlannerSession::open_at(Box::new(store.clone()), TODAY);
    assert!(matches!(result, Err(StorageError::Io(_))));
}

#[test]
fn reopened_session_sees_committed_state() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut session = open_shared(&store);
        session.autofill_example().unwrap();
        session.select_day("2025-03-12").unwrap();
        session.edit_notes("Field trip").unwrap();
        session.set_mood(Some(Mood::Happy)).unwrap();
        session.save_planner().unwrap();
        session.add_todo("Sign permission slip").unwrap();
        session.edit_notes("never saved").unwrap();
    }

    let session = open_shared(&store);
    let state = session.state();
    assert_eq!(state.selected_day(), "2025-03-12");
    assert_eq!(state.timetable(), &Timetable::example());
    assert_eq!(state.editable().notes, "Field trip");
    assert_eq!(state.editable().mood, Some(Mood::Happy));
    assert_eq!(state.todos()[0].text, "Sign permission slip");
}

#[test]
fn unreadable_stored_values_fall_back_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    store.set("timetable", "{oops").unwrap();
    store.set("subjects", "42").unwrap();
    store.set("planners", "null").unwrap();
    store.set("selectedDay", "2024-12-01").unwrap();

    let session = open_shared(&store);
    assert!(session.state().timetable().is_empty());
    assert_eq!(session.state().subjects(), default_subjects().as_slice());
    assert!(session.state().planners().is_empty());
    assert_eq!(session.state().selected_day(), "2024-12-01");

    // The defaults replace the bad values in the store.
    assert!(store.get("timetable").unwrap().unwrap().starts_with("{\"Luni\""));
}

#[test]
fn stored_timetable_and_plans_are_normalized_on_load() {
    let store = Arc::new(MemoryStore::new());
    store
        .set("timetable", r#"{"Luni": ["Chimie"], "Duminica": ["Odihnă"]}"#)
        .unwrap();
    store
        .set(
            "planners",
            r#"{"2025-03-10": {"priorities": ["Only one"], "mood": "Grumpy"}}"#,
        )
        .unwrap();

    let session = open_shared(&store);
    let timetable = session.state().timetable();
    assert_eq!(timetable.lessons(SchoolDay::Monday)[0], "Chimie");
    assert!(timetable.lessons(SchoolDay::Monday)[1..].iter().all(String::is_empty));
    assert_eq!(
        session.state().editable().priorities,
        ["Only one".to_string(), String::new(), String::new()]
    );
    assert_eq!(session.state().editable().mood, None);
    assert!(session.state().todos().is_empty());
}

#[test]
fn json_file_store_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("planner-store.json");
    {
        let store = JsonFileStore::open(&path).unwrap();
        let mut session = PlannerSession::open_at(Box::new(store), TODAY).unwrap();
        session.set_lesson("Vineri", 6, "Cor").unwrap();
        session.add_todo("Buy notebook").unwrap();
    }
    assert!(path.exists());

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(store.path(), path.as_path());
    assert_eq!(store.get("selectedDay").unwrap().as_deref(), Some(TODAY));
    let session = PlannerSession::open_at(Box::new(store), "2030-01-01").unwrap();
    assert_eq!(session.state().selected_day(), TODAY);
    assert_eq!(
        session.state().timetable().lesson(SchoolDay::Friday, 6),
        Some("Cor")
    );
    assert_eq!(session.state().todos()[0].text, "Buy notebook");
}

#[test]
fn json_file_store_opens_corrupt_file_as_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("planner-store.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(store.get("subjects").unwrap(), None);
    let session = PlannerSession::open_at(Box::new(store), TODAY).unwrap();
    assert_eq!(session.state().subjects(), default_subjects().as_slice());

    let rewritten: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(rewritten["selectedDay"], TODAY);
}

#[test]
fn json_file_store_opens_missing_file_as_empty() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::open(dir.path().join("absent.json")).unwrap();
    assert_eq!(store.get("subjects").unwrap(), None);
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_store_round_trip() {
    use school_planner::SqliteStore;
    use tempfile::NamedTempFile;

    let file = NamedTempFile::new().unwrap();
    {
        let store = SqliteStore::new(file.path()).unwrap();
        let mut session = PlannerSession::open_at(Box::new(store), TODAY).unwrap();
        session.add_subject("Robotică").unwrap();
        session.edit_priority(2, "Build robot").unwrap();
        session.save_planner().unwrap();
    }

    let store = SqliteStore::new(file.path()).unwrap();
    let session = PlannerSession::open_at(Box::new(store), TODAY).unwrap();
    assert_eq!(session.state().subjects().last().map(String::as_str), Some("Robotică"));
    assert_eq!(session.state().editable().priorities[2], "Build robot");
}

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_store_overwrites_existing_key() {
    use school_planner::SqliteStore;

    let store = SqliteStore::in_memory().unwrap();
    store.set("selectedDay", "2025-01-01").unwrap();
    store.set("selectedDay", "2025-01-02").unwrap();
    assert_eq!(store.get("selectedDay").unwrap().as_deref(), Some("2025-01-02"));
    assert_eq!(store.get("planners").unwrap(), None);
}
