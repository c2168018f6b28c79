use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::planner::Planners;
use crate::state::{Changes, PlannerState};
use crate::subjects::default_subjects;
use crate::timetable::Timetable;

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[derive(Debug)]
pub enum StorageError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Poisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Serialization(err) => write!(f, "serialization error: {err}"),
            StorageError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            StorageError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            StorageError::Poisoned => write!(f, "storage lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<SerdeJsonError> for StorageError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for StorageError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String-keyed, string-valued store in the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Subjects,
    Timetable,
    Planners,
    SelectedDay,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::Subjects,
        StorageKey::Timetable,
        StorageKey::Planners,
        StorageKey::SelectedDay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Subjects => "subjects",
            StorageKey::Timetable => "timetable",
            StorageKey::Planners => "planners",
            StorageKey::SelectedDay => "selectedDay",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: StorageKey,
) -> StorageResult<Option<T>> {
    let Some(raw) = store.get(key.as_str())? else {
        return Ok(None);
    };
    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(key = %key, error = %err, "stored value is unreadable, using default");
            Ok(None)
        }
    }
}

/// Reads all four entities once; anything missing or unreadable takes its default.
pub fn load_state(store: &dyn KeyValueStore, today: &str) -> StorageResult<PlannerState> {
    let subjects = read_json::<Vec<String>>(store, StorageKey::Subjects)?
        .unwrap_or_else(default_subjects);
    let timetable = read_json::<Timetable>(store, StorageKey::Timetable)?.unwrap_or_default();
    let planners = read_json::<Planners>(store, StorageKey::Planners)?.unwrap_or_default();
    let selected_day = store
        .get(StorageKey::SelectedDay.as_str())?
        .filter(|day| !day.is_empty())
        .unwrap_or_else(|| today.to_string());
    Ok(PlannerState::new(subjects, timetable, planners, selected_day))
}

fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: StorageKey,
    value: &T,
) -> StorageResult<()> {
    let json = serde_json::to_string(value)?;
    store.set(key.as_str(), &json)
}

/// Rewrites every entity named in `changes`, and nothing else.
pub fn commit(store: &dyn KeyValueStore, state: &PlannerState, changes: Changes) -> StorageResult<()> {
    for key in changes.iter() {
        match key {
            StorageKey::Subjects => write_json(store, key, state.subjects())?,
            StorageKey::Timetable => write_json(store, key, state.timetable())?,
            StorageKey::Planners => write_json(store, key, state.planners())?,
            StorageKey::SelectedDay => store.set(key.as_str(), state.selected_day())?,
        }
        debug!(key = %key, "committed");
    }
    Ok(())
}
