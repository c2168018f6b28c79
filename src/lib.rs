pub mod config;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod planner;
pub mod session;
pub mod state;
pub mod subjects;
pub mod timetable;
pub mod transfer;

pub use config::{PlannerConfig, StoreLocation};
pub use error::{PlannerError, PlannerResult};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteStore;
pub use persistence::{
    JsonFileStore, KeyValueStore, MemoryStore, StorageError, StorageKey, StorageResult,
};
pub use planner::{
    DayPlan, EditableFields, Mood, PRIORITY_COUNT, Planners, Todo, derive_editable_fields,
};
pub use session::PlannerSession;
pub use state::{Action, Changes, Notice, Outcome, PlannerState, apply, today_key};
pub use subjects::{DEFAULT_SUBJECTS, default_subjects};
pub use timetable::{SLOTS_PER_DAY, SchoolDay, Timetable};
pub use transfer::{EXPORT_FILE_NAME, ExportDocument, parse_import};
