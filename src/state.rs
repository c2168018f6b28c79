use chrono::Utc;
use std::fmt;
use tracing::{debug, info};

use crate::error::PlannerResult;
use crate::persistence::StorageKey;
use crate::planner::{DayPlan, EditableFields, Mood, Planners, Todo, derive_editable_fields};
use crate::subjects::{default_subjects, normalize_subject};
use crate::timetable::{SchoolDay, Timetable};
use crate::transfer::{self, ExportDocument};

/// Everything the planner holds in memory. Mutated only through [`apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerState {
    subjects: Vec<String>,
    timetable: Timetable,
    planners: Planners,
    selected_day: String,
    editable: EditableFields,
}

impl Default for PlannerState {
    fn default() -> Self {
        Self::new(
            default_subjects(),
            Timetable::empty(),
            Planners::new(),
            today_key(),
        )
    }
}

impl PlannerState {
    pub fn new(
        subjects: Vec<String>,
        timetable: Timetable,
        planners: Planners,
        selected_day: impl Into<String>,
    ) -> Self {
        let selected_day = selected_day.into();
        let editable = derive_editable_fields(&planners, &selected_day);
        Self {
            subjects,
            timetable,
            planners,
            selected_day,
            editable,
        }
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn planners(&self) -> &Planners {
        &self.planners
    }

    pub fn selected_day(&self) -> &str {
        &self.selected_day
    }

    pub fn editable(&self) -> &EditableFields {
        &self.editable
    }

    /// Stored plan for the selected day, if that day was ever touched.
    pub fn current_plan(&self) -> Option<&DayPlan> {
        self.planners.get(&self.selected_day)
    }

    pub fn todos(&self) -> &[Todo] {
        self.current_plan()
            .map(|plan| plan.todos.as_slice())
            .unwrap_or_default()
    }

    pub fn export_document(&self) -> ExportDocument {
        ExportDocument {
            subjects: self.subjects.clone(),
            timetable: self.timetable.clone(),
            planners: self.planners.clone(),
        }
    }

    fn plan_mut(&mut self) -> &mut DayPlan {
        self.planners.entry(self.selected_day.clone()).or_default()
    }
}

/// Current UTC date as a planner key.
pub fn today_key() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetLesson {
        day: String,
        slot: usize,
        text: String,
    },
    AddSubject(String),
    SelectDay(String),
    EditPriority {
        index: usize,
        text: String,
    },
    EditNotes(String),
    SetMood(Option<Mood>),
    ClearEditable,
    SavePlanner,
    AddTodo(String),
    ToggleTodo(usize),
    RemoveTodo(usize),
    ResetTimetable {
        confirmed: bool,
    },
    AutofillExample,
    Import(String),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::SetLesson { .. } => "set_lesson",
            Action::AddSubject(_) => "add_subject",
            Action::SelectDay(_) => "select_day",
            Action::EditPriority { .. } => "edit_priority",
            Action::EditNotes(_) => "edit_notes",
            Action::SetMood(_) => "set_mood",
            Action::ClearEditable => "clear_editable",
            Action::SavePlanner => "save_planner",
            Action::AddTodo(_) => "add_todo",
            Action::ToggleTodo(_) => "toggle_todo",
            Action::RemoveTodo(_) => "remove_todo",
            Action::ResetTimetable { .. } => "reset_timetable",
            Action::AutofillExample => "autofill_example",
            Action::Import(_) => "import",
        }
    }
}

/// Set of persisted entities touched by one action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    keys: [bool; 4],
}

impl Changes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self { keys: [true; 4] }
    }

    pub fn of(keys: &[StorageKey]) -> Self {
        let mut changes = Self::none();
        for key in keys {
            changes.insert(*key);
        }
        changes
    }

    pub fn insert(&mut self, key: StorageKey) {
        self.keys[key.index()] = true;
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        self.keys[key.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.keys.iter().any(|changed| *changed)
    }

    pub fn iter(&self) -> impl Iterator<Item = StorageKey> + '_ {
        StorageKey::ALL.into_iter().filter(|key| self.contains(*key))
    }
}

/// Confirmation shown to the user after certain actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PlannerSaved { day: String },
    Imported,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PlannerSaved { day } => write!(f, "Planner saved for {day}"),
            Notice::Imported => write!(f, "Data imported successfully"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub changes: Changes,
    pub notice: Option<Notice>,
}

impl Outcome {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(key: StorageKey) -> Self {
        Self {
            changes: Changes::of(&[key]),
            notice: None,
        }
    }
}

/// Applies one action to `state`. Only an import can fail, and a failed
/// import leaves `state` untouched.
pub fn apply(state: &mut PlannerState, action: Action) -> PlannerResult<Outcome> {
    let name = action.name();
    let outcome = match action {
        Action::SetLesson { day, slot, text } => {
            let applied = SchoolDay::from_label(&day)
                .is_some_and(|day| state.timetable.set_lesson(day, slot, text));
            if applied {
                Outcome::changed(StorageKey::Timetable)
            } else {
                Outcome::unchanged()
            }
        }
        Action::AddSubject(label) => match normalize_subject(&label) {
            Some(subject) => {
                state.subjects.push(subject);
                Outcome::changed(StorageKey::Subjects)
            }
            None => Outcome::unchanged(),
        },
        Action::SelectDay(day) => {
            if day == state.selected_day {
                Outcome::unchanged()
            } else {
                state.editable = derive_editable_fields(&state.planners, &day);
                state.selected_day = day;
                Outcome::changed(StorageKey::SelectedDay)
            }
        }
        Action::EditPriority { index, text } => {
            state.editable.set_priority(index, text);
            Outcome::unchanged()
        }
        Action::EditNotes(notes) => {
            state.editable.notes = notes;
            Outcome::unchanged()
        }
        Action::SetMood(mood) => {
            state.editable.mood = mood;
            Outcome::unchanged()
        }
        Action::ClearEditable => {
            state.editable = EditableFields::default();
            Outcome::unchanged()
        }
        Action::SavePlanner => {
            let fields = state.editable.clone();
            state.plan_mut().apply_editable(&fields);
            info!(day = %state.selected_day, "planner saved");
            Outcome {
                changes: Changes::of(&[StorageKey::Planners]),
                notice: Some(Notice::PlannerSaved {
                    day: state.selected_day.clone(),
                }),
            }
        }
        Action::AddTodo(text) => match Todo::new(&text) {
            Some(todo) => {
                state.plan_mut().todos.push(todo);
                Outcome::changed(StorageKey::Planners)
            }
            None => Outcome::unchanged(),
        },
        Action::ToggleTodo(index) => {
            let toggled = state
                .planners
                .get_mut(&state.selected_day)
                .is_some_and(|plan| plan.toggle_todo(index));
            if toggled {
                Outcome::changed(StorageKey::Planners)
            } else {
                Outcome::unchanged()
            }
        }
        Action::RemoveTodo(index) => {
            let removed = state
                .planners
                .get_mut(&state.selected_day)
                .and_then(|plan| plan.remove_todo(index));
            match removed {
                Some(_) => Outcome::changed(StorageKey::Planners),
                None => Outcome::unchanged(),
            }
        }
        Action::ResetTimetable { confirmed } => {
            if confirmed {
                state.timetable = Timetable::empty();
                info!("timetable reset");
                Outcome::changed(StorageKey::Timetable)
            } else {
                Outcome::unchanged()
            }
        }
        Action::AutofillExample => {
            state.timetable = Timetable::example();
            Outcome::changed(StorageKey::Timetable)
        }
        Action::Import(document) => {
            let imported = transfer::parse_import(&document)?;
            state.subjects = imported.subjects;
            state.timetable = imported.timetable;
            state.planners = imported.planners;
            state.editable = derive_editable_fields(&state.planners, &state.selected_day);
            info!(
                subjects = state.subjects.len(),
                days = state.planners.len(),
                "imported planner data"
            );
            Outcome {
                changes: Changes::of(&[
                    StorageKey::Subjects,
                    StorageKey::Timetable,
                    StorageKey::Planners,
                ]),
                notice: Some(Notice::Imported),
            }
        }
    };
    debug!(action = name, changed = !outcome.changes.is_empty(), "applied");
    Ok(outcome)
}
