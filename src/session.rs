use std::path::Path;
use tracing::{error, info};

use crate::error::PlannerResult;
use crate::persistence::{self, KeyValueStore, StorageResult};
use crate::planner::Mood;
use crate::state::{self, Action, Changes, Outcome, PlannerState};
use crate::transfer;

/// A planner bound to its backing store. Every successful action is
/// committed before `dispatch` returns.
pub struct PlannerSession {
    state: PlannerState,
    store: Box<dyn KeyValueStore>,
}

impl PlannerSession {
    pub fn open(store: Box<dyn KeyValueStore>) -> StorageResult<Self> {
        Self::open_at(store, &state::today_key())
    }

    /// Like [`PlannerSession::open`], with `today` used as the selected day
    /// when the store has none.
    pub fn open_at(store: Box<dyn KeyValueStore>, today: &str) -> StorageResult<Self> {
        let state = persistence::load_state(store.as_ref(), today)?;
        // Mirror the loaded (or defaulted) entities back so the store always holds all four.
        persistence::commit(store.as_ref(), &state, Changes::all())?;
        info!(
            selected_day = %state.selected_day(),
            days = state.planners().len(),
            "planner session opened"
        );
        Ok(Self { state, store })
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) -> PlannerResult<Outcome> {
        let outcome = state::apply(&mut self.state, action)?;
        if let Err(err) = persistence::commit(self.store.as_ref(), &self.state, outcome.changes) {
            error!(error = %err, "failed to persist planner state");
            return Err(err.into());
        }
        Ok(outcome)
    }

    pub fn set_lesson(&mut self, day: &str, slot: usize, text: &str) -> PlannerResult<Outcome> {
        self.dispatch(Action::SetLesson {
            day: day.to_string(),
            slot,
            text: text.to_string(),
        })
    }

    pub fn add_subject(&mut self, label: &str) -> PlannerResult<Outcome> {
        self.dispatch(Action::AddSubject(label.to_string()))
    }

    pub fn select_day(&mut self, day: &str) -> PlannerResult<Outcome> {
        self.dispatch(Action::SelectDay(day.to_string()))
    }

    pub fn edit_priority(&mut self, index: usize, text: &str) -> PlannerResult<Outcome> {
        self.dispatch(Action::EditPriority {
            index,
            text: text.to_string(),
        })
    }

    pub fn edit_notes(&mut self, notes: &str) -> PlannerResult<Outcome> {
        self.dispatch(Action::EditNotes(notes.to_string()))
    }

    pub fn set_mood(&mut self, mood: Option<Mood>) -> PlannerResult<Outcome> {
        self.dispatch(Action::SetMood(mood))
    }

    pub fn clear_editable(&mut self) -> PlannerResult<Outcome> {
        self.dispatch(Action::ClearEditable)
    }

    pub fn save_planner(&mut self) -> PlannerResult<Outcome> {
        self.dispatch(Action::SavePlanner)
    }

    pub fn add_todo(&mut self, text: &str) -> PlannerResult<Outcome> {
        self.dispatch(Action::AddTodo(text.to_string()))
    }

    pub fn toggle_todo(&mut self, index: usize) -> PlannerResult<Outcome> {
        self.dispatch(Action::ToggleTodo(index))
    }

    pub fn remove_todo(&mut self, index: usize) -> PlannerResult<Outcome> {
        self.dispatch(Action::RemoveTodo(index))
    }

    pub fn reset_timetable(&mut self, confirmed: bool) -> PlannerResult<Outcome> {
        self.dispatch(Action::ResetTimetable { confirmed })
    }

    pub fn autofill_example(&mut self) -> PlannerResult<Outcome> {
        self.dispatch(Action::AutofillExample)
    }

    pub fn import_state(&mut self, document: &str) -> PlannerResult<Outcome> {
        self.dispatch(Action::Import(document.to_string()))
    }

    pub fn export_state(&self) -> PlannerResult<String> {
        self.state.export_document().to_json_pretty()
    }

    pub fn export_to_path<P: AsRef<Path>>(&self, path: P) -> PlannerResult<()> {
        transfer::write_export(&self.state.export_document(), path)
    }

    pub fn import_from_path<P: AsRef<Path>>(&mut self, path: P) -> PlannerResult<Outcome> {
        let document = transfer::read_import(path)?;
        self.dispatch(Action::Import(document))
    }
}
