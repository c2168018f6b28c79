use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

pub const PRIORITY_COUNT: usize = 3;

pub type Priorities = [String; PRIORITY_COUNT];

/// Day plans keyed by ISO date (`YYYY-MM-DD`). Keys are not validated.
pub type Planners = BTreeMap<String, DayPlan>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Good,
    Tired,
    Stressed,
    Sleepy,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Good,
        Mood::Tired,
        Mood::Stressed,
        Mood::Sleepy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "😊 Fericit",
            Mood::Good => "🙂 Bine",
            Mood::Tired => "😐 Obosit",
            Mood::Stressed => "😟 Stresat",
            Mood::Sleepy => "😴 Somnolent",
        }
    }

    fn word(self) -> &'static str {
        match self {
            Mood::Happy => "Fericit",
            Mood::Good => "Bine",
            Mood::Tired => "Obosit",
            Mood::Stressed => "Stresat",
            Mood::Sleepy => "Somnolent",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mood| mood.label() == label)
    }

    /// Accepts the full label or just its word, ignoring ASCII case.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        Self::ALL.into_iter().find(|mood| {
            mood.label() == trimmed || mood.word().eq_ignore_ascii_case(trimmed)
        })
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mood stored as its label, with the empty string meaning "not chosen".
mod mood_label {
    use super::Mood;
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn serialize<S: Serializer>(mood: &Option<Mood>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(mood.map(Mood::label).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Mood>, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if label.is_empty() {
            return Ok(None);
        }
        let mood = Mood::from_label(&label);
        if mood.is_none() {
            warn!(mood = %label, "unrecognized mood label, treating as unset");
        }
        Ok(mood)
    }
}

fn deserialize_priorities<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priorities, D::Error> {
    let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
    if raw.len() != PRIORITY_COUNT {
        warn!(count = raw.len(), "normalizing priorities to {PRIORITY_COUNT} entries");
    }
    let mut priorities = Priorities::default();
    for (slot, text) in raw.into_iter().take(PRIORITY_COUNT).enumerate() {
        priorities[slot] = text;
    }
    Ok(priorities)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl Todo {
    /// Returns `None` when `text` is blank.
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            done: false,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default, deserialize_with = "deserialize_priorities")]
    pub priorities: Priorities,
    #[serde(default)]
    pub notes: String,
    #[serde(default, with = "mood_label")]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl DayPlan {
    /// Overwrites priorities, notes and mood. Todos are left alone.
    pub fn apply_editable(&mut self, fields: &EditableFields) {
        self.priorities = fields.priorities.clone();
        self.notes = fields.notes.clone();
        self.mood = fields.mood;
    }

    pub fn toggle_todo(&mut self, index: usize) -> bool {
        match self.todos.get_mut(index) {
            Some(todo) => {
                todo.done = !todo.done;
                true
            }
            None => false,
        }
    }

    pub fn remove_todo(&mut self, index: usize) -> Option<Todo> {
        (index < self.todos.len()).then(|| self.todos.remove(index))
    }
}

/// Unsaved priorities, notes and mood shown for the selected day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableFields {
    #[serde(default, deserialize_with = "deserialize_priorities")]
    pub priorities: Priorities,
    #[serde(default)]
    pub notes: String,
    #[serde(default, with = "mood_label")]
    pub mood: Option<Mood>,
}

impl EditableFields {
    pub fn from_plan(plan: &DayPlan) -> Self {
        Self {
            priorities: plan.priorities.clone(),
            notes: plan.notes.clone(),
            mood: plan.mood,
        }
    }

    pub fn set_priority(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.priorities.get_mut(index) {
            Some(priority) => {
                *priority = text.into();
                true
            }
            None => false,
        }
    }
}

/// Projects the stored plan for `selected_day` onto the editable fields,
/// falling back to blanks for a day that was never saved.
pub fn derive_editable_fields(planners: &Planners, selected_day: &str) -> EditableFields {
    planners
        .get(selected_day)
        .map(EditableFields::from_plan)
        .unwrap_or_default()
}
