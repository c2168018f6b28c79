use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

pub const SLOTS_PER_DAY: usize = 7;

pub type LessonSlots = [String; SLOTS_PER_DAY];

/// Teaching days of the week, keyed in storage by their Romanian label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchoolDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl SchoolDay {
    pub const ALL: [SchoolDay; 5] = [
        SchoolDay::Monday,
        SchoolDay::Tuesday,
        SchoolDay::Wednesday,
        SchoolDay::Thursday,
        SchoolDay::Friday,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SchoolDay::Monday => "Luni",
            SchoolDay::Tuesday => "Marti",
            SchoolDay::Wednesday => "Miercuri",
            SchoolDay::Thursday => "Joi",
            SchoolDay::Friday => "Vineri",
        }
    }

    /// Exact match against the stored label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|day| day.label() == label)
    }

    /// Lenient match for user input: surrounding whitespace and ASCII case are ignored.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.label().eq_ignore_ascii_case(trimmed))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SchoolDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timetable {
    days: [LessonSlots; 5],
}

impl Default for Timetable {
    fn default() -> Self {
        Self::empty()
    }
}

impl Timetable {
    pub fn empty() -> Self {
        Self {
            days: std::array::from_fn(|_| std::array::from_fn(|_| String::new())),
        }
    }

    /// The hard-coded sample week offered by "fill example".
    pub fn example() -> Self {
        let rows: [[&str; SLOTS_PER_DAY]; 5] = [
            [
                "Limba română",
                "Geografie",
                "Religie",
                "Chimie",
                "Info & TIC",
                "Lb. engleză",
                "",
            ],
            [
                "Matematică",
                "Ed. tehn. / financiară",
                "Ed. plastică",
                "Limba română opţ.",
                "Lb. engleză",
                "",
                "",
            ],
            [
                "Matematică",
                "Ed. fizică",
                "Biologie",
                "Limba română",
                "Limba franceză",
                "Istorie",
                "Dirigenţie",
            ],
            [
                "Fizică",
                "Geografie",
                "Ed. muzicală",
                "Limba română",
                "Istorie",
                "Limba română",
                "",
            ],
            [
                "Chimie",
                "Limba franceză",
                "Matematică",
                "Limba română",
                "Ed. fizică",
                "",
                "",
            ],
        ];
        Self {
            days: rows.map(|row| row.map(str::to_string)),
        }
    }

    pub fn lessons(&self, day: SchoolDay) -> &LessonSlots {
        &self.days[day.index()]
    }

    pub fn lesson(&self, day: SchoolDay, slot: usize) -> Option<&str> {
        self.days[day.index()].get(slot).map(String::as_str)
    }

    /// Replaces one slot. Returns `false` when `slot` is outside the day.
    pub fn set_lesson(&mut self, day: SchoolDay, slot: usize, text: impl Into<String>) -> bool {
        match self.days[day.index()].get_mut(slot) {
            Some(current) => {
                *current = text.into();
                true
            }
            None => false,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = (SchoolDay, &LessonSlots)> {
        SchoolDay::ALL.into_iter().map(|day| (day, self.lessons(day)))
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().flatten().all(String::is_empty)
    }

    fn from_raw(raw: HashMap<String, Vec<String>>) -> Self {
        let mut timetable = Self::empty();
        let mut seen = [false; 5];
        for (label, lessons) in raw {
            let Some(day) = SchoolDay::from_label(&label) else {
                warn!(day = %label, "dropping unknown timetable day");
                continue;
            };
            if lessons.len() != SLOTS_PER_DAY {
                warn!(
                    day = %label,
                    slots = lessons.len(),
                    "normalizing timetable day to {SLOTS_PER_DAY} slots"
                );
            }
            seen[day.index()] = true;
            for (slot, lesson) in lessons.into_iter().take(SLOTS_PER_DAY).enumerate() {
                timetable.days[day.index()][slot] = lesson;
            }
        }
        for day in SchoolDay::ALL {
            if !seen[day.index()] {
                warn!(day = %day, "timetable day missing, using empty slots");
            }
        }
        timetable
    }
}

impl Serialize for Timetable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, lessons) in self.days() {
            map.serialize_entry(day.label(), lessons)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Timetable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, Vec<String>>::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}
