use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{PlannerError, PlannerResult};
use crate::planner::Planners;
use crate::subjects::default_subjects;
use crate::timetable::Timetable;

pub const EXPORT_FILE_NAME: &str = "school-planner.json";

/// Backup document: everything except the selected day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub subjects: Vec<String>,
    pub timetable: Timetable,
    pub planners: Planners,
}

impl ExportDocument {
    /// Pretty JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> PlannerResult<String> {
        serde_json::to_string_pretty(self).map_err(PlannerError::Serialization)
    }
}

#[derive(Default, Deserialize)]
struct ImportDocument {
    subjects: Option<Vec<String>>,
    timetable: Option<Timetable>,
    planners: Option<Planners>,
}

/// Parses an import document. Only invalid JSON, or a field of the wrong
/// shape, is rejected. Absent or null fields fall back to the built-in
/// defaults, and a top-level value that is not an object counts as having
/// no fields at all.
pub fn parse_import(document: &str) -> PlannerResult<ExportDocument> {
    let value: Value = serde_json::from_str(document).map_err(PlannerError::MalformedImport)?;
    let parsed = if value.is_object() {
        serde_json::from_value::<ImportDocument>(value).map_err(PlannerError::MalformedImport)?
    } else {
        warn!("import document is not an object, using defaults");
        ImportDocument::default()
    };
    Ok(ExportDocument {
        subjects: parsed.subjects.unwrap_or_else(default_subjects),
        timetable: parsed.timetable.unwrap_or_default(),
        planners: parsed.planners.unwrap_or_default(),
    })
}

pub fn write_export<P: AsRef<Path>>(document: &ExportDocument, path: P) -> PlannerResult<()> {
    let json = document.to_json_pretty()?;
    fs::write(path.as_ref(), json)?;
    info!(path = %path.as_ref().display(), "exported planner data");
    Ok(())
}

pub fn read_import<P: AsRef<Path>>(path: P) -> PlannerResult<String> {
    Ok(fs::read_to_string(path)?)
}
