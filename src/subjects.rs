pub const DEFAULT_SUBJECTS: [&str; 15] = [
    "Limba română",
    "Matematică",
    "Geografie",
    "Biologie",
    "Fizică",
    "Chimie",
    "Istorie",
    "Engleză",
    "Franceză",
    "Religie",
    "Info & TIC",
    "Ed. fizică",
    "Ed. muzicală",
    "Ed. tehn. / financiară",
    "Arte",
];

pub fn default_subjects() -> Vec<String> {
    DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect()
}

/// Trimmed label, or `None` if nothing is left after trimming.
pub fn normalize_subject(label: &str) -> Option<String> {
    let trimmed = label.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
