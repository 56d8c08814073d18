use serde::{Deserialize, Serialize};

/// Persisted process-wide settings.
///
/// Stored under the `config` key. An empty name means no note is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub current_note_name: String,
}

impl Config {
    /// Name of the selected note, if any.
    pub fn current_note(&self) -> Option<&str> {
        if self.current_note_name.is_empty() {
            None
        } else {
            Some(&self.current_note_name)
        }
    }
}
