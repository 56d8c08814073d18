//! Error types for note store operations.

use thiserror::Error;

use crate::models::ItemId;

/// Result type alias for note store operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Errors that can occur while working with a note store.
#[derive(Debug, Error)]
pub enum NoteError {
    /// A note with this name already exists.
    #[error("note \"{0}\" already exists")]
    AlreadyExists(String),

    /// No note with this name exists.
    #[error("note \"{name}\" does not exist in {available:?}")]
    NoteNotFound {
        name: String,
        available: Vec<String>,
    },

    /// The item id is not stored under the note.
    #[error("item \"{id}\" does not exist in note \"{note}\"")]
    ItemNotFound { note: String, id: ItemId },

    /// An item-level operation was attempted with no note selected.
    #[error("no note selected from {available:?}, use \"cnote use <name>\"")]
    NoCurrentNote { available: Vec<String> },

    /// Note names must be non-empty and free of tabs and line breaks.
    #[error("invalid note name: {0:?}")]
    InvalidNoteName(String),

    /// A search pattern is not a valid regular expression.
    #[error("invalid search pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A dump line could not be parsed.
    #[error("malformed dump at line {line}: {reason}")]
    MalformedDump { line: usize, reason: &'static str },

    /// Underlying key-value engine failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A stored record could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Reading a dump or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NoteError {
    /// Returns true for failures caused by the caller's input rather than
    /// the storage engine or a corrupt record.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            NoteError::AlreadyExists(_)
                | NoteError::NoteNotFound { .. }
                | NoteError::ItemNotFound { .. }
                | NoteError::NoCurrentNote { .. }
                | NoteError::InvalidNoteName(_)
                | NoteError::InvalidPattern { .. }
                | NoteError::MalformedDump { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_lists_available_notes() {
        let err = NoteError::NoteNotFound {
            name: "home".to_string(),
            available: vec!["work".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "note \"home\" does not exist in [\"work\"]"
        );
    }

    #[test]
    fn item_not_found_message_names_note_and_id() {
        let err = NoteError::ItemNotFound {
            note: "work".to_string(),
            id: ItemId::new(7),
        };
        assert_eq!(err.to_string(), "item \"7\" does not exist in note \"work\"");
    }

    #[test]
    fn storage_and_encoding_errors_are_internal() {
        let encoding = serde_json::from_str::<u8>("x").unwrap_err();
        assert!(!NoteError::Encoding(encoding).is_user_error());
        assert!(NoteError::AlreadyExists("work".to_string()).is_user_error());
    }
}
