//! Layout of the reserved keys in the key-value store.
//!
//! | Key | Value |
//! |---|---|
//! | `note_<name>` | note record |
//! | `item_<note>_<id, 9 digits>` | item record |
//! | `config` | config record |

use crate::models::ItemId;

pub const NOTE_PREFIX: &str = "note_";
pub const ITEM_PREFIX: &str = "item_";
pub const CONFIG_KEY: &str = "config";

/// Width of the zero-padded id suffix of item keys.
const ITEM_ID_WIDTH: usize = 9;

/// Whether `name` can be used as a note name.
///
/// Names end up inside keys, and dumps separate key from value with a tab
/// and pairs with newlines, so neither may appear in a name.
pub fn is_valid_note_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['\t', '\n', '\r'])
}

/// Key of the note record named `name`.
pub fn note_key(name: &str) -> String {
    format!("{NOTE_PREFIX}{name}")
}

/// Key of item `id` in note `note`.
///
/// # Examples
///
/// ```
/// use cnote::{ItemId, keys};
///
/// assert_eq!(keys::item_key("work", ItemId::new(12)), "item_work_000000012");
/// ```
pub fn item_key(note: &str, id: ItemId) -> String {
    format!("{}{:0width$}", item_prefix(note), id.get(), width = ITEM_ID_WIDTH)
}

/// Prefix shared by every item key of note `note`.
pub fn item_prefix(note: &str) -> String {
    format!("{ITEM_PREFIX}{note}_")
}

/// Note name from a note key, or `None` for any other key.
pub fn parse_note_key(key: &[u8]) -> Option<&str> {
    std::str::from_utf8(key).ok()?.strip_prefix(NOTE_PREFIX)
}

/// Item id from `key` if it is an item key of note `note`.
///
/// The suffix after the note prefix must be all digits, so `work` does not
/// claim the items of a note named `work_old`.
pub fn parse_item_key(key: &str, note: &str) -> Option<ItemId> {
    let suffix = key
        .strip_prefix(ITEM_PREFIX)?
        .strip_prefix(note)?
        .strip_prefix('_')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_keys_sort_by_numeric_id() {
        let a = item_key("n", ItemId::new(9));
        let b = item_key("n", ItemId::new(10));
        assert!(a < b);
        assert_eq!(b, "item_n_000000010");
    }

    #[test]
    fn note_key_round_trips() {
        let key = note_key("my note");
        assert_eq!(parse_note_key(key.as_bytes()), Some("my note"));
        assert_eq!(parse_note_key(b"config"), None);
    }

    #[test]
    fn parse_item_key_requires_exact_note() {
        let key = item_key("work_old", ItemId::new(3));
        assert_eq!(parse_item_key(&key, "work_old"), Some(ItemId::new(3)));
        assert_eq!(parse_item_key(&key, "work"), None);
        assert_eq!(parse_item_key("item_workshop_000000001", "work"), None);
        assert_eq!(parse_item_key("note_work", "work"), None);
        assert_eq!(parse_item_key("item_work_", "work"), None);
    }

    #[test]
    fn note_names_exclude_dump_separators() {
        assert!(is_valid_note_name("my note"));
        assert!(!is_valid_note_name(""));
        assert!(!is_valid_note_name("a\tb"));
        assert!(!is_valid_note_name("a\nb"));
        assert!(!is_valid_note_name("a\r"));
    }
}
