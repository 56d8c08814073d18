use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::ItemId;
use super::ids::as_string;

/// A single tagged text entry belonging to exactly one note.
///
/// Stored as `{"itemid":"1","tags":["x","y"],"content":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier within the owning note.
    #[serde(rename = "itemid", with = "as_string")]
    pub id: ItemId,
    /// Tag names in the order they were given.
    #[serde(default, deserialize_with = "nullable_tags")]
    pub tags: Vec<String>,
    /// Free-text content.
    pub content: String,
}

impl Item {
    /// Creates a new item.
    ///
    /// # Examples
    ///
    /// ```
    /// use cnote::{Item, ItemId};
    ///
    /// let item = Item::new(ItemId::new(1), vec!["x".to_string()], "buy milk");
    /// assert_eq!(item.to_string(), "item: 1\t(tags: x)\tbuy milk");
    /// ```
    pub fn new(id: ItemId, tags: Vec<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            tags,
            content: content.into(),
        }
    }

    /// Returns the tags joined back into the comma form accepted on input.
    pub fn tag_string(&self) -> String {
        self.tags.join(",")
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "item: {}\t(tags: {})\t{}",
            self.id,
            self.tags.join(", "),
            self.content
        )
    }
}

/// Older records may carry `"tags": null`.
fn nullable_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Splits a comma-separated tag string into tag names.
///
/// Entries are trimmed; empty and whitespace-only entries are discarded and
/// repeated tags keep their first position.
///
/// # Examples
///
/// ```
/// use cnote::parse_tags;
///
/// assert_eq!(parse_tags(" x, y,,x , "), vec!["x", "y"]);
/// ```
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_serializes_id_as_string() {
        let item = Item::new(ItemId::new(3), vec!["a".to_string()], "hello");
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"itemid":"3","tags":["a"],"content":"hello"}"#);
    }

    #[test]
    fn item_decodes_null_tags_as_empty() {
        let item: Item =
            serde_json::from_str(r#"{"itemid":"9","tags":null,"content":"x"}"#).unwrap();
        assert_eq!(item.id, ItemId::new(9));
        assert!(item.tags.is_empty());
    }

    #[test]
    fn item_rejects_non_numeric_id() {
        let result = serde_json::from_str::<Item>(r#"{"itemid":"abc","tags":[],"content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_tags_with_normal_input() {
        assert_eq!(parse_tags("rust,learning"), vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_with_empty_elements() {
        assert_eq!(parse_tags("rust,,learning,"), vec!["rust", "learning"]);
    }

    #[test]
    fn parse_tags_only_whitespace() {
        assert!(parse_tags("  ,  ,  ").is_empty());
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn tag_string_round_trips_through_parse_tags() {
        let item = Item::new(
            ItemId::new(1),
            vec!["x".to_string(), "y".to_string()],
            "c",
        );
        assert_eq!(parse_tags(&item.tag_string()), item.tags);
    }
}
