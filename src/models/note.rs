use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Item, ItemId, TagStat};

/// Per-note mapping from tag name to the ids of the items carrying it.
pub type TagIndex = BTreeMap<String, BTreeSet<ItemId>>;

/// A named collection of items with its own tag index and id counter.
///
/// The note record holds only aggregates; item bodies live under their own
/// keys. Every mutation goes through [`Note::record_added`] or
/// [`Note::record_removed`] so that `sum` and the tag index stay in step
/// with the stored items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique note name.
    #[serde(rename = "noteid")]
    pub name: String,
    /// Number of live items.
    pub sum: u64,
    /// Time of the last mutation, truncated to the minute.
    #[serde(with = "time::serde::rfc3339")]
    pub last_update: OffsetDateTime,
    /// Highest id ever assigned in this note.
    pub last_id: u64,
    /// Tag name to item ids.
    #[serde(with = "tag_index_format", default)]
    pub tags: TagIndex,
}

impl Note {
    /// Creates an empty note.
    ///
    /// # Examples
    ///
    /// ```
    /// use cnote::Note;
    /// use time::macros::datetime;
    ///
    /// let note = Note::new("work", datetime!(2024-01-01 09:30 UTC));
    /// assert_eq!(note.sum, 0);
    /// assert_eq!(note.last_id, 0);
    /// assert!(note.tags.is_empty());
    /// ```
    pub fn new(name: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            name: name.into(),
            sum: 0,
            last_update: now,
            last_id: 0,
            tags: TagIndex::new(),
        }
    }

    /// Id the next added item will receive.
    pub fn next_item_id(&self) -> ItemId {
        ItemId::new(self.last_id).next()
    }

    /// Updates the aggregates for a newly stored item.
    pub fn record_added(&mut self, item: &Item, now: OffsetDateTime) {
        self.last_id = self.last_id.max(item.id.get());
        self.sum += 1;
        for tag in &item.tags {
            self.tags.entry(tag.clone()).or_default().insert(item.id);
        }
        self.last_update = now;
    }

    /// Updates the aggregates for a deleted item, dropping emptied tags.
    pub fn record_removed(&mut self, item: &Item, now: OffsetDateTime) {
        self.sum = self.sum.saturating_sub(1);
        for tag in &item.tags {
            if let Some(ids) = self.tags.get_mut(tag) {
                ids.remove(&item.id);
                if ids.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
        self.last_update = now;
    }

    /// Every item id referenced by the tag index, deduplicated and ascending.
    pub fn indexed_item_ids(&self) -> BTreeSet<ItemId> {
        self.tags.values().flatten().copied().collect()
    }

    /// Ids carrying `tag` in ascending order, or `None` for an unknown tag.
    pub fn items_with_tag(&self, tag: &str) -> Option<Vec<ItemId>> {
        self.tags.get(tag).map(|ids| ids.iter().copied().collect())
    }

    /// Tags with their item counts, most used first, ties by name.
    pub fn tag_stats(&self) -> Vec<TagStat> {
        let mut stats: Vec<TagStat> = self
            .tags
            .iter()
            .map(|(tag, ids)| TagStat {
                tag: tag.clone(),
                count: ids.len(),
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        stats
    }
}

/// Stores the tag index as `{"tag": {"1": true, "2": true}}`.
mod tag_index_format {
    use std::collections::{BTreeMap, BTreeSet};

    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{ItemId, TagIndex};

    pub fn serialize<S: Serializer>(index: &TagIndex, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(index.len()))?;
        for (tag, ids) in index {
            let set: BTreeMap<String, bool> =
                ids.iter().map(|id| (id.to_string(), true)).collect();
            map.serialize_entry(tag, &set)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TagIndex, D::Error> {
        let raw: Option<BTreeMap<String, BTreeMap<String, bool>>> =
            Option::deserialize(deserializer)?;

        let mut index = TagIndex::new();
        for (tag, ids) in raw.unwrap_or_default() {
            let ids = ids
                .into_iter()
                .filter(|(_, present)| *present)
                .map(|(id, _)| id.parse::<ItemId>().map_err(D::Error::custom))
                .collect::<Result<BTreeSet<_>, _>>()?;
            if !ids.is_empty() {
                index.insert(tag, ids);
            }
        }
        Ok(index)
    }
}
