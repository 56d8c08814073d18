use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::backup::{DumpReader, parse_dump};
use crate::clock::{Clock, SystemClock, truncate_to_minute};
use crate::db::{Database, KeyValue, WriteBatch};
use crate::error::{NoteError, Result};
use crate::keys::{self, CONFIG_KEY};
use crate::models::{Config, Item, ItemId, Note, NoteSummary, TagStat, parse_tags};


/// Result of a tag query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagQuery {
    /// Matching items, grouped by requested tag in request order.
    pub items: Vec<Item>,
    /// Requested tags that the current note does not have.
    pub missing: Vec<String>,
}

/// Note store over an ordered key-value database.
///
/// NoteStore owns the [`Database`] and the session state: the persisted
/// [`Config`], the list of note names, and the cached current note. Item
/// operations target the current note; every mutation rewrites the note
/// record in the same batch as the item record so the aggregates never
/// drift from the stored items.
///
/// # Examples
///
/// ```
/// use cnote::NoteStore;
///
/// # fn main() -> cnote::Result<()> {
/// let mut store = NoteStore::in_memory()?;
/// store.new_note("work")?;
///
/// let item = store.add_item("x,y", "buy milk")?;
/// assert_eq!(item.id.get(), 1);
///
/// let found = store.items_by_tag(&["x"])?;
/// assert_eq!(found.items, vec![item]);
/// # Ok(())
/// # }
/// ```
pub struct NoteStore {
    db: Database,
    config: Config,
    notes: Vec<String>,
    current: Option<Note>,
    /// Items of the current note, loaded on the first pattern search.
    item_cache: Option<BTreeMap<ItemId, Item>>,
    clock: Box<dyn Clock>,
}

impl NoteStore {
    /// Opens the store at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Database::open(path)?)
    }

    /// Opens a store that lives only in memory.
    pub fn in_memory() -> Result<Self> {
        Self::new(Database::in_memory()?)
    }

    /// Wraps an open database, using the system clock.
    pub fn new(db: Database) -> Result<Self> {
        Self::with_clock(db, SystemClock)
    }

    /// Wraps an open database with a custom time source.
    ///
    /// Loads the config record and reselects the configured note. A config
    /// naming a note that no longer exists leaves nothing selected.
    pub fn with_clock(db: Database, clock: impl Clock + 'static) -> Result<Self> {
        let mut store = Self {
            db,
            config: Config::default(),
            notes: Vec::new(),
            current: None,
            item_cache: None,
            clock: Box::new(clock),
        };
        store.reload()?;
        Ok(store)
    }

    /// Rebuilds the session state from what is persisted.
    fn reload(&mut self) -> Result<()> {
        self.config = match self.read_record::<Config>(CONFIG_KEY) {
            Ok(config) => config.unwrap_or_default(),
            Err(NoteError::Encoding(e)) => {
                tracing::warn!("ignoring unreadable config record: {e}");
                Config::default()
            }
            Err(e) => return Err(e),
        };
        self.notes = self.scan_note_names()?;
        self.current = None;
        self.item_cache = None;

        let Some(selected) = self.config.current_note().map(str::to_string) else {
            return Ok(());
        };
        match self.use_note(&selected) {
            Ok(()) => Ok(()),
            Err(NoteError::NoteNotFound { .. }) => {
                tracing::warn!(note = %selected, "configured note no longer exists");
                self.config.current_note_name.clear();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn scan_note_names(&self) -> Result<Vec<String>> {
        let pairs = self.db.scan_prefix(keys::NOTE_PREFIX.as_bytes())?;
        Ok(pairs
            .iter()
            .filter_map(|(key, _)| keys::parse_note_key(key))
            .map(str::to_string)
            .collect())
    }

    /// Persists the config record and releases the database.
    pub fn close(self) -> Result<()> {
        self.save_config()
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Names of all notes in key order.
    pub fn note_names(&self) -> &[String] {
        &self.notes
    }

    /// The selected note, if any.
    pub fn current_note(&self) -> Option<&Note> {
        self.current.as_ref()
    }

    /// The selected note, or `NoCurrentNote`.
    pub fn require_current(&self) -> Result<&Note> {
        self.current.as_ref().ok_or_else(|| NoteError::NoCurrentNote {
            available: self.notes.clone(),
        })
    }

    /// Creates an empty note and selects it.
    pub fn new_note(&mut self, name: &str) -> Result<()> {
        if !keys::is_valid_note_name(name) {
            return Err(NoteError::InvalidNoteName(name.to_string()));
        }
        let key = keys::note_key(name);
        if self.db.get(key.as_bytes())?.is_some() {
            return Err(NoteError::AlreadyExists(name.to_string()));
        }

        let note = Note::new(name, self.now());
        self.db.put(key.as_bytes(), &encode(&note)?)?;
        if let Err(pos) = self.notes.binary_search_by(|n| n.as_str().cmp(name)) {
            self.notes.insert(pos, name.to_string());
        }
        tracing::info!(note = %name, "created note");

        self.select(note);
        Ok(())
    }

    /// Selects `name` as the current note.
    ///
    /// Selecting the empty name while the store has no notes clears the
    /// selection.
    pub fn use_note(&mut self, name: &str) -> Result<()> {
        if name.is_empty() && self.notes.is_empty() {
            self.config.current_note_name.clear();
            self.current = None;
            self.item_cache = None;
            return Ok(());
        }

        let note = self.load_note(name)?;
        self.select(note);
        Ok(())
    }

    fn select(&mut self, note: Note) {
        self.config.current_note_name = note.name.clone();
        self.current = Some(note);
        self.item_cache = None;
    }

    /// Reads a note record by name.
    pub fn load_note(&self, name: &str) -> Result<Note> {
        self.read_record(&keys::note_key(name))?
            .ok_or_else(|| NoteError::NoteNotFound {
                name: name.to_string(),
                available: self.notes.clone(),
            })
    }

    /// Deletes a note and every item it owns.
    ///
    /// Items are found through the tag index and through a scan of the
    /// note's item keys, so untagged items are removed too. All deletes are
    /// applied in one batch.
    pub fn delete_note(&mut self, name: &str) -> Result<()> {
        let note = self.load_note(name)?;

        let mut ids: BTreeSet<ItemId> = note.indexed_item_ids();
        let prefix = keys::item_prefix(name);
        for (key, _) in self.db.scan_prefix(prefix.as_bytes())? {
            if let Some(id) = std::str::from_utf8(&key)
                .ok()
                .and_then(|key| keys::parse_item_key(key, name))
            {
                ids.insert(id);
            }
        }

        let mut batch = WriteBatch::new();
        for id in &ids {
            batch.delete(keys::item_key(name, *id));
        }
        batch.delete(keys::note_key(name));
        self.db.write_batch(batch)?;

        self.notes.retain(|n| n != name);
        tracing::info!(note = %name, items = ids.len(), "deleted note");

        if self.current.as_ref().is_some_and(|n| n.name == name) {
            self.current = None;
            self.item_cache = None;
            self.config.current_note_name.clear();
            self.save_config()?;
        }
        Ok(())
    }

    /// Name, size and last update of every note, in key order.
    pub fn note_summaries(&self) -> Result<Vec<NoteSummary>> {
        let current = self.current.as_ref().map(|n| n.name.as_str());
        let mut summaries = Vec::with_capacity(self.notes.len());
        for name in &self.notes {
            let note = match &self.current {
                Some(n) if n.name == *name => n.clone(),
                _ => self.load_note(name)?,
            };
            summaries.push(NoteSummary {
                current: current == Some(name.as_str()),
                name: note.name,
                sum: note.sum,
                last_update: note.last_update,
            });
        }
        Ok(summaries)
    }

    /// Adds an item to the current note.
    ///
    /// `tag_string` is split on commas; empty entries are dropped. The new
    /// item gets the next id of the note.
    pub fn add_item(&mut self, tag_string: &str, content: &str) -> Result<Item> {
        let now = self.now();
        let mut note = self.require_current()?.clone();

        let item = Item::new(note.next_item_id(), parse_tags(tag_string), content);
        note.record_added(&item, now);

        let mut batch = WriteBatch::new();
        batch.put(keys::item_key(&note.name, item.id), encode(&item)?);
        batch.put(keys::note_key(&note.name), encode(&note)?);
        self.db.write_batch(batch)?;
        tracing::debug!(note = %note.name, item = %item.id, "added item");

        // Search only sees items reachable through the tag index.
        if !item.tags.is_empty() {
            if let Some(cache) = self.item_cache.as_mut() {
                cache.insert(item.id, item.clone());
            }
        }
        self.current = Some(note);
        Ok(item)
    }

    /// Reads item `id` of note `note`.
    pub fn read_item(&self, note: &str, id: ItemId) -> Result<Item> {
        self.read_record(&keys::item_key(note, id))?
            .ok_or_else(|| NoteError::ItemNotFound {
                note: note.to_string(),
                id,
            })
    }

    /// Removes item `id` from note `note` and returns it.
    pub fn remove_item(&mut self, note: &str, id: ItemId) -> Result<Item> {
        let is_current = self.current.as_ref().is_some_and(|n| n.name == note);
        let mut target = match self.current.as_ref() {
            Some(current) if is_current => current.clone(),
            _ => self.load_note(note)?,
        };
        let item = self.read_item(note, id)?;
        target.record_removed(&item, self.now());

        let mut batch = WriteBatch::new();
        batch.delete(keys::item_key(note, id));
        batch.put(keys::note_key(note), encode(&target)?);
        self.db.write_batch(batch)?;
        tracing::debug!(note = %note, item = %id, "removed item");

        if is_current {
            if let Some(cache) = self.item_cache.as_mut() {
                cache.remove(&id);
            }
            self.current = Some(target);
        }
        Ok(item)
    }

    /// Items of the current note carrying each of `tags`.
    ///
    /// Unknown tags are skipped and listed in [`TagQuery::missing`]. An item
    /// carrying two requested tags appears once per tag.
    pub fn items_by_tag<S: AsRef<str>>(&self, tags: &[S]) -> Result<TagQuery> {
        let note = self.require_current()?;
        let mut query = TagQuery::default();

        for tag in tags {
            let tag = tag.as_ref();
            let Some(ids) = note.items_with_tag(tag) else {
                tracing::warn!(note = %note.name, tag = %tag, "tag does not exist");
                query.missing.push(tag.to_string());
                continue;
            };
            for id in ids {
                query.items.push(self.read_item(&note.name, id)?);
            }
        }
        Ok(query)
    }

    /// Items of the current note whose content matches each regex pattern.
    ///
    /// Results are grouped by pattern in request order, each group in
    /// ascending id order.
    pub fn items_by_pattern<S: AsRef<str>>(&mut self, patterns: &[S]) -> Result<Vec<Item>> {
        self.require_current()?;
        let regexes = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| NoteError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let cache = self.loaded_items()?;
        let mut items = Vec::new();
        for re in &regexes {
            items.extend(cache.values().filter(|item| re.is_match(&item.content)).cloned());
        }
        Ok(items)
    }

    fn loaded_items(&mut self) -> Result<&BTreeMap<ItemId, Item>> {
        if self.item_cache.is_none() {
            let note = self.require_current()?;
            let mut cache = BTreeMap::new();
            for id in note.indexed_item_ids() {
                cache.insert(id, self.read_item(&note.name, id)?);
            }
            tracing::debug!(note = %note.name, items = cache.len(), "loaded items for search");
            self.item_cache = Some(cache);
        }
        let cache: &BTreeMap<ItemId, Item> = self.item_cache.get_or_insert_with(BTreeMap::new);
        Ok(cache)
    }

    /// Tags of the current note with item counts, most used first.
    pub fn tag_stats(&self) -> Result<Vec<TagStat>> {
        Ok(self.require_current()?.tag_stats())
    }

    /// Every stored pair in key order.
    pub fn dump(&self) -> Result<Vec<KeyValue>> {
        self.db.scan_all()
    }

    /// Deletes every note and its items.
    pub fn wipe(&mut self) -> Result<()> {
        for name in self.notes.clone() {
            self.delete_note(&name)?;
        }
        tracing::info!("wiped all notes");
        Ok(())
    }

    /// Replaces the store contents with a dump.
    ///
    /// The dump is parsed completely before anything is touched; a
    /// malformed line aborts with [`NoteError::MalformedDump`]. Pairs are
    /// written verbatim and the session is then reloaded from them.
    pub fn restore<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let entries = parse_dump(reader)?;
        self.wipe()?;

        let count = entries.len();
        let mut batch = WriteBatch::new();
        for entry in entries {
            batch.put(entry.key, entry.value);
        }
        self.db.write_batch(batch)?;
        self.reload()?;
        tracing::info!(pairs = count, "restored dump");
        Ok(count)
    }

    /// Re-adds the items of note `source` found in a dump into `target`.
    ///
    /// `target` becomes the current note. Items get fresh ids; tags and
    /// content are kept. Returns the number of imported items.
    pub fn import<R: BufRead>(&mut self, target: &str, source: &str, reader: R) -> Result<usize> {
        self.use_note(target)?;

        let mut count = 0;
        for entry in DumpReader::new(reader) {
            let entry = entry?;
            if keys::parse_item_key(&entry.key, source).is_none() {
                continue;
            }
            let item: Item = serde_json::from_str(&entry.value)?;
            self.add_item(&item.tag_string(), &item.content)?;
            count += 1;
        }
        tracing::info!(note = %target, from = %source, items = count, "imported items");
        Ok(count)
    }

    fn save_config(&self) -> Result<()> {
        self.db.put(CONFIG_KEY.as_bytes(), &encode(&self.config)?)
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn now(&self) -> OffsetDateTime {
        truncate_to_minute(self.clock.now())
    }
}

fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}
