//! Personal note store on an embedded ordered key-value database.
//!
//! Notes are named collections of tagged text items. Each note keeps a tag
//! index so items can be listed by tag without a query engine, and items can
//! be searched by regular expression. The whole store can be dumped to a
//! tab-separated text file and restored or selectively imported from one.

pub mod backup;
pub mod clock;
pub mod db;
pub mod error;
pub mod keys;
pub mod logging;
pub mod models;
pub mod store;
pub mod utils;

pub use db::{Database, WriteBatch};
pub use error::{NoteError, Result};
pub use models::{Config, Item, ItemId, Note, NoteSummary, TagIndex, TagStat, parse_tags};
pub use store::{NoteStore, TagQuery};
