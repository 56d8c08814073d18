mod config;
mod ids;
mod item;
mod note;
mod summary;

pub use config::Config;
pub use ids::ItemId;
pub use item::{Item, parse_tags};
pub use note::{Note, TagIndex};
pub use summary::{NoteSummary, TagStat};
