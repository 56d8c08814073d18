use serde::Serialize;
use time::OffsetDateTime;

/// A tag together with the number of items carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagStat {
    pub tag: String,
    pub count: usize,
}

/// One row of the note listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub name: String,
    pub sum: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_update: OffsetDateTime,
    pub current: bool,
}
