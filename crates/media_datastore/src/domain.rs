use chrono::{DateTime, Utc};

/// A single archived video as recorded in the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub filesize: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
}
