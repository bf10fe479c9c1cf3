use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One playable item, as delivered by the library service.
///
/// The engine only ever reads a `Track`; resolving `media_url` into something
/// fetchable (signed URLs, CDN paths) is the producer's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub artist: String,
    pub media_url: String,
    /// Reported length in seconds, when the uploader's metadata carried one.
    pub duration: Option<f64>,
    pub size_bytes: Option<u64>,
    pub content_type: Option<String>,
    pub play_count: Option<u64>,
    pub last_played_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
