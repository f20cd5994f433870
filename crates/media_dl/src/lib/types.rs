//! Serde models for the subset of the YouTube Data API v3 resources this
//! crate consumes, plus the `Playlist` domain type derived from them.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// One page of a paged API listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    pub id: String,
    pub snippet: ChannelSnippet,
    pub content_details: ChannelContentDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPlaylists {
    pub uploads: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResource {
    pub id: String,
    pub snippet: PlaylistSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemResource {
    pub snippet: PlaylistItemSnippet,
    pub content_details: PlaylistItemContentDetails,
    #[serde(default)]
    pub status: Option<PlaylistItemStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemStatus {
    pub privacy_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    pub snippet: VideoSnippet,
    pub statistics: VideoStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    /// The API reports counts as strings.
    #[serde(default)]
    pub view_count: Option<String>,
}

impl VideoResource {
    pub fn views(&self) -> u64 {
        self.statistics
            .view_count
            .as_deref()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Views averaged over the full years since publication. Videos published
    /// this year rank at zero.
    pub fn views_per_year(&self) -> u64 {
        let years = (Utc::now().year() - self.snippet.published_at.year()) as u64;
        if years == 0 {
            0
        } else {
            self.views() / years + 1
        }
    }
}

/// Channel attribution for one video, kept in the `videos_channels` cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAuthor {
    pub channel_id: String,
    pub channel_title: String,
}

/// A playlist as the pipeline sees it, flattened from the API resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub playlist_id: String,
    pub title: String,
    pub description: String,
    pub creator_id: String,
    pub creator_name: String,
    pub slug: String,
}

impl Playlist {
    pub fn new(
        playlist_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        creator_id: impl Into<String>,
        creator_name: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Playlist {
            playlist_id: playlist_id.into(),
            title,
            description: description.into(),
            creator_id: creator_id.into(),
            creator_name: creator_name.into(),
            slug,
        }
    }
}

impl From<PlaylistResource> for Playlist {
    fn from(resource: PlaylistResource) -> Self {
        Playlist::new(
            resource.id,
            resource.snippet.title,
            resource.snippet.description,
            resource.snippet.channel_id,
            resource.snippet.channel_title,
        )
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}
