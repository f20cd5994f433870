use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use media_dl::{
    types::{
        ChannelContentDetails, ChannelResource, ChannelSnippet, PlaylistItemContentDetails,
        PlaylistItemResource, PlaylistItemSnippet, PlaylistResource, PlaylistSnippet,
        RelatedPlaylists, VideoAuthor, VideoResource, VideoSnippet, VideoStatistics,
    },
    yt::CollectionSource,
};

pub const CHANNEL_ID: &str = "UC0123456789abcdefghijkl";
pub const CHANNEL_TITLE: &str = "Test Channel";
pub const UPLOADS_ID: &str = "UU0123456789abcdefghijkl";
pub const MUSIC_PLAYLIST_ID: &str = "PLmusic0123456789abc";

#[derive(Clone)]
pub struct MockCollectionSource {
    pub playlists: Vec<PlaylistResource>,
    pub items: HashMap<String, Vec<PlaylistItemResource>>,
    pub fail_with: Option<String>,
}

fn playlist(id: &str, title: &str) -> PlaylistResource {
    PlaylistResource {
        id: id.to_string(),
        snippet: PlaylistSnippet {
            title: title.to_string(),
            description: String::new(),
            channel_id: CHANNEL_ID.to_string(),
            channel_title: CHANNEL_TITLE.to_string(),
        },
    }
}

pub fn item(video_id: &str, title: &str) -> PlaylistItemResource {
    PlaylistItemResource {
        snippet: PlaylistItemSnippet {
            title: title.to_string(),
            description: String::new(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            position: 0,
        },
        content_details: PlaylistItemContentDetails {
            video_id: video_id.to_string(),
        },
        status: Some(media_dl::types::PlaylistItemStatus {
            privacy_status: "public".to_string(),
        }),
    }
}

impl MockCollectionSource {
    /// One channel with an uploads playlist (3 videos, one of them deleted)
    /// and a "Music" playlist overlapping on one video.
    pub fn from_fixture() -> Self {
        let mut items = HashMap::new();
        items.insert(
            UPLOADS_ID.to_string(),
            vec![
                item("video000001", "First video"),
                item("video000002", "Second video"),
                item("video000003", "Deleted video"),
            ],
        );
        items.insert(
            MUSIC_PLAYLIST_ID.to_string(),
            vec![item("video000002", "Second video")],
        );

        Self {
            playlists: vec![playlist(MUSIC_PLAYLIST_ID, "Music")],
            items,
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            playlists: Vec::new(),
            items: HashMap::new(),
            fail_with: Some(msg.to_string()),
        }
    }

    fn fail(&self) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(())
    }
}

impl CollectionSource for MockCollectionSource {
    async fn channel(&self, id: &str, _for_username: bool) -> anyhow::Result<ChannelResource> {
        self.fail()?;
        Ok(ChannelResource {
            id: id.to_string(),
            snippet: ChannelSnippet {
                title: CHANNEL_TITLE.to_string(),
                description: String::new(),
            },
            content_details: ChannelContentDetails {
                related_playlists: RelatedPlaylists {
                    uploads: UPLOADS_ID.to_string(),
                },
            },
        })
    }

    async fn channel_playlists(&self, _channel_id: &str) -> anyhow::Result<Vec<PlaylistResource>> {
        self.fail()?;
        Ok(self.playlists.clone())
    }

    async fn playlist(&self, playlist_id: &str) -> anyhow::Result<PlaylistResource> {
        self.fail()?;
        if playlist_id == UPLOADS_ID {
            return Ok(playlist(UPLOADS_ID, "Uploads"));
        }
        self.playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("{playlist_id}: Not Found"))
    }

    async fn playlist_items(&self, playlist_id: &str) -> anyhow::Result<Vec<PlaylistItemResource>> {
        self.fail()?;
        Ok(self.items.get(playlist_id).cloned().unwrap_or_default())
    }

    async fn videos(&self, video_ids: &[&str]) -> anyhow::Result<Vec<VideoResource>> {
        self.fail()?;
        Ok(video_ids
            .iter()
            .map(|id| VideoResource {
                id: id.to_string(),
                snippet: VideoSnippet {
                    title: id.to_string(),
                    channel_id: CHANNEL_ID.to_string(),
                    channel_title: CHANNEL_TITLE.to_string(),
                    published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                },
                statistics: VideoStatistics {
                    view_count: Some("100".to_string()),
                },
            })
            .collect())
    }

    async fn videos_authors(
        &self,
        video_ids: &[&str],
    ) -> anyhow::Result<HashMap<String, VideoAuthor>> {
        self.fail()?;
        Ok(video_ids
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    VideoAuthor {
                        channel_id: CHANNEL_ID.to_string(),
                        channel_title: CHANNEL_TITLE.to_string(),
                    },
                )
            })
            .collect())
    }
}
