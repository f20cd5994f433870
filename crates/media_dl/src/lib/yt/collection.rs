//! Expanding a user-supplied id into the list of playlists to archive.
//!
//! USER: we fetch the hidden channel associated with it.
//! CHANNEL (and USER): we grab all playlists plus the `uploads` playlist.
//! PLAYLIST: we resolve the comma-separated playlist id(s).

use std::collections::HashSet;

use crate::{
    cache::JsonCache,
    error::Error,
    ident::CollectionType,
    types::{Playlist, PlaylistItemResource},
    yt::CollectionSource,
};

/// Synthetic playlist id holding merged videos; its items live only in the
/// cache, under `playlist_custom_videos`.
pub const CUSTOM_PLAYLIST_ID: &str = "custom";

#[derive(Debug)]
pub struct CollectionPlan {
    pub playlists: Vec<Playlist>,
    pub main_channel_id: String,
    pub uploads_playlist_id: Option<String>,
}

impl CollectionPlan {
    /// Playlists sorted by title, with the `uploads` playlist first if any.
    pub fn sorted_playlists(&self) -> Vec<&Playlist> {
        if self.playlists.len() < 2 {
            return self.playlists.iter().collect();
        }
        let mut sorted: Vec<&Playlist> = self.playlists.iter().collect();
        sorted.sort_by(|a, b| a.title.cmp(&b.title));

        if let Some(uploads_id) = &self.uploads_playlist_id {
            if let Some(index) = sorted.iter().rposition(|p| &p.playlist_id == uploads_id) {
                let uploads = sorted.remove(index);
                sorted.insert(0, uploads);
            }
        }
        sorted
    }
}

pub async fn expand_collection<S: CollectionSource>(
    source: &S,
    cache: &JsonCache,
    collection_type: CollectionType,
    youtube_id: &str,
    optimize: Option<u32>,
) -> anyhow::Result<CollectionPlan> {
    if let Some(n @ (1 | 2)) = optimize {
        return Err(Error::UnsupportedOptimize(n).into());
    }

    let mut uploads_playlist_id = None;
    let main_channel_id;
    let mut playlists = Vec::new();
    let mut playlist_ids: Vec<String>;

    match collection_type {
        CollectionType::User | CollectionType::Channel => {
            // a username resolves to its hidden channel first
            let for_username = collection_type == CollectionType::User;
            let channel = source.channel(youtube_id, for_username).await?;
            main_channel_id = channel.id.clone();

            let channel_playlists = source.channel_playlists(&main_channel_id).await?;
            let uploads_id = channel.content_details.related_playlists.uploads.clone();

            match optimize {
                Some(limit) => {
                    let mut with_items = Vec::new();
                    for playlist in &channel_playlists {
                        let items = source.playlist_items(&playlist.id).await?;
                        with_items.push((playlist.id.clone(), items));
                    }
                    let uploads_items = source.playlist_items(&uploads_id).await?;
                    with_items.push((uploads_id.clone(), uploads_items));

                    let all_ids: Vec<String> =
                        with_items.iter().map(|(id, _)| id.clone()).collect();
                    let (kept, merged) = merge_small_playlists(with_items, limit);
                    playlist_ids = kept;
                    // cached items of merged-away playlists are stale now
                    for playlist_id in &all_ids {
                        if !playlist_ids.contains(playlist_id) {
                            cache.remove(&format!("playlist_{playlist_id}_videos"));
                        }
                    }
                    if !merged.is_empty() || limit == 0 {
                        cache.save("playlist_custom_videos", &merged)?;
                        playlists.push(custom_playlist(
                            &main_channel_id,
                            &channel.snippet.title,
                            limit,
                        ));
                        playlist_ids.push(CUSTOM_PLAYLIST_ID.to_string());
                    }
                    if playlist_ids.contains(&uploads_id) {
                        uploads_playlist_id = Some(uploads_id);
                    }
                }
                None => {
                    playlist_ids = channel_playlists.iter().map(|p| p.id.clone()).collect();
                    // we always include the uploads playlist (contains everything)
                    playlist_ids.push(uploads_id.clone());
                    uploads_playlist_id = Some(uploads_id);
                }
            }
        }
        CollectionType::Playlist => {
            playlist_ids = youtube_id.split(',').map(str::to_string).collect();
            main_channel_id = source
                .playlist(&playlist_ids[0])
                .await?
                .snippet
                .channel_id
                .clone();
        }
    }

    // dedup while keeping synthetic entries out of the lookup
    let mut seen = HashSet::new();
    for playlist_id in playlist_ids {
        if playlist_id == CUSTOM_PLAYLIST_ID || !seen.insert(playlist_id.clone()) {
            continue;
        }
        let playlist = source.playlist(&playlist_id).await?;
        playlists.push(Playlist::from(playlist));
    }

    Ok(CollectionPlan {
        playlists,
        main_channel_id,
        uploads_playlist_id,
    })
}

/// Merges playlists with fewer than `limit` videos into one synthetic
/// playlist; `limit == 0` merges everything. Returns the kept playlist ids
/// and the merged items, deduplicated by video id with positions reassigned.
pub fn merge_small_playlists(
    playlists_with_items: Vec<(String, Vec<PlaylistItemResource>)>,
    limit: u32,
) -> (Vec<String>, Vec<PlaylistItemResource>) {
    let mut kept = Vec::new();
    let mut merged = Vec::new();

    for (playlist_id, items) in playlists_with_items {
        if limit == 0 || items.len() < limit as usize {
            merged.extend(items);
        } else {
            kept.push(playlist_id);
        }
    }

    let mut seen = HashSet::new();
    let mut unique: Vec<PlaylistItemResource> = merged
        .into_iter()
        .filter(|item| seen.insert(item.content_details.video_id.clone()))
        .collect();
    for (position, item) in unique.iter_mut().enumerate() {
        item.snippet.position = position as u64;
    }

    (kept, unique)
}

fn custom_playlist(channel_id: &str, channel_title: &str, limit: u32) -> Playlist {
    let title = if limit == 0 { "All Videos" } else { "Other Videos" };
    Playlist::new(
        CUSTOM_PLAYLIST_ID,
        title,
        "Custom playlist created by user",
        channel_id,
        channel_title,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlaylistItemContentDetails, PlaylistItemSnippet};

    fn item(video_id: &str) -> PlaylistItemResource {
        PlaylistItemResource {
            snippet: PlaylistItemSnippet {
                title: video_id.to_string(),
                description: String::new(),
                published_at: None,
                position: 99,
            },
            content_details: PlaylistItemContentDetails {
                video_id: video_id.to_string(),
            },
            status: None,
        }
    }

    #[test]
    fn merge_zero_merges_everything() {
        let playlists = vec![
            ("PLaaa".to_string(), vec![item("v1"), item("v2")]),
            ("PLbbb".to_string(), vec![item("v3")]),
        ];
        let (kept, merged) = merge_small_playlists(playlists, 0);
        assert!(kept.is_empty());
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn merge_keeps_large_playlists() {
        let playlists = vec![
            ("PLbig".to_string(), vec![item("v1"), item("v2"), item("v3")]),
            ("PLsmall".to_string(), vec![item("v4")]),
        ];
        let (kept, merged) = merge_small_playlists(playlists, 3);
        assert_eq!(kept, vec!["PLbig"]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content_details.video_id, "v4");
    }

    #[test]
    fn merge_dedups_and_reassigns_positions() {
        let playlists = vec![
            ("PLaaa".to_string(), vec![item("v1"), item("v2")]),
            ("PLbbb".to_string(), vec![item("v2"), item("v3")]),
        ];
        let (_, merged) = merge_small_playlists(playlists, 0);
        let ids: Vec<&str> = merged
            .iter()
            .map(|i| i.content_details.video_id.as_str())
            .collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);
        let positions: Vec<u64> = merged.iter().map(|i| i.snippet.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn uploads_playlist_sorts_first() {
        let plan = CollectionPlan {
            playlists: vec![
                Playlist::new("PLaaa", "Alpha", "", "UC1", "c"),
                Playlist::new("UUuploads", "Zulu uploads", "", "UC1", "c"),
                Playlist::new("PLbbb", "Bravo", "", "UC1", "c"),
            ],
            main_channel_id: "UC1".into(),
            uploads_playlist_id: Some("UUuploads".into()),
        };
        let sorted = plan.sorted_playlists();
        assert_eq!(sorted[0].playlist_id, "UUuploads");
        assert_eq!(sorted[1].title, "Alpha");
        assert_eq!(sorted[2].title, "Bravo");
    }
}
