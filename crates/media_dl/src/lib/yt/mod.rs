pub mod api;
pub mod collection;
pub mod fetcher;

use std::{collections::HashMap, future::Future, path::Path, path::PathBuf};

use media_fetch::FormatSpec;

use crate::types::{
    ChannelResource, PlaylistItemResource, PlaylistResource, VideoAuthor, VideoResource,
};

/// Read access to the YouTube Data API, the seam the pipeline is tested
/// through.
pub trait CollectionSource {
    fn channel(
        &self,
        id: &str,
        for_username: bool,
    ) -> impl Future<Output = anyhow::Result<ChannelResource>> + Send;

    fn channel_playlists(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<PlaylistResource>>> + Send;

    fn playlist(
        &self,
        playlist_id: &str,
    ) -> impl Future<Output = anyhow::Result<PlaylistResource>> + Send;

    fn playlist_items(
        &self,
        playlist_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<PlaylistItemResource>>> + Send;

    fn videos(
        &self,
        video_ids: &[&str],
    ) -> impl Future<Output = anyhow::Result<Vec<VideoResource>>> + Send;

    fn videos_authors(
        &self,
        video_ids: &[&str],
    ) -> impl Future<Output = anyhow::Result<HashMap<String, VideoAuthor>>> + Send;
}

/// The external media fetcher seam. Implementations shell out to yt-dlp;
/// tests substitute a mock.
pub trait MediaFetcher {
    const BASE_URL: &'static str;

    /// Downloads the video stream into `<videos_dir>/<video_id>/` and returns
    /// the media file path.
    fn fetch_video(
        &self,
        video_id: &str,
        spec: &FormatSpec,
        videos_dir: &Path,
    ) -> anyhow::Result<PathBuf>;

    fn fetch_thumbnail(&self, video_id: &str, videos_dir: &Path) -> anyhow::Result<PathBuf>;

    fn fetch_subtitles(
        &self,
        video_id: &str,
        all_subtitles: bool,
        videos_dir: &Path,
    ) -> anyhow::Result<()>;

    fn probe_filesize(&self, video_id: &str) -> anyhow::Result<Option<u64>>;
}
