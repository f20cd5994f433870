use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use media_datastore::{DataStore, Video};
use media_fetch::FormatSpec;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    cache::JsonCache,
    dateafter::DateAfter,
    error::Error,
    filters::{
        parse_manifest, replace_titles, skip_deleted, skip_out_of_range, subset, CustomTitles,
        RankedVideo, SubsetOptions,
    },
    ident::{video_id_from_url, CollectionType},
    types::PlaylistItemResource,
    yt::{
        collection::{expand_collection, CollectionPlan, CUSTOM_PLAYLIST_ID},
        CollectionSource, MediaFetcher,
    },
};

pub mod builder;

/// Everything one archiving run needs to know.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Playlist id(s), channel id or username.
    pub youtube_id: String,
    pub format: FormatSpec,
    pub all_subtitles: bool,
    pub dateafter: DateAfter,
    /// Playlist merge threshold; `None` keeps every playlist as-is.
    pub optimize: Option<u32>,
    /// CSV manifests listing exactly which videos to archive. When present
    /// they override the playlist-derived video list.
    pub manifests: Vec<PathBuf>,
    /// Title override files (one of URLs, one of titles).
    pub custom_titles: Vec<PathBuf>,
    pub subset: SubsetOptions,
    pub max_concurrency: usize,
    pub output_dir: PathBuf,
    pub tmp_dir: Option<PathBuf>,
    pub keep_build_dir: bool,
}

impl Default for DownloadRequest {
    fn default() -> Self {
        DownloadRequest {
            youtube_id: String::new(),
            format: FormatSpec::default(),
            all_subtitles: false,
            dateafter: DateAfter::default(),
            optimize: None,
            manifests: Vec::new(),
            custom_titles: Vec::new(),
            subset: SubsetOptions::default(),
            max_concurrency: 1,
            output_dir: PathBuf::from("output"),
            tmp_dir: None,
            keep_build_dir: false,
        }
    }
}

/// A video the pipeline has selected for download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedVideo {
    pub video_id: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub size_bytes: Option<u64>,
}

impl From<PlaylistItemResource> for SelectedVideo {
    fn from(item: PlaylistItemResource) -> Self {
        SelectedVideo {
            video_id: item.content_details.video_id,
            title: item.snippet.title,
            published_at: item.snippet.published_at,
            size_bytes: None,
        }
    }
}

struct BuildDirs {
    videos_dir: PathBuf,
    channels_dir: PathBuf,
    // owning the tempdir removes the build folder when the run is done
    _build_dir: Option<tempfile::TempDir>,
}

// The core YouTube media download processor
#[derive(Debug)]
pub struct MediaDownloader<D, S, F>
where
    D: DataStore + Send + Sync + 'static,
    S: CollectionSource + Send + Sync + 'static,
    F: MediaFetcher + Send + Sync + 'static,
{
    request: DownloadRequest,
    cache_dir: PathBuf,
    store: D,
    source: S,
    fetcher: F,
}

impl<D, S, F> MediaDownloader<D, S, F>
where
    D: DataStore + Send + Sync + 'static,
    S: CollectionSource + Send + Sync + 'static,
    F: MediaFetcher + Send + Sync + 'static,
{
    /// Fetch a single video by watch URL into
    /// `<output_dir>/videos/` and return the media file path.
    pub async fn download(&self, url: &str) -> anyhow::Result<PathBuf> {
        let video_id =
            video_id_from_url(url).ok_or_else(|| Error::InvalidId(url.to_string()))?;
        let videos_dir = self.request.output_dir.join("videos");
        fs::create_dir_all(&videos_dir)?;
        let path = self
            .fetcher
            .fetch_video(&video_id, &self.request.format, &videos_dir)?;
        Ok(path)
    }

    /// Execute the archiving run end to end.
    #[tracing::instrument(skip(self), fields(youtube_id = %self.request.youtube_id))]
    pub async fn run(self) -> anyhow::Result<()> {
        // fail early on malformed input
        let collection_type = CollectionType::validate(&self.request.youtube_id)?;
        let custom_titles = if self.request.custom_titles.is_empty() {
            None
        } else {
            Some(CustomTitles::from_files(&self.request.custom_titles)?)
        };

        let cache = JsonCache::new(&self.cache_dir)?;
        let build = self.prepare_build_folder()?;

        tracing::info!("compute list of playlists");
        let plan = expand_collection(
            &self.source,
            &cache,
            collection_type,
            &self.request.youtube_id,
            self.request.optimize,
        )
        .await?;
        tracing::info!(
            count = plan.playlists.len(),
            playlists = ?plan
                .sorted_playlists()
                .iter()
                .map(|p| p.playlist_id.as_str())
                .collect::<Vec<_>>(),
            "playlists"
        );

        tracing::info!("compute list of videos");
        let mut videos = self
            .extract_videos_info(&cache, &plan, custom_titles.as_ref())
            .await?;
        if self.request.dateafter.is_unbounded() {
            tracing::info!(count = videos.len(), "videos");
        } else {
            tracing::info!(
                count = videos.len(),
                date_range_start = %self.request.dateafter.start,
                "videos in date range"
            );
        }

        if !self.request.subset.is_noop() {
            videos = self.apply_subset(videos).await?;
            tracing::info!(count = videos.len(), "videos after subset");
        }

        let video_ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        let archived = self
            .store
            .get_archived_video_ids(&video_ids)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to get archived video IDs"))
            .context("Failed to get archived video IDs")?;
        videos.retain(|v| !archived.contains(&v.video_id));
        if videos.is_empty() {
            tracing::info!("No videos to download at this time");
            return Ok(());
        }

        tracing::info!(
            count = videos.len(),
            concurrency = self.request.max_concurrency,
            format = ?self.request.format.container,
            quality = if self.request.format.low_quality { "low" } else { "high" },
            generated_subtitles = self.request.all_subtitles,
            "downloading all videos, subtitles and thumbnails"
        );
        let (succeeded, failed) = self.download_video_files(&videos, &build.videos_dir)?;
        if !failed.is_empty() {
            tracing::error!(count = failed.len(), failed = ?failed, "video(s) failed to download");
            if failed.len() >= succeeded.len() {
                tracing::error!("More than half of videos failed. exiting");
                return Err(Error::TooManyFailures {
                    failed: failed.len(),
                    succeeded: succeeded.len(),
                }
                .into());
            }
        }

        tracing::info!("retrieve channel-info for all videos (author details)");
        let succeeded_ids: Vec<&str> = succeeded.iter().map(String::as_str).collect();
        let authors = self.source.videos_authors(&succeeded_ids).await?;
        for author in authors.values() {
            let profile_path = build.channels_dir.join(format!("{}.json", author.channel_id));
            fs::write(&profile_path, serde_json::to_vec_pretty(author)?)?;
        }

        self.publish(&build, &succeeded)?;

        let records: Vec<Video> = videos
            .iter()
            .filter(|v| succeeded.contains(&v.video_id))
            .map(|v| {
                let author = authors.get(&v.video_id);
                Video {
                    video_id: v.video_id.clone(),
                    title: v.title.clone(),
                    author_id: author.map(|a| a.channel_id.clone()),
                    author_name: author.map(|a| a.channel_title.clone()),
                    filesize: v.size_bytes.map(|s| s as i64),
                    published_at: v.published_at,
                }
            })
            .collect();
        let result = self.store.bulk_insert_videos(&records).await?;
        tracing::info!(
            inserted = result.successful_inserts,
            failed = result.failed_inserts.len(),
            "updated archive ledger"
        );

        Ok(())
    }

    /// Prepare the build folder before we start downloading data.
    fn prepare_build_folder(&self) -> anyhow::Result<BuildDirs> {
        fs::create_dir_all(&self.request.output_dir)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("media-dl-");
        let build = match &self.request.tmp_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)?
            }
            None => builder.tempdir()?,
        };
        tracing::info!(build_dir = ?build.path(), "preparing build folder");

        let videos_dir = build.path().join("videos");
        let channels_dir = build.path().join("channels");
        fs::create_dir_all(&videos_dir)?;
        fs::create_dir_all(&channels_dir)?;

        let build_dir = if self.request.keep_build_dir {
            let path = build.into_path();
            tracing::info!(path = ?path, "keeping build folder");
            None
        } else {
            Some(build)
        };

        Ok(BuildDirs {
            videos_dir,
            channels_dir,
            _build_dir: build_dir,
        })
    }

    /// Process the list of videos to download, either from CSV manifests or
    /// from the playlists of the collection.
    async fn extract_videos_info(
        &self,
        cache: &JsonCache,
        plan: &CollectionPlan,
        custom_titles: Option<&CustomTitles>,
    ) -> anyhow::Result<Vec<SelectedVideo>> {
        if !self.request.manifests.is_empty() {
            tracing::debug!(count = self.request.manifests.len(), "found csv files");
            let mut videos = Vec::new();
            for file in &self.request.manifests {
                tracing::debug!(file = ?file, "processing csv file");
                let manifest = parse_manifest(file)?;
                let total_size: u64 = manifest.iter().map(|v| v.size_bytes).sum();
                tracing::debug!(total_size, "manifest total size in bytes");
                videos.extend(manifest.into_iter().map(|m| SelectedVideo {
                    video_id: m.video_id,
                    title: m.title,
                    published_at: None,
                    size_bytes: Some(m.size_bytes),
                }));
            }
            return Ok(videos);
        }

        if let Some(videos) = cache.load::<Vec<SelectedVideo>>("videos") {
            return Ok(videos);
        }

        let mut all = Vec::new();
        let mut seen = HashSet::new();
        for playlist in &plan.playlists {
            let mut items: Vec<PlaylistItemResource> =
                if playlist.playlist_id == CUSTOM_PLAYLIST_ID {
                    cache.load("playlist_custom_videos").unwrap_or_default()
                } else {
                    self.source.playlist_items(&playlist.playlist_id).await?
                };

            if let Some(custom) = custom_titles {
                replace_titles(&mut items, custom);
            }

            for item in items {
                if !skip_out_of_range(&self.request.dateafter, &item) || !skip_deleted(&item) {
                    continue;
                }
                if seen.insert(item.content_details.video_id.clone()) {
                    all.push(SelectedVideo::from(item));
                }
            }
        }
        cache.save("videos", &all)?;
        Ok(all)
    }

    /// Restrict the selection per the subset options; needs per-video stats
    /// from the API and, for a size budget, filesize probes.
    async fn apply_subset(
        &self,
        videos: Vec<SelectedVideo>,
    ) -> anyhow::Result<Vec<SelectedVideo>> {
        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        let resources = self.source.videos(&ids).await?;

        let need_sizes = self.request.subset.max_gb != 0;
        let ranked: Vec<RankedVideo> = resources
            .into_iter()
            .map(|resource| {
                let filesize = if need_sizes {
                    self.fetcher
                        .probe_filesize(&resource.id)
                        .inspect_err(
                            |e| tracing::debug!(error = ?e, video_id = %resource.id, "filesize probe failed"),
                        )
                        .ok()
                        .flatten()
                } else {
                    None
                };
                RankedVideo::new(resource, filesize)
            })
            .collect();

        let keep: HashSet<String> = subset(ranked, &self.request.subset)
            .into_iter()
            .map(|v| v.resource.id)
            .collect();
        Ok(videos
            .into_iter()
            .filter(|v| keep.contains(&v.video_id))
            .collect())
    }

    /// Download video, thumbnail and subtitles for every selected video,
    /// round-robined into at most `max_concurrency` parallel batches.
    fn download_video_files(
        &self,
        videos: &[SelectedVideo],
        videos_dir: &Path,
    ) -> anyhow::Result<(Vec<String>, Vec<String>)> {
        let nb_videos = videos.len();
        let concurrency = nb_videos.min(self.request.max_concurrency.max(1));

        // short-circuit concurrency if we have only one batch (can help debug)
        let (succeeded, failed) = if concurrency <= 1 {
            let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
            self.download_batch(&ids, videos_dir)
        } else {
            let mut batches: Vec<Vec<&str>> = vec![Vec::new(); concurrency];
            for (slot, video) in videos.iter().enumerate() {
                batches[slot % concurrency].push(video.video_id.as_str());
            }

            let results: Vec<(Vec<String>, Vec<String>)> = batches
                .par_iter()
                .map(|batch| self.download_batch(batch, videos_dir))
                .collect();

            let mut succeeded = Vec::new();
            let mut failed = Vec::new();
            for (ok, not_ok) in results {
                succeeded.extend(ok);
                failed.extend(not_ok);
            }
            (succeeded, failed)
        };

        // remove left-over files for failed downloads
        if !failed.is_empty() {
            tracing::debug!(count = failed.len(), "removing left-over files of failed videos");
            for video_id in &failed {
                let _ = fs::remove_dir_all(videos_dir.join(video_id));
            }
        }

        Ok((succeeded, failed))
    }

    /// Download video file, thumbnail and subtitles for all videos in batch.
    fn download_batch(&self, video_ids: &[&str], videos_dir: &Path) -> (Vec<String>, Vec<String>) {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for video_id in video_ids {
            if self.download_video(video_id, videos_dir)
                && self.download_thumbnail(video_id, videos_dir)
            {
                self.download_subtitles(video_id, videos_dir);
                succeeded.push(video_id.to_string());
            } else {
                failed.push(video_id.to_string());
            }
        }
        (succeeded, failed)
    }

    fn download_video(&self, video_id: &str, videos_dir: &Path) -> bool {
        match self
            .fetcher
            .fetch_video(video_id, &self.request.format, videos_dir)
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(%video_id, "Video file could not be downloaded");
                tracing::debug!(error = ?e);
                false
            }
        }
    }

    fn download_thumbnail(&self, video_id: &str, videos_dir: &Path) -> bool {
        match self.fetcher.fetch_thumbnail(video_id, videos_dir) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(%video_id, "Thumbnail could not be downloaded");
                tracing::debug!(error = ?e);
                false
            }
        }
    }

    /// Subtitle failures are logged but never fail the video.
    fn download_subtitles(&self, video_id: &str, videos_dir: &Path) {
        if let Err(e) =
            self.fetcher
                .fetch_subtitles(video_id, self.request.all_subtitles, videos_dir)
        {
            tracing::error!(%video_id, error = ?e, "Could not download subtitles");
        }
    }

    /// Move finished downloads and channel profiles out of the build folder
    /// into the output directory.
    fn publish(&self, build: &BuildDirs, succeeded: &[String]) -> anyhow::Result<()> {
        let videos_out = self.request.output_dir.join("videos");
        fs::create_dir_all(&videos_out)?;
        for video_id in succeeded {
            let from = build.videos_dir.join(video_id);
            let to = videos_out.join(video_id);
            if from.exists() {
                move_dir(&from, &to)?;
            }
        }

        let channels_out = self.request.output_dir.join("channels");
        fs::create_dir_all(&channels_out)?;
        for entry in fs::read_dir(&build.channels_dir)? {
            let entry = entry?;
            fs::copy(entry.path(), channels_out.join(entry.file_name()))?;
        }
        Ok(())
    }
}

/// Rename where possible, copy-and-remove when the build dir sits on another
/// filesystem.
fn move_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    if to.exists() {
        fs::remove_dir_all(to)?;
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            copy_dir(from, to)?;
            fs::remove_dir_all(from)
        }
    }
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
