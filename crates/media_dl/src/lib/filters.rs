//! Video selection: dropping deleted/out-of-range items, title overrides,
//! CSV manifests and subset capping.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;

use crate::{
    dateafter::DateAfter,
    error::Error,
    ident::video_id_from_url,
    types::{PlaylistItemResource, VideoResource},
};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Filter func to filter-out deleted, unavailable or private videos.
pub fn skip_deleted(item: &PlaylistItemResource) -> bool {
    item.snippet.title != "Deleted video"
        && item.snippet.description != "This video is unavailable."
        && item
            .status
            .as_ref()
            .is_none_or(|s| s.privacy_status != "private")
}

/// Filter func to filter-out videos that are not within the date range.
/// Items without a published date stay in.
pub fn skip_out_of_range(range: &DateAfter, item: &PlaylistItemResource) -> bool {
    item.snippet
        .published_at
        .is_none_or(|published| range.contains(published.date_naive()))
}

/// Title overrides loaded from a pair of files: one of watch URLs, one of
/// replacement titles, matched pairwise in order.
#[derive(Debug, Clone)]
pub struct CustomTitles {
    pub ids: Vec<String>,
    pub titles: Vec<String>,
}

impl CustomTitles {
    pub fn from_files(paths: &[PathBuf]) -> Result<Self, Error> {
        tracing::debug!(count = paths.len(), "found custom titles files");
        match paths.len() {
            0 => return Err(Error::CustomTitles("no custom titles files found".into())),
            1 => {
                return Err(Error::CustomTitles(
                    "only one custom titles file found (need one for titles and one for ids)"
                        .into(),
                ))
            }
            2 => {}
            _ => {
                return Err(Error::CustomTitles(
                    "too many custom titles files found (need one for titles and one for ids)"
                        .into(),
                ))
            }
        }

        let mut ids = Vec::new();
        let mut titles = Vec::new();
        for path in paths {
            for line in fs::read_to_string(path)?.lines() {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                if line.starts_with("https://") {
                    let id = video_id_from_url(line).ok_or_else(|| {
                        Error::CustomTitles(format!("could not extract a video id from {line}"))
                    })?;
                    tracing::debug!(video_id = %id, "found video id");
                    ids.push(id);
                } else {
                    tracing::debug!(title = %line, "found title");
                    titles.push(line.to_string());
                }
            }
        }

        if titles.len() != ids.len() {
            return Err(Error::CustomTitles(format!(
                "number of titles ({}) and ids ({}) do not match",
                titles.len(),
                ids.len()
            )));
        }
        if ids.len() != ids.iter().collect::<HashSet<_>>().len() {
            tracing::error!(ids = ?ids, "duplicate ids found in custom titles files");
        }

        Ok(CustomTitles { ids, titles })
    }
}

/// Replaces item titles in place. For each item the id list is scanned
/// forward from the last match; ids skipped over on the way are consumed
/// and never matched again.
pub fn replace_titles(items: &mut [PlaylistItemResource], custom: &CustomTitles) {
    let mut v_index = 0;
    for item in items.iter_mut() {
        if v_index >= custom.ids.len() {
            tracing::debug!("no more titles to replace");
            break;
        }
        if let Some(offset) = custom.ids[v_index..]
            .iter()
            .position(|id| *id == item.content_details.video_id)
        {
            let found = v_index + offset;
            tracing::info!(
                old = %item.snippet.title,
                new = %custom.titles[found],
                "replacing title"
            );
            item.snippet.title = custom.titles[found].clone();
            v_index = found + 1;
        }
    }
}

/// One row of a CSV manifest of videos to archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestVideo {
    pub video_id: String,
    pub title: String,
    pub size_bytes: u64,
}

/// Parses a manifest of `video_id,title,..,..,..,human_size` rows, with or
/// without a header line.
pub fn parse_manifest(path: &Path) -> Result<Vec<ManifestVideo>, Error> {
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines().peekable();

    if lines
        .peek()
        .is_some_and(|first| first.contains("video_id"))
    {
        tracing::debug!(path = ?path, "manifest has a header");
        lines.next();
    } else {
        tracing::debug!(path = ?path, "manifest does not have a header");
    }

    let mut videos = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 6 {
            return Err(Error::Parse("manifest row has fewer than 6 fields"));
        }
        let video_id = fields[0].replace(WATCH_URL_PREFIX, "");
        let size = fields[5].trim();
        let size_bytes = if size.is_empty() {
            0
        } else {
            parse_human_size(size)?
        };
        videos.push(ManifestVideo {
            video_id,
            title: fields[1].to_string(),
            size_bytes,
        });
    }
    Ok(videos)
}

/// `1.5K` / `20M` / `3G` style sizes to bytes.
pub fn parse_human_size(size: &str) -> Result<u64, Error> {
    let size = size.trim();
    if size == "0" {
        return Ok(0);
    }
    let (number, multiplier) = match size.as_bytes().last() {
        Some(b'K') => (&size[..size.len() - 1], 1024f64),
        Some(b'M') => (&size[..size.len() - 1], 1024f64 * 1024.0),
        Some(b'G') => (&size[..size.len() - 1], 1024f64 * 1024.0 * 1024.0),
        _ => return Err(Error::InvalidSizeFormat(size.to_string())),
    };
    number
        .trim()
        .parse::<f64>()
        .map(|n| (n * multiplier) as u64)
        .map_err(|_| Error::InvalidSizeFormat(size.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsetBy {
    Views,
    Recent,
    ViewsPerYear,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubsetOptions {
    pub by: Option<SubsetBy>,
    /// Keep at most this many videos; 0 means no count cap.
    pub max_videos: usize,
    /// Keep videos up to this cumulative size; 0 means no size cap.
    pub max_gb: u64,
}

impl SubsetOptions {
    pub fn is_noop(&self) -> bool {
        self.by.is_none() && self.max_videos == 0 && self.max_gb == 0
    }
}

/// A video together with the derived stats the subset ordering needs.
#[derive(Debug, Clone)]
pub struct RankedVideo {
    pub resource: VideoResource,
    pub views_per_year: u64,
    pub filesize: u64,
}

impl RankedVideo {
    pub fn new(resource: VideoResource, filesize: Option<u64>) -> Self {
        let views_per_year = resource.views_per_year();
        RankedVideo {
            resource,
            views_per_year,
            filesize: filesize.unwrap_or(0),
        }
    }
}

/// Orders videos per `by`, then applies the count cap and the cumulative
/// size cap, in that order.
pub fn subset(videos: Vec<RankedVideo>, options: &SubsetOptions) -> Vec<RankedVideo> {
    let mut videos = match options.by {
        Some(SubsetBy::Views) => videos
            .into_iter()
            .sorted_by_key(|v| std::cmp::Reverse(v.resource.views()))
            .collect(),
        Some(SubsetBy::Recent) => videos
            .into_iter()
            .sorted_by_key(|v| std::cmp::Reverse(v.resource.snippet.published_at))
            .collect(),
        Some(SubsetBy::ViewsPerYear) => videos
            .into_iter()
            .sorted_by_key(|v| std::cmp::Reverse(v.views_per_year))
            .collect(),
        None => videos,
    };

    if options.max_videos != 0 && videos.len() > options.max_videos {
        videos.truncate(options.max_videos);
    }

    if options.max_gb != 0 {
        let budget = options.max_gb * 1024 * 1024 * 1024;
        // the size cap always picks the most-rewatched videos first and
        // stops at the first video that no longer fits
        videos = videos
            .into_iter()
            .sorted_by_key(|v| std::cmp::Reverse(v.views_per_year))
            .collect();
        let mut total = 0u64;
        let mut within_budget = Vec::new();
        for video in videos {
            if total + video.filesize > budget {
                break;
            }
            total += video.filesize;
            within_budget.push(video);
        }
        videos = within_budget;
    }

    videos
}
