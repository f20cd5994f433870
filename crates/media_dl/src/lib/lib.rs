mod cache;
mod dateafter;
mod downloader;
mod error;
mod filters;
pub mod ident;
pub mod tracing;
pub mod types;
pub mod yt;

pub use cache::JsonCache;
pub use dateafter::DateAfter;
pub use downloader::{
    builder::MediaDownloaderBuilder, DownloadRequest, MediaDownloader, SelectedVideo,
};
pub use error::Error;
pub use filters::{
    parse_manifest, replace_titles, skip_deleted, skip_out_of_range, subset, CustomTitles,
    ManifestVideo, RankedVideo, SubsetBy, SubsetOptions,
};
