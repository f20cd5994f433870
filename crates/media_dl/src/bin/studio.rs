use std::{path::PathBuf, str::FromStr};

use apalis::{
    layers::{retry::RetryPolicy, sentry::SentryLayer},
    prelude::*,
};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand, ValueEnum};
use cron::Schedule;
use media_datastore::SqliteDataStore;
use media_dl::{
    ident::FileKind,
    tracing::init_tracing_subscriber,
    yt::{api::YouTubeApiClient, fetcher::YtDlpFetcher},
    DateAfter, DownloadRequest, JsonCache, MediaDownloaderBuilder, SubsetOptions,
};
use media_fetch::{Container, FormatSpec, YtDlp};

#[derive(Parser)]
#[command(name = "studio", about = "YouTube collection archiver")]
struct Cli {
    /// YouTube Data API v3 key
    #[arg(long, env = "YOUTUBE_API_KEY")]
    api_key: String,

    /// Database connection URL for the archive ledger
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://media-dl.db?mode=rwc")]
    database_url: String,

    /// Path to yt-dlp cookies file
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    cookies_path: Option<PathBuf>,

    /// Playlist id(s) (comma-separated), channel id or user name to archive
    #[arg(long)]
    youtube_id: String,

    /// Media container for downloaded videos
    #[arg(long, value_enum, default_value = "mp4")]
    format: ContainerArg,

    /// Prefer lower-quality media to save space
    #[arg(long)]
    low_quality: bool,

    /// Cap video height at this many pixels
    #[arg(long)]
    resolution: Option<u32>,

    /// Also fetch auto-generated subtitles
    #[arg(long)]
    all_subtitles: bool,

    /// Only download videos published on or after this date
    /// (YYYYMMDD, or relative like "today-2weeks")
    #[arg(long)]
    dateafter: Option<String>,

    /// Merge playlists with fewer than this many videos into one;
    /// 0 merges everything into a single playlist
    #[arg(long)]
    optimize: Option<u32>,

    /// CSV manifest of videos to download (repeatable); overrides playlists
    #[arg(long = "file")]
    files: Vec<PathBuf>,

    /// Pair of files with video URLs and replacement titles (pass twice)
    #[arg(long = "custom-title-file")]
    custom_title_files: Vec<PathBuf>,

    /// Rank videos before applying subset caps
    #[arg(long, value_enum)]
    subset_by: Option<SubsetByArg>,

    /// Keep at most this many videos (0 means no cap)
    #[arg(long, default_value = "0")]
    subset_max_videos: usize,

    /// Keep at most this many gigabytes of video (0 means no cap)
    #[arg(long, default_value = "0")]
    subset_max_gb: u64,

    /// Maximum parallel downloads
    #[arg(long, env = "MAX_CONCURRENCY", default_value = "1")]
    max_concurrency: usize,

    /// Where downloaded media and the API cache end up
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Host this run's scratch folder here instead of the system temp dir
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// Keep the scratch folder around after the run
    #[arg(long)]
    keep_build_dir: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the archiver once and exit
    Run,
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 */6 * * *")]
        schedule: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ContainerArg {
    Mp4,
    Webm,
}

impl From<ContainerArg> for Container {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Mp4 => Container::Mp4,
            ContainerArg::Webm => Container::Webm,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SubsetByArg {
    Views,
    Recent,
    ViewsPerYear,
}

impl From<SubsetByArg> for media_dl::SubsetBy {
    fn from(arg: SubsetByArg) -> Self {
        match arg {
            SubsetByArg::Views => media_dl::SubsetBy::Views,
            SubsetByArg::Recent => media_dl::SubsetBy::Recent,
            SubsetByArg::ViewsPerYear => media_dl::SubsetBy::ViewsPerYear,
        }
    }
}

#[derive(Clone)]
struct Config {
    api_key: String,
    database_url: String,
    cookies_path: Option<PathBuf>,
    request: DownloadRequest,
}

async fn run_pipeline(config: &Config) -> anyhow::Result<()> {
    let store = SqliteDataStore::init(&config.database_url).await?;
    let yt_dlp = YtDlp::new_with_cookies(config.cookies_path.clone())?;

    let cache_dir = config
        .request
        .output_dir
        .join("data")
        .join(&config.request.youtube_id)
        .join("cache");
    let api = YouTubeApiClient::new(config.api_key.as_str(), JsonCache::new(cache_dir)?);
    if !api.credentials_ok().await {
        anyhow::bail!("Invalid YouTube API key");
    }

    let downloader = MediaDownloaderBuilder::new(config.request.clone())
        .store(store)
        .source(api)
        .fetcher(YtDlpFetcher::new(yt_dlp))
        .build();

    downloader.run().await
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(
        youtube_id = %config.request.youtube_id,
        "Running scheduled archive pass..."
    );
    run_pipeline(&config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    for file in &cli.files {
        if FileKind::detect(file) != Some(FileKind::Csv) {
            anyhow::bail!("{} is not a csv manifest", file.display());
        }
    }
    for file in &cli.custom_title_files {
        if FileKind::detect(file) != Some(FileKind::Txt) {
            anyhow::bail!("{} is not a txt custom titles file", file.display());
        }
    }

    let dateafter = match &cli.dateafter {
        Some(raw) => DateAfter::from_str(raw)?,
        None => DateAfter::default(),
    };

    let request = DownloadRequest {
        youtube_id: cli.youtube_id,
        format: FormatSpec {
            container: cli.format.into(),
            low_quality: cli.low_quality,
            resolution: cli.resolution,
        },
        all_subtitles: cli.all_subtitles,
        dateafter,
        optimize: cli.optimize,
        manifests: cli.files,
        custom_titles: cli.custom_title_files,
        subset: SubsetOptions {
            by: cli.subset_by.map(Into::into),
            max_videos: cli.subset_max_videos,
            max_gb: cli.subset_max_gb,
        },
        max_concurrency: cli.max_concurrency,
        output_dir: cli.output_dir,
        tmp_dir: cli.tmp_dir,
        keep_build_dir: cli.keep_build_dir,
    };

    let config = Config {
        api_key: cli.api_key,
        database_url: cli.database_url,
        cookies_path: cli.cookies_path,
        request,
    };

    match cli.command {
        Command::Run => {
            tracing::info!(youtube_id = %config.request.youtube_id, "Running archiver once...");
            run_pipeline(&config).await?;
        }
        Command::Cron { schedule } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("media-dl-cron")
                .backend(CronStream::new(schedule))
                .retry(RetryPolicy::retries(3))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
    }

    Ok(())
}
