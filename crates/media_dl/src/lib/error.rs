use media_fetch::YtDlpError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid YoutubeId: {0}")]
    InvalidId(String),
    #[error(
        "Invalid dateafter input: {0}. Valid dateafter format: \
         YYYYMMDD or (now|today)[+-][0-9](day|week|month|year)(s)"
    )]
    InvalidDateAfter(String),
    #[error("Parse error: {0}")]
    Parse(&'static str),
    #[error("{0}: Not Found")]
    NotFound(String),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yt-dlp error: {0}")]
    Fetch(#[from] YtDlpError),
    #[error("{failed} video(s) failed to download against {succeeded} that succeeded")]
    TooManyFailures { failed: usize, succeeded: usize },
    #[error("custom titles: {0}")]
    CustomTitles(String),
    #[error("Unknown size format: {0}")]
    InvalidSizeFormat(String),
    #[error("optimize must be 0 or >= 3, got {0}")]
    UnsupportedOptimize(u32),
}
