//! # media_fetch
//!
//! Bindings to the `yt-dlp` executable, which performs the actual network
//! retrieval, format negotiation and media extraction. Everything here shells
//! out to the binary; no downloading logic lives in this crate.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
};

#[derive(Debug, thiserror::Error)]
pub enum YtDlpError {
    #[error("yt-dlp binary not found: {0}")]
    BinaryNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yt-dlp exited with {status}: {stderr}")]
    NonZeroExit { status: i32, stderr: String },
    #[error("unexpected yt-dlp output: {0}")]
    InvalidOutput(String),
}

/// Target container for downloaded videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    #[default]
    Mp4,
    Webm,
}

impl Container {
    pub fn video_ext(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
        }
    }

    pub fn audio_ext(&self) -> &'static str {
        match self {
            Container::Mp4 => "m4a",
            Container::Webm => "webm",
        }
    }
}

/// Stream selection passed to yt-dlp via `-f`.
#[derive(Debug, Clone, Default)]
pub struct FormatSpec {
    pub container: Container,
    pub low_quality: bool,
    pub resolution: Option<u32>,
}

impl FormatSpec {
    /// Low quality without an explicit resolution caps at 480p.
    const LOW_QUALITY_HEIGHT: u32 = 480;

    pub fn selector(&self) -> String {
        let vidext = self.container.video_ext();
        let audext = self.container.audio_ext();
        let resolution = self
            .resolution
            .or(self.low_quality.then_some(Self::LOW_QUALITY_HEIGHT));
        match resolution {
            None => format!(
                "best[ext={vidext}]/bestvideo[ext={vidext}]+bestaudio[ext={audext}]/best"
            ),
            Some(res) => format!(
                "bestvideo[height<={res}][ext={vidext}]+bestaudio[ext={audext}]/best[height<={res}]"
            ),
        }
    }
}

/// Handle to the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlp {
    pub fn new() -> Result<Self, YtDlpError> {
        Self::new_with_cookies(None)
    }

    pub fn new_with_cookies(cookies: Option<PathBuf>) -> Result<Self, YtDlpError> {
        Self::with_binary("yt-dlp", cookies)
    }

    /// Use an explicit binary path. Probes the binary with `--version` so a
    /// missing executable fails at construction rather than mid-pipeline.
    pub fn with_binary(
        bin: impl Into<PathBuf>,
        cookies: Option<PathBuf>,
    ) -> Result<Self, YtDlpError> {
        let bin = bin.into();
        let probe = Command::new(&bin).arg("--version").output();
        match probe {
            Ok(out) if out.status.success() => Ok(YtDlp { bin, cookies }),
            Ok(out) => Err(YtDlpError::NonZeroExit {
                status: out.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            }),
            Err(_) => Err(YtDlpError::BinaryNotFound(bin.display().to_string())),
        }
    }

    fn run<I, S>(&self, args: I) -> Result<String, YtDlpError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.bin);
        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.args(args);

        tracing::debug!(cmd = ?cmd, "invoking yt-dlp");
        let output = cmd.output()?;
        if !output.status.success() {
            return Err(YtDlpError::NonZeroExit {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Downloads the video stream only. Thumbnails and subtitles are fetched
    /// separately so a failure in one does not discard the others.
    pub fn download_video(
        &self,
        url: &str,
        spec: &FormatSpec,
        output_template: impl AsRef<Path>,
    ) -> Result<(), YtDlpError> {
        let template = output_template.as_ref();
        self.run([
            OsStr::new("--no-playlist"),
            OsStr::new("--retries"),
            OsStr::new("20"),
            OsStr::new("--fragment-retries"),
            OsStr::new("50"),
            OsStr::new("--skip-unavailable-fragments"),
            OsStr::new("-f"),
            OsStr::new(&spec.selector()),
            OsStr::new("-o"),
            template.as_os_str(),
            OsStr::new(url),
        ])?;
        Ok(())
    }

    pub fn download_thumbnail(
        &self,
        url: &str,
        output_template: impl AsRef<Path>,
    ) -> Result<(), YtDlpError> {
        let template = output_template.as_ref();
        // some extractors serve jpg/png; convert so the output name is stable
        self.run([
            OsStr::new("--no-playlist"),
            OsStr::new("--skip-download"),
            OsStr::new("--write-thumbnail"),
            OsStr::new("--convert-thumbnails"),
            OsStr::new("webp"),
            OsStr::new("-o"),
            template.as_os_str(),
            OsStr::new(url),
        ])?;
        Ok(())
    }

    /// Fetches vtt subtitles; `lang_all` also pulls auto-generated ones.
    pub fn download_subtitles(
        &self,
        url: &str,
        lang_all: bool,
        output_template: impl AsRef<Path>,
    ) -> Result<(), YtDlpError> {
        let template = output_template.as_ref();
        let mut args = vec![
            OsStr::new("--no-playlist").to_os_string(),
            OsStr::new("--skip-download").to_os_string(),
            OsStr::new("--write-subs").to_os_string(),
            OsStr::new("--sub-format").to_os_string(),
            OsStr::new("vtt").to_os_string(),
        ];
        if lang_all {
            args.push(OsStr::new("--write-auto-subs").to_os_string());
        }
        args.push(OsStr::new("-o").to_os_string());
        args.push(template.as_os_str().to_os_string());
        args.push(OsStr::new(url).to_os_string());
        self.run(args)?;
        Ok(())
    }

    /// Approximate filesize as reported by the extractor, without downloading.
    /// Videos that report nothing resolve to `Ok(None)`.
    pub fn probe_filesize(&self, url: &str) -> Result<Option<u64>, YtDlpError> {
        let stdout = self.run([
            "--no-playlist",
            "--skip-download",
            "--print",
            "filesize_approx",
            url,
        ])?;
        let line = stdout.trim();
        if line.is_empty() || line == "NA" {
            return Ok(None);
        }
        match line.parse::<f64>() {
            Ok(size) if size >= 0.0 => Ok(Some(size as u64)),
            _ => Err(YtDlpError::InvalidOutput(line.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_without_resolution() {
        let spec = FormatSpec {
            container: Container::Mp4,
            low_quality: false,
            resolution: None,
        };
        assert_eq!(
            spec.selector(),
            "best[ext=mp4]/bestvideo[ext=mp4]+bestaudio[ext=m4a]/best"
        );
    }

    #[test]
    fn selector_with_resolution_cap() {
        let spec = FormatSpec {
            container: Container::Webm,
            low_quality: true,
            resolution: Some(480),
        };
        assert_eq!(
            spec.selector(),
            "bestvideo[height<=480][ext=webm]+bestaudio[ext=webm]/best[height<=480]"
        );
    }

    #[test]
    fn low_quality_without_resolution_caps_height() {
        let spec = FormatSpec {
            container: Container::Mp4,
            low_quality: true,
            resolution: None,
        };
        assert_eq!(
            spec.selector(),
            "bestvideo[height<=480][ext=mp4]+bestaudio[ext=m4a]/best[height<=480]"
        );
    }

    #[test]
    fn container_extensions() {
        assert_eq!(Container::Mp4.video_ext(), "mp4");
        assert_eq!(Container::Mp4.audio_ext(), "m4a");
        assert_eq!(Container::Webm.video_ext(), "webm");
        assert_eq!(Container::Webm.audio_ext(), "webm");
    }

    #[test]
    fn missing_binary_is_reported_at_construction() {
        let result = YtDlp::with_binary("/nonexistent/yt-dlp", None);
        assert!(matches!(result, Err(YtDlpError::BinaryNotFound(_))));
    }
}
