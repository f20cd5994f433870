use std::{
    ops::Deref,
    path::{Path, PathBuf},
};

use media_fetch::{FormatSpec, YtDlp};

use crate::yt::MediaFetcher;

pub struct YtDlpFetcher(pub YtDlp);

impl YtDlpFetcher {
    pub fn new(yt_dlp: YtDlp) -> Self {
        YtDlpFetcher(yt_dlp)
    }

    fn watch_url(video_id: &str) -> String {
        format!("{}?v={}", Self::BASE_URL, video_id)
    }
}

impl Deref for YtDlpFetcher {
    type Target = YtDlp;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl MediaFetcher for YtDlpFetcher {
    const BASE_URL: &'static str = "https://youtube.com/watch";

    fn fetch_video(
        &self,
        video_id: &str,
        spec: &FormatSpec,
        videos_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        let url = Self::watch_url(video_id);
        let output_template = videos_dir.join(video_id).join("video.%(ext)s");
        let video_path = videos_dir
            .join(video_id)
            .join(format!("video.{}", spec.container.video_ext()));

        // download video if needed
        if !video_path.exists() {
            if let Err(e) = self
                .download_video(&url, spec, &output_template)
                .inspect_err(|e| tracing::error!(error = ?e, "Failed to download video"))
            {
                anyhow::bail!("Failed to download video: {:?}", e);
            }

            if !video_path.exists() {
                anyhow::bail!(
                    "yt-dlp did not produce expected file: {}",
                    video_path.display()
                );
            }
        } else {
            tracing::debug!("Video already exists at {}", video_path.display());
        }
        Ok(video_path)
    }

    fn fetch_thumbnail(&self, video_id: &str, videos_dir: &Path) -> anyhow::Result<PathBuf> {
        let url = Self::watch_url(video_id);
        let output_template = videos_dir.join(video_id).join("video.%(ext)s");
        let thumbnail_path = videos_dir.join(video_id).join("video.webp");

        if !thumbnail_path.exists() {
            if let Err(e) = self
                .download_thumbnail(&url, &output_template)
                .inspect_err(|e| tracing::error!(error = ?e, "Failed to download thumbnail"))
            {
                anyhow::bail!("Failed to download thumbnail: {:?}", e);
            }

            if !thumbnail_path.exists() {
                anyhow::bail!(
                    "yt-dlp did not produce expected file: {}",
                    thumbnail_path.display()
                );
            }
        } else {
            tracing::debug!("Thumbnail already exists at {}", thumbnail_path.display());
        }
        Ok(thumbnail_path)
    }

    fn fetch_subtitles(
        &self,
        video_id: &str,
        all_subtitles: bool,
        videos_dir: &Path,
    ) -> anyhow::Result<()> {
        let url = Self::watch_url(video_id);
        let output_template = videos_dir.join(video_id).join("video.%(ext)s");
        self.download_subtitles(&url, all_subtitles, &output_template)?;
        Ok(())
    }

    fn probe_filesize(&self, video_id: &str) -> anyhow::Result<Option<u64>> {
        let url = Self::watch_url(video_id);
        Ok(self.0.probe_filesize(&url)?)
    }
}
