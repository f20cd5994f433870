use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use media_dl::yt::MediaFetcher;
use media_fetch::FormatSpec;

#[derive(Clone)]
pub struct MockFetcher {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_ids: HashSet<String>,
    pub fail_subtitles: bool,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_ids: HashSet::new(),
            fail_subtitles: false,
        }
    }
}

impl MockFetcher {
    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            fail_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl MediaFetcher for MockFetcher {
    const BASE_URL: &'static str = "https://youtube.com/watch";

    fn fetch_video(
        &self,
        video_id: &str,
        spec: &FormatSpec,
        videos_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        if self.fail_ids.contains(video_id) {
            return Err(anyhow::anyhow!("download failed for {video_id}"));
        }
        let dir = videos_dir.join(video_id);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("video.{}", spec.container.video_ext()));
        fs::write(&path, b"media")?;
        self.calls.lock().unwrap().push(video_id.to_string());
        Ok(path)
    }

    fn fetch_thumbnail(&self, video_id: &str, videos_dir: &Path) -> anyhow::Result<PathBuf> {
        let dir = videos_dir.join(video_id);
        fs::create_dir_all(&dir)?;
        let path = dir.join("video.webp");
        fs::write(&path, b"thumb")?;
        Ok(path)
    }

    fn fetch_subtitles(
        &self,
        video_id: &str,
        _all_subtitles: bool,
        _videos_dir: &Path,
    ) -> anyhow::Result<()> {
        if self.fail_subtitles {
            return Err(anyhow::anyhow!("no subtitles for {video_id}"));
        }
        Ok(())
    }

    fn probe_filesize(&self, _video_id: &str) -> anyhow::Result<Option<u64>> {
        Ok(Some(1_000_000))
    }
}
