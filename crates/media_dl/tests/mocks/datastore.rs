use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use media_datastore::{BulkInsertResult, DataStore, Video};

#[derive(Clone)]
pub struct MockDataStore {
    pub archived_ids: HashSet<String>,
    pub inserted: Arc<Mutex<Vec<Video>>>,
    pub fail_with: Option<String>,
}

impl Default for MockDataStore {
    fn default() -> Self {
        Self {
            archived_ids: HashSet::new(),
            inserted: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }
}

impl MockDataStore {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn with_archived(ids: &[&str]) -> Self {
        Self {
            archived_ids: ids.iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl DataStore for MockDataStore {
    async fn get_archived_video_ids(&self, _video_ids: &[&str]) -> anyhow::Result<HashSet<String>> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.archived_ids.clone())
    }

    async fn bulk_insert_videos(&self, videos: &[Video]) -> anyhow::Result<BulkInsertResult> {
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        self.inserted.lock().unwrap().extend(videos.iter().cloned());
        Ok(BulkInsertResult {
            successful_inserts: videos.len(),
            failed_inserts: Vec::new(),
        })
    }
}
