use std::{collections::HashSet, future::Future};

pub mod sqlite;

pub trait DataStore {
    fn get_archived_video_ids(
        &self,
        video_ids: &[&str],
    ) -> impl Future<Output = anyhow::Result<HashSet<String>>> + Send;

    fn bulk_insert_videos(
        &self,
        videos: &[crate::Video],
    ) -> impl Future<Output = anyhow::Result<BulkInsertResult>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn get_archived_video_ids(
        &self,
        video_ids: &[&str],
    ) -> anyhow::Result<HashSet<String>> {
        (**self).get_archived_video_ids(video_ids).await
    }

    async fn bulk_insert_videos(
        &self,
        videos: &[crate::Video],
    ) -> anyhow::Result<BulkInsertResult> {
        (**self).bulk_insert_videos(videos).await
    }
}

#[derive(Debug)]
pub struct BulkInsertResult {
    pub successful_inserts: usize,
    pub failed_inserts: Vec<FailedInsert>,
}

#[derive(Debug)]
pub struct FailedInsert {
    pub video_id: String,
    pub reason: InsertFailReason,
}

#[derive(Debug)]
pub enum InsertFailReason {
    Database(String),
}
