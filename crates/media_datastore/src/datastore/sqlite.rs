use anyhow::Context;
use sqlx::{migrate::Migrator, sqlite::SqlitePoolOptions, SqlitePool};

use crate::datastore::{BulkInsertResult, DataStore, FailedInsert, InsertFailReason};

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct SqliteDataStore {
    pub pool: SqlitePool,
}

impl SqliteDataStore {
    /// Establish connection to the database and create the videos table
    /// if not exists
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to sqlite database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(SqliteDataStore { pool })
    }
}

impl DataStore for SqliteDataStore {
    async fn get_archived_video_ids(
        &self,
        video_ids: &[&str],
    ) -> anyhow::Result<std::collections::HashSet<String>> {
        if video_ids.is_empty() {
            return Ok(Default::default());
        }

        #[derive(sqlx::FromRow)]
        struct VideoId {
            video_id: String,
        }

        // sqlite has no array bind; build the placeholder list by hand
        let placeholders = vec!["?"; video_ids.len()].join(",");
        let sql = format!("SELECT video_id FROM videos WHERE video_id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, VideoId>(&sql);
        for video_id in video_ids {
            query = query.bind(*video_id);
        }

        let videos = query
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| {
                tracing::error!(error = ?e, "Failed to fetch archived videos");
            })
            .context("Failed to fetch archived videos")?;

        Ok(videos.into_iter().map(|v| v.video_id).collect())
    }

    async fn bulk_insert_videos(&self, videos: &[crate::Video]) -> anyhow::Result<BulkInsertResult> {
        let mut result = BulkInsertResult {
            successful_inserts: 0,
            failed_inserts: Vec::new(),
        };

        for video in videos {
            let inserted = sqlx::query(
                r#"
                INSERT INTO videos (video_id, title, author_id, author_name, filesize, published_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&video.video_id)
            .bind(&video.title)
            .bind(&video.author_id)
            .bind(&video.author_name)
            .bind(video.filesize)
            .bind(video.published_at)
            .execute(&self.pool)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    error = ?err,
                    video_id = %video.video_id,
                    "Failed to insert video"
                )
            });

            match inserted {
                Ok(_) => result.successful_inserts += 1,
                Err(err) => result.failed_inserts.push(FailedInsert {
                    video_id: video.video_id.clone(),
                    reason: InsertFailReason::Database(err.to_string()),
                }),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Video;

    // :memory: gives every pooled connection its own database, so the tests
    // go through a throwaway file instead
    async fn test_store() -> (SqliteDataStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.db").display());
        let store = SqliteDataStore::init(&url)
            .await
            .expect("test database should initialize");
        (store, dir)
    }

    fn video(id: &str) -> Video {
        Video {
            video_id: id.to_string(),
            title: format!("video {id}"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_and_lookup_roundtrip() {
        let (store, _dir) = test_store().await;

        let videos = vec![video("abc123def45"), video("xyz987uvw65")];
        let result = store.bulk_insert_videos(&videos).await.unwrap();
        assert_eq!(result.successful_inserts, 2);
        assert!(result.failed_inserts.is_empty());

        let archived = store
            .get_archived_video_ids(&["abc123def45", "notinserted"])
            .await
            .unwrap();
        assert!(archived.contains("abc123def45"));
        assert!(!archived.contains("notinserted"));
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_no_op() {
        let (store, _dir) = test_store().await;

        let videos = vec![video("abc123def45")];
        store.bulk_insert_videos(&videos).await.unwrap();
        let second = store.bulk_insert_videos(&videos).await.unwrap();

        // conflict resolution swallows the duplicate without error
        assert!(second.failed_inserts.is_empty());

        let archived = store.get_archived_video_ids(&["abc123def45"]).await.unwrap();
        assert_eq!(archived.len(), 1);
    }

    #[tokio::test]
    async fn empty_lookup_short_circuits() {
        let (store, _dir) = test_store().await;
        let archived = store.get_archived_video_ids(&[]).await.unwrap();
        assert!(archived.is_empty());
    }
}
