//! src/services/submission_store.rs
//!
//! SubmissionStore is the collaborator that receives a validated upload batch.
//! Batch and per-file metadata go to SQLite; payloads go to disk beneath
//! `base_path/{submission_id}/{file_id}`. Also serves the task history.

use crate::models::{
    metadata::MetadataMap,
    submission::{SubmissionData, SubmissionReceipt, SubmissionRecord, SubmittedFile},
    uploaded_file::UploadedFile,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use sqlx::SqlitePool;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, info};
use uuid::Uuid;

const MIGRATIONS: &str = include_str!("../../migrations/0001_init.sql");
const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("submission `{0}` not found")]
    SubmissionNotFound(Uuid),
    #[error("file `{file_id}` not found in submission `{submission_id}`")]
    FileNotFound { submission_id: Uuid, file_id: Uuid },
    #[error("submission has no target date")]
    MissingTargetDate,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Receives the files, their metadata and the submission record once an
/// upload passes validation.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn files_selected(
        &self,
        files: Vec<UploadedFile>,
        metadata: MetadataMap,
        submission: SubmissionData,
    ) -> StoreResult<SubmissionReceipt>;
}

#[derive(Clone)]
pub struct SubmissionStore {
    /// Shared SQLite connection pool used for submission records.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where submitted payloads are stored.
    pub base_path: PathBuf,
}

impl SubmissionStore {
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    fn submission_root(&self, submission_id: Uuid) -> PathBuf {
        self.base_path.join(submission_id.to_string())
    }

    fn file_path(&self, submission_id: Uuid, file_id: Uuid) -> PathBuf {
        self.submission_root(submission_id).join(file_id.to_string())
    }

    /// Write one payload through a temp file, fsync, then rename into place.
    async fn write_payload(&self, dir: &Path, file_id: Uuid, data: &[u8]) -> StoreResult<()> {
        let final_path = dir.join(file_id.to_string());
        let tmp_path = dir.join(format!(".tmp-{}", file_id));
        let mut file = File::create(&tmp_path).await?;

        let written = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        debug!("stored payload {} ({} bytes)", final_path.display(), data.len());
        Ok(())
    }

    async fn insert_rows(
        &self,
        submission_id: Uuid,
        files: &[UploadedFile],
        metadata: &MetadataMap,
        submission: &SubmissionData,
        target_date: chrono::NaiveDate,
        total_bytes: u64,
    ) -> StoreResult<chrono::DateTime<Utc>> {
        let created_at = Utc::now();
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO submissions (id, title, description, video_type, target_date,
                                      file_count, total_bytes, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(submission_id)
        .bind(&submission.title)
        .bind(&submission.description)
        .bind(&submission.video_type)
        .bind(target_date)
        .bind(files.len() as i64)
        .bind(total_bytes as i64)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for (position, file) in files.iter().enumerate() {
            let meta = metadata.get(&file.id).cloned().unwrap_or_default();
            sqlx::query(
                "INSERT INTO submission_files (id, submission_id, position, file_name,
                                               content_type, size_bytes, etag, title, description)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(file.id)
            .bind(submission_id)
            .bind(position as i64)
            .bind(&file.file_name)
            .bind(file.content_type.clone())
            .bind(file.size_bytes as i64)
            .bind(&file.etag)
            .bind(&meta.title)
            .bind(&meta.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created_at)
    }

    /// Most recent submissions first.
    pub async fn list_recent(&self, limit: i64) -> StoreResult<Vec<SubmissionRecord>> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let rows = sqlx::query_as::<_, SubmissionRecord>(
            "SELECT id, title, description, video_type, target_date, file_count,
                    total_bytes, created_at
             FROM submissions ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, submission_id: Uuid) -> StoreResult<SubmissionRecord> {
        sqlx::query_as::<_, SubmissionRecord>(
            "SELECT id, title, description, video_type, target_date, file_count,
                    total_bytes, created_at
             FROM submissions WHERE id = ?",
        )
        .bind(submission_id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::SubmissionNotFound(submission_id),
            other => StoreError::Sqlx(other),
        })
    }

    pub async fn list_files(&self, submission_id: Uuid) -> StoreResult<Vec<SubmittedFile>> {
        let rows = sqlx::query_as::<_, SubmittedFile>(
            "SELECT id, submission_id, position, file_name, content_type, size_bytes,
                    etag, title, description
             FROM submission_files WHERE submission_id = ? ORDER BY position ASC",
        )
        .bind(submission_id)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    /// Open a stored payload for streaming out.
    pub async fn open_file(
        &self,
        submission_id: Uuid,
        file_id: Uuid,
    ) -> StoreResult<(SubmittedFile, File)> {
        let not_found = || StoreError::FileNotFound {
            submission_id,
            file_id,
        };
        let meta = sqlx::query_as::<_, SubmittedFile>(
            "SELECT id, submission_id, position, file_name, content_type, size_bytes,
                    etag, title, description
             FROM submission_files WHERE submission_id = ? AND id = ?",
        )
        .bind(submission_id)
        .bind(file_id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => not_found(),
            other => StoreError::Sqlx(other),
        })?;

        let file = File::open(self.file_path(submission_id, file_id))
            .await
            .map_err(|err| {
                if err.kind() == io::ErrorKind::NotFound {
                    not_found()
                } else {
                    StoreError::Io(err)
                }
            })?;
        Ok((meta, file))
    }
}

#[async_trait]
impl SubmissionSink for SubmissionStore {
    /// Persist every payload concurrently, then record the batch in one
    /// transaction. On any failure the submission directory is removed.
    async fn files_selected(
        &self,
        files: Vec<UploadedFile>,
        metadata: MetadataMap,
        submission: SubmissionData,
    ) -> StoreResult<SubmissionReceipt> {
        let target_date = submission.target_date.ok_or(StoreError::MissingTargetDate)?;
        let submission_id = Uuid::new_v4();
        let dir = self.submission_root(submission_id);
        fs::create_dir_all(&dir).await?;

        let writes = files
            .iter()
            .map(|file| self.write_payload(&dir, file.id, &file.data));
        let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();

        let recorded = match try_join_all(writes).await {
            Ok(_) => {
                self.insert_rows(
                    submission_id,
                    &files,
                    &metadata,
                    &submission,
                    target_date,
                    total_bytes,
                )
                .await
            }
            Err(err) => Err(err),
        };

        let recorded_at = match recorded {
            Ok(at) => at,
            Err(err) => {
                if let Err(cleanup) = fs::remove_dir_all(&dir).await {
                    debug!("failed to clean up {} after error: {}", dir.display(), cleanup);
                }
                return Err(err);
            }
        };

        info!(
            %submission_id,
            files = files.len(),
            total_bytes,
            "recorded submission `{}`",
            submission.title
        );

        Ok(SubmissionReceipt {
            submission_id,
            file_count: files.len(),
            total_bytes,
            recorded_at,
        })
    }
}

/// Apply the embedded schema. Statements are idempotent.
pub async fn run_migrations(db: &SqlitePool) -> StoreResult<()> {
    let statements = MIGRATIONS
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::metadata::FileMetadata;
    use bytes::Bytes;
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::io::AsyncReadExt;

    pub(crate) async fn memory_pool() -> Arc<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        Arc::new(pool)
    }

    fn uploaded(name: &str, body: &'static [u8]) -> UploadedFile {
        let id = Uuid::new_v4();
        UploadedFile {
            id,
            file_name: name.into(),
            content_type: Some("video/mp4".into()),
            size_bytes: body.len() as u64,
            etag: format!("{:x}", md5::compute(body)),
            preview_url: format!("/previews/{}/preview", id),
            data: Bytes::from_static(body),
        }
    }

    fn submission() -> SubmissionData {
        SubmissionData {
            title: "Launch".into(),
            description: "Launch week".into(),
            video_type: "Dialogue".into(),
            target_date: NaiveDate::from_ymd_opt(2026, 11, 2),
        }
    }

    #[tokio::test]
    async fn records_batch_and_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubmissionStore::new(memory_pool().await, dir.path());

        let files = vec![uploaded("a.mp4", b"first"), uploaded("b.mp4", b"second!")];
        let mut metadata = MetadataMap::new();
        metadata.insert(
            files[1].id,
            FileMetadata {
                title: "Cut B".into(),
                description: "Alt angle".into(),
            },
        );
        metadata.insert(files[0].id, FileMetadata::default());

        let receipt = store
            .files_selected(files.clone(), metadata, submission())
            .await
            .unwrap();
        assert_eq!(receipt.file_count, 2);
        assert_eq!(receipt.total_bytes, 12);

        let history = store.list_recent(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, receipt.submission_id);
        assert_eq!(history[0].title, "Launch");

        let stored = store.list_files(receipt.submission_id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].file_name, "a.mp4");
        assert_eq!(stored[1].title, "Cut B");

        let (meta, mut file) = store
            .open_file(receipt.submission_id, files[1].id)
            .await
            .unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"second!");
        assert_eq!(meta.etag, files[1].etag);
    }

    #[tokio::test]
    async fn unknown_submission_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubmissionStore::new(memory_pool().await, dir.path());
        let id = Uuid::new_v4();
        assert!(matches!(
            store.get(id).await,
            Err(StoreError::SubmissionNotFound(missing)) if missing == id
        ));
        assert!(matches!(
            store.open_file(id, Uuid::new_v4()).await,
            Err(StoreError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn missing_target_date_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubmissionStore::new(memory_pool().await, dir.path());
        let mut data = submission();
        data.target_date = None;
        let result = store
            .files_selected(vec![uploaded("a.mp4", b"x")], MetadataMap::new(), data)
            .await;
        assert!(matches!(result, Err(StoreError::MissingTargetDate)));
        assert!(store.list_recent(10).await.unwrap().is_empty());
    }
}
