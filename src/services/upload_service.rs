//! src/services/upload_service.rs
//!
//! UploadService: owns every live upload session and hands validated
//! batches to the configured `SubmissionSink`. Each session is an
//! `UploadModule` behind its own lock; no lock is held while the sink runs.

use crate::{
    models::{
        metadata::{MetadataMap, MetadataUpdate},
        submission::{SubmissionData, SubmissionReceipt},
        uploaded_file::{FileId, SelectedFile, UploadedFile},
    },
    services::{
        submission_store::{StoreError, SubmissionSink},
        upload_module::{UploadError, UploadModule},
    },
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};
use thiserror::Error;
use tokio::{
    runtime::Handle,
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::{info, warn};
use uuid::Uuid;

pub type SessionId = Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("upload session `{0}` not found")]
    SessionNotFound(SessionId),
    #[error("max_files must be between 1 and {ceiling}")]
    InvalidMaxFiles { ceiling: usize },
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Partial update of the submission record. Absent fields are left alone;
/// `target_date: Some(None)` clears the date.
#[derive(Deserialize, Debug, Default)]
pub struct SubmissionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_target_date")]
    pub target_date: Option<Option<NaiveDate>>,
}

/// Dates arrive as `YYYY-MM-DD`. Anything unparseable, empty or null is
/// stored as unset so validation reports it as missing.
fn deserialize_target_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(raw.and_then(|value| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
    })))
}

/// Snapshot of a session returned to clients.
#[derive(Serialize, Debug)]
pub struct SessionView {
    pub id: SessionId,
    pub max_files: usize,
    pub files: Vec<UploadedFile>,
    pub metadata: MetadataMap,
    pub submission: SubmissionData,
    pub video_types: Vec<String>,
    pub error: Option<String>,
    pub is_processing: bool,
}

impl SessionView {
    fn of(id: SessionId, module: &UploadModule) -> Self {
        Self {
            id,
            max_files: module.max_files(),
            files: module.files().to_vec(),
            metadata: module.metadata().clone(),
            submission: module.submission().clone(),
            video_types: module.video_types().to_vec(),
            error: module.error().map(str::to_string),
            is_processing: module.is_processing(),
        }
    }
}

/// One live session and the last time a request touched it.
struct SessionSlot {
    module: Mutex<UploadModule>,
    last_seen: StdMutex<Instant>,
}

impl SessionSlot {
    fn new(module: UploadModule) -> Self {
        Self {
            module: Mutex::new(module),
            last_seen: StdMutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Reopens the processing gate when dropped, including when the submit
/// future is dropped mid-flight.
struct ProcessingGuard {
    id: SessionId,
    slot: Arc<SessionSlot>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        if let Ok(mut module) = self.slot.module.try_lock() {
            module.set_processing(false);
            return;
        }
        // contended: clear it once the current holder lets go
        match Handle::try_current() {
            Ok(runtime) => {
                let slot = self.slot.clone();
                runtime.spawn(async move {
                    slot.module.lock().await.set_processing(false);
                });
            }
            Err(_) => warn!("session {}: runtime gone, processing flag left set", self.id),
        }
    }
}

#[derive(Clone)]
pub struct UploadService {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<SessionSlot>>>>,
    sink: Arc<dyn SubmissionSink>,
    max_files: usize,
    video_types: Vec<String>,
    preview_base: String,
}

impl UploadService {
    /// `preview_base` is the URL prefix sessions live under, e.g. `/api/uploads`.
    pub fn new(
        sink: Arc<dyn SubmissionSink>,
        max_files: usize,
        video_types: Vec<String>,
        preview_base: impl Into<String>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            sink,
            max_files,
            video_types,
            preview_base: preview_base.into(),
        }
    }

    /// Open a new session. `max_files` may lower, never raise, the configured ceiling.
    pub async fn create_session(&self, max_files: Option<usize>) -> SessionResult<SessionView> {
        let max_files = match max_files {
            None => self.max_files,
            Some(n) if (1..=self.max_files).contains(&n) => n,
            Some(_) => {
                return Err(SessionError::InvalidMaxFiles {
                    ceiling: self.max_files,
                });
            }
        };

        let id = Uuid::new_v4();
        let prefix = format!("{}/{}/files", self.preview_base, id);
        let module = UploadModule::new(max_files, self.video_types.clone(), prefix);
        let view = SessionView::of(id, &module);
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(SessionSlot::new(module)));
        info!("opened upload session {} (max {} files)", id, max_files);
        Ok(view)
    }

    /// Drop a session and everything it holds; its previews stop resolving.
    pub async fn close_session(&self, id: SessionId) -> SessionResult<()> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!("closed upload session {}", id);
                Ok(())
            }
            None => Err(SessionError::SessionNotFound(id)),
        }
    }

    /// Drop every session untouched for at least `idle`, except ones with a
    /// submission in flight. Returns how many were evicted.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, slot| {
            let busy = slot
                .module
                .try_lock()
                .map(|module| module.is_processing())
                .unwrap_or(true);
            let keep = busy || slot.idle_for() < idle;
            if !keep {
                info!("evicted idle upload session {}", id);
            }
            keep
        });
        before - sessions.len()
    }

    async fn session(&self, id: SessionId) -> SessionResult<Arc<SessionSlot>> {
        let slot = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::SessionNotFound(id))?;
        slot.touch();
        Ok(slot)
    }

    pub async fn view(&self, id: SessionId) -> SessionResult<SessionView> {
        let session = self.session(id).await?;
        let module = session.module.lock().await;
        Ok(SessionView::of(id, &module))
    }

    /// Free slots in the selection, checked before a batch is read.
    pub async fn capacity(&self, id: SessionId) -> SessionResult<usize> {
        let session = self.session(id).await?;
        let capacity = session.module.lock().await.capacity()?;
        Ok(capacity)
    }

    /// Record and return the error for a batch of at least `requested` files
    /// that cannot fit.
    pub async fn reject_overflow(&self, id: SessionId, requested: usize) -> SessionError {
        match self.session(id).await {
            Ok(session) => session.module.lock().await.reject_overflow(requested).into(),
            Err(err) => err,
        }
    }

    pub async fn add_files(
        &self,
        id: SessionId,
        batch: Vec<SelectedFile>,
    ) -> SessionResult<Vec<UploadedFile>> {
        let session = self.session(id).await?;
        let mut module = session.module.lock().await;
        let added = module.handle_files(batch)?.to_vec();
        info!("session {}: added {} files ({}/{})", id, added.len(), module.files().len(), module.max_files());
        Ok(added)
    }

    pub async fn remove_file(&self, id: SessionId, file_id: FileId) -> SessionResult<()> {
        let session = self.session(id).await?;
        let removed = session.module.lock().await.remove_file(file_id)?;
        info!("session {}: removed file {} ({})", id, file_id, removed.file_name);
        Ok(())
    }

    /// Clone of a selected file, used to serve its preview.
    pub async fn preview(&self, id: SessionId, file_id: FileId) -> SessionResult<UploadedFile> {
        let session = self.session(id).await?;
        let module = session.module.lock().await;
        module
            .file(file_id)
            .cloned()
            .ok_or(SessionError::Upload(UploadError::FileNotFound(file_id)))
    }

    pub async fn update_metadata(
        &self,
        id: SessionId,
        file_id: FileId,
        update: MetadataUpdate,
    ) -> SessionResult<SessionView> {
        let session = self.session(id).await?;
        let mut module = session.module.lock().await;
        module.update_metadata(file_id, update)?;
        Ok(SessionView::of(id, &module))
    }

    /// Apply each present field through the module's setters, stopping at the
    /// first rejection.
    pub async fn update_submission(
        &self,
        id: SessionId,
        update: SubmissionUpdate,
    ) -> SessionResult<SessionView> {
        let session = self.session(id).await?;
        let mut module = session.module.lock().await;
        if let Some(video_type) = update.video_type {
            module.set_video_type(&video_type)?;
        }
        if let Some(title) = update.title {
            module.set_title(title)?;
        }
        if let Some(description) = update.description {
            module.set_description(description)?;
        }
        if let Some(target_date) = update.target_date {
            module.set_target_date(target_date)?;
        }
        Ok(SessionView::of(id, &module))
    }

    pub async fn dismiss_error(&self, id: SessionId) -> SessionResult<SessionView> {
        let session = self.session(id).await?;
        let mut module = session.module.lock().await;
        module.dismiss_error();
        Ok(SessionView::of(id, &module))
    }

    /// Validate and hand the batch to the sink.
    ///
    /// The session is marked processing for the duration of the sink call, so
    /// concurrent mutations and a second submit are refused. The flag is
    /// cleared however the call ends, including when the caller goes away;
    /// the selection is left as it was.
    pub async fn submit(&self, id: SessionId, submitted_by: &str) -> SessionResult<SubmissionReceipt> {
        let session = self.session(id).await?;
        let batch = {
            let mut module = session.module.lock().await;
            let batch = module.prepare_submission()?;
            module.set_processing(true);
            batch
        };
        let guard = ProcessingGuard {
            id,
            slot: session.clone(),
        };

        info!("session {}: `{}` submitting {} files", id, submitted_by, batch.files.len());
        let result = self
            .sink
            .files_selected(batch.files, batch.metadata, batch.submission)
            .await;
        drop(guard);

        match result {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                warn!("session {}: submission failed: {}", id, err);
                Err(SessionError::Store(err))
            }
        }
    }
}
