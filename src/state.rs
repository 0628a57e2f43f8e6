//! Shared state handed to every handler.

use crate::{
    config::AppConfig,
    services::{
        auth_service::AuthService, script_generator::TemplateScriptGenerator,
        script_service::ScriptService, submission_store::SubmissionStore,
        upload_service::UploadService,
    },
};
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::info;

/// URL prefix upload sessions live under; preview URLs are built from it.
pub const UPLOADS_PATH: &str = "/api/uploads";

#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadService,
    pub scripts: ScriptService,
    pub submissions: SubmissionStore,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(cfg: &AppConfig, db: Arc<SqlitePool>) -> Self {
        let submissions = SubmissionStore::new(db, cfg.storage_dir.clone());
        let uploads = UploadService::new(
            Arc::new(submissions.clone()),
            cfg.max_files,
            cfg.video_types.clone(),
            UPLOADS_PATH,
        );
        let scripts = ScriptService::new(Arc::new(TemplateScriptGenerator), cfg.generation_delay());
        let auth = AuthService::new(
            cfg.admin_username.clone(),
            cfg.admin_password.clone(),
            cfg.session_ttl_secs,
        );

        Self {
            uploads,
            scripts,
            submissions,
            auth,
        }
    }

    /// Periodically drop idle upload sessions, idle script workflows and
    /// expired login tokens.
    pub fn spawn_sweeper(&self, idle: Duration) -> JoinHandle<()> {
        let state = self.clone();
        let period = (idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let uploads = state.uploads.evict_idle(idle).await;
                let scripts = state.scripts.evict_idle(idle).await;
                let tokens = state.auth.prune_expired().await;
                if uploads + scripts + tokens > 0 {
                    info!(
                        "swept {} upload sessions, {} script workflows, {} expired tokens",
                        uploads, scripts, tokens
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::upload_service::SessionError;

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_idle_sessions() {
        // never touched by the sweep, so the pool does not need to connect
        let db = Arc::new(SqlitePool::connect_lazy("sqlite::memory:").unwrap());
        let state = AppState::new(&AppConfig::default(), db);
        let idle = Duration::from_secs(120);

        let upload = state.uploads.create_session(None).await.unwrap().id;
        let (script, _) = state.scripts.create().await;
        let sweeper = state.spawn_sweeper(idle);

        tokio::time::sleep(idle + Duration::from_secs(31)).await;

        assert!(matches!(
            state.uploads.view(upload).await,
            Err(SessionError::SessionNotFound(_))
        ));
        assert!(state.scripts.get(script).await.is_none());
        sweeper.abort();
    }
}
