//! Registry of script workflows, one per client session.

use crate::services::{
    script_generator::ScriptGenerator,
    script_workflow::{WorkflowHandle, WorkflowView},
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::Instant};
use tracing::info;
use uuid::Uuid;

struct WorkflowEntry {
    handle: WorkflowHandle,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct ScriptService {
    workflows: Arc<RwLock<HashMap<Uuid, WorkflowEntry>>>,
    generator: Arc<dyn ScriptGenerator>,
    delay: Duration,
}

impl ScriptService {
    pub fn new(generator: Arc<dyn ScriptGenerator>, delay: Duration) -> Self {
        Self {
            workflows: Arc::new(RwLock::new(HashMap::new())),
            generator,
            delay,
        }
    }

    pub async fn create(&self) -> (Uuid, WorkflowView) {
        let id = Uuid::new_v4();
        let handle = WorkflowHandle::new(self.generator.clone(), self.delay);
        let view = handle.view().await;
        self.workflows.write().await.insert(
            id,
            WorkflowEntry {
                handle,
                last_seen: Instant::now(),
            },
        );
        info!("opened script workflow {}", id);
        (id, view)
    }

    /// The workflow for `id`, marking it as recently used.
    pub async fn get(&self, id: Uuid) -> Option<WorkflowHandle> {
        let mut workflows = self.workflows.write().await;
        let entry = workflows.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.handle.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.workflows.write().await.remove(&id).is_some();
        if removed {
            info!("closed script workflow {}", id);
        }
        removed
    }

    /// Drop workflows untouched for at least `idle`. A generation already
    /// running finishes on its own handle.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let mut workflows = self.workflows.write().await;
        let before = workflows.len();
        workflows.retain(|id, entry| {
            let keep = entry.last_seen.elapsed() < idle;
            if !keep {
                info!("evicted idle script workflow {}", id);
            }
            keep
        });
        before - workflows.len()
    }
}
