//! src/services/script_workflow.rs
//!
//! The script generation workflow: `Input → Editing ⇄ Final`, with
//! `new_script` returning to `Input`. `ScriptWorkflow` holds the state and
//! is synchronous; `WorkflowHandle` shares one behind a lock and runs the
//! generation step with its fixed delay. One generation may be in flight per
//! workflow; the busy flag is the only guard.

use crate::{
    models::{
        notification::Notification,
        script::{GeneratedScript, ScriptInput},
    },
    services::script_generator::{GenerationError, ScriptGenerator},
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const GENERATED: &str = "Script generated successfully!";
pub const GENERATION_FAILED: &str = "Failed to generate script. Please try again.";
pub const SAVED: &str = "Script saved successfully!";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("a script is already being generated")]
    GenerationInProgress,
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("script generation was interrupted")]
    Interrupted,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Input,
    Editing(GeneratedScript),
    Final(GeneratedScript),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Input => "input",
            WorkflowState::Editing(_) => "editing",
            WorkflowState::Final(_) => "final",
        }
    }

    pub fn script(&self) -> Option<&GeneratedScript> {
        match self {
            WorkflowState::Input => None,
            WorkflowState::Editing(script) | WorkflowState::Final(script) => Some(script),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScriptWorkflow {
    state: WorkflowState,
    generating: bool,
    notifications: Vec<Notification>,
}

impl ScriptWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Claim the busy flag for a generation. Only valid in `Input`.
    pub fn begin_generation(&mut self) -> Result<(), WorkflowError> {
        if self.generating {
            return Err(WorkflowError::GenerationInProgress);
        }
        if self.state != WorkflowState::Input {
            return Err(self.invalid("generate"));
        }
        self.generating = true;
        Ok(())
    }

    /// Release the busy flag and apply the generator's outcome. A failure
    /// leaves the workflow in `Input` with nothing retained.
    pub fn finish_generation(
        &mut self,
        outcome: Result<GeneratedScript, GenerationError>,
    ) -> Result<GeneratedScript, WorkflowError> {
        self.generating = false;
        match outcome {
            Ok(script) => {
                self.state = WorkflowState::Editing(script.clone());
                self.notifications.push(Notification::success(GENERATED));
                Ok(script)
            }
            Err(err) => {
                self.notifications.push(Notification::error(GENERATION_FAILED));
                Err(WorkflowError::Generation(err))
            }
        }
    }

    /// Replace the held script. Stays in `Editing`.
    pub fn save(&mut self, script: GeneratedScript) -> Result<(), WorkflowError> {
        match &mut self.state {
            WorkflowState::Editing(held) => {
                *held = script;
                self.notifications.push(Notification::success(SAVED));
                Ok(())
            }
            _ => Err(self.invalid("save")),
        }
    }

    pub fn view_final(&mut self) -> Result<(), WorkflowError> {
        match std::mem::take(&mut self.state) {
            WorkflowState::Editing(script) => {
                self.state = WorkflowState::Final(script);
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("view the final script"))
            }
        }
    }

    pub fn back(&mut self) -> Result<(), WorkflowError> {
        match std::mem::take(&mut self.state) {
            WorkflowState::Final(script) => {
                self.state = WorkflowState::Editing(script);
                Ok(())
            }
            other => {
                self.state = other;
                Err(self.invalid("go back to editing"))
            }
        }
    }

    /// Discard any held script and return to `Input`.
    pub fn new_script(&mut self) {
        self.state = WorkflowState::Input;
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn invalid(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

/// What clients see of a workflow. Reading it drains pending notifications.
#[derive(Serialize, Debug)]
pub struct WorkflowView {
    pub state: &'static str,
    pub script: Option<GeneratedScript>,
    pub is_generating: bool,
    pub notifications: Vec<Notification>,
}

/// A workflow shared between requests, plus the generator and delay it runs with.
#[derive(Clone)]
pub struct WorkflowHandle {
    inner: Arc<Mutex<ScriptWorkflow>>,
    generator: Arc<dyn ScriptGenerator>,
    delay: Duration,
}

impl WorkflowHandle {
    pub fn new(generator: Arc<dyn ScriptGenerator>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptWorkflow::new())),
            generator,
            delay,
        }
    }

    /// Generate a script from `input`.
    ///
    /// Waits the fixed delay, then runs the generator. The lock is not held
    /// during the wait, so the busy state is observable and a concurrent
    /// call is refused with `GenerationInProgress`. Not cancellable: the
    /// outcome is applied even if the caller stops waiting.
    pub async fn generate(&self, input: ScriptInput) -> Result<GeneratedScript, WorkflowError> {
        self.inner.lock().await.begin_generation()?;

        let inner = self.inner.clone();
        let generator = self.generator.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = generator.generate(&input);
            match &outcome {
                Ok(script) => info!("generated script `{}`", script.title),
                Err(err) => warn!("script generation failed: {}", err),
            }
            inner.lock().await.finish_generation(outcome)
        });

        match task.await {
            Ok(result) => result,
            Err(join_err) => {
                warn!("script generation task aborted: {}", join_err);
                let mut workflow = self.inner.lock().await;
                workflow.generating = false;
                workflow.notifications.push(Notification::error(GENERATION_FAILED));
                Err(WorkflowError::Interrupted)
            }
        }
    }

    pub async fn save(&self, script: GeneratedScript) -> Result<(), WorkflowError> {
        self.inner.lock().await.save(script)
    }

    pub async fn view_final(&self) -> Result<(), WorkflowError> {
        self.inner.lock().await.view_final()
    }

    pub async fn back(&self) -> Result<(), WorkflowError> {
        self.inner.lock().await.back()
    }

    pub async fn new_script(&self) {
        self.inner.lock().await.new_script()
    }

    pub async fn view(&self) -> WorkflowView {
        let mut workflow = self.inner.lock().await;
        WorkflowView {
            state: workflow.state.name(),
            script: workflow.state.script().cloned(),
            is_generating: workflow.is_generating(),
            notifications: workflow.take_notifications(),
        }
    }
}
