//! Readiness-gated action queue
//!
//! Actions wait in one of four buckets until the viewer is far enough along
//! to accept them:
//!
//! | Bucket | Flushed when |
//! |--------|--------------|
//! | `Immediate` | the control channel is up (`ready`) |
//! | `ViewerReady` | stage >= `ViewerReady` |
//! | `DocumentLoaded` | stage >= `DocumentLoaded` or `on_document_loaded()` |
//! | `OnDemand` | never queued, runs as soon as it is submitted |
//!
//! Within a bucket actions run in submission order, one at a time. Failures
//! are turned into [`ActionExecutionResult`]s and never escape the queue.
//! An action stays in its bucket until the moment it is dispatched, so
//! [`ActionQueueManager::clear_queues`] also stops a flush that is already
//! running.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::action::{ActionExecutionResult, ActionStatus, ViewerAction};
use crate::command::ViewerCommand;
use crate::error::{BridgeError, Result};
use crate::readiness::ReadinessStage;

/// Transport that actually delivers a command to the viewer
#[async_trait(?Send)]
pub trait ActionExecutor {
    /// Deliver `command` and wait for the viewer's verdict.
    /// Returns the response payload, if any.
    async fn execute(&self, action_id: &str, command: &ViewerCommand) -> Result<Option<Value>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueBucket {
    Immediate,
    ViewerReady,
    DocumentLoaded,
    OnDemand,
}

impl QueueBucket {
    pub const ALL: [QueueBucket; 4] = [
        QueueBucket::Immediate,
        QueueBucket::ViewerReady,
        QueueBucket::DocumentLoaded,
        QueueBucket::OnDemand,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QueueBucket::Immediate => "immediate",
            QueueBucket::ViewerReady => "viewer-ready",
            QueueBucket::DocumentLoaded => "document-loaded",
            QueueBucket::OnDemand => "on-demand",
        }
    }
}

/// Snapshot of the queue for introspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueStatus {
    pub immediate: usize,
    pub viewer_ready: usize,
    pub document_loaded: usize,
    pub on_demand: usize,
    pub executed: usize,
    pub ready: bool,
    pub stage: ReadinessStage,
    pub document_is_loaded: bool,
}

impl QueueStatus {
    pub fn pending(&self) -> usize {
        self.immediate + self.viewer_ready + self.document_loaded + self.on_demand
    }
}

#[derive(Default)]
struct QueueState {
    immediate: VecDeque<ViewerAction>,
    viewer_ready: VecDeque<ViewerAction>,
    document_loaded: VecDeque<ViewerAction>,
    on_demand: VecDeque<ViewerAction>,
    executed: HashMap<String, ActionExecutionResult>,
    executing: HashSet<String>,
    flushing: HashSet<QueueBucket>,
    ready: bool,
    stage: ReadinessStage,
    document_is_loaded: bool,
}

impl QueueState {
    fn bucket_mut(&mut self, bucket: QueueBucket) -> &mut VecDeque<ViewerAction> {
        match bucket {
            QueueBucket::Immediate => &mut self.immediate,
            QueueBucket::ViewerReady => &mut self.viewer_ready,
            QueueBucket::DocumentLoaded => &mut self.document_loaded,
            QueueBucket::OnDemand => &mut self.on_demand,
        }
    }

    fn buckets(&self) -> [&VecDeque<ViewerAction>; 4] {
        [
            &self.immediate,
            &self.viewer_ready,
            &self.document_loaded,
            &self.on_demand,
        ]
    }

    fn is_satisfied(&self, bucket: QueueBucket) -> bool {
        match bucket {
            QueueBucket::Immediate => self.ready,
            QueueBucket::ViewerReady => self.stage >= ReadinessStage::ViewerReady,
            QueueBucket::DocumentLoaded => {
                self.document_is_loaded || self.stage >= ReadinessStage::DocumentLoaded
            }
            QueueBucket::OnDemand => true,
        }
    }
}

/// Buckets pending actions by the readiness they need
pub struct ActionQueueManager {
    state: RefCell<QueueState>,
    executor: RefCell<Option<Rc<dyn ActionExecutor>>>,
    /// Bumped by `clear_queues`; results from an older generation are dropped
    generation: Cell<u64>,
    diagnostics: bool,
}

impl ActionQueueManager {
    pub fn new(diagnostics: bool) -> Self {
        Self {
            state: RefCell::new(QueueState::default()),
            executor: RefCell::new(None),
            generation: Cell::new(0),
            diagnostics,
        }
    }

    /// Install the transport used by every subsequent dispatch
    pub fn set_post_message_executor(&self, executor: Rc<dyn ActionExecutor>) {
        *self.executor.borrow_mut() = Some(executor);
    }

    /// Submit an action.
    ///
    /// `OnDemand` actions run right away and their result is returned.
    /// Other actions are appended to their bucket; if the bucket's threshold
    /// has already been crossed the bucket is flushed immediately so late
    /// arrivals never sit in a queue that will not flush again.
    pub async fn queue_action(
        &self,
        action: ViewerAction,
        bucket: QueueBucket,
    ) -> Option<ActionExecutionResult> {
        if bucket == QueueBucket::OnDemand {
            if self.diagnostics {
                debug!("Executing on-demand action {} ({})", action.id, action.command.action());
            }
            return Some(self.execute_action(action).await);
        }

        let satisfied = {
            let mut state = self.state.borrow_mut();
            if self.diagnostics {
                debug!(
                    "Queueing action {} ({}) into {}",
                    action.id,
                    action.command.action(),
                    bucket.name()
                );
            }
            state.bucket_mut(bucket).push_back(action);
            state.is_satisfied(bucket)
        };

        if satisfied {
            self.flush(bucket).await;
        }
        None
    }

    /// Update readiness and flush every bucket whose threshold is now met.
    ///
    /// Once the channel has been reported ready it stays ready for the
    /// lifetime of this manager; `ready = false` only leaves it unset.
    pub async fn set_ready(&self, ready: bool, stage: ReadinessStage) {
        let (flush_immediate, flush_viewer, flush_document) = {
            let mut state = self.state.borrow_mut();
            state.ready |= ready;
            if stage > state.stage {
                state.stage = stage;
            }
            if state.stage >= ReadinessStage::DocumentLoaded {
                state.document_is_loaded = true;
            }
            (
                state.ready,
                state.is_satisfied(QueueBucket::ViewerReady),
                state.is_satisfied(QueueBucket::DocumentLoaded),
            )
        };

        if self.diagnostics {
            debug!("Queue readiness: ready={} stage={:?}", ready, stage);
        }

        if flush_immediate {
            self.flush(QueueBucket::Immediate).await;
        }
        if flush_viewer {
            self.flush(QueueBucket::ViewerReady).await;
        }
        if flush_document {
            self.flush(QueueBucket::DocumentLoaded).await;
        }
    }

    /// Explicit document-load notification, independent of `set_ready`
    pub async fn on_document_loaded(&self) {
        self.state.borrow_mut().document_is_loaded = true;
        if self.diagnostics {
            debug!("Document loaded, flushing document-loaded queue");
        }
        self.flush(QueueBucket::DocumentLoaded).await;
    }

    pub fn is_document_loaded(&self) -> bool {
        self.state.borrow().document_is_loaded
    }

    /// Drain a bucket in order. Actions queued while the drain is running
    /// are picked up by the same drain, keeping per-bucket FIFO order.
    async fn flush(&self, bucket: QueueBucket) {
        let pending = {
            let mut state = self.state.borrow_mut();
            if !state.flushing.insert(bucket) {
                return;
            }
            state.bucket_mut(bucket).len()
        };
        if self.diagnostics && pending > 0 {
            debug!("Flushing {} action(s) from {}", pending, bucket.name());
        }

        loop {
            // Pop one at a time so a clear between dispatches is honored
            let next = self.state.borrow_mut().bucket_mut(bucket).pop_front();
            let Some(action) = next else {
                break;
            };
            let result = self.execute_action(action).await;
            if !result.success {
                warn!(
                    "Action {} ({}) failed: {}",
                    result.action_id,
                    result.action,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        self.state.borrow_mut().flushing.remove(&bucket);
    }

    /// Run one action: check its guard, dispatch through the executor,
    /// record the result and fire the resolver exactly once.
    pub async fn execute_action(&self, mut action: ViewerAction) -> ActionExecutionResult {
        let id = action.id.clone();
        let tag = action.command.action().to_string();
        let generation = self.generation.get();

        let result = if !action.condition_met() {
            ActionExecutionResult::failure(&id, &tag, &BridgeError::ConditionNotMet)
        } else {
            let executor = self.executor.borrow().clone();
            match executor {
                None => ActionExecutionResult::failure(&id, &tag, &BridgeError::TransportUnavailable),
                Some(executor) => {
                    self.state.borrow_mut().executing.insert(id.clone());
                    let outcome = executor.execute(&id, &action.command).await;
                    self.state.borrow_mut().executing.remove(&id);
                    match outcome {
                        Ok(payload) => ActionExecutionResult::success(&id, &tag, payload),
                        Err(e) => ActionExecutionResult::failure(&id, &tag, &e),
                    }
                }
            }
        };

        if self.generation.get() == generation {
            self.state
                .borrow_mut()
                .executed
                .insert(id.clone(), result.clone());
        } else if self.diagnostics {
            debug!("Queue cleared while {} was running, result not kept", id);
        }
        action.resolve(&result);
        result
    }

    pub fn get_action_status(&self, id: &str) -> ActionStatus {
        let state = self.state.borrow();
        if state.executing.contains(id) {
            return ActionStatus::Executing;
        }
        if state
            .buckets()
            .iter()
            .any(|bucket| bucket.iter().any(|a| a.id == id))
        {
            return ActionStatus::Pending;
        }
        match state.executed.get(id) {
            Some(result) if result.success => ActionStatus::Completed,
            Some(_) => ActionStatus::Failed,
            None => ActionStatus::NotFound,
        }
    }

    pub fn get_action_result(&self, id: &str) -> Option<ActionExecutionResult> {
        self.state.borrow().executed.get(id).cloned()
    }

    pub fn get_queue_status(&self) -> QueueStatus {
        let state = self.state.borrow();
        QueueStatus {
            immediate: state.immediate.len(),
            viewer_ready: state.viewer_ready.len(),
            document_loaded: state.document_loaded.len(),
            on_demand: state.on_demand.len(),
            executed: state.executed.len(),
            ready: state.ready,
            stage: state.stage,
            document_is_loaded: state.document_is_loaded,
        }
    }

    /// Drop every queued action and every recorded result.
    ///
    /// Dropped actions release their resolvers, so outstanding tickets
    /// resolve with [`BridgeError::Cancelled`]. A flush in progress stops
    /// after the action it is currently dispatching.
    pub fn clear_queues(&self) {
        let mut state = self.state.borrow_mut();
        let discarded: usize = state.buckets().iter().map(|b| b.len()).sum();
        for bucket in QueueBucket::ALL {
            state.bucket_mut(bucket).clear();
        }
        state.executed.clear();
        state.executing.clear();
        self.generation.set(self.generation.get().wrapping_add(1));
        if self.diagnostics && discarded > 0 {
            debug!("Cleared {} pending action(s)", discarded);
        }
    }
}
