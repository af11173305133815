//! Queued actions and their execution results

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::command::ViewerCommand;
use crate::error::BridgeError;

/// Guard evaluated right before dispatch
pub type Condition = Box<dyn Fn() -> bool>;

/// A command waiting to be sent to the viewer
pub struct ViewerAction {
    pub id: String,
    pub command: ViewerCommand,
    pub created_at: DateTime<Utc>,
    condition: Option<Condition>,
    resolver: Option<oneshot::Sender<ActionExecutionResult>>,
}

impl ViewerAction {
    pub fn new(command: ViewerCommand) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), command)
    }

    pub fn with_id(id: impl Into<String>, command: ViewerCommand) -> Self {
        Self {
            id: id.into(),
            command,
            created_at: Utc::now(),
            condition: None,
            resolver: None,
        }
    }

    /// Only dispatch when `condition` holds at execution time
    pub fn when(mut self, condition: impl Fn() -> bool + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Attach a resolver and hand back the ticket that observes it.
    ///
    /// The ticket resolves once with the execution result, or with
    /// [`BridgeError::Cancelled`] if the action is discarded first.
    pub fn with_ticket(mut self) -> (Self, ActionTicket) {
        let (sender, receiver) = oneshot::channel();
        self.resolver = Some(sender);
        let ticket = ActionTicket {
            id: self.id.clone(),
            receiver,
        };
        (self, ticket)
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    pub(crate) fn condition_met(&self) -> bool {
        self.condition.as_ref().map_or(true, |check| check())
    }

    /// Fire the resolver. The sender is consumed, so this can only happen once.
    pub(crate) fn resolve(&mut self, result: &ActionExecutionResult) {
        if let Some(resolver) = self.resolver.take() {
            // Receiver may already be gone; nobody is waiting then.
            let _ = resolver.send(result.clone());
        }
    }
}

impl fmt::Debug for ViewerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerAction")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("created_at", &self.created_at)
            .field("has_condition", &self.condition.is_some())
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Outcome of one executed action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionExecutionResult {
    pub action_id: String,
    pub action: String,
    pub success: bool,
    pub error: Option<String>,
    pub payload: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ActionExecutionResult {
    pub fn success(action_id: &str, action: &str, payload: Option<Value>) -> Self {
        Self {
            action_id: action_id.to_string(),
            action: action.to_string(),
            success: true,
            error: None,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(action_id: &str, action: &str, error: &BridgeError) -> Self {
        Self {
            action_id: action_id.to_string(),
            action: action.to_string(),
            success: false,
            error: Some(error.to_string()),
            payload: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    Pending,
    Executing,
    Completed,
    Failed,
    NotFound,
}

/// Future side of an action's resolver
#[derive(Debug)]
pub struct ActionTicket {
    id: String,
    receiver: oneshot::Receiver<ActionExecutionResult>,
}

impl ActionTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for ActionTicket {
    type Output = Result<ActionExecutionResult, BridgeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| received.map_err(|_| BridgeError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_action_has_unique_id() {
        let a = ViewerAction::new(ViewerCommand::TriggerPrint);
        let b = ViewerAction::new(ViewerCommand::TriggerPrint);
        assert_ne!(a.id, b.id);
        assert!(!a.has_resolver());
    }

    #[test]
    fn test_condition_defaults_to_true() {
        let action = ViewerAction::new(ViewerCommand::GoToLastPage);
        assert!(action.condition_met());

        let guarded = ViewerAction::new(ViewerCommand::GoToLastPage).when(|| false);
        assert!(!guarded.condition_met());
    }

    #[tokio::test]
    async fn test_ticket_receives_result() {
        let (mut action, ticket) =
            ViewerAction::with_id("a-1", ViewerCommand::TriggerPrint).with_ticket();
        assert_eq!(ticket.id(), "a-1");

        let result = ActionExecutionResult::success("a-1", "trigger-print", None);
        action.resolve(&result);
        // second call is a no-op
        action.resolve(&ActionExecutionResult::failure(
            "a-1",
            "trigger-print",
            &BridgeError::ConditionNotMet,
        ));

        let received = ticket.await.unwrap();
        assert!(received.success);
    }

    #[tokio::test]
    async fn test_dropped_action_cancels_ticket() {
        let (action, ticket) = ViewerAction::new(ViewerCommand::TriggerPrint).with_ticket();
        drop(action);
        assert!(matches!(ticket.await, Err(BridgeError::Cancelled)));
    }
}
