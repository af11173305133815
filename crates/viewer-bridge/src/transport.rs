//! Transport seams between the bridge and the viewer's browsing context
//!
//! [`ViewerSurface`] owns where the viewer lives (an iframe or a separate
//! window) and [`RemoteHandle`] posts messages into it. Responses come back
//! through the host's `message` listener and are matched to the waiting
//! dispatch by id in the [`ResponseRouter`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::Value;
use tracing::debug;

use crate::command::ViewerCommand;
use crate::error::{BridgeError, Result};
use crate::platform;
use crate::protocol::{ControlResponse, HostMessage};
use crate::queue::ActionExecutor;
use crate::readiness::ReadinessStage;

/// The viewer's browsing context, seen from the host
pub trait RemoteHandle {
    /// Post a structured-cloneable message. `Ok` only means the browser
    /// accepted it, not that the viewer acted on it.
    fn post_message(&self, message: &Value) -> Result<()>;
}

/// Container the viewer page is loaded into
pub trait ViewerSurface {
    /// Point the surface at `url` and return a handle for posting to it.
    /// Fails with [`BridgeError::PopupBlocked`] when a window cannot be opened.
    fn open(&mut self, url: &str) -> Result<Rc<dyn RemoteHandle>>;

    /// True once an external window has been closed by the user
    fn is_closed(&self) -> bool;

    fn close(&mut self);

    /// Inspect the viewer directly, for surfaces that can see into it.
    /// `None` when nothing can be determined, including while the page
    /// from before the last `open` is still showing.
    fn probe_readiness(&self) -> Option<ReadinessStage> {
        None
    }
}

/// Pending dispatches waiting for their `control-response`
#[derive(Default)]
pub struct ResponseRouter {
    pending: RefCell<HashMap<String, oneshot::Sender<ControlResponse>>>,
}

impl ResponseRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, id: &str) -> oneshot::Receiver<ControlResponse> {
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().insert(id.to_string(), sender);
        receiver
    }

    fn forget(&self, id: &str) {
        self.pending.borrow_mut().remove(id);
    }

    /// Hand a response to its waiting dispatch. Returns false when no
    /// dispatch is waiting for that id.
    pub fn deliver(&self, response: ControlResponse) -> bool {
        let sender = self.pending.borrow_mut().remove(&response.id);
        match sender {
            Some(sender) => sender.send(response).is_ok(),
            None => {
                debug!("Dropping response for unknown action {}", response.id);
                false
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Fail every waiting dispatch with [`BridgeError::Cancelled`]
    pub fn cancel_all(&self) {
        self.pending.borrow_mut().clear();
    }
}

/// Executor that sends `control-update` messages and waits for the
/// correlated `control-response`
pub struct PostMessageExecutor {
    handle: Rc<dyn RemoteHandle>,
    router: Rc<ResponseRouter>,
    response_timeout: Duration,
}

impl PostMessageExecutor {
    pub fn new(
        handle: Rc<dyn RemoteHandle>,
        router: Rc<ResponseRouter>,
        response_timeout: Duration,
    ) -> Self {
        Self {
            handle,
            router,
            response_timeout,
        }
    }
}

#[async_trait(?Send)]
impl ActionExecutor for PostMessageExecutor {
    async fn execute(&self, action_id: &str, command: &ViewerCommand) -> Result<Option<Value>> {
        let message = HostMessage::control_update(action_id, command).to_value()?;

        // Register first: the reply may arrive before post_message returns
        let receiver = self.router.register(action_id);
        if let Err(e) = self.handle.post_message(&message) {
            self.router.forget(action_id);
            return Err(e);
        }

        match platform::timeout(self.response_timeout, receiver).await {
            Some(Ok(response)) => response.into_result(),
            Some(Err(_)) => Err(BridgeError::Cancelled),
            None => {
                self.router.forget(action_id);
                Err(BridgeError::ResponseTimeout {
                    id: action_id.to_string(),
                    timeout_ms: self.response_timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Handle that answers every message through the router
    struct EchoHandle {
        router: Rc<ResponseRouter>,
        reply: bool,
    }

    impl RemoteHandle for EchoHandle {
        fn post_message(&self, message: &Value) -> Result<()> {
            if self.reply {
                let id = message["id"].as_str().unwrap_or_default();
                let action = message["action"].as_str().unwrap_or_default();
                self.router
                    .deliver(ControlResponse::ok(id, action, Some(message["payload"].clone())));
            }
            Ok(())
        }
    }

    struct FailingHandle;

    impl RemoteHandle for FailingHandle {
        fn post_message(&self, _message: &Value) -> Result<()> {
            Err(BridgeError::PostMessageFailed("window detached".to_string()))
        }
    }

    #[tokio::test]
    async fn test_executor_returns_response_payload() {
        let router = Rc::new(ResponseRouter::new());
        let handle = Rc::new(EchoHandle {
            router: router.clone(),
            reply: true,
        });
        let executor = PostMessageExecutor::new(handle, router.clone(), Duration::from_secs(1));

        let payload = executor
            .execute("a1", &ViewerCommand::SetPage(9))
            .await
            .unwrap();
        assert_eq!(payload, Some(json!(9)));
        assert_eq!(router.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_executor_times_out() {
        let router = Rc::new(ResponseRouter::new());
        let handle = Rc::new(EchoHandle {
            router: router.clone(),
            reply: false,
        });
        let executor = PostMessageExecutor::new(handle, router.clone(), Duration::from_millis(200));

        let err = executor
            .execute("a2", &ViewerCommand::TriggerPrint)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ResponseTimeout { timeout_ms: 200, .. }));
        assert_eq!(router.pending(), 0);
    }

    #[tokio::test]
    async fn test_post_failure_is_reported() {
        let router = Rc::new(ResponseRouter::new());
        let executor =
            PostMessageExecutor::new(Rc::new(FailingHandle), router.clone(), Duration::from_secs(1));
        let err = executor
            .execute("a3", &ViewerCommand::TriggerDownload)
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::PostMessageFailed(_)));
        assert_eq!(router.pending(), 0);
    }

    #[test]
    fn test_router_ignores_unknown_ids() {
        let router = ResponseRouter::new();
        assert!(!router.deliver(ControlResponse::ok("x", "set-page", None)));
        assert_eq!(router.pending(), 0);
    }
}
