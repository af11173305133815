//! In-memory viewer for driving the bridge without a browser
//!
//! [`InMemoryViewer`] plays the viewer page: it decodes every
//! `control-update` the way the real handler does, applies it to a small
//! state model and answers through the bridge's [`ResponseRouter`] before
//! `post_message` returns. Readiness reports and events are produced as
//! JSON for the test to feed into `handle_message`.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};
use tracing::warn;

use crate::command::ViewerCommand;
use crate::error::{BridgeError, Result};
use crate::protocol::{ControlResponse, HostMessage, VIEWER_READINESS};
use crate::readiness::ReadinessStage;
use crate::transform::{Rotation, Zoom};
use crate::transport::{RemoteHandle, ResponseRouter, ViewerSurface};

#[derive(Default)]
struct ViewerModel {
    viewer_id: String,
    router: Option<Rc<ResponseRouter>>,
    opened_urls: Vec<String>,
    received: Vec<Value>,
    applied: Vec<ViewerCommand>,
    page: Option<u32>,
    zoom: Option<Zoom>,
    rotation: Rotation,
    block_popups: bool,
    closed: bool,
    silent: bool,
    probe: Option<ReadinessStage>,
    navigated: bool,
}

impl ViewerModel {
    fn apply(&mut self, command: &ViewerCommand) {
        match command {
            ViewerCommand::SetPage(page) => self.page = Some(*page),
            ViewerCommand::SetZoom(zoom) => self.zoom = Some(*zoom),
            ViewerCommand::SetRotation(rotation) => self.rotation = *rotation,
            ViewerCommand::TriggerRotateCw => self.rotation = self.rotation.rotate_cw(),
            ViewerCommand::TriggerRotateCcw => self.rotation = self.rotation.rotate_ccw(),
            _ => {}
        }
        self.applied.push(command.clone());
    }
}

/// Scriptable stand-in for the viewer page
#[derive(Clone)]
pub struct InMemoryViewer {
    model: Rc<RefCell<ViewerModel>>,
}

impl InMemoryViewer {
    pub fn new(viewer_id: &str) -> Self {
        let model = ViewerModel {
            viewer_id: viewer_id.to_string(),
            ..Default::default()
        };
        Self {
            model: Rc::new(RefCell::new(model)),
        }
    }

    /// Surface to hand to the bridge; shares state with this viewer
    pub fn surface(&self) -> InMemorySurface {
        InMemorySurface {
            model: Rc::clone(&self.model),
        }
    }

    /// Answer commands through `router`. Unconnected viewers never reply.
    pub fn connect(&self, router: Rc<ResponseRouter>) {
        self.model.borrow_mut().router = Some(router);
    }

    /// Stop answering commands, so dispatches run into their timeout
    pub fn set_silent(&self, silent: bool) {
        self.model.borrow_mut().silent = silent;
    }

    pub fn block_popups(&self, blocked: bool) {
        self.model.borrow_mut().block_popups = blocked;
    }

    /// Simulate the user closing the external window
    pub fn close_window(&self) {
        self.model.borrow_mut().closed = true;
    }

    /// Stage the currently open page exposes to `probe_readiness`.
    ///
    /// Opening the surface again leaves the old stage in place but hides it
    /// until this is called for the new page, like an iframe that still
    /// shows the previous document while navigating.
    pub fn set_probe(&self, stage: Option<ReadinessStage>) {
        let mut model = self.model.borrow_mut();
        model.probe = stage;
        model.navigated = true;
    }

    pub fn readiness(&self, stage: ReadinessStage) -> Value {
        json!({
            "type": VIEWER_READINESS,
            "viewerId": self.model.borrow().viewer_id,
            "stage": stage.as_wire(),
        })
    }

    pub fn event(&self, name: &str, param: Value) -> Value {
        json!({
            "viewerId": self.model.borrow().viewer_id,
            "event": name,
            "param": param,
        })
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.model.borrow().opened_urls.clone()
    }

    /// Raw messages posted to the viewer, accepted or not
    pub fn received(&self) -> Vec<Value> {
        self.model.borrow().received.clone()
    }

    /// Action tags of every posted message, in order
    pub fn received_actions(&self) -> Vec<String> {
        self.model
            .borrow()
            .received
            .iter()
            .filter_map(|m| m.get("action").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Commands the viewer decoded and applied
    pub fn applied(&self) -> Vec<ViewerCommand> {
        self.model.borrow().applied.clone()
    }

    pub fn current_page(&self) -> Option<u32> {
        self.model.borrow().page
    }

    pub fn current_zoom(&self) -> Option<Zoom> {
        self.model.borrow().zoom
    }

    pub fn current_rotation(&self) -> Rotation {
        self.model.borrow().rotation
    }
}

pub struct InMemorySurface {
    model: Rc<RefCell<ViewerModel>>,
}

impl ViewerSurface for InMemorySurface {
    fn open(&mut self, url: &str) -> Result<Rc<dyn RemoteHandle>> {
        let mut model = self.model.borrow_mut();
        if model.block_popups {
            return Err(BridgeError::PopupBlocked);
        }
        model.closed = false;
        model.navigated = false;
        model.opened_urls.push(url.to_string());
        Ok(Rc::new(InMemoryHandle {
            model: Rc::clone(&self.model),
        }))
    }

    fn is_closed(&self) -> bool {
        self.model.borrow().closed
    }

    fn close(&mut self) {
        self.model.borrow_mut().closed = true;
    }

    fn probe_readiness(&self) -> Option<ReadinessStage> {
        let model = self.model.borrow();
        model.probe.filter(|_| model.navigated)
    }
}

struct InMemoryHandle {
    model: Rc<RefCell<ViewerModel>>,
}

impl RemoteHandle for InMemoryHandle {
    fn post_message(&self, message: &Value) -> Result<()> {
        let update: HostMessage = serde_json::from_value(message.clone())?;
        let HostMessage::ControlUpdate {
            action,
            payload,
            id,
        } = update;

        let (router, response) = {
            let mut model = self.model.borrow_mut();
            if model.closed {
                return Err(BridgeError::PostMessageFailed("window is closed".to_string()));
            }
            model.received.push(message.clone());

            let Some(id) = id else {
                return Ok(());
            };
            if model.silent {
                return Ok(());
            }
            let response = match ViewerCommand::parse(&action, &payload) {
                Ok(command) => {
                    model.apply(&command);
                    ControlResponse::ok(&id, &action, Some(payload))
                }
                Err(e) => {
                    warn!("Viewer rejected {}: {}", action, e);
                    ControlResponse::rejected(&id, &action, e.to_string())
                }
            };
            (model.router.clone(), response)
        };

        // Reply outside the borrow; the router wakes the waiting dispatch
        if let Some(router) = router {
            router.deliver(response);
        }
        Ok(())
    }
}
