//! Host-side `message` listener and event delivery

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::MessageEvent;

use viewer_bridge::{BridgeEvent, EventStream, ViewerBridge};

/// Hands queued [`BridgeEvent`]s to the host's `onEvent` callback
#[derive(Clone)]
pub struct EventPump {
    events: Rc<RefCell<EventStream>>,
    callback: Rc<RefCell<Option<js_sys::Function>>>,
}

impl EventPump {
    pub fn new(events: EventStream) -> Self {
        Self {
            events: Rc::new(RefCell::new(events)),
            callback: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_callback(&self, callback: js_sys::Function) {
        *self.callback.borrow_mut() = Some(callback);
    }

    /// Deliver everything queued so far. The callback may call back into the
    /// viewer, so nothing stays borrowed while it runs.
    pub fn flush(&self) {
        let pending: Vec<BridgeEvent> = {
            let mut events = self.events.borrow_mut();
            let mut pending = Vec::new();
            while let Ok(Some(event)) = events.try_next() {
                pending.push(event);
            }
            pending
        };
        let Some(callback) = self.callback.borrow().clone() else {
            return;
        };
        for event in pending {
            match event.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
                Ok(value) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                        warn!("onEvent callback threw: {:?}", e);
                    }
                }
                Err(e) => warn!("Could not serialize event: {}", e),
            }
        }
    }
}

/// Registered `message` listener, removed again on drop
pub struct MessageListener {
    closure: Closure<dyn FnMut(MessageEvent)>,
}

impl Drop for MessageListener {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(
                "message",
                self.closure.as_ref().unchecked_ref(),
            );
        }
    }
}

/// Forward every `message` event on the host window into the bridge
pub fn install_message_listener(
    bridge: Rc<ViewerBridge>,
    pump: EventPump,
) -> Result<MessageListener, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        let data: Value = match serde_wasm_bindgen::from_value(event.data()) {
            Ok(data) => data,
            Err(_) => return,
        };
        let bridge = Rc::clone(&bridge);
        let pump = pump.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = bridge.handle_message(&data).await {
                debug!("Rejected viewer message: {}", e);
            }
            pump.flush();
        });
    }) as Box<dyn FnMut(MessageEvent)>);

    window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())?;
    Ok(MessageListener { closure })
}
