//! WASM bindings for the PDF.js viewer bridge
//!
//! Wraps [`ViewerBridge`] in a `PdfJsViewer` class. State stays in Rust;
//! JavaScript supplies the iframe (or asks for a popup window) and receives
//! events through a single callback.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfJsViewer } from './pkg/pdfjs_viewer_wasm.js';
//!
//! await init();
//!
//! const viewer = new PdfJsViewer(JSON.stringify({
//!     viewer_id: "main",
//!     source: "/files/report.pdf",
//!     events: { page_change: true, pages_loaded: true },
//! }));
//! viewer.attachIframe(document.getElementById("pdf"));
//! viewer.onEvent((event) => {
//!     if (event.kind === "page-change") console.log("page", event.page);
//! });
//! await viewer.load();
//! await viewer.setZoom("page-width");
//! const result = await viewer.triggerPrint();
//! ```

pub mod listener;
pub mod logging;
pub mod surface;

use std::future::Future;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::HtmlIFrameElement;

use viewer_bridge::{ViewerBridge, ViewerOptions};

use crate::listener::{install_message_listener, EventPump, MessageListener};
use crate::surface::{ExternalWindowSurface, IframeSurface};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Parse and validate the constructor options
fn parse_options(options_json: &str) -> Result<ViewerOptions, String> {
    let options: ViewerOptions =
        serde_json::from_str(options_json).map_err(|e| format!("Invalid viewer options: {}", e))?;
    options.validate().map_err(|e| format!("{:#}", e))?;
    Ok(options)
}

/// PDF.js viewer controlled from Rust
#[wasm_bindgen]
pub struct PdfJsViewer {
    bridge: Rc<ViewerBridge>,
    pump: EventPump,
    _listener: MessageListener,
}

impl PdfJsViewer {
    /// Run `work` against the bridge, deliver resulting events and resolve
    /// the promise with its output
    fn spawn<F, Fut, T>(&self, work: F) -> js_sys::Promise
    where
        F: FnOnce(Rc<ViewerBridge>) -> Fut + 'static,
        Fut: Future<Output = Result<T, JsValue>> + 'static,
        T: Serialize,
    {
        let bridge = Rc::clone(&self.bridge);
        let pump = self.pump.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let outcome = work(bridge).await;
            pump.flush();
            to_js(&outcome?)
        })
    }
}

#[wasm_bindgen]
impl PdfJsViewer {
    /// Create a viewer from JSON options (same keys as the TOML config)
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: &str) -> Result<PdfJsViewer, JsValue> {
        let options = parse_options(options_json).map_err(|e| JsValue::from_str(&e))?;
        logging::init(options.diagnostic_logs);

        let surface: Box<dyn viewer_bridge::ViewerSurface> = if options.external_window {
            Box::new(ExternalWindowSurface::new(
                options.external_window_options.clone(),
            ))
        } else {
            Box::new(IframeSurface::unattached())
        };
        let (bridge, events) = ViewerBridge::new(options, surface);
        let bridge = Rc::new(bridge);
        let pump = EventPump::new(events);
        let listener = install_message_listener(Rc::clone(&bridge), pump.clone())?;

        Ok(Self {
            bridge,
            pump,
            _listener: listener,
        })
    }

    /// Host the viewer in `iframe`
    #[wasm_bindgen(js_name = attachIframe)]
    pub fn attach_iframe(&self, iframe: HtmlIFrameElement) {
        self.bridge.set_surface(Box::new(IframeSurface::new(iframe)));
        self.pump.flush();
    }

    /// Host the viewer in a popup window opened with `features`
    #[wasm_bindgen(js_name = useExternalWindow)]
    pub fn use_external_window(&self, features: Option<String>) {
        self.bridge
            .set_surface(Box::new(ExternalWindowSurface::new(features)));
        self.pump.flush();
    }

    /// Callback signature: (event: { kind: string, ... }) => void
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: js_sys::Function) {
        self.pump.set_callback(callback);
    }

    /// Open the viewer and wait for its control channel.
    /// Resolves to whether the channel came up before the poll gave up.
    pub fn load(&self) -> js_sys::Promise {
        self.spawn(|bridge| async move {
            bridge
                .load()
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(bridge.wait_for_channel().await)
        })
    }

    pub fn refresh(&self) -> js_sys::Promise {
        self.spawn(|bridge| async move {
            bridge
                .refresh()
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(bridge.wait_for_channel().await)
        })
    }

    #[wasm_bindgen(js_name = openDocument)]
    pub fn open_document(&self, source: String) -> js_sys::Promise {
        self.spawn(move |bridge| async move {
            bridge
                .open_document(source)
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    /// Resolves to the queued action id, or null when the write was an echo
    #[wasm_bindgen(js_name = setPage)]
    pub fn set_page(&self, page: u32) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_page(page).await) })
    }

    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&self, zoom: String) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_zoom(&zoom).await) })
    }

    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&self, degrees: i32) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_rotation(degrees as i64).await) })
    }

    #[wasm_bindgen(js_name = setCursor)]
    pub fn set_cursor(&self, cursor: String) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_cursor(&cursor).await) })
    }

    #[wasm_bindgen(js_name = setScroll)]
    pub fn set_scroll(&self, scroll: String) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_scroll(&scroll).await) })
    }

    #[wasm_bindgen(js_name = setSpread)]
    pub fn set_spread(&self, spread: String) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_spread(&spread).await) })
    }

    #[wasm_bindgen(js_name = setPageMode)]
    pub fn set_page_mode(&self, mode: String) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_page_mode(&mode).await) })
    }

    #[wasm_bindgen(js_name = setNamedDest)]
    pub fn set_named_dest(&self, dest: String) -> js_sys::Promise {
        self.spawn(move |bridge| async move { Ok(bridge.set_named_dest(&dest).await) })
    }

    #[wasm_bindgen(js_name = triggerPrint)]
    pub fn trigger_print(&self) -> js_sys::Promise {
        self.spawn(|bridge| async move { Ok(bridge.trigger_print().await) })
    }

    #[wasm_bindgen(js_name = triggerDownload)]
    pub fn trigger_download(&self) -> js_sys::Promise {
        self.spawn(|bridge| async move { Ok(bridge.trigger_download().await) })
    }

    #[wasm_bindgen(js_name = rotateCw)]
    pub fn rotate_cw(&self) -> js_sys::Promise {
        self.spawn(|bridge| async move { Ok(bridge.rotate_cw().await) })
    }

    #[wasm_bindgen(js_name = rotateCcw)]
    pub fn rotate_ccw(&self) -> js_sys::Promise {
        self.spawn(|bridge| async move { Ok(bridge.rotate_ccw().await) })
    }

    #[wasm_bindgen(js_name = goToLastPage)]
    pub fn go_to_last_page(&self) -> js_sys::Promise {
        self.spawn(|bridge| async move { Ok(bridge.go_to_last_page().await) })
    }

    #[wasm_bindgen(js_name = viewerUrl)]
    pub fn viewer_url(&self) -> Option<String> {
        self.bridge.viewer_url()
    }

    #[wasm_bindgen(js_name = queueStatus)]
    pub fn queue_status(&self) -> Result<JsValue, JsValue> {
        to_js(&self.bridge.queue_status())
    }

    #[wasm_bindgen(js_name = actionStatus)]
    pub fn action_status(&self, id: &str) -> Result<JsValue, JsValue> {
        to_js(&self.bridge.action_status(id))
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.bridge.state())
    }

    #[wasm_bindgen(getter)]
    pub fn page(&self) -> Option<u32> {
        self.bridge.page()
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> Option<u32> {
        self.bridge.page_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_options() {
        let options = parse_options(r#"{"viewer_id": "main", "source": "a.pdf", "page": 2}"#).unwrap();
        assert_eq!(options.viewer_id.as_deref(), Some("main"));
        assert_eq!(options.page, Some(2));
        assert_eq!(options.viewer_folder, "assets/pdfjs");
    }

    #[test]
    fn test_parse_options_rejects_bad_input() {
        assert!(parse_options("{not json").unwrap_err().starts_with("Invalid viewer options"));
        assert!(parse_options(r#"{"page": 0}"#)
            .unwrap_err()
            .contains("page numbers start at 1"));
    }
}
