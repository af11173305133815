//! Browser surfaces the viewer can live in: an iframe or a popup window

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlIFrameElement, Window};

use viewer_bridge::{BridgeError, ReadinessStage, RemoteHandle, Result, ViewerSurface};

/// Stage implied by what `PDFViewerApplication` exposes
pub fn stage_from_app(initialized: bool, has_viewer: bool, has_document: bool) -> ReadinessStage {
    if has_document {
        ReadinessStage::DocumentLoaded
    } else if has_viewer && initialized {
        ReadinessStage::ViewerReady
    } else if initialized {
        ReadinessStage::ApplicationReady
    } else {
        ReadinessStage::ScriptLoaded
    }
}

fn js_error(err: JsValue) -> BridgeError {
    BridgeError::PostMessageFailed(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

fn is_set(target: &JsValue, key: &str) -> bool {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .map(|v| !v.is_undefined() && !v.is_null() && v.as_bool() != Some(false))
        .unwrap_or(false)
}

/// Peek into a same-origin viewer window. Cross-origin access throws and
/// yields `None`.
fn probe_window(window: &Window) -> Option<ReadinessStage> {
    let app = js_sys::Reflect::get(window, &JsValue::from_str("PDFViewerApplication")).ok()?;
    if app.is_undefined() || app.is_null() {
        return None;
    }
    Some(stage_from_app(
        is_set(&app, "initialized"),
        is_set(&app, "pdfViewer"),
        is_set(&app, "pdfDocument"),
    ))
}

/// Where messages for the viewer are posted
enum Target {
    Iframe(HtmlIFrameElement),
    Window(Window),
}

struct WindowHandle {
    target: Target,
}

impl RemoteHandle for WindowHandle {
    fn post_message(&self, message: &Value) -> Result<()> {
        let window = match &self.target {
            Target::Iframe(iframe) => iframe.content_window().ok_or_else(|| {
                BridgeError::PostMessageFailed("iframe has no content window".to_string())
            })?,
            Target::Window(window) => window.clone(),
        };
        let data = message
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| BridgeError::Protocol(e.to_string()))?;
        window.post_message(&data, "*").map_err(js_error)
    }
}

/// Viewer embedded in an `<iframe>` owned by the host page
///
/// After `open` the iframe keeps showing the previous page until the new
/// one has loaded, so probing waits for the iframe's `load` event.
pub struct IframeSurface {
    iframe: Option<HtmlIFrameElement>,
    navigated: Rc<Cell<bool>>,
    on_load: Option<Closure<dyn FnMut()>>,
}

impl IframeSurface {
    pub fn new(iframe: HtmlIFrameElement) -> Self {
        Self {
            iframe: Some(iframe),
            navigated: Rc::new(Cell::new(false)),
            on_load: None,
        }
    }

    /// Placeholder until the host attaches an element
    pub fn unattached() -> Self {
        Self {
            iframe: None,
            navigated: Rc::new(Cell::new(false)),
            on_load: None,
        }
    }
}

impl ViewerSurface for IframeSurface {
    fn open(&mut self, url: &str) -> Result<Rc<dyn RemoteHandle>> {
        let iframe = self.iframe.clone().ok_or_else(|| {
            BridgeError::Protocol("no iframe attached; call attachIframe first".to_string())
        })?;

        self.navigated.set(false);
        let navigated = Rc::clone(&self.navigated);
        let frame = iframe.clone();
        let on_load = Closure::<dyn FnMut()>::new(move || {
            // Teardown's about:blank can finish loading after the new src is set
            let blank = frame
                .content_window()
                .and_then(|w| w.location().href().ok())
                .is_some_and(|href| href == "about:blank");
            if !blank {
                navigated.set(true);
            }
        });
        iframe.set_onload(Some(on_load.as_ref().unchecked_ref()));
        self.on_load = Some(on_load);

        iframe.set_src(url);
        Ok(Rc::new(WindowHandle {
            target: Target::Iframe(iframe),
        }))
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn close(&mut self) {
        self.navigated.set(false);
        if let Some(iframe) = &self.iframe {
            iframe.set_src("about:blank");
        }
    }

    fn probe_readiness(&self) -> Option<ReadinessStage> {
        if !self.navigated.get() {
            return None;
        }
        let window = self.iframe.as_ref()?.content_window()?;
        probe_window(&window)
    }
}

impl Drop for IframeSurface {
    fn drop(&mut self) {
        if let (Some(iframe), Some(_)) = (&self.iframe, &self.on_load) {
            iframe.set_onload(None);
        }
    }
}

/// Viewer opened with `window.open`
pub struct ExternalWindowSurface {
    features: Option<String>,
    window: Option<Window>,
}

impl ExternalWindowSurface {
    pub fn new(features: Option<String>) -> Self {
        Self {
            features,
            window: None,
        }
    }
}

impl ViewerSurface for ExternalWindowSurface {
    fn open(&mut self, url: &str) -> Result<Rc<dyn RemoteHandle>> {
        let host = web_sys::window()
            .ok_or_else(|| BridgeError::Protocol("no global window".to_string()))?;
        let opened = match &self.features {
            Some(features) => host.open_with_url_and_target_and_features(url, "_blank", features),
            None => host.open_with_url_and_target(url, "_blank"),
        };
        // Blockers either throw or hand back null
        let window = match opened {
            Ok(Some(window)) => window,
            _ => return Err(BridgeError::PopupBlocked),
        };
        self.window = Some(window.clone());
        Ok(Rc::new(WindowHandle {
            target: Target::Window(window),
        }))
    }

    fn is_closed(&self) -> bool {
        self.window
            .as_ref()
            .map(|w| w.closed().unwrap_or(true))
            .unwrap_or(false)
    }

    fn close(&mut self) {
        if let Some(window) = self.window.take() {
            let _ = window.close();
        }
    }

    fn probe_readiness(&self) -> Option<ReadinessStage> {
        probe_window(self.window.as_ref()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_app() {
        assert_eq!(stage_from_app(false, false, false), ReadinessStage::ScriptLoaded);
        assert_eq!(stage_from_app(true, false, false), ReadinessStage::ApplicationReady);
        assert_eq!(stage_from_app(true, true, false), ReadinessStage::ViewerReady);
        assert_eq!(stage_from_app(true, true, true), ReadinessStage::DocumentLoaded);
    }
}
