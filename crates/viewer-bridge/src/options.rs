//! Viewer configuration
//!
//! Everything the host can configure before the viewer loads. Options can be
//! built in code or loaded from TOML:
//!
//! ```toml
//! viewer_folder = "assets/pdfjs"
//! viewer_id = "main-viewer"
//! source = "/files/report.pdf"
//! download = true
//! zoom = "page-width"
//! cursor = "hand"
//!
//! [events]
//! page_change = true
//! pages_loaded = true
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::transform::{CursorTool, PageMode, Rotation, ScrollMode, SpreadMode, ViewerMode, Zoom};

/// Viewer events the host wants forwarded. Each one turns on the matching
/// bootstrap flag so the viewer starts reporting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSubscriptions {
    pub before_print: bool,
    pub after_print: bool,
    pub pages_loaded: bool,
    pub page_change: bool,
}

impl EventSubscriptions {
    pub fn all() -> Self {
        Self {
            before_print: true,
            after_print: true,
            pages_loaded: true,
            page_change: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Folder containing `web/viewer.html` (default: `assets/pdfjs`)
    pub viewer_folder: String,
    /// Identifier echoed back by the viewer on every event
    pub viewer_id: Option<String>,
    /// Document URL (or blob URL) handed to the viewer as `file`
    pub source: Option<String>,
    /// Open the viewer in a separate window instead of an iframe
    pub external_window: bool,
    /// Feature string passed to `window.open`
    pub external_window_options: Option<String>,
    /// Emit diagnostic logs; never changes behavior
    pub diagnostic_logs: bool,
    pub events: EventSubscriptions,

    pub download_file_name: Option<String>,
    pub open_file: Option<bool>,
    pub download: Option<bool>,
    pub start_download: Option<bool>,
    pub view_bookmark: Option<bool>,
    pub print: Option<bool>,
    pub start_print: Option<bool>,
    pub full_screen: Option<bool>,
    pub find: Option<bool>,
    pub last_page: bool,
    pub rotate_cw: bool,
    pub rotate_ccw: bool,
    pub cursor: Option<String>,
    pub scroll: Option<String>,
    pub spread: Option<String>,
    pub locale: Option<String>,
    pub use_only_css_zoom: Option<bool>,

    pub page: Option<u32>,
    pub zoom: Option<String>,
    pub named_dest: Option<String>,
    pub page_mode: Option<String>,
    /// Initial rotation in degrees, applied once the document loads
    pub rotation: Option<i64>,

    pub error_message: Option<String>,
    pub error_override: bool,
    pub error_append: bool,

    /// Delay between readiness probes (default: 100ms)
    pub readiness_poll_interval_ms: u64,
    /// Probes before giving up on the viewer (default: 50)
    pub readiness_max_attempts: u32,
    /// How long a dispatched command waits for its response (default: 10s)
    pub response_timeout_ms: u64,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            viewer_folder: "assets/pdfjs".to_string(),
            viewer_id: None,
            source: None,
            external_window: false,
            external_window_options: None,
            diagnostic_logs: false,
            events: EventSubscriptions::default(),
            download_file_name: None,
            open_file: None,
            download: None,
            start_download: None,
            view_bookmark: None,
            print: None,
            start_print: None,
            full_screen: None,
            find: None,
            last_page: false,
            rotate_cw: false,
            rotate_ccw: false,
            cursor: None,
            scroll: None,
            spread: None,
            locale: None,
            use_only_css_zoom: None,
            page: None,
            zoom: None,
            named_dest: None,
            page_mode: None,
            rotation: None,
            error_message: None,
            error_override: false,
            error_append: false,
            readiness_poll_interval_ms: 100,
            readiness_max_attempts: 50,
            response_timeout_ms: 10_000,
        }
    }
}

impl ViewerOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    /// Load options from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read viewer config: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate options from a TOML string
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let options: Self = toml::from_str(s).context("Failed to parse viewer config")?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.viewer_folder.trim().is_empty() {
            bail!("viewer_folder must not be empty");
        }
        if self.page == Some(0) {
            bail!("page numbers start at 1");
        }
        if self.readiness_max_attempts == 0 {
            bail!("readiness_max_attempts must be at least 1");
        }
        if (self.error_override || self.error_append) && self.error_message.is_none() {
            bail!("error_override/error_append require error_message");
        }
        Ok(())
    }

    pub fn with_viewer_id(mut self, id: impl Into<String>) -> Self {
        self.viewer_id = Some(id.into());
        self
    }

    pub fn with_viewer_folder(mut self, folder: impl Into<String>) -> Self {
        self.viewer_folder = folder.into();
        self
    }

    pub fn with_events(mut self, events: EventSubscriptions) -> Self {
        self.events = events;
        self
    }

    pub fn with_external_window(mut self, features: Option<String>) -> Self {
        self.external_window = true;
        self.external_window_options = features;
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostic_logs = enabled;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_zoom(mut self, zoom: impl Into<String>) -> Self {
        self.zoom = Some(zoom.into());
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>, override_default: bool) -> Self {
        self.error_message = Some(message.into());
        self.error_override = override_default;
        self.error_append = !override_default;
        self
    }

    pub fn zoom_value(&self) -> Option<Zoom> {
        self.zoom.as_deref().map(Zoom::from_host)
    }

    pub fn cursor_value(&self) -> Option<CursorTool> {
        self.cursor.as_deref().map(CursorTool::from_host)
    }

    pub fn scroll_value(&self) -> Option<ScrollMode> {
        self.scroll.as_deref().map(ScrollMode::from_host)
    }

    pub fn spread_value(&self) -> Option<SpreadMode> {
        self.spread.as_deref().map(SpreadMode::from_host)
    }

    pub fn page_mode_value(&self) -> Option<PageMode> {
        self.page_mode.as_deref().map(PageMode::from_host)
    }

    pub fn rotation_value(&self) -> Option<Rotation> {
        self.rotation.map(Rotation::from_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ViewerOptions::default();
        assert_eq!(options.viewer_folder, "assets/pdfjs");
        assert_eq!(options.readiness_max_attempts, 50);
        assert!(!options.external_window);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            viewer_id = "main"
            source = "/docs/a.pdf"
            download = true
            zoom = "150%"
            cursor = "grab"
            page = 3

            [events]
            page_change = true
        "#;
        let options = ViewerOptions::from_toml_str(toml).unwrap();
        assert_eq!(options.viewer_id.as_deref(), Some("main"));
        assert_eq!(options.download, Some(true));
        assert_eq!(options.zoom_value(), Some(Zoom::Percent(150)));
        assert_eq!(options.cursor_value(), Some(CursorTool::Hand));
        assert!(options.events.page_change);
        assert!(!options.events.before_print);
        assert_eq!(options.viewer_folder, "assets/pdfjs");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(ViewerOptions::from_toml_str("page = 0").is_err());
        assert!(ViewerOptions::from_toml_str("readiness_max_attempts = 0").is_err());
        assert!(ViewerOptions::from_toml_str("error_override = true").is_err());
        assert!(ViewerOptions::from_toml_str("page = \"three\"").is_err());
    }

    #[test]
    fn test_builders() {
        let options = ViewerOptions::new("a.pdf")
            .with_viewer_id("v1")
            .with_page(4)
            .with_error_message("Could not load", true);
        assert_eq!(options.source.as_deref(), Some("a.pdf"));
        assert_eq!(options.page, Some(4));
        assert!(options.error_override);
        assert!(!options.error_append);
        assert!(options.validate().is_ok());
    }
}
