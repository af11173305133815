//! Control commands understood by the remote viewer
//!
//! Commands are typed on the Rust side and only turned into the
//! `action` string tag plus JSON payload at the transport boundary.

use serde_json::{json, Value};

use crate::error::{BridgeError, Result};
use crate::queue::QueueBucket;
use crate::transform::{CursorTool, PageMode, Rotation, ScrollMode, SpreadMode, ViewerMode, Zoom};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    ShowDownload(bool),
    ShowPrint(bool),
    ShowFullscreen(bool),
    ShowFind(bool),
    ShowBookmark(bool),
    ShowOpenFile(bool),
    SetErrorMessage {
        message: String,
        override_default: bool,
        append: bool,
    },
    SetLocale(String),
    SetZoom(Zoom),
    SetCursor(CursorTool),
    SetScroll(ScrollMode),
    SetSpread(SpreadMode),
    SetPage(u32),
    SetRotation(Rotation),
    GoToLastPage,
    GoToNamedDest(String),
    UpdatePageMode(PageMode),
    TriggerDownload,
    TriggerPrint,
    TriggerRotateCw,
    TriggerRotateCcw,
    /// Action outside the built-in vocabulary, passed through untouched
    Raw { action: String, payload: Value },
}

impl ViewerCommand {
    /// Wire tag for the `action` field
    pub fn action(&self) -> &str {
        match self {
            Self::ShowDownload(_) => "show-download",
            Self::ShowPrint(_) => "show-print",
            Self::ShowFullscreen(_) => "show-fullscreen",
            Self::ShowFind(_) => "show-find",
            Self::ShowBookmark(_) => "show-bookmark",
            Self::ShowOpenFile(_) => "show-openfile",
            Self::SetErrorMessage { .. } => "set-error-message",
            Self::SetLocale(_) => "set-locale",
            Self::SetZoom(_) => "set-zoom",
            Self::SetCursor(_) => "set-cursor",
            Self::SetScroll(_) => "set-scroll",
            Self::SetSpread(_) => "set-spread",
            Self::SetPage(_) => "set-page",
            Self::SetRotation(_) => "set-rotation",
            Self::GoToLastPage => "go-to-last-page",
            Self::GoToNamedDest(_) => "go-to-named-dest",
            Self::UpdatePageMode(_) => "update-page-mode",
            Self::TriggerDownload => "trigger-download",
            Self::TriggerPrint => "trigger-print",
            Self::TriggerRotateCw => "trigger-rotate-cw",
            Self::TriggerRotateCcw => "trigger-rotate-ccw",
            Self::Raw { action, .. } => action.as_str(),
        }
    }

    /// Wire payload in the viewer's representation
    pub fn payload(&self) -> Value {
        match self {
            Self::ShowDownload(v)
            | Self::ShowPrint(v)
            | Self::ShowFullscreen(v)
            | Self::ShowFind(v)
            | Self::ShowBookmark(v)
            | Self::ShowOpenFile(v) => Value::Bool(*v),
            Self::SetErrorMessage {
                message,
                override_default,
                append,
            } => json!({
                "message": message,
                "override": override_default,
                "append": append,
            }),
            Self::SetLocale(locale) => Value::from(locale.as_str()),
            Self::SetZoom(zoom) => zoom.to_viewer(),
            Self::SetCursor(cursor) => cursor.to_viewer(),
            Self::SetScroll(scroll) => scroll.to_viewer(),
            Self::SetSpread(spread) => spread.to_viewer(),
            Self::SetPage(page) => Value::from(*page),
            Self::SetRotation(rotation) => rotation.to_viewer(),
            Self::GoToNamedDest(dest) => Value::from(dest.as_str()),
            Self::UpdatePageMode(mode) => mode.to_viewer(),
            Self::GoToLastPage
            | Self::TriggerDownload
            | Self::TriggerPrint
            | Self::TriggerRotateCw
            | Self::TriggerRotateCcw => Value::Null,
            Self::Raw { payload, .. } => payload.clone(),
        }
    }

    /// Bucket a command waits in when queued as a property change.
    ///
    /// Error text only needs a live channel, toolbar toggles and mode
    /// switches need the viewer components, and anything that addresses
    /// pages needs a loaded document.
    pub fn default_bucket(&self) -> QueueBucket {
        match self {
            Self::SetErrorMessage { .. } | Self::SetLocale(_) => QueueBucket::Immediate,
            Self::ShowDownload(_)
            | Self::ShowPrint(_)
            | Self::ShowFullscreen(_)
            | Self::ShowFind(_)
            | Self::ShowBookmark(_)
            | Self::ShowOpenFile(_)
            | Self::SetCursor(_)
            | Self::SetScroll(_)
            | Self::SetSpread(_) => QueueBucket::ViewerReady,
            Self::SetZoom(_)
            | Self::SetPage(_)
            | Self::SetRotation(_)
            | Self::GoToLastPage
            | Self::GoToNamedDest(_)
            | Self::UpdatePageMode(_)
            | Self::TriggerDownload
            | Self::TriggerPrint
            | Self::TriggerRotateCw
            | Self::TriggerRotateCcw => QueueBucket::DocumentLoaded,
            Self::Raw { .. } => QueueBucket::OnDemand,
        }
    }

    /// Decode a command from its wire form, the way the viewer-side handler
    /// does. Unknown tags and malformed payloads are errors.
    pub fn parse(action: &str, payload: &Value) -> Result<Self> {
        let invalid = |reason: &str| BridgeError::InvalidPayload {
            action: action.to_string(),
            reason: reason.to_string(),
        };
        let flag = || payload.as_bool().ok_or_else(|| invalid("expected boolean"));
        let text = || {
            payload
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid("expected string"))
        };

        let command = match action {
            "show-download" => Self::ShowDownload(flag()?),
            "show-print" => Self::ShowPrint(flag()?),
            "show-fullscreen" => Self::ShowFullscreen(flag()?),
            "show-find" => Self::ShowFind(flag()?),
            "show-bookmark" => Self::ShowBookmark(flag()?),
            "show-openfile" => Self::ShowOpenFile(flag()?),
            "set-error-message" => Self::SetErrorMessage {
                message: payload
                    .get("message")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid("missing message"))?
                    .to_string(),
                override_default: payload
                    .get("override")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                append: payload
                    .get("append")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "set-locale" => Self::SetLocale(text()?),
            "set-zoom" => Self::SetZoom(Zoom::from_viewer(payload)),
            "set-cursor" => Self::SetCursor(CursorTool::from_viewer(payload)),
            "set-scroll" => Self::SetScroll(ScrollMode::from_viewer(payload)),
            "set-spread" => Self::SetSpread(SpreadMode::from_viewer(payload)),
            "set-page" => {
                let page = payload
                    .as_u64()
                    .filter(|p| *p >= 1 && *p <= u32::MAX as u64)
                    .ok_or_else(|| invalid("expected page number >= 1"))?;
                Self::SetPage(page as u32)
            }
            "set-rotation" => Self::SetRotation(Rotation::from_viewer(payload)),
            "go-to-last-page" => Self::GoToLastPage,
            "go-to-named-dest" => Self::GoToNamedDest(text()?),
            "update-page-mode" => Self::UpdatePageMode(PageMode::from_viewer(payload)),
            "trigger-download" => Self::TriggerDownload,
            "trigger-print" => Self::TriggerPrint,
            "trigger-rotate-cw" => Self::TriggerRotateCw,
            "trigger-rotate-ccw" => Self::TriggerRotateCcw,
            other => return Err(BridgeError::UnknownAction(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_payloads() {
        let cmd = ViewerCommand::SetZoom(Zoom::Percent(150));
        assert_eq!(cmd.action(), "set-zoom");
        assert_eq!(cmd.payload(), json!(1.5));

        let cmd = ViewerCommand::SetScroll(ScrollMode::Horizontal);
        assert_eq!(cmd.payload(), json!(1));

        assert_eq!(ViewerCommand::TriggerPrint.payload(), Value::Null);
    }

    #[test]
    fn test_parse_inverts_tagging() {
        let commands = vec![
            ViewerCommand::ShowFind(false),
            ViewerCommand::SetPage(7),
            ViewerCommand::SetRotation(Rotation::from_degrees(180)),
            ViewerCommand::GoToNamedDest("chapter-2".to_string()),
            ViewerCommand::UpdatePageMode(PageMode::Attachments),
            ViewerCommand::SetErrorMessage {
                message: "Oops".to_string(),
                override_default: true,
                append: false,
            },
        ];
        for cmd in commands {
            let parsed = ViewerCommand::parse(cmd.action(), &cmd.payload()).unwrap();
            assert_eq!(parsed, cmd);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let err = ViewerCommand::parse("bad-action", &Value::Null).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownAction(ref a) if a == "bad-action"));
    }

    #[test]
    fn test_parse_rejects_bad_payload() {
        let err = ViewerCommand::parse("set-page", &json!(0)).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPayload { .. }));

        let err = ViewerCommand::parse("show-print", &json!("yes")).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPayload { .. }));
    }

    #[test]
    fn test_default_buckets() {
        assert_eq!(
            ViewerCommand::SetLocale("de".into()).default_bucket(),
            QueueBucket::Immediate
        );
        assert_eq!(
            ViewerCommand::ShowDownload(true).default_bucket(),
            QueueBucket::ViewerReady
        );
        assert_eq!(
            ViewerCommand::SetPage(2).default_bucket(),
            QueueBucket::DocumentLoaded
        );
    }
}
