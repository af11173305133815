//! Viewer event vocabulary and the host-facing event stream

use serde::Serialize;
use serde_json::Value;

use crate::bridge::BridgeState;
use crate::origin::PropertyChange;

/// Events the viewer may report; anything else is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerEventKind {
    BeforePrint,
    AfterPrint,
    PagesLoaded,
    PageChange,
    DocumentError,
    DocumentInit,
    PagesInit,
    PresentationModeChanged,
    OpenFile,
    Find,
    FindMatchesCount,
    MetadataLoaded,
    OutlineLoaded,
    PageRendered,
    AnnotationLayerRendered,
    BookmarkClick,
    Idle,
    ScaleChange,
    RotationChange,
    CursorToolChange,
    ScrollModeChange,
    SpreadModeChange,
    PageModeChange,
}

impl ViewerEventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "beforePrint" => Self::BeforePrint,
            "afterPrint" => Self::AfterPrint,
            "pagesLoaded" => Self::PagesLoaded,
            "pageChange" => Self::PageChange,
            "documentError" => Self::DocumentError,
            "documentInit" => Self::DocumentInit,
            "pagesInit" => Self::PagesInit,
            "presentationModeChanged" => Self::PresentationModeChanged,
            "openFile" => Self::OpenFile,
            "find" => Self::Find,
            "updateFindMatchesCount" => Self::FindMatchesCount,
            "metadataLoaded" => Self::MetadataLoaded,
            "outlineLoaded" => Self::OutlineLoaded,
            "pageRendered" => Self::PageRendered,
            "annotationLayerRendered" => Self::AnnotationLayerRendered,
            "bookmarkClick" => Self::BookmarkClick,
            "idle" => Self::Idle,
            "scaleChange" => Self::ScaleChange,
            "rotationChange" => Self::RotationChange,
            "cursorToolChange" => Self::CursorToolChange,
            "scrollModeChange" => Self::ScrollModeChange,
            "spreadModeChange" => Self::SpreadModeChange,
            "pageModeChange" => Self::PageModeChange,
            _ => return None,
        };
        Some(kind)
    }
}

/// Output surfaced to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BridgeEvent {
    BeforePrint,
    AfterPrint,
    DocumentLoad { page_count: u32 },
    PageChange { page: u32 },
    DocumentError { message: String },
    DocumentInit,
    PagesInit,
    PresentationModeChanged { detail: Value },
    OpenFile,
    Find { detail: Value },
    FindMatchesCount { current: u32, total: u32 },
    MetadataLoaded { metadata: Value },
    OutlineLoaded { outline: Value },
    PageRendered { page: u32 },
    AnnotationLayerRendered { page: u32 },
    BookmarkClick { detail: Value },
    Idle,
    PropertyChanged(PropertyChange),
    StateChanged { state: BridgeState },
}

/// Page number from either a bare number or `{ "pageNumber": n }`
pub fn param_page(param: &Value) -> Option<u32> {
    let raw = match param {
        Value::Object(map) => map.get("pageNumber").or_else(|| map.get("page"))?,
        other => other,
    };
    let page = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    u32::try_from(page).ok().filter(|p| *p >= 1)
}

/// `{current, total}` either at the top level or under `matchesCount`
pub fn param_matches(param: &Value) -> (u32, u32) {
    let counts = param.get("matchesCount").unwrap_or(param);
    let read = |key: &str| {
        counts
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    };
    (read("current"), read("total"))
}

/// Value of a property report, `{ "value": x }` or bare
pub fn param_value(param: &Value) -> &Value {
    param.get("value").unwrap_or(param)
}

impl BridgeEvent {
    /// Events that need no bridge state to translate
    pub fn stateless(kind: ViewerEventKind, param: &Value) -> Option<Self> {
        let event = match kind {
            ViewerEventKind::BeforePrint => Self::BeforePrint,
            ViewerEventKind::AfterPrint => Self::AfterPrint,
            ViewerEventKind::DocumentError => Self::DocumentError {
                message: param
                    .as_str()
                    .map(str::to_string)
                    .or_else(|| param.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| "Unknown document error".to_string()),
            },
            ViewerEventKind::DocumentInit => Self::DocumentInit,
            ViewerEventKind::PagesInit => Self::PagesInit,
            ViewerEventKind::PresentationModeChanged => Self::PresentationModeChanged {
                detail: param.clone(),
            },
            ViewerEventKind::OpenFile => Self::OpenFile,
            ViewerEventKind::Find => Self::Find {
                detail: param.clone(),
            },
            ViewerEventKind::FindMatchesCount => {
                let (current, total) = param_matches(param);
                Self::FindMatchesCount { current, total }
            }
            ViewerEventKind::MetadataLoaded => Self::MetadataLoaded {
                metadata: param.clone(),
            },
            ViewerEventKind::OutlineLoaded => Self::OutlineLoaded {
                outline: param.clone(),
            },
            ViewerEventKind::PageRendered => Self::PageRendered {
                page: param_page(param)?,
            },
            ViewerEventKind::AnnotationLayerRendered => Self::AnnotationLayerRendered {
                page: param_page(param)?,
            },
            ViewerEventKind::BookmarkClick => Self::BookmarkClick {
                detail: param.clone(),
            },
            ViewerEventKind::Idle => Self::Idle,
            _ => return None,
        };
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vocabulary() {
        assert_eq!(
            ViewerEventKind::from_name("pageChange"),
            Some(ViewerEventKind::PageChange)
        );
        assert_eq!(
            ViewerEventKind::from_name("updateFindMatchesCount"),
            Some(ViewerEventKind::FindMatchesCount)
        );
        assert_eq!(ViewerEventKind::from_name("pagechange"), None);
        assert_eq!(ViewerEventKind::from_name("mystery"), None);
    }

    #[test]
    fn test_param_page() {
        assert_eq!(param_page(&json!(3)), Some(3));
        assert_eq!(param_page(&json!("7")), Some(7));
        assert_eq!(param_page(&json!({"pageNumber": 2})), Some(2));
        assert_eq!(param_page(&json!(0)), None);
        assert_eq!(param_page(&json!(null)), None);
    }

    #[test]
    fn test_param_matches() {
        assert_eq!(param_matches(&json!({"current": 2, "total": 9})), (2, 9));
        assert_eq!(
            param_matches(&json!({"matchesCount": {"current": 1, "total": 4}})),
            (1, 4)
        );
        assert_eq!(param_matches(&json!(null)), (0, 0));
    }

    #[test]
    fn test_stateless_translation() {
        assert_eq!(
            BridgeEvent::stateless(ViewerEventKind::DocumentError, &json!("Missing PDF")),
            Some(BridgeEvent::DocumentError {
                message: "Missing PDF".to_string()
            })
        );
        assert_eq!(
            BridgeEvent::stateless(ViewerEventKind::PageRendered, &json!({"pageNumber": 5})),
            Some(BridgeEvent::PageRendered { page: 5 })
        );
        assert_eq!(
            BridgeEvent::stateless(ViewerEventKind::PageChange, &json!(2)),
            None
        );
    }
}
