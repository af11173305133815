//! Property transformers between host values and viewer values
//!
//! Every function here is total: malformed input falls back to the
//! documented default instead of failing.
//!
//! | Property | Host form | Viewer form | Fallback |
//! |----------|-----------|-------------|----------|
//! | Zoom | `"150"`, `"150%"`, `"page-width"` | `1.5`, `"page-width"` | `auto` |
//! | Rotation | any integer degrees | `0/90/180/270` | `0` |
//! | Cursor | `"hand"`, `"select"`, ... | `0..=2` | select |
//! | Scroll | `"wrapped"`, ... | `0..=3` | vertical |
//! | Spread | `"odd"`, ... | `0..=2` | none |
//! | Page mode | `"thumbs"`, ... | `"thumbs"` | none |

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_ZOOM_PERCENT: u32 = 10;
pub const MAX_ZOOM_PERCENT: u32 = 1000;

/// Lowercase and drop separators so `Page-Width`, `page_width` and
/// `PAGEWIDTH` compare equal
fn normalize_keyword(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

fn clamp_percent(percent: f64) -> u32 {
    percent
        .round()
        .clamp(MIN_ZOOM_PERCENT as f64, MAX_ZOOM_PERCENT as f64) as u32
}

/// Zoom level as the host sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Zoom {
    #[default]
    Auto,
    PageWidth,
    PageFit,
    PageHeight,
    PageActual,
    /// Explicit scale in percent, always within `10..=1000`
    Percent(u32),
}

impl Zoom {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "auto" => Some(Self::Auto),
            "pagewidth" | "width" => Some(Self::PageWidth),
            "pagefit" | "fit" | "page" => Some(Self::PageFit),
            "pageheight" | "height" => Some(Self::PageHeight),
            "pageactual" | "actual" | "actualsize" => Some(Self::PageActual),
            _ => None,
        }
    }

    /// Parse a host value such as `"150"`, `"150%"` or `"page-width"`
    pub fn from_host(input: &str) -> Self {
        let trimmed = input.trim();
        let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        if let Ok(percent) = numeric.parse::<f64>() {
            if percent.is_finite() && percent > 0.0 {
                return Self::Percent(clamp_percent(percent));
            }
            return Self::Auto;
        }
        Self::from_keyword(&normalize_keyword(trimmed)).unwrap_or_default()
    }

    pub fn as_host_str(&self) -> String {
        match self {
            Self::Percent(p) => p.to_string(),
            keyword => keyword.keyword().to_string(),
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::PageWidth => "page-width",
            Self::PageFit => "page-fit",
            Self::PageHeight => "page-height",
            Self::PageActual => "page-actual",
            Self::Percent(_) => "",
        }
    }

    /// Value assigned to the viewer's `currentScaleValue`
    pub fn to_viewer(&self) -> Value {
        match self {
            Self::Percent(p) => Value::from(*p as f64 / 100.0),
            keyword => Value::from(keyword.keyword()),
        }
    }

    /// Decode a scale reported by the viewer. Numbers (and numeric strings)
    /// are scale factors, not percentages.
    pub fn from_viewer(value: &Value) -> Self {
        let scale = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(scale) => Some(scale),
                Err(_) => return Self::from_keyword(&normalize_keyword(s)).unwrap_or_default(),
            },
            _ => None,
        };
        match scale {
            Some(scale) if scale.is_finite() && scale > 0.0 => {
                Self::Percent(clamp_percent(scale * 100.0))
            }
            _ => Self::Auto,
        }
    }

    /// Value used for the `zoom` bootstrap parameter
    pub fn as_url_param(&self) -> String {
        self.as_host_str()
    }
}

/// Page rotation, always a quarter turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rotation(u16);

impl Rotation {
    /// Normalize arbitrary degrees into `0/90/180/270`, snapping to the
    /// nearest quarter turn (ties round up)
    pub fn from_degrees(degrees: i64) -> Self {
        let positive = degrees.rem_euclid(360);
        let quarter = ((positive + 45) / 90) % 4;
        Self((quarter * 90) as u16)
    }

    pub fn degrees(&self) -> u16 {
        self.0
    }

    pub fn from_host(input: &str) -> Self {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_suffix("deg").unwrap_or(trimmed).trim();
        match trimmed.parse::<f64>() {
            Ok(d) if d.is_finite() => Self::from_degrees(d.round() as i64),
            _ => Self::default(),
        }
    }

    pub fn as_host_str(&self) -> String {
        self.0.to_string()
    }

    pub fn to_viewer(&self) -> Value {
        Value::from(self.0)
    }

    pub fn from_viewer(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(d) if d.is_finite() => Self::from_degrees(d.round() as i64),
                _ => Self::default(),
            },
            Value::String(s) => Self::from_host(s),
            _ => Self::default(),
        }
    }

    pub fn rotate_cw(&self) -> Self {
        Self::from_degrees(self.0 as i64 + 90)
    }

    pub fn rotate_ccw(&self) -> Self {
        Self::from_degrees(self.0 as i64 - 90)
    }
}

/// Shared behavior of the keyword-valued viewer modes
pub trait ViewerMode: Sized + Copy + Default + PartialEq + 'static {
    const ALL: &'static [Self];

    /// Canonical lowercase keyword
    fn keyword(self) -> &'static str;

    /// Numeric constant used inside the viewer
    fn viewer_code(self) -> i64;

    /// Match an already-normalized alias
    fn from_alias(alias: &str) -> Option<Self>;

    fn from_host(input: &str) -> Self {
        Self::from_alias(&normalize_keyword(input)).unwrap_or_default()
    }

    fn as_host_str(self) -> &'static str {
        self.keyword()
    }

    fn to_viewer(self) -> Value {
        Value::from(self.viewer_code())
    }

    fn from_viewer(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_i64()
                .and_then(|code| Self::ALL.iter().copied().find(|m| m.viewer_code() == code))
                .unwrap_or_default(),
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(code) => Self::from_viewer(&Value::from(code)),
                Err(_) => Self::from_host(s),
            },
            _ => Self::default(),
        }
    }

    /// Uppercase keyword used in bootstrap query parameters
    fn as_url_param(self) -> String {
        self.keyword().to_uppercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorTool {
    #[default]
    Select,
    Hand,
    Zoom,
}

impl ViewerMode for CursorTool {
    const ALL: &'static [Self] = &[Self::Select, Self::Hand, Self::Zoom];

    fn keyword(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Hand => "hand",
            Self::Zoom => "zoom",
        }
    }

    fn viewer_code(self) -> i64 {
        match self {
            Self::Select => 0,
            Self::Hand => 1,
            Self::Zoom => 2,
        }
    }

    fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "select" | "text" | "selection" => Some(Self::Select),
            "hand" | "grab" | "pan" => Some(Self::Hand),
            "zoom" => Some(Self::Zoom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
    #[default]
    Vertical,
    Horizontal,
    Wrapped,
    Page,
}

impl ViewerMode for ScrollMode {
    const ALL: &'static [Self] = &[Self::Vertical, Self::Horizontal, Self::Wrapped, Self::Page];

    fn keyword(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
            Self::Wrapped => "wrapped",
            Self::Page => "page",
        }
    }

    fn viewer_code(self) -> i64 {
        match self {
            Self::Vertical => 0,
            Self::Horizontal => 1,
            Self::Wrapped => 2,
            Self::Page => 3,
        }
    }

    fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "vertical" | "v" => Some(Self::Vertical),
            "horizontal" | "h" => Some(Self::Horizontal),
            "wrapped" | "wrap" => Some(Self::Wrapped),
            "page" | "single" | "singlepage" => Some(Self::Page),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadMode {
    #[default]
    None,
    Odd,
    Even,
}

impl ViewerMode for SpreadMode {
    const ALL: &'static [Self] = &[Self::None, Self::Odd, Self::Even];

    fn keyword(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Odd => "odd",
            Self::Even => "even",
        }
    }

    fn viewer_code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Odd => 1,
            Self::Even => 2,
        }
    }

    fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "none" | "off" | "single" => Some(Self::None),
            "odd" => Some(Self::Odd),
            "even" => Some(Self::Even),
            _ => None,
        }
    }
}

/// Sidebar content shown when the document opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    #[default]
    None,
    Thumbs,
    Bookmarks,
    Attachments,
    Layers,
}

impl ViewerMode for PageMode {
    const ALL: &'static [Self] = &[
        Self::None,
        Self::Thumbs,
        Self::Bookmarks,
        Self::Attachments,
        Self::Layers,
    ];

    fn keyword(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Thumbs => "thumbs",
            Self::Bookmarks => "bookmarks",
            Self::Attachments => "attachments",
            Self::Layers => "layers",
        }
    }

    fn viewer_code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Thumbs => 1,
            Self::Bookmarks => 2,
            Self::Attachments => 3,
            Self::Layers => 4,
        }
    }

    fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "none" => Some(Self::None),
            "thumbs" | "thumbnails" => Some(Self::Thumbs),
            "bookmarks" | "outline" => Some(Self::Bookmarks),
            "attachments" => Some(Self::Attachments),
            "layers" => Some(Self::Layers),
            _ => None,
        }
    }

    // The viewer's pagemode hash parameter takes the keyword, not the code
    fn to_viewer(self) -> Value {
        Value::from(self.keyword())
    }

    fn as_url_param(self) -> String {
        self.keyword().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_zoom_from_host() {
        assert_eq!(Zoom::from_host("150"), Zoom::Percent(150));
        assert_eq!(Zoom::from_host(" 75% "), Zoom::Percent(75));
        assert_eq!(Zoom::from_host("Page-Width"), Zoom::PageWidth);
        assert_eq!(Zoom::from_host("fit"), Zoom::PageFit);
        assert_eq!(Zoom::from_host("5"), Zoom::Percent(MIN_ZOOM_PERCENT));
        assert_eq!(Zoom::from_host("99999"), Zoom::Percent(MAX_ZOOM_PERCENT));
        assert_eq!(Zoom::from_host("-20"), Zoom::Auto);
        assert_eq!(Zoom::from_host("banana"), Zoom::Auto);
        assert_eq!(Zoom::from_host(""), Zoom::Auto);
    }

    #[test]
    fn test_zoom_viewer_values() {
        assert_eq!(Zoom::Percent(150).to_viewer(), json!(1.5));
        assert_eq!(Zoom::PageFit.to_viewer(), json!("page-fit"));
        assert_eq!(Zoom::from_viewer(&json!(1.25)), Zoom::Percent(125));
        assert_eq!(Zoom::from_viewer(&json!("2")), Zoom::Percent(200));
        assert_eq!(Zoom::from_viewer(&json!("page-width")), Zoom::PageWidth);
        assert_eq!(Zoom::from_viewer(&json!(null)), Zoom::Auto);
        assert_eq!(Zoom::from_viewer(&json!(0)), Zoom::Auto);
    }

    #[test]
    fn test_rotation_normalizes() {
        assert_eq!(Rotation::from_degrees(0).degrees(), 0);
        assert_eq!(Rotation::from_degrees(450).degrees(), 90);
        assert_eq!(Rotation::from_degrees(-90).degrees(), 270);
        assert_eq!(Rotation::from_degrees(44).degrees(), 0);
        assert_eq!(Rotation::from_degrees(45).degrees(), 90);
        assert_eq!(Rotation::from_degrees(359).degrees(), 0);
        assert_eq!(Rotation::from_host("abc").degrees(), 0);
        assert_eq!(Rotation::from_host("180deg").degrees(), 180);
    }

    #[test]
    fn test_rotation_steps() {
        let r = Rotation::from_degrees(270);
        assert_eq!(r.rotate_cw().degrees(), 0);
        assert_eq!(r.rotate_ccw().degrees(), 180);
    }

    #[test]
    fn test_modes_accept_aliases() {
        assert_eq!(CursorTool::from_host("GRAB"), CursorTool::Hand);
        assert_eq!(CursorTool::from_host("text"), CursorTool::Select);
        assert_eq!(ScrollMode::from_host("Wrapped"), ScrollMode::Wrapped);
        assert_eq!(SpreadMode::from_host("even"), SpreadMode::Even);
        assert_eq!(PageMode::from_host("outline"), PageMode::Bookmarks);
    }

    #[test]
    fn test_modes_fall_back_to_default() {
        assert_eq!(CursorTool::from_host("laser"), CursorTool::Select);
        assert_eq!(ScrollMode::from_host(""), ScrollMode::Vertical);
        assert_eq!(SpreadMode::from_viewer(&json!(7)), SpreadMode::None);
        assert_eq!(PageMode::from_viewer(&json!({"x": 1})), PageMode::None);
    }

    #[test]
    fn test_modes_from_viewer_codes() {
        assert_eq!(ScrollMode::from_viewer(&json!(2)), ScrollMode::Wrapped);
        assert_eq!(CursorTool::from_viewer(&json!("1")), CursorTool::Hand);
        assert_eq!(PageMode::from_viewer(&json!("thumbs")), PageMode::Thumbs);
    }

    #[test]
    fn test_url_params() {
        assert_eq!(CursorTool::Hand.as_url_param(), "HAND");
        assert_eq!(ScrollMode::Wrapped.as_url_param(), "WRAPPED");
        assert_eq!(PageMode::Thumbs.as_url_param(), "thumbs");
        assert_eq!(Zoom::Percent(80).as_url_param(), "80");
        assert_eq!(Zoom::PageWidth.as_url_param(), "page-width");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: host parsing never panics and is idempotent on its own output
        #[test]
        fn zoom_host_is_idempotent(input in ".{0,12}") {
            let once = Zoom::from_host(&input);
            prop_assert_eq!(Zoom::from_host(&once.as_host_str()), once);
        }

        /// Property: a viewer round trip preserves every zoom value
        #[test]
        fn zoom_viewer_round_trip(input in ".{0,12}") {
            let zoom = Zoom::from_host(&input);
            prop_assert_eq!(Zoom::from_viewer(&zoom.to_viewer()), zoom);
        }

        /// Property: rotation is always a quarter turn and stable
        #[test]
        fn rotation_is_quarter_turn(degrees in any::<i32>()) {
            let rotation = Rotation::from_degrees(degrees as i64);
            prop_assert_eq!(rotation.degrees() % 90, 0);
            prop_assert!(rotation.degrees() < 360);
            prop_assert_eq!(Rotation::from_viewer(&rotation.to_viewer()), rotation);
        }

        /// Property: mode transformers are total and idempotent, including
        /// unrecognized strings
        #[test]
        fn modes_are_idempotent(input in "[a-zA-Z_ -]{0,12}") {
            let cursor = CursorTool::from_host(&input);
            prop_assert_eq!(CursorTool::from_host(cursor.as_host_str()), cursor);
            prop_assert_eq!(CursorTool::from_viewer(&cursor.to_viewer()), cursor);

            let scroll = ScrollMode::from_host(&input);
            prop_assert_eq!(ScrollMode::from_viewer(&scroll.to_viewer()), scroll);

            let spread = SpreadMode::from_host(&input);
            prop_assert_eq!(SpreadMode::from_viewer(&spread.to_viewer()), spread);

            let mode = PageMode::from_host(&input);
            prop_assert_eq!(PageMode::from_viewer(&mode.to_viewer()), mode);
        }
    }
}
