//! Tolerant parsing of `yabai -m query` output.
//!
//! A query payload is a JSON array of records (or a single object for
//! selector queries). A payload that is not JSON at all is an error; a record
//! that does not match the expected shape is skipped and logged so one bad
//! window never hides the rest of the desktop.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{GatewayError, GatewayResult};
use crate::state::{Rect, Space, SpaceKind, Window};

/// A record that was skipped while parsing a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Record kind ("space", "window", ...).
    pub what: &'static str,
    /// Position of the record in the batch.
    pub position: usize,
    /// Why the record was rejected.
    pub reason: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} record #{}: {}", self.what, self.position, self.reason)
    }
}

/// Layout value reported in a space's `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YabaiLayout {
    Bsp,
    Stack,
    Float,
}

impl YabaiLayout {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bsp => "bsp",
            Self::Stack => "stack",
            Self::Float => "float",
        }
    }
}

impl FromStr for YabaiLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bsp" => Ok(Self::Bsp),
            "stack" => Ok(Self::Stack),
            "float" => Ok(Self::Float),
            other => Err(format!("unknown space type '{other}'")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSpace {
    id: u64,
    index: u32,
    #[serde(default)]
    label: String,
    #[serde(rename = "type")]
    layout: String,
    #[serde(default)]
    display: u32,
    #[serde(default)]
    windows: Vec<u64>,
    #[serde(default)]
    has_focus: bool,
    #[serde(default)]
    is_visible: bool,
    #[serde(default)]
    is_native_fullscreen: bool,
}

impl TryFrom<RawSpace> for Space {
    type Error = String;

    fn try_from(raw: RawSpace) -> Result<Self, Self::Error> {
        let layout: YabaiLayout = raw.layout.parse()?;
        let kind = if raw.is_native_fullscreen {
            SpaceKind::Fullscreen
        } else {
            match layout {
                YabaiLayout::Bsp | YabaiLayout::Stack => SpaceKind::Tiled,
                YabaiLayout::Float => SpaceKind::Floating,
            }
        };

        Ok(Self {
            id: raw.id,
            index: raw.index,
            label: Some(raw.label).filter(|label| !label.is_empty()),
            kind,
            display: raw.display,
            is_focused: raw.has_focus,
            is_visible: raw.is_visible,
            is_native_fullscreen: raw.is_native_fullscreen,
            windows: raw.windows.into_iter().collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawWindow {
    id: u64,
    #[serde(default)]
    pid: i32,
    app: String,
    #[serde(default)]
    title: String,
    space: u32,
    #[serde(default)]
    display: u32,
    #[serde(default)]
    frame: Option<RawFrame>,
    #[serde(default)]
    role: String,
    #[serde(default)]
    subrole: String,
    #[serde(default)]
    stack_index: u32,
    #[serde(default)]
    has_focus: bool,
    #[serde(default)]
    is_native_fullscreen: bool,
    #[serde(default)]
    is_floating: bool,
    #[serde(default)]
    is_minimized: bool,
    #[serde(default)]
    is_hidden: bool,
    #[serde(default)]
    is_visible: bool,
}

impl From<RawWindow> for Window {
    fn from(raw: RawWindow) -> Self {
        Self {
            id: raw.id,
            pid: raw.pid,
            app: raw.app,
            title: raw.title,
            space: raw.space,
            display: raw.display,
            frame: raw.frame.map(|f| Rect::new(f.x, f.y, f.w, f.h)).filter(Rect::is_valid),
            role: raw.role,
            subrole: raw.subrole,
            stack_index: raw.stack_index,
            is_focused: raw.has_focus,
            is_native_fullscreen: raw.is_native_fullscreen,
            is_floating: raw.is_floating,
            is_minimized: raw.is_minimized,
            is_hidden: raw.is_hidden,
            is_visible: raw.is_visible,
        }
    }
}

/// Splits a payload into its JSON records.
///
/// Empty output is an empty batch and a single object is a batch of one.
///
/// # Errors
///
/// Returns [`GatewayError::Malformed`] when the payload is not JSON, or is a
/// JSON scalar.
pub fn split_records(raw: &str, what: &'static str) -> GatewayResult<Vec<Value>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: Value = serde_json::from_str(raw)
        .map_err(|err| GatewayError::Malformed { what, reason: err.to_string() })?;

    match parsed {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        other => Err(GatewayError::Malformed {
            what,
            reason: format!("expected an array or object, got {other}"),
        }),
    }
}

/// Deserializes every record of a batch, skipping the ones that fail.
fn parse_batch<R, T, F>(raw: &str, what: &'static str, convert: F) -> GatewayResult<Vec<T>>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T, String>,
{
    let records = split_records(raw, what)?;
    let mut parsed = Vec::with_capacity(records.len());

    for (position, record) in records.into_iter().enumerate() {
        let result = serde_json::from_value::<R>(record)
            .map_err(|err| err.to_string())
            .and_then(&convert);

        match result {
            Ok(item) => parsed.push(item),
            Err(reason) => {
                let failure = ParseFailure { what, position, reason };
                tracing::warn!("yabai: skipping malformed {failure}");
            }
        }
    }

    Ok(parsed)
}

/// Parses `query --spaces` output.
///
/// # Errors
///
/// Returns [`GatewayError::Malformed`] when the payload as a whole is not JSON.
pub fn parse_spaces(raw: &str) -> GatewayResult<Vec<Space>> {
    parse_batch::<RawSpace, _, _>(raw, "space", Space::try_from)
}

/// Parses `query --windows` output.
///
/// # Errors
///
/// Returns [`GatewayError::Malformed`] when the payload as a whole is not JSON.
pub fn parse_windows(raw: &str) -> GatewayResult<Vec<Window>> {
    parse_batch::<RawWindow, _, _>(raw, "window", |raw| Ok(Window::from(raw)))
}

/// Parses the `type` of a single-space query (`query --spaces --space`).
///
/// # Errors
///
/// Returns [`GatewayError::Malformed`] when no usable space record is present.
pub fn parse_space_layout(raw: &str) -> GatewayResult<YabaiLayout> {
    #[derive(Deserialize)]
    struct LayoutOnly {
        #[serde(rename = "type")]
        layout: String,
    }

    let record = split_records(raw, "space")?.into_iter().next().ok_or_else(|| {
        GatewayError::Malformed { what: "space", reason: "empty output".to_string() }
    })?;

    serde_json::from_value::<LayoutOnly>(record)
        .map_err(|err| err.to_string())
        .and_then(|only| only.layout.parse())
        .map_err(|reason| GatewayError::Malformed { what: "space", reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACES: &str = r#"[
        {"id":3,"uuid":"","index":1,"label":"","type":"bsp","display":1,"windows":[101,102],
         "first-window":101,"last-window":102,"has-focus":true,"is-visible":true,
         "is-native-fullscreen":false},
        {"id":7,"uuid":"","index":2,"label":"web","type":"float","display":1,"windows":[],
         "has-focus":false,"is-visible":false,"is-native-fullscreen":false},
        {"id":9,"uuid":"","index":3,"label":"","type":"bsp","display":1,"windows":[110],
         "has-focus":false,"is-visible":false,"is-native-fullscreen":true}
    ]"#;

    const WINDOWS: &str = r#"[
        {"id":101,"pid":501,"app":"Ghostty","title":"~","frame":{"x":0.0,"y":25.0,"w":756.0,"h":957.0},
         "role":"AXWindow","subrole":"AXStandardWindow","display":1,"space":1,"stack-index":0,
         "has-focus":true,"is-native-fullscreen":false,"is-floating":false,"is-minimized":false,
         "is-hidden":false,"is-visible":true},
        {"id":102,"pid":502,"app":"Safari","title":"Docs","role":"AXWindow",
         "subrole":"AXStandardWindow","display":1,"space":1,"stack-index":2,"has-focus":false,
         "is-visible":true}
    ]"#;

    #[test]
    fn test_parse_empty_output_is_ok() {
        assert!(parse_spaces("  \n").unwrap().is_empty());
        assert!(parse_windows("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_spaces_maps_kind_and_label() {
        let spaces = parse_spaces(SPACES).unwrap();
        assert_eq!(spaces.len(), 3);

        assert_eq!(spaces[0].kind, SpaceKind::Tiled);
        assert_eq!(spaces[0].label, None);
        assert!(spaces[0].is_focused);
        assert_eq!(spaces[0].windows.as_slice(), &[101, 102]);

        assert_eq!(spaces[1].kind, SpaceKind::Floating);
        assert_eq!(spaces[1].label.as_deref(), Some("web"));

        assert_eq!(spaces[2].kind, SpaceKind::Fullscreen);
        assert!(spaces[2].is_native_fullscreen);
    }

    #[test]
    fn test_parse_windows_maps_frame_and_flags() {
        let windows = parse_windows(WINDOWS).unwrap();
        assert_eq!(windows.len(), 2);

        let ghostty = &windows[0];
        assert_eq!(ghostty.app, "Ghostty");
        assert_eq!(ghostty.frame, Some(Rect::new(0.0, 25.0, 756.0, 957.0)));
        assert!(ghostty.is_focused);
        assert!(ghostty.is_displayable());

        let safari = &windows[1];
        assert_eq!(safari.frame, None);
        assert_eq!(safari.stack_index, 2);
        assert!(safari.is_stacked());
    }

    #[test]
    fn test_zero_sized_frame_is_dropped() {
        let raw = r#"[{"id":9,"app":"Preview","space":2,
            "frame":{"x":0.0,"y":0.0,"w":0.0,"h":0.0},"is-minimized":true}]"#;
        let windows = parse_windows(raw).unwrap();
        assert_eq!(windows[0].frame, None);
        assert!(windows[0].is_minimized);
    }

    #[test]
    fn test_malformed_records_are_skipped_and_rest_kept() {
        let raw = r#"[
            {"id":1,"app":"Finder","space":1},
            {"id":"not-a-number","app":"Broken","space":1},
            {"app":"NoId","space":2},
            {"id":4,"app":"Mail","space":2}
        ]"#;

        let windows = parse_windows(raw).unwrap();
        let ids: Vec<u64> = windows.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_unknown_space_type_is_skipped() {
        let raw = r#"[
            {"id":1,"index":1,"type":"bsp"},
            {"id":2,"index":2,"type":"spiral"}
        ]"#;
        let spaces = parse_spaces(raw).unwrap();
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].id, 1);
    }

    #[test]
    fn test_single_object_is_wrapped() {
        let windows = parse_windows(r#"{"id":5,"app":"Notes","space":2}"#).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].id, 5);
    }

    #[test]
    fn test_non_json_payload_is_malformed() {
        let err = parse_spaces("yabai: unknown command").unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { what: "space", .. }));
    }

    #[test]
    fn test_scalar_payload_is_malformed() {
        assert!(matches!(parse_windows("42"), Err(GatewayError::Malformed { .. })));
    }

    #[test]
    fn test_parse_space_layout() {
        assert_eq!(parse_space_layout(r#"{"id":1,"type":"stack"}"#).unwrap(), YabaiLayout::Stack);
        assert_eq!(parse_space_layout(r#"[{"type":"float"}]"#).unwrap(), YabaiLayout::Float);
        assert!(parse_space_layout("").is_err());
        assert!(parse_space_layout(r#"{"type":"circle"}"#).is_err());
    }

    #[test]
    fn test_parse_failure_display() {
        let failure = ParseFailure {
            what: "window",
            position: 3,
            reason: "missing field `app`".to_string(),
        };
        assert_eq!(failure.to_string(), "window record #3: missing field `app`");
    }
}
