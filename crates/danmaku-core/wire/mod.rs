//! Decoding of server comment payloads
//!
//! Servers send comments in one of three JSON shapes:
//!
//! - a flat array of items
//! - an object mapping bucket keys (episode numbers, minute ranges) to arrays
//! - an envelope object whose `data` field holds either of the above
//!
//! Items look like `{"text": "...", "time": 12.5, "color": "#FFFFFF",
//! "mode": 0, "border": false}`. Older endpoints use `content` for the text
//! and `type` for the mode. Colors may be strings or packed integers.
//! Items that do not fit are skipped; only a payload of the wrong overall
//! shape is an error.
//!
//! ```rust
//! use danmaku_core::wire::decode_comments;
//! use danmaku_core::{Mode, Rgb};
//!
//! let records = decode_comments(r##"{"1": [
//!     {"text": "hi\nthere", "time": 3, "color": "#FF0000", "mode": 1}
//! ]}"##)?;
//! assert_eq!(records[0].text, "hi there");
//! assert_eq!(records[0].color, Rgb::new(255, 0, 0));
//! assert_eq!(records[0].mode, Mode::Top);
//! # Ok::<(), danmaku_core::DanmakuError>(())
//! ```

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::model::{CommentRecord, Mode, Rgb};
use crate::utils::{DanmakuError, Result};

#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(alias = "content")]
    text: Option<String>,
    time: f64,
    #[serde(default)]
    color: Option<WireColor>,
    #[serde(default, alias = "type")]
    mode: i64,
    #[serde(default)]
    border: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireColor {
    Packed(u32),
    Text(String),
}

impl WireColor {
    fn to_rgb(&self) -> Rgb {
        match self {
            Self::Packed(packed) => Rgb::from_u32(*packed),
            Self::Text(text) => Rgb::parse_or_white(Some(text)),
        }
    }
}

impl WireItem {
    fn into_record(self) -> CommentRecord {
        CommentRecord {
            text: sanitize_text(self.text.as_deref().unwrap_or_default()),
            appear_second: self.time,
            color: self.color.as_ref().map_or(Rgb::WHITE, WireColor::to_rgb),
            mode: Mode::from_wire(self.mode),
            has_border: self.border,
        }
    }
}

/// Flatten comment text to one line
///
/// Newlines and carriage returns become spaces; surrounding whitespace is
/// trimmed.
#[must_use]
pub fn sanitize_text(input: &str) -> String {
    input.replace(['\n', '\r'], " ").trim().to_string()
}

/// Decode a JSON payload into comment records
///
/// # Errors
///
/// Returns [`DanmakuError::Decode`] if `payload` is not JSON, or is JSON of
/// none of the accepted shapes.
pub fn decode_comments(payload: &str) -> Result<Vec<CommentRecord>> {
    let value: Value = serde_json::from_str(payload)?;
    decode_value(value)
}

/// Decode an already parsed JSON value
///
/// # Errors
///
/// Returns [`DanmakuError::Decode`] for a value of none of the accepted
/// shapes.
pub fn decode_value(value: Value) -> Result<Vec<CommentRecord>> {
    match value {
        Value::Array(items) => Ok(decode_items(items)),
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data") {
                return match data {
                    Value::Null => Ok(Vec::new()),
                    Value::Array(_) | Value::Object(_) => decode_value(data),
                    other => Err(DanmakuError::decode(format!(
                        "envelope `data` is {}",
                        kind(&other)
                    ))),
                };
            }
            let mut records = Vec::new();
            for (key, bucket) in map {
                match bucket {
                    Value::Array(items) => records.extend(decode_items(items)),
                    Value::Null => {}
                    other => {
                        return Err(DanmakuError::decode(format!(
                            "bucket {key:?} is {}, expected an array",
                            kind(&other)
                        )))
                    }
                }
            }
            Ok(records)
        }
        other => Err(DanmakuError::decode(format!(
            "expected an array or object, found {}",
            kind(&other)
        ))),
    }
}

fn decode_items(items: Vec<Value>) -> Vec<CommentRecord> {
    let total = items.len();
    let records: Vec<CommentRecord> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<WireItem>(item) {
            Ok(item) => Some(item.into_record()),
            Err(err) => {
                debug!("Skipping malformed comment item: {err}");
                None
            }
        })
        .collect();
    if records.len() < total {
        debug!("Decoded {} of {total} comment items", records.len());
    }
    records
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_flat_array() {
        let records = decode_comments(
            r##"[
                {"text": "a", "time": 1},
                {"text": "b", "time": 2.5, "color": "#00ff00", "mode": 2, "border": true}
            ]"##,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].color, Rgb::WHITE);
        assert_eq!(records[0].mode, Mode::Scroll);
        assert!((records[1].appear_second - 2.5).abs() < f64::EPSILON);
        assert_eq!(records[1].mode, Mode::Bottom);
        assert!(records[1].has_border);
    }

    #[test]
    fn decodes_envelope_and_legacy_fields() {
        let records = decode_comments(
            r#"{"code": 0, "msg": "ok", "data": [
                {"content": "legacy", "time": 4, "type": 1, "color": 16711680}
            ]}"#,
        )
        .unwrap();
        assert_eq!(records[0].text, "legacy");
        assert_eq!(records[0].mode, Mode::Top);
        assert_eq!(records[0].color, Rgb::new(255, 0, 0));
    }

    #[test]
    fn skips_malformed_items() {
        let records = decode_comments(
            r#"{"0-60000": [
                {"text": "ok", "time": 1},
                {"text": "no time"},
                "not an object",
                {"text": "bad color", "time": 2, "color": "purple"}
            ], "60000-120000": null}"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].color, Rgb::WHITE);
    }

    #[test]
    fn unknown_mode_scrolls() {
        let records = decode_comments(r#"[{"text": "x", "time": 0, "mode": 7}]"#).unwrap();
        assert_eq!(records[0].mode, Mode::Scroll);
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(matches!(
            decode_comments("not json"),
            Err(DanmakuError::Decode(_))
        ));
        assert!(matches!(decode_comments("42"), Err(DanmakuError::Decode(_))));
        assert!(matches!(
            decode_comments(r#"{"1": "nope"}"#),
            Err(DanmakuError::Decode(_))
        ));
        assert!(matches!(
            decode_comments(r#"{"data": true}"#),
            Err(DanmakuError::Decode(_))
        ));
        assert_eq!(decode_comments(r#"{"data": null}"#).unwrap(), Vec::new());
    }

    #[test]
    fn sanitize_flattens_lines() {
        assert_eq!(sanitize_text("  one\ntwo\r\nthree "), "one two  three");
        assert_eq!(sanitize_text("\n"), "");
    }
}
