//! Body normalisation for request log entries.
//!
//! Text that parses as JSON is re-emitted as 2-space indented JSON with key
//! order preserved; otherwise well-formed XML is re-indented; anything else
//! is stored verbatim. Structured values are always rendered as pretty JSON.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use serde_json::Value;
use tracing::debug;

/// Normalise a loggable value into display text.
///
/// Returns `None` for null and empty values so they are not stored.
pub fn normalize(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => normalize_text(text),
        Value::Object(_) | Value::Array(_) => match serde_json::to_string_pretty(value) {
            Ok(pretty) => Some(pretty),
            Err(error) => {
                debug!(%error, "failed to pretty-print structured log value");
                Some(value.to_string())
            }
        },
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
    }
}

/// Normalise a raw text body.
pub fn normalize_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(text)
        && let Ok(pretty) = serde_json::to_string_pretty(&parsed)
    {
        return Some(pretty);
    }

    if let Some(pretty) = pretty_xml(text) {
        return Some(pretty);
    }

    Some(text.to_string())
}

/// Re-indent a well-formed XML document, or `None` when `text` is not one.
///
/// A document must have exactly one root element, balanced tags and no
/// character data outside the root. Whitespace-only text between elements is
/// replaced by the new indentation; any other text is kept as is.
pub fn pretty_xml(text: &str) -> Option<String> {
    let mut reader = Reader::from_str(text);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut depth: usize = 0;
    let mut roots: usize = 0;

    loop {
        let event = match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => event,
            Err(error) => {
                debug!(%error, "log body is not well-formed XML");
                return None;
            }
        };

        match &event {
            Event::Start(_) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.checked_sub(1)?;
            }
            Event::Empty(_) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => continue,
            Event::Text(_) | Event::CData(_) if depth == 0 => return None,
            _ => {}
        }

        if roots > 1 {
            return None;
        }

        writer.write_event(event).ok()?;
    }

    if depth != 0 || roots != 1 {
        return None;
    }

    String::from_utf8(writer.into_inner()).ok()
}

/// Split a normalised body into its inline text and binary side-field.
///
/// Text longer than `limit_bytes` moves to the side-field byte-exact and the
/// inline text is blanked.
pub fn fit_inline(text: Option<String>, limit_bytes: usize) -> (Option<String>, Option<Vec<u8>>) {
    match text {
        Some(text) if text.len() > limit_bytes => (Some(String::new()), Some(text.into_bytes())),
        other => (other, None),
    }
}
