//! `{placeholder}` template rendering.

use serde_json::Value;

/// Render `template`, replacing each `{key}` with the matching payload value.
///
/// Strings are inserted verbatim, numbers and booleans as their JSON text,
/// arrays and objects as compact JSON. `null`, missing keys, and a payload
/// that is not an object all render as the empty string. An opening brace
/// without a closing one is kept literally. Rendering never fails.
pub fn render(template: &str, payload: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let key = &after_open[..close];
                out.push_str(&value_text(payload.get(key)));
                rest = &after_open[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Text used when a payload value is substituted into a template.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
