// Cell rendering shared by the tabular and document exporters.

use chrono::DateTime;
use serde_json::{Number, Value};

/// Output format for timestamp strings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a field value as display text.
///
/// RFC 3339 timestamps are reformatted, booleans become `Yes`/`No`, null is
/// empty, nested arrays and objects are written as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "Yes".into(),
        Value::Bool(false) => "No".into(),
        Value::Number(n) => render_number(n),
        Value::String(s) => render_string(s),
        nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
    }
}

fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else if let Some(f) = n.as_f64() {
        // f64's Display is the shortest round-tripping form: 2.0 -> "2".
        f.to_string()
    } else {
        n.to_string()
    }
}

fn render_string(s: &str) -> String {
    match DateTime::parse_from_rfc3339(s) {
        Ok(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        Err(_) => s.to_owned(),
    }
}
