//! Field readers over untyped JSON payloads
//!
//! Every reader takes an alias list: the first alias present with a non-null
//! value wins. Missing or unreadable fields fall back to the caller's default.

use serde_json::Value;

/// First non-null value under any of `aliases`
pub fn lookup<'a>(obj: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| obj.get(*alias))
        .find(|v| !v.is_null())
}

/// Whether any alias is present at all, even with a null value
pub fn has_any(obj: &Value, aliases: &[&str]) -> bool {
    aliases.iter().any(|alias| obj.get(*alias).is_some())
}

pub fn str_field(obj: &Value, aliases: &[&str], default: &str) -> String {
    match lookup(obj, aliases) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

pub fn num_field(obj: &Value, aliases: &[&str], default: f64) -> f64 {
    match lookup(obj, aliases) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => parse_decimal(s).unwrap_or(default),
        _ => default,
    }
}

pub fn int_field(obj: &Value, aliases: &[&str], default: i64) -> i64 {
    match lookup(obj, aliases) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => parse_decimal(s).map(|f| f.trunc() as i64).unwrap_or(default),
        _ => default,
    }
}

pub fn uint_field(obj: &Value, aliases: &[&str], default: u32) -> u32 {
    let value = int_field(obj, aliases, default as i64);
    u32::try_from(value).unwrap_or(default)
}

pub fn bool_field(obj: &Value, aliases: &[&str], default: bool) -> bool {
    match lookup(obj, aliases) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
        Some(Value::String(s)) => parse_flag(s).unwrap_or(default),
        _ => default,
    }
}

pub fn array_field<'a>(obj: &'a Value, aliases: &[&str]) -> Option<&'a Vec<Value>> {
    lookup(obj, aliases).and_then(Value::as_array)
}

/// Parses spreadsheet-style numbers: `12.5`, `"12,50"`, `"R$ 1.234,56"`
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    normalized.parse().ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "sim" | "s" | "yes" | "y" | "ativo" => Some(true),
        "false" | "0" | "nao" | "não" | "n" | "no" | "inativo" => Some(false),
        _ => None,
    }
}
