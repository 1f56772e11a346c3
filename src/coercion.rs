//! Value-level transforms keyed by the engine's column type.
//!
//! The reported type string is never changed; only cell values are.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::models::{Column, Row};

pub type Coercion = fn(Value) -> Value;

/// Base type tag -> transform. Anything not listed passes through.
static COERCIONS: &[(&str, Coercion)] = &[
    ("varbinary", decode_binary),
    ("array", composite),
    ("map", composite),
    ("row", composite),
];

/// `array<bigint>` -> `array`, `row<bigint,bigint>('a','b')` -> `row`.
fn base_type(type_name: &str) -> &str {
    type_name
        .split(['<', '('])
        .next()
        .unwrap_or_default()
        .trim()
}

pub fn coercion_for(type_name: &str) -> Coercion {
    let tag = base_type(type_name);
    COERCIONS
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(tag))
        .map(|(_, f)| *f)
        .unwrap_or(identity)
}

/// Resolves one transform per column. Done once, when columns arrive.
pub fn coercions_for(columns: &[Column]) -> Vec<Coercion> {
    columns.iter().map(|c| coercion_for(&c.type_name)).collect()
}

/// Applies each column's transform to the matching cell. Cells past the
/// known columns are left alone.
pub fn coerce_row(coercions: &[Coercion], row: Row) -> Row {
    row.into_iter()
        .enumerate()
        .map(|(i, cell)| match coercions.get(i) {
            Some(coerce) if !cell.is_null() => coerce(cell),
            _ => cell,
        })
        .collect()
}

fn identity(v: Value) -> Value {
    v
}

/// Base64 on the wire. Text comes back as a string, other bytes as hex.
fn decode_binary(v: Value) -> Value {
    let Value::String(encoded) = &v else {
        return v;
    };
    match STANDARD.decode(encoded.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::String(text),
            Err(e) => Value::String(hex(e.as_bytes())),
        },
        Err(_) => v,
    }
}

/// Arrays, maps and rows are already nested JSON; map keys are strings on
/// the wire, so there is nothing to rewrite.
fn composite(v: Value) -> Value {
    v
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
