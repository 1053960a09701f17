//! Decoding of untyped store documents into [`Planet`] values.
//!
//! Every field goes through an explicit parse step that either yields a
//! typed value or a [`CoreError::MalformedRecord`] naming the field. Optional
//! fields (`mainAtmosphere`, `surfaceTemperatureC`) never fail; they fall
//! back to empty / zero values instead.

use serde_json::Value;

use crate::error::CoreError;
use crate::planet::{Planet, Temperature};

/// A document as exchanged with the store: field name to dynamic value.
pub type Document = serde_json::Map<String, Value>;

/// Decode a planet document.
///
/// The identity is read from `_id`, falling back to `id` when `_id` is
/// absent or `null`.
pub fn planet_from_document(doc: &Document) -> Result<Planet, CoreError> {
    let id = if doc.get("_id").is_some_and(|v| !v.is_null()) {
        required_string(doc, "_id")?
    } else {
        required_string(doc, "id")?
    };

    Ok(Planet {
        id,
        planet_id: required_string(doc, "planetId")?,
        name: required_string(doc, "name")?,
        order_from_sun: required_i32(doc, "orderFromSun")?,
        has_rings: required_bool(doc, "hasRings")?,
        main_atmosphere: atmosphere(doc.get("mainAtmosphere")),
        is_archived: required_bool(doc, "isArchived")?,
        surface_temperature_c: temperature(doc.get("surfaceTemperatureC")),
    })
}

impl TryFrom<&Document> for Planet {
    type Error = CoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        planet_from_document(doc)
    }
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

fn required<'a>(doc: &'a Document, field: &'static str) -> Result<&'a Value, CoreError> {
    match doc.get(field) {
        None | Some(Value::Null) => Err(CoreError::malformed(field, "is missing")),
        Some(value) => Ok(value),
    }
}

fn required_string(doc: &Document, field: &'static str) -> Result<String, CoreError> {
    let value = required(doc, field)?;
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| wrong_type(field, "a string", value))
}

fn required_bool(doc: &Document, field: &'static str) -> Result<bool, CoreError> {
    let value = required(doc, field)?;
    value
        .as_bool()
        .ok_or_else(|| wrong_type(field, "a boolean", value))
}

fn required_i32(doc: &Document, field: &'static str) -> Result<i32, CoreError> {
    let value = required(doc, field)?;
    let whole = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    });

    match whole {
        Some(n) => i32::try_from(n)
            .map_err(|_| CoreError::malformed(field, format!("is out of range: {n}"))),
        None => Err(wrong_type(field, "an integer", value)),
    }
}

/// String elements in order; anything else is dropped.
fn atmosphere(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}

fn temperature(value: Option<&Value>) -> Temperature {
    match value {
        Some(Value::Object(temp)) => Temperature {
            max: temp.get("max").and_then(Value::as_f64),
            mean: temp.get("mean").and_then(Value::as_f64).unwrap_or(0.0),
            min: temp.get("min").and_then(Value::as_f64),
        },
        _ => Temperature::default(),
    }
}

fn wrong_type(field: &'static str, expected: &str, found: &Value) -> CoreError {
    CoreError::malformed(field, format!("expected {expected}, found {}", kind(found)))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
