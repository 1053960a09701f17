//! Planet and surface temperature models.
//!
//! Field names on the wire follow the documents stored in the `planets`
//! collection (`_id`, camelCase for everything else).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Document;
use crate::types::PlanetId;

/// A planet record as stored in the `planets` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    #[serde(rename = "_id")]
    pub id: PlanetId,
    /// Lookup key for update and archive. Equal to `id` for records created here.
    pub planet_id: PlanetId,
    pub name: String,
    pub order_from_sun: i32,
    pub has_rings: bool,
    #[serde(default)]
    pub main_atmosphere: Vec<String>,
    pub is_archived: bool,
    #[serde(default)]
    pub surface_temperature_c: Temperature,
}

/// Surface temperature in degrees Celsius.
///
/// No ordering is enforced between `min`, `mean` and `max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub max: Option<f64>,
    #[serde(default)]
    pub mean: f64,
    pub min: Option<f64>,
}

impl Temperature {
    pub fn new(max: Option<f64>, mean: f64, min: Option<f64>) -> Self {
        Self { max, mean, min }
    }

    /// Whether the values present satisfy `min <= mean <= max`.
    pub fn is_ordered(&self) -> bool {
        let min_ok = self.min.map_or(true, |min| min <= self.mean);
        let max_ok = self.max.map_or(true, |max| self.mean <= max);
        let span_ok = match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        };
        min_ok && max_ok && span_ok
    }

    /// Document form; absent bounds are written as `null`.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("max".into(), optional_number(self.max));
        doc.insert("mean".into(), number(self.mean));
        doc.insert("min".into(), optional_number(self.min));
        doc
    }
}

impl Planet {
    /// Document form sent to the store on insert.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("_id".into(), Value::String(self.id.clone()));
        doc.insert("hasRings".into(), Value::Bool(self.has_rings));
        doc.insert("isArchived".into(), Value::Bool(self.is_archived));
        doc.insert("mainAtmosphere".into(), atmosphere_value(&self.main_atmosphere));
        doc.insert("name".into(), Value::String(self.name.clone()));
        doc.insert("orderFromSun".into(), Value::from(self.order_from_sun));
        doc.insert("planetId".into(), Value::String(self.planet_id.clone()));
        doc.insert(
            "surfaceTemperatureC".into(),
            Value::Object(self.surface_temperature_c.to_document()),
        );
        doc
    }
}

pub(crate) fn atmosphere_value(gases: &[String]) -> Value {
    Value::Array(gases.iter().cloned().map(Value::String).collect())
}

/// Non-finite values have no JSON representation and are written as `null`.
fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn optional_number(value: Option<f64>) -> Value {
    value.map_or(Value::Null, number)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
