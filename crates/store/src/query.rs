//! Structured queries against a document collection.
//!
//! A [`Query`] selects the documents of one collection whose fields equal
//! the given values, optionally ordered ascending by one field. Its
//! `Display` form is the DQL statement an SDK-backed store would run, with
//! named parameters in place of values.

use std::cmp::Ordering;
use std::fmt;

use orrery_core::Document;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    /// Field equality constraints, all of which must hold.
    pub filter: Vec<(String, Value)>,
    pub order_by: Option<String>,
}

impl Query {
    /// Select every document in `collection`.
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filter: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Named arguments for the filter, keyed by field name.
    pub fn arguments(&self) -> Document {
        self.filter
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filter
            .iter()
            .all(|(field, expected)| doc.get(field).is_some_and(|v| values_equal(v, expected)))
    }

    /// Stable ascending sort by `order_by`; a no-op without one.
    pub fn sort(&self, docs: &mut [Document]) {
        if let Some(field) = &self.order_by {
            docs.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT * FROM {}", self.collection)?;
        for (i, (field, _)) in self.filter.iter().enumerate() {
            let keyword = if i == 0 { "WHERE" } else { "AND" };
            write!(f, " {keyword} {field} = :{field}")?;
        }
        if let Some(field) = &self.order_by {
            write!(f, " ORDER BY {field}")?;
        }
        Ok(())
    }
}

/// JSON equality, except that numbers compare by value (`3 == 3.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total order used for `ORDER BY`: missing and `null` first, then booleans,
/// numbers, strings, and finally arrays and objects (which compare equal).
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) | Some(Value::Object(_)) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn display_renders_dql() {
        let query = Query::collection("planets")
            .filter_eq("isArchived", false)
            .order_by("orderFromSun");
        assert_eq!(
            query.to_string(),
            "SELECT * FROM planets WHERE isArchived = :isArchived ORDER BY orderFromSun"
        );

        let two = Query::collection("planets")
            .filter_eq("planetId", "p1")
            .filter_eq("isArchived", false);
        assert_eq!(
            two.to_string(),
            "SELECT * FROM planets WHERE planetId = :planetId AND isArchived = :isArchived"
        );
        assert_eq!(two.arguments()["planetId"], "p1");
    }

    #[test]
    fn matches_requires_every_constraint() {
        let query = Query::collection("planets")
            .filter_eq("isArchived", false)
            .filter_eq("orderFromSun", 3);
        assert!(query.matches(&doc(json!({"isArchived": false, "orderFromSun": 3.0}))));
        assert!(!query.matches(&doc(json!({"isArchived": true, "orderFromSun": 3}))));
        assert!(!query.matches(&doc(json!({"orderFromSun": 3}))));
    }

    #[test]
    fn sort_is_numeric_and_puts_missing_first() {
        let query = Query::collection("planets").order_by("orderFromSun");
        let mut docs = vec![
            doc(json!({"n": "ten", "orderFromSun": 10})),
            doc(json!({"n": "two", "orderFromSun": 2})),
            doc(json!({"n": "none"})),
            doc(json!({"n": "also-two", "orderFromSun": 2.0})),
        ];
        query.sort(&mut docs);
        let names: Vec<_> = docs.iter().map(|d| d["n"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["none", "two", "also-two", "ten"]);
    }
}
