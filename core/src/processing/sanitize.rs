use crate::ingest::{RawValue, Record};
use crate::schema::Schema;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Required fields of one record, each coerced to a finite number.
///
/// Fields appear in schema order and every schema field is present.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedPayload {
    values: Vec<(&'static str, f64)>,
}

impl SanitizedPayload {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for SanitizedPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Numeric value of `text`, or `0` when it is blank, non-numeric, or not finite.
pub fn sanitize_text(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub fn sanitize_value(value: &RawValue) -> f64 {
    match value {
        RawValue::Number(number) if number.is_finite() => *number,
        RawValue::Number(_) | RawValue::Missing => 0.0,
        RawValue::Text(text) => sanitize_text(text),
    }
}

/// Builds the outgoing payload for `record`. Columns outside `schema` are
/// dropped and absent schema columns become `0`.
pub fn sanitize_record(schema: Schema, record: &Record) -> SanitizedPayload {
    let values = schema
        .fields
        .iter()
        .map(|spec| {
            let value = record.get(spec.name).map(sanitize_value).unwrap_or(0.0);
            (spec.name, value)
        })
        .collect();
    SanitizedPayload { values }
}

pub fn sanitize_records(schema: Schema, records: &[Record]) -> Vec<SanitizedPayload> {
    records
        .iter()
        .map(|record| sanitize_record(schema, record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Subsystem;

    #[test]
    fn coerces_blank_missing_and_garbage_to_zero() {
        assert_eq!(sanitize_value(&RawValue::Text(String::new())), 0.0);
        assert_eq!(sanitize_value(&RawValue::Text("3.5".into())), 3.5);
        assert_eq!(sanitize_value(&RawValue::Missing), 0.0);
        assert_eq!(sanitize_value(&RawValue::Text("abc".into())), 0.0);
        assert_eq!(sanitize_value(&RawValue::Text(" -2e3 ".into())), -2000.0);
    }

    #[test]
    fn non_finite_values_become_zero() {
        assert_eq!(sanitize_value(&RawValue::Number(f64::NAN)), 0.0);
        assert_eq!(sanitize_value(&RawValue::Number(f64::INFINITY)), 0.0);
        assert_eq!(sanitize_text("inf"), 0.0);
        assert_eq!(sanitize_text("NaN"), 0.0);
        assert_eq!(sanitize_text("1e400"), 0.0);
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        let inputs = [
            RawValue::Text("".into()),
            RawValue::Text("42.25".into()),
            RawValue::Text("x1".into()),
            RawValue::Number(-7.5),
            RawValue::Number(f64::NEG_INFINITY),
            RawValue::Missing,
        ];
        for input in inputs {
            let once = sanitize_value(&input);
            assert_eq!(sanitize_value(&RawValue::Number(once)), once);
        }
    }

    #[test]
    fn payload_holds_exactly_the_schema_fields() {
        let record = Record::from_pairs([
            ("tire_pressure", RawValue::from("31.2")),
            ("comment", RawValue::from("hard landing")),
            ("load_during_landing", RawValue::from("")),
        ]);
        let payload = sanitize_record(Subsystem::LandingGear.schema(), &record);
        assert_eq!(payload.len(), 3);
        assert_eq!(payload.get("tire_pressure"), Some(31.2));
        assert_eq!(payload.get("load_during_landing"), Some(0.0));
        assert_eq!(payload.get("speed_during_landing"), Some(0.0));
        assert_eq!(payload.get("comment"), None);
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"load_during_landing":0.0,"tire_pressure":31.2,"speed_during_landing":0.0}"#
        );
    }
}
