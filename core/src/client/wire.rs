use crate::processing::SanitizedPayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_units() -> String {
    "cycles".to_string()
}

/// Estimate returned by the prediction service for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_rul: f64,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// Body of `POST /predict/{subsystem}/batch`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest<'a> {
    pub items: &'a [SanitizedPayload],
}

/// Ordered batch reply. Entries stay as raw JSON so a single unreadable
/// entry marks its own row instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub predictions: Vec<Value>,
}

impl BatchResponse {
    pub fn from_results(results: &[PredictionResult]) -> Self {
        Self {
            predictions: results
                .iter()
                .filter_map(|result| serde_json::to_value(result).ok())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Turns a non-success body into the message shown to the operator.
///
/// A structured `{"detail": ...}` body yields `detail` verbatim, with
/// non-string details rendered as JSON. Other JSON is rendered whole, plain
/// text is used as-is, and an empty body falls back to the status line.
pub fn error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("Request failed with status {status}");
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(Value::Null) | None => Value::Object(map).to_string(),
            Some(detail) => detail.to_string(),
        },
        Ok(Value::String(text)) => text,
        Ok(other) => other.to_string(),
        Err(_) => trimmed.to_string(),
    }
}
