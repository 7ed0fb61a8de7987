use crate::client::wire::{BatchResponse, PredictionResult};
use crate::ingest::Record;
use crate::prelude::MergeMismatchError;
use log::debug;
use serde::Serialize;
use serde_json::Value;

/// Display unit: the uploaded record's raw fields plus its prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    #[serde(flatten)]
    pub record: Record,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MergedRow {
    pub fn predicted_rul(&self) -> Option<f64> {
        self.prediction.as_ref().map(|p| p.predicted_rul)
    }
}

/// Pairs `records[i]` with `response.predictions[i]`.
///
/// The pairing relies on the service answering in submission order. When an
/// entry carries an `index`, it must equal its position. Any length or index
/// disagreement rejects the whole batch. An entry that is present but
/// unreadable marks only its own row.
pub fn merge_batch(
    records: Vec<Record>,
    response: BatchResponse,
) -> Result<Vec<MergedRow>, MergeMismatchError> {
    if records.len() != response.predictions.len() {
        return Err(MergeMismatchError::Length {
            submitted: records.len(),
            received: response.predictions.len(),
        });
    }

    let mut correlated = 0usize;
    for (position, entry) in response.predictions.iter().enumerate() {
        if let Some(index) = entry.get("index").and_then(Value::as_u64) {
            let index = index as usize;
            if index != position {
                return Err(MergeMismatchError::Order { position, index });
            }
            correlated += 1;
        }
    }
    if correlated < records.len() {
        debug!(
            "merging {} rows by position; {} carried a correlation index",
            records.len(),
            correlated
        );
    }

    Ok(records
        .into_iter()
        .zip(response.predictions)
        .map(|(record, entry)| match serde_json::from_value::<PredictionResult>(entry) {
            Ok(prediction) => MergedRow {
                record,
                prediction: Some(prediction),
                error: None,
            },
            Err(err) => MergedRow {
                record,
                prediction: None,
                error: Some(format!("unreadable prediction: {err}")),
            },
        })
        .collect())
}
