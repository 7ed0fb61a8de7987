use crate::client::wire::{BatchResponse, PredictionResult};
use crate::prelude::RequestError;
use crate::processing::SanitizedPayload;
use crate::schema::Subsystem;
use std::future::Future;

/// Remote prediction endpoints, one single and one bulk call per subsystem.
///
/// Each call is a single attempt; implementations never retry.
pub trait PredictionService {
    fn predict_single(
        &self,
        subsystem: Subsystem,
        payload: &SanitizedPayload,
    ) -> impl Future<Output = Result<PredictionResult, RequestError>> + Send;

    fn predict_batch(
        &self,
        subsystem: Subsystem,
        items: &[SanitizedPayload],
    ) -> impl Future<Output = Result<BatchResponse, RequestError>> + Send;
}
