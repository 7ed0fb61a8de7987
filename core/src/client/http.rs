use crate::client::service::PredictionService;
use crate::client::wire::{error_message, BatchRequest, BatchResponse, HealthStatus, PredictionResult};
use crate::prelude::RequestError;
use crate::processing::SanitizedPayload;
use crate::schema::Subsystem;
use log::debug;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// JSON-over-HTTP client for the prediction service.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl PredictionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RequestError> {
        let base_url = normalize_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RequestError::Connection(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus, RequestError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        self.read_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {url}");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        self.read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, RequestError> {
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) if err.is_timeout() => return Err(RequestError::Timeout(self.timeout)),
                Err(err) => {
                    debug!("error body for status {status} unreadable: {err}");
                    String::new()
                }
            };
            return Err(RequestError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }
        response.json::<T>().await.map_err(|err| {
            if err.is_timeout() {
                RequestError::Timeout(self.timeout)
            } else {
                RequestError::Decode(err.to_string())
            }
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> RequestError {
        if err.is_timeout() {
            RequestError::Timeout(self.timeout)
        } else {
            RequestError::Connection(err.to_string())
        }
    }
}

impl PredictionService for PredictionClient {
    async fn predict_single(
        &self,
        subsystem: Subsystem,
        payload: &SanitizedPayload,
    ) -> Result<PredictionResult, RequestError> {
        self.post_json(&subsystem.single_path(), payload).await
    }

    async fn predict_batch(
        &self,
        subsystem: Subsystem,
        items: &[SanitizedPayload],
    ) -> Result<BatchResponse, RequestError> {
        self.post_json(&subsystem.batch_path(), &BatchRequest { items })
            .await
    }
}

/// Validates an `http`/`https` address and drops any trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String, RequestError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| RequestError::InvalidBaseUrl(format!("{trimmed}: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(RequestError::InvalidBaseUrl(format!(
            "{trimmed}: unsupported scheme '{other}'"
        ))),
    }
}
