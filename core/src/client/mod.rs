pub mod http;
pub mod service;
pub mod wire;

pub use http::{PredictionClient, DEFAULT_TIMEOUT};
pub use service::PredictionService;
pub use wire::{BatchResponse, HealthStatus, PredictionResult};
