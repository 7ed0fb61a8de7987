//! Core ingestion pipeline for the aircraft RUL console.
//!
//! Uploaded sensor files flow through parsing, schema validation, payload
//! sanitization, a single bulk request per subsystem, positional merge, and
//! finally the per-subsystem aggregation store read by the console views.

pub mod client;
pub mod ingest;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod schema;
pub mod store;
pub mod telemetry;

pub use prelude::{
    MergeMismatchError, ParseError, PipelineError, PipelineResult, RequestError, SchemaError,
};
pub use schema::Subsystem;
