pub mod subsystem;
pub mod validator;

pub use subsystem::{FieldSpec, Schema, Subsystem};
pub use validator::validate_headers;
