pub mod merge;
pub mod sanitize;

pub use merge::{merge_batch, MergedRow};
pub use sanitize::{sanitize_record, sanitize_records, sanitize_text, sanitize_value, SanitizedPayload};
