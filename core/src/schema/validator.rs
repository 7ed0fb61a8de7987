use crate::prelude::SchemaError;
use crate::schema::Subsystem;

/// Checks that every required column of `subsystem` appears in `headers`.
///
/// Column order is irrelevant and unknown columns are accepted; they are
/// dropped later by the sanitizer. Missing columns are reported in schema order.
pub fn validate_headers(subsystem: Subsystem, headers: &[String]) -> Result<(), SchemaError> {
    let missing: Vec<String> = subsystem
        .required_columns()
        .filter(|required| !headers.iter().any(|header| header == required))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { subsystem, missing })
    }
}
