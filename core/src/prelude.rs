use crate::schema::Subsystem;

/// Malformed upload. `line` is the 1-based physical line in the source text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("missing header row")]
    MissingHeader,
    #[error("column '{0}' is declared more than once")]
    DuplicateColumn(String),
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("unterminated quoted field")]
    UnterminatedQuote,
    #[error("no data rows after header")]
    NoDataRows,
    #[error("malformed input: {0}")]
    Malformed(String),
}

/// Required columns absent from an upload's header.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{subsystem} file is missing required columns: {}", missing.join(", "))]
pub struct SchemaError {
    pub subsystem: Subsystem,
    pub missing: Vec<String>,
}

/// Transport, timeout, or server-side failure of a prediction call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("could not reach prediction service: {0}")]
    Connection(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unreadable response from prediction service: {0}")]
    Decode(String),
    #[error("invalid service address: {0}")]
    InvalidBaseUrl(String),
}

/// Batch response that cannot be paired with the submitted records.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeMismatchError {
    #[error("submitted {submitted} records but received {received} predictions")]
    Length { submitted: usize, received: usize },
    #[error("prediction at position {position} is labelled for record {index}")]
    Order { position: usize, index: usize },
}

/// Which per-panel action a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Single,
    Batch,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Single => f.write_str("single prediction"),
            RequestKind::Batch => f.write_str("batch prediction"),
        }
    }
}

/// Every failure surfaced to the console as one message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("could not parse file: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("batch rejected: {0}")]
    Merge(#[from] MergeMismatchError),
    #[error("a {kind} for {subsystem} is already pending")]
    Busy {
        subsystem: Subsystem,
        kind: RequestKind,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
