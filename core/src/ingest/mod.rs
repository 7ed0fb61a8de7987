pub mod parser;
pub mod record;

pub use parser::{parse_reader, parse_str, ParsedFile};
pub use record::{RawValue, Record};
