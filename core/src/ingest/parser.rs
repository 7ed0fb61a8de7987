use crate::ingest::record::{RawValue, Record};
use crate::prelude::{ParseError, ParseErrorKind};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;

/// Header list and data records of one uploaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl ParsedFile {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Drains `reader` once and parses the result as comma-separated text.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<ParsedFile, ParseError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|err| ParseError::new(1, ParseErrorKind::Malformed(err.to_string())))?;
    parse_str(&text)
}

/// Parses one header line followed by data lines.
///
/// Blank lines are skipped wherever they appear, and `\n`, `\r\n`, and bare
/// `\r` terminators may be mixed. Every data line must carry exactly as many
/// fields as the header.
pub fn parse_str(text: &str) -> Result<ParsedFile, ParseError> {
    if let Some(line) = unterminated_quote_line(text) {
        return Err(ParseError::new(line, ParseErrorKind::UnterminatedQuote));
    }

    let lines = LineIndex::new(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = reader
        .records()
        .map(|row| row.map_err(|err| csv_error(&lines, err)))
        .filter(|row| !matches!(row, Ok(record) if is_blank(record)));

    let header_row = rows
        .next()
        .transpose()?
        .ok_or_else(|| ParseError::new(1, ParseErrorKind::MissingHeader))?;
    let header_line = lines.line_of(&header_row);
    let headers = read_headers(&header_row, header_line)?;

    let mut records = Vec::new();
    for row in rows {
        let row = row?;
        if row.len() != headers.len() {
            return Err(ParseError::new(
                lines.line_of(&row),
                ParseErrorKind::FieldCount {
                    expected: headers.len(),
                    found: row.len(),
                },
            ));
        }
        records.push(Record::from_pairs(
            headers
                .iter()
                .cloned()
                .zip(row.iter().map(|field| RawValue::Text(field.to_string()))),
        ));
    }

    if records.is_empty() {
        return Err(ParseError::new(header_line + 1, ParseErrorKind::NoDataRows));
    }

    Ok(ParsedFile { headers, records })
}

fn read_headers(row: &StringRecord, line: usize) -> Result<Vec<String>, ParseError> {
    let mut headers: Vec<String> = Vec::with_capacity(row.len());
    for (idx, raw) in row.iter().enumerate() {
        let name = if idx == 0 {
            raw.trim_start_matches('\u{feff}').trim()
        } else {
            raw.trim()
        };
        if headers.iter().any(|existing| existing == name) {
            return Err(ParseError::new(
                line,
                ParseErrorKind::DuplicateColumn(name.to_string()),
            ));
        }
        headers.push(name.to_string());
    }
    Ok(headers)
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|field| field.trim().is_empty())
}

/// Physical line numbers for byte offsets. `\r\n`, bare `\r`, and `\n` each
/// end one line.
struct LineIndex<'a> {
    bytes: &'a [u8],
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut starts = vec![0];
        let mut idx = 0;
        while idx < bytes.len() {
            match bytes[idx] {
                b'\r' if bytes.get(idx + 1) == Some(&b'\n') => {
                    idx += 2;
                    starts.push(idx);
                }
                b'\r' | b'\n' => {
                    idx += 1;
                    starts.push(idx);
                }
                _ => idx += 1,
            }
        }
        Self { bytes, starts }
    }

    /// Line of the first content byte at or after `byte`. The reader reports
    /// a record's position before the terminators and blank lines it skips.
    fn line_at(&self, byte: u64) -> usize {
        let mut offset = usize::try_from(byte).unwrap_or(self.bytes.len());
        while matches!(self.bytes.get(offset), Some(b'\r' | b'\n')) {
            offset += 1;
        }
        self.starts.partition_point(|&start| start <= offset)
    }

    fn line_of(&self, record: &StringRecord) -> usize {
        record
            .position()
            .map(|pos| self.line_at(pos.byte()))
            .unwrap_or(1)
    }
}

fn csv_error(lines: &LineIndex<'_>, err: csv::Error) -> ParseError {
    let line = err.position().map(|pos| lines.line_at(pos.byte())).unwrap_or(1);
    ParseError::new(line, ParseErrorKind::Malformed(err.to_string()))
}

/// Line on which a quoted field opens without ever closing, if any.
///
/// A quote only opens a quoted field at the start of a field; doubled quotes
/// inside a quoted field are escapes.
fn unterminated_quote_line(text: &str) -> Option<usize> {
    let mut line = 1;
    let mut opened_at = 0;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\r' && chars.peek() == Some(&'\n') {
            chars.next();
        }
        let newline = ch == '\n' || ch == '\r';
        if newline {
            line += 1;
        }

        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match ch {
            '"' if field_start => {
                in_quotes = true;
                opened_at = line;
                field_start = false;
            }
            ',' => field_start = true,
            _ if newline => field_start = true,
            _ => field_start = false,
        }
    }

    in_quotes.then_some(opened_at)
}
