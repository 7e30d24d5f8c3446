use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::models::{RecordTable, Value, NUMERIC_COLUMNS};

/// Numeric cell contents read as missing data, compared case-insensitively
/// after trimming.
const NULL_MARKERS: [&str; 7] = ["", "-", "n/a", "na", "nan", "null", "none"];

/// Field separators tried when the caller does not name one.
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

fn is_null_marker(raw: &str) -> bool {
    let trimmed = raw.trim();
    NULL_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parses a spreadsheet number: `7,5` and `7.5` are the same value and a
/// trailing `%` is dropped. Returns `None` for anything else.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Picks the separator that occurs most often in the header line. Spreadsheets
/// saved under a decimal-comma locale use `;`. Ties fall back to `,`.
pub fn sniff_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|byte| *byte == b'\n').next().unwrap_or_default();
    let mut best = (b',', 0usize);
    for candidate in CANDIDATE_DELIMITERS {
        let count = header.iter().filter(|byte| **byte == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// Categorical cells are kept verbatim; only an empty cell is missing.
/// Numeric cells accept the null markers and fall back to null when they do
/// not parse.
fn to_value(raw: &str, numeric: bool, column: &str, line: usize) -> Value {
    if !numeric {
        return if raw.is_empty() {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        };
    }
    if is_null_marker(raw) {
        return Value::Null;
    }
    match parse_number(raw) {
        Some(number) => Value::Number(number),
        None => {
            tracing::debug!(column, line, raw, "non-numeric value treated as missing");
            Value::Null
        }
    }
}

/// Reads a headed CSV, detecting `,`, `;` or tab from the header line.
pub fn read_table<R: Read>(mut reader: R) -> Result<RecordTable> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let delimiter = sniff_delimiter(&data);
    tracing::debug!(delimiter = %char::from(delimiter), "detected field separator");
    read_table_with_delimiter(data.as_slice(), delimiter)
}

/// Reads a headed CSV into a table. Numeric columns are typed here; a value
/// that does not parse becomes null rather than failing the load.
pub fn read_table_with_delimiter<R: Read>(reader: R, delimiter: u8) -> Result<RecordTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|header| header.is_empty()) {
        return Err(IngestError::MissingHeader);
    }

    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(IngestError::DuplicateColumn(header.clone()));
        }
    }

    let numeric: Vec<bool> = headers
        .iter()
        .map(|header| NUMERIC_COLUMNS.contains(&header.as_str()))
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = index + 2;
        let values: Vec<Value> = headers
            .iter()
            .zip(&numeric)
            .enumerate()
            .map(|(position, (header, is_numeric))| {
                record
                    .get(position)
                    .map_or(Value::Null, |raw| to_value(raw, *is_numeric, header, line))
            })
            .collect();
        rows.push(values);
    }

    let table = RecordTable::new(headers, rows);
    tracing::info!(
        records = table.len(),
        columns = table.columns().len(),
        "student table loaded"
    );
    Ok(table)
}

/// Loads a file from disk. `None` detects the separator from the header.
pub fn load_csv(path: &Path, delimiter: Option<u8>) -> Result<RecordTable> {
    let file = std::io::BufReader::new(std::fs::File::open(path)?);
    match delimiter {
        Some(delimiter) => read_table_with_delimiter(file, delimiter),
        None => read_table(file),
    }
}
