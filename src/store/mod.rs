//! Append-only delimited dataset files.
//!
//! Every dataset in the pipeline is a `;`-delimited text file with a fixed
//! column header written exactly once, followed by data rows appended over
//! time, possibly across many process invocations. The format is not
//! quote-escaped, so field values are neutralized deterministically before
//! write: any `;` inside a field becomes `,` and newlines collapse to a
//! single space.

pub mod naming;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Field delimiter used by all dataset files.
pub const DELIMITER: char = ';';

/// Header of per-subject generated datasets and the pre-derivation corpus.
pub const RECORD_HEADER: &str = "instruction;input;output";

/// Header of the combined corpus after the derived-text pass.
pub const CORPUS_HEADER: &str = "instruction;input;output;text";

/// One instruction/input/output tuple, the atomic training-data unit.
///
/// This is also the shape expected from the completion service: a JSON
/// array of objects with exactly these three keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub instruction: String,
    pub input: String,
    pub output: String,
}

impl Record {
    pub fn new(
        instruction: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// A combined-corpus row: a record plus the derived `text` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRow {
    pub instruction: String,
    pub input: String,
    pub output: String,
    pub text: String,
}

/// Neutralize a field value for the non-quoted delimited format.
///
/// Deterministic: `;` becomes `,`, CR/LF become a single space. Applied on
/// every write so a stored row always splits back into its original fields.
pub fn sanitize_field(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .replace(DELIMITER, ",")
}

/// Append-only store for delimited dataset files.
///
/// Guarantees header-once semantics: the header row is written iff the
/// target file is missing or empty, so repeated appends across process
/// invocations never duplicate it.
pub struct RecordStore;

impl RecordStore {
    /// Append records to a generated dataset, creating it (with header) on
    /// first use. Returns the number of rows written.
    ///
    /// Existing rows are never modified; an empty `records` slice leaves a
    /// missing file missing.
    pub fn append(path: &Path, records: &[Record]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let needs_header = match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if needs_header {
            writeln!(file, "{}", RECORD_HEADER)?;
        }
        for record in records {
            writeln!(
                file,
                "{}{d}{}{d}{}",
                sanitize_field(&record.instruction),
                sanitize_field(&record.input),
                sanitize_field(&record.output),
                d = DELIMITER,
            )?;
        }
        file.flush()?;

        Ok(records.len())
    }

    /// Truncate a dataset file down to a single 3-column header row.
    pub fn init(path: &Path) -> Result<(), StoreError> {
        fs::write(path, format!("{}\n", RECORD_HEADER))?;
        Ok(())
    }

    /// Read the data rows of a generated dataset (header excluded).
    ///
    /// Rows were sanitized on write, so splitting on the delimiter
    /// reconstructs the stored fields exactly. A row with the wrong field
    /// count means the file was edited outside the pipeline and is a hard
    /// error.
    pub fn read_records(path: &Path) -> Result<Vec<Record>, StoreError> {
        let content = fs::read_to_string(path)?;
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if idx == 0 || line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(DELIMITER).collect();
            if fields.len() != 3 {
                return Err(StoreError::MalformedRow {
                    path: path.display().to_string(),
                    line: idx + 1,
                    expected: 3,
                    found: fields.len(),
                });
            }
            records.push(Record::new(fields[0], fields[1], fields[2]));
        }
        Ok(records)
    }

    /// Read the data rows of a derived corpus file (header excluded).
    pub fn read_corpus_rows(path: &Path) -> Result<Vec<CorpusRow>, StoreError> {
        let content = fs::read_to_string(path)?;
        let mut rows = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if idx == 0 || line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(DELIMITER).collect();
            if fields.len() != 4 {
                return Err(StoreError::MalformedRow {
                    path: path.display().to_string(),
                    line: idx + 1,
                    expected: 4,
                    found: fields.len(),
                });
            }
            rows.push(CorpusRow {
                instruction: fields[0].to_string(),
                input: fields[1].to_string(),
                output: fields[2].to_string(),
                text: fields[3].to_string(),
            });
        }
        Ok(rows)
    }

    /// Rewrite a corpus file in full: one 4-column header, then the rows.
    pub fn write_corpus(path: &Path, rows: &[CorpusRow]) -> Result<(), StoreError> {
        let mut out = String::with_capacity(rows.len() * 64 + CORPUS_HEADER.len() + 1);
        out.push_str(CORPUS_HEADER);
        out.push('\n');
        for row in rows {
            out.push_str(&sanitize_field(&row.instruction));
            out.push(DELIMITER);
            out.push_str(&sanitize_field(&row.input));
            out.push(DELIMITER);
            out.push_str(&sanitize_field(&row.output));
            out.push(DELIMITER);
            out.push_str(&sanitize_field(&row.text));
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }
}
