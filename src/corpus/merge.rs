//! Combining per-subject generated datasets into one corpus.

use std::path::PathBuf;

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::StoreError;
use crate::store::naming::FileNamingScheme;
use crate::store::{CorpusRow, RecordStore};

/// Separator between `input` and `output` in the derived `text` field.
pub const DERIVED_TEXT_SEPARATOR: &str = "->: ";

/// Outcome of a combine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Per-subject files whose rows were merged.
    pub files_merged: usize,
    /// Data rows in the resulting corpus.
    pub rows: usize,
}

impl MergeOutcome {
    /// Whether no generated files were found at all.
    pub fn is_empty_corpus(&self) -> bool {
        self.files_merged == 0
    }
}

/// Concatenates every per-subject generated dataset into the combined
/// corpus file, then derives the `text` column.
///
/// The corpus file is reinitialized at the start of every run, so a
/// combine always reflects the current set of generated files.
pub struct DatasetMerger<'a> {
    naming: &'a FileNamingScheme,
}

impl<'a> DatasetMerger<'a> {
    pub fn new(naming: &'a FileNamingScheme) -> Self {
        Self { naming }
    }

    /// Run the combine stage.
    pub fn combine(&self) -> Result<MergeOutcome, StoreError> {
        let corpus_path = self.naming.corpus_path();
        RecordStore::init(&corpus_path)?;

        let sources = self.discover()?;
        if sources.is_empty() {
            warn!(
                data_dir = %self.naming.data_dir().display(),
                "No generated datasets found, corpus left header-only"
            );
        }

        for (subject, path) in &sources {
            let records = RecordStore::read_records(path)?;
            RecordStore::append(&corpus_path, &records)?;
            info!(subject, rows = records.len(), "Merged dataset into corpus");
        }

        // Derivation pass: rewrite the corpus with the text column filled in.
        let rows: Vec<CorpusRow> = RecordStore::read_records(&corpus_path)?
            .into_iter()
            .map(|record| {
                let text = format!("{}{}{}", record.input, DERIVED_TEXT_SEPARATOR, record.output);
                CorpusRow {
                    instruction: record.instruction,
                    input: record.input,
                    output: record.output,
                    text,
                }
            })
            .collect();
        RecordStore::write_corpus(&corpus_path, &rows)?;

        Ok(MergeOutcome {
            files_merged: sources.len(),
            rows: rows.len(),
        })
    }

    /// Find every per-subject generated dataset under the data directory,
    /// sorted by subject name so discovery order is reproducible across
    /// platforms.
    fn discover(&self) -> Result<Vec<(String, PathBuf)>, StoreError> {
        let mut sources = Vec::new();
        for entry in WalkDir::new(self.naming.data_dir()) {
            let entry = entry.map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(subject) = self.naming.subject_of_generated(name) {
                sources.push((subject, entry.into_path()));
            }
        }
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Record, CORPUS_HEADER};
    use tempfile::TempDir;

    fn write_dataset(naming: &FileNamingScheme, subject: &str, count: usize) {
        let records: Vec<Record> = (0..count)
            .map(|i| {
                Record::new(
                    format!("{} q{}", subject, i),
                    format!("{} i{}", subject, i),
                    format!("{} o{}", subject, i),
                )
            })
            .collect();
        RecordStore::append(&naming.generated_path(subject), &records).expect("write dataset");
    }

    #[test]
    fn test_combine_completeness() {
        let dir = TempDir::new().expect("tempdir");
        let naming = FileNamingScheme::new(dir.path());
        write_dataset(&naming, "math", 3);
        write_dataset(&naming, "history", 2);

        let outcome = DatasetMerger::new(&naming).combine().expect("combine");

        assert_eq!(outcome.files_merged, 2);
        assert_eq!(outcome.rows, 5);

        let content = std::fs::read_to_string(naming.corpus_path()).expect("read corpus");
        assert_eq!(content.lines().count(), 6, "one header plus five rows");
        assert_eq!(content.lines().next(), Some(CORPUS_HEADER));
    }

    #[test]
    fn test_discovery_order_sorted_by_subject() {
        let dir = TempDir::new().expect("tempdir");
        let naming = FileNamingScheme::new(dir.path());
        write_dataset(&naming, "zoology", 1);
        write_dataset(&naming, "algebra", 1);

        DatasetMerger::new(&naming).combine().expect("combine");

        let rows = RecordStore::read_corpus_rows(&naming.corpus_path()).expect("rows");
        assert_eq!(rows[0].instruction, "algebra q0");
        assert_eq!(rows[1].instruction, "zoology q0");
    }

    #[test]
    fn test_derived_text_correctness() {
        let dir = TempDir::new().expect("tempdir");
        let naming = FileNamingScheme::new(dir.path());
        write_dataset(&naming, "math", 4);

        DatasetMerger::new(&naming).combine().expect("combine");

        let rows = RecordStore::read_corpus_rows(&naming.corpus_path()).expect("rows");
        assert_eq!(rows.len(), 4);
        for row in rows {
            assert_eq!(
                row.text,
                format!("{}{}{}", row.input, DERIVED_TEXT_SEPARATOR, row.output)
            );
        }
    }

    #[test]
    fn test_empty_corpus_reported() {
        let dir = TempDir::new().expect("tempdir");
        let naming = FileNamingScheme::new(dir.path());

        let outcome = DatasetMerger::new(&naming).combine().expect("combine");

        assert!(outcome.is_empty_corpus());
        assert_eq!(outcome.rows, 0);
        let content = std::fs::read_to_string(naming.corpus_path()).expect("read corpus");
        assert_eq!(content, format!("{}\n", CORPUS_HEADER));
    }

    #[test]
    fn test_combine_reinitializes_prior_corpus() {
        let dir = TempDir::new().expect("tempdir");
        let naming = FileNamingScheme::new(dir.path());
        write_dataset(&naming, "math", 2);

        DatasetMerger::new(&naming).combine().expect("first combine");
        let outcome = DatasetMerger::new(&naming).combine().expect("second combine");

        // Rows must not double up: the corpus file is excluded from
        // discovery and truncated before each run.
        assert_eq!(outcome.rows, 2);
    }

    #[test]
    fn test_seed_files_not_merged() {
        let dir = TempDir::new().expect("tempdir");
        let naming = FileNamingScheme::new(dir.path());
        write_dataset(&naming, "math", 1);
        std::fs::write(
            naming.seed_path("math"),
            "instruction;topic;subject\nseed row;t;math\n",
        )
        .expect("write seed");

        let outcome = DatasetMerger::new(&naming).combine().expect("combine");

        assert_eq!(outcome.files_merged, 1);
        assert_eq!(outcome.rows, 1);
    }
}
