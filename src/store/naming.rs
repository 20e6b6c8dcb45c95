//! File naming scheme shared by all pipeline stages.
//!
//! Stages communicate purely through the filesystem: the first generation
//! seeds from `manual-questions-<subject>.csv`, writes
//! `llama-<subject>-dataset.csv`, and the combine stage aggregates every
//! generated file into `llama-combined-dataset.csv`. Centralizing the
//! convention here keeps discovery logic testable against any directory.

use std::path::{Path, PathBuf};

/// Filename prefix of manually curated seed files.
const SEED_PREFIX: &str = "manual-questions-";

/// Filename prefix of generated per-subject datasets.
const GENERATED_PREFIX: &str = "llama-";

/// Filename suffix of generated per-subject datasets.
const GENERATED_SUFFIX: &str = "-dataset.csv";

/// Filename of the combined corpus.
const CORPUS_FILE: &str = "llama-combined-dataset.csv";

/// Maps subjects and stages to the files they read and write.
#[derive(Debug, Clone)]
pub struct FileNamingScheme {
    /// Directory holding all seed, generated and corpus files.
    data_dir: PathBuf,
}

impl FileNamingScheme {
    /// Create a naming scheme rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Directory holding all pipeline files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the manually curated seed file for a subject.
    pub fn seed_path(&self, subject: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.csv", SEED_PREFIX, subject))
    }

    /// Path of the generated dataset for a subject.
    pub fn generated_path(&self, subject: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}{}", GENERATED_PREFIX, subject, GENERATED_SUFFIX))
    }

    /// Path of the combined corpus file.
    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join(CORPUS_FILE)
    }

    /// Extract the subject from a generated-dataset filename.
    ///
    /// Returns `None` for anything that is not a per-subject generated file,
    /// including the combined corpus itself.
    pub fn subject_of_generated(&self, file_name: &str) -> Option<String> {
        if file_name == CORPUS_FILE {
            return None;
        }
        let subject = file_name
            .strip_prefix(GENERATED_PREFIX)?
            .strip_suffix(GENERATED_SUFFIX)?;
        if subject.is_empty() {
            return None;
        }
        Some(subject.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_for_subject() {
        let scheme = FileNamingScheme::new("/data");

        assert_eq!(
            scheme.seed_path("math"),
            PathBuf::from("/data/manual-questions-math.csv")
        );
        assert_eq!(
            scheme.generated_path("math"),
            PathBuf::from("/data/llama-math-dataset.csv")
        );
        assert_eq!(
            scheme.corpus_path(),
            PathBuf::from("/data/llama-combined-dataset.csv")
        );
    }

    #[test]
    fn test_subject_round_trip() {
        let scheme = FileNamingScheme::new(".");
        let path = scheme.generated_path("history");
        let name = path.file_name().unwrap().to_str().unwrap();

        assert_eq!(scheme.subject_of_generated(name), Some("history".into()));
    }

    #[test]
    fn test_subject_of_generated_rejects_non_matches() {
        let scheme = FileNamingScheme::new(".");

        assert_eq!(scheme.subject_of_generated("llama-combined-dataset.csv"), None);
        assert_eq!(scheme.subject_of_generated("manual-questions-math.csv"), None);
        assert_eq!(scheme.subject_of_generated("llama--dataset.csv"), None);
        assert_eq!(scheme.subject_of_generated("notes.txt"), None);
    }
}
