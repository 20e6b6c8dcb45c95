//! Duplicate removal over the combined corpus.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::error::StoreError;
use crate::store::RecordStore;

/// Outcome of a deduplication run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupOutcome {
    /// Rows kept in the file.
    pub kept: usize,
    /// Duplicate rows removed.
    pub removed: usize,
}

/// Removes duplicate records from a corpus file.
///
/// Two rows are duplicates iff their `instruction`, `input` and `output`
/// fields are exactly equal as text. The derived `text` field is excluded
/// from the equality key so formatting drift there cannot mask a
/// duplicate. The first-seen representative of each equality class is
/// kept, in its original position.
pub struct DuplicateResolver;

impl DuplicateResolver {
    /// Rewrite the file with duplicates removed. Safe no-op when the file
    /// contains none.
    pub fn deduplicate(path: &Path) -> Result<DedupOutcome, StoreError> {
        let rows = RecordStore::read_corpus_rows(path)?;
        let total = rows.len();

        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(total);
        for row in rows {
            let key = (
                row.instruction.clone(),
                row.input.clone(),
                row.output.clone(),
            );
            if seen.insert(key) {
                kept.push(row);
            }
        }

        let outcome = DedupOutcome {
            kept: kept.len(),
            removed: total - kept.len(),
        };

        if outcome.removed > 0 {
            RecordStore::write_corpus(path, &kept)?;
        }
        info!(kept = outcome.kept, removed = outcome.removed, "Deduplication finished");

        Ok(outcome)
    }
}
