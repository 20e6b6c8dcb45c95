//! Corpus assembly: merging per-subject datasets and removing duplicates.

mod dedup;
mod merge;

pub use dedup::{DedupOutcome, DuplicateResolver};
pub use merge::{DatasetMerger, MergeOutcome, DERIVED_TEXT_SEPARATOR};
