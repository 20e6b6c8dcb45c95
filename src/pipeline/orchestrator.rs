//! Fixed-order orchestration of the selected pipeline stages.
//!
//! Whatever subset of stages the operator selects, they always run in the
//! same order: first generation, second generation, combine, deduplicate.
//! Each stage consumes the files the previous one produced via the shared
//! naming scheme.

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, ForgeConfig};
use crate::corpus::{DatasetMerger, DedupOutcome, DuplicateResolver, MergeOutcome};
use crate::error::{LlmError, StoreError};
use crate::llm::CompletionBackend;
use crate::store::naming::FileNamingScheme;

use super::stage::{GenerationStage, StageKind, StageReport};

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset file error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// LLM client error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// A generation stage was selected without a subject.
    #[error("Generation stages require a subject")]
    MissingSubject,

    /// The selected subject is not in the configured theme set.
    #[error("Unknown subject '{0}'")]
    UnknownSubject(String),

    /// A generation stage was selected but no completion backend is
    /// available.
    #[error("Generation stages require a completion backend")]
    MissingBackend,
}

/// Which stages the operator selected for this run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageSelection {
    pub first_generation: bool,
    pub second_generation: bool,
    pub combine: bool,
    pub no_duplicates: bool,
}

impl StageSelection {
    /// Whether any stage was selected at all.
    pub fn any(&self) -> bool {
        self.first_generation || self.second_generation || self.combine || self.no_duplicates
    }

    /// Whether a stage that talks to the completion service was selected.
    pub fn needs_generation(&self) -> bool {
        self.first_generation || self.second_generation
    }
}

/// What the selected stages did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub first_generation: Option<StageReport>,
    pub second_generation: Option<StageReport>,
    pub merge: Option<MergeOutcome>,
    pub dedup: Option<DedupOutcome>,
}

/// Runs the selected stages in their fixed order.
pub struct Orchestrator<'a> {
    config: &'a ForgeConfig,
    naming: FileNamingScheme,
    backend: Option<&'a dyn CompletionBackend>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator. The backend may be omitted for runs that
    /// only combine or deduplicate.
    pub fn new(config: &'a ForgeConfig, backend: Option<&'a dyn CompletionBackend>) -> Self {
        Self {
            config,
            naming: FileNamingScheme::new(&config.data_dir),
            backend,
        }
    }

    /// The naming scheme this run operates under.
    pub fn naming(&self) -> &FileNamingScheme {
        &self.naming
    }

    /// Run the selected stages to completion.
    ///
    /// `subject` is required (and must be configured) whenever a
    /// generation stage is selected; combine and deduplicate operate on
    /// every generated file regardless of subject.
    pub async fn run(
        &self,
        selection: StageSelection,
        subject: Option<&str>,
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        if selection.needs_generation() {
            let subject = subject.ok_or(PipelineError::MissingSubject)?;
            if !self.config.has_subject(subject) {
                return Err(PipelineError::UnknownSubject(subject.to_string()));
            }
            let backend = self.backend.ok_or(PipelineError::MissingBackend)?;
            let stage = GenerationStage::new(self.config, &self.naming, backend);

            if selection.first_generation {
                info!(subject, "Running first generation stage");
                summary.first_generation =
                    Some(stage.run(StageKind::FirstGeneration, subject).await?);
            }
            if selection.second_generation {
                info!(subject, "Running second generation stage");
                summary.second_generation =
                    Some(stage.run(StageKind::SecondGeneration, subject).await?);
            }
        }

        if selection.combine {
            info!("Running combine stage");
            summary.merge = Some(DatasetMerger::new(&self.naming).combine()?);
        }

        if selection.no_duplicates {
            info!("Running deduplicate stage");
            summary.dedup = Some(DuplicateResolver::deduplicate(&self.naming.corpus_path())?);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::CompletionRequest;
    use crate::store::RecordStore;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Backend returning the same batch for every request.
    struct FixedBackend {
        payload: String,
    }

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
            Ok(self.payload.clone())
        }
    }

    fn test_config(dir: &TempDir) -> ForgeConfig {
        let mut config = ForgeConfig::default();
        config.first_step_iterations = 1;
        config.second_step_iterations = 1;
        config.pacing_delay_secs = 0;
        config.data_dir = dir.path().to_path_buf();
        config
            .themes
            .insert("math".to_string(), "mathematics questions".to_string());
        config
    }

    fn batch() -> String {
        r#"[{"instruction": "q", "input": "i", "output": "o"}]"#.to_string()
    }

    #[tokio::test]
    async fn test_generation_requires_subject() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        let backend = FixedBackend { payload: batch() };
        let orchestrator = Orchestrator::new(&config, Some(&backend));

        let selection = StageSelection {
            first_generation: true,
            ..Default::default()
        };
        let result = orchestrator.run(selection, None).await;
        assert!(matches!(result, Err(PipelineError::MissingSubject)));

        let result = orchestrator.run(selection, Some("biology")).await;
        assert!(matches!(result, Err(PipelineError::UnknownSubject(_))));
    }

    #[tokio::test]
    async fn test_generation_requires_backend() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        let orchestrator = Orchestrator::new(&config, None);

        let selection = StageSelection {
            second_generation: true,
            ..Default::default()
        };
        let result = orchestrator.run(selection, Some("math")).await;
        assert!(matches!(result, Err(PipelineError::MissingBackend)));
    }

    #[tokio::test]
    async fn test_full_run_in_fixed_order() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        let backend = FixedBackend { payload: batch() };
        let orchestrator = Orchestrator::new(&config, Some(&backend));

        let selection = StageSelection {
            first_generation: true,
            second_generation: true,
            combine: true,
            no_duplicates: true,
        };
        let summary = orchestrator
            .run(selection, Some("math"))
            .await
            .expect("run");

        assert_eq!(summary.first_generation.unwrap().records_appended, 1);
        assert_eq!(summary.second_generation.unwrap().records_appended, 1);
        // Both iterations produced identical records: merged then deduped.
        assert_eq!(summary.merge.unwrap().rows, 2);
        let dedup = summary.dedup.unwrap();
        assert_eq!(dedup.kept, 1);
        assert_eq!(dedup.removed, 1);

        let rows =
            RecordStore::read_corpus_rows(&orchestrator.naming().corpus_path()).expect("rows");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_combine_only_needs_no_backend_or_subject() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config(&dir);
        let orchestrator = Orchestrator::new(&config, None);

        let selection = StageSelection {
            combine: true,
            no_duplicates: true,
            ..Default::default()
        };
        let summary = orchestrator.run(selection, None).await.expect("run");

        assert!(summary.merge.unwrap().is_empty_corpus());
        assert_eq!(summary.dedup.unwrap().kept, 0);
    }
}
