//! Generation stages: prompt, complete, parse, append, repeat.

use tracing::{debug, info, warn};

use crate::config::ForgeConfig;
use crate::error::{LlmError, StoreError};
use crate::llm::{extract_json_array, CompletionBackend, CompletionRequest, SamplingParams};
use crate::prompts::PromptBuilder;
use crate::store::naming::FileNamingScheme;
use crate::store::{Record, RecordStore};

/// Which of the two generation stages is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Bootstrap generation, seeded from manual questions.
    FirstGeneration,
    /// Follow-up generation, referencing the dataset generated so far.
    SecondGeneration,
}

impl StageKind {
    /// Configured iteration count for this stage.
    pub fn iterations(&self, config: &ForgeConfig) -> usize {
        match self {
            StageKind::FirstGeneration => config.first_step_iterations,
            StageKind::SecondGeneration => config.second_step_iterations,
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::FirstGeneration => write!(f, "first-generation"),
            StageKind::SecondGeneration => write!(f, "second-generation"),
        }
    }
}

/// Outcome of parsing one completion reply.
#[derive(Debug)]
pub struct ParsedReply {
    /// Well-formed records, in their original relative order.
    pub records: Vec<Record>,
    /// Objects dropped for lacking a required key.
    pub skipped: usize,
}

/// Parse a completion payload into records.
///
/// The payload must contain a JSON array of objects; anything else is a
/// malformed reply. Objects missing one of the required keys are dropped
/// individually, their well-formed siblings kept.
pub fn parse_reply(payload: &str) -> Result<ParsedReply, LlmError> {
    let json = extract_json_array(payload)
        .ok_or_else(|| LlmError::ParseError("no JSON array in reply".to_string()))?;

    let values: Vec<serde_json::Value> = serde_json::from_str(&json)
        .map_err(|e| LlmError::ParseError(format!("invalid JSON array: {}", e)))?;

    let mut records = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for value in values {
        match serde_json::from_value::<Record>(value) {
            Ok(record) => records.push(record),
            Err(_) => skipped += 1,
        }
    }

    Ok(ParsedReply { records, skipped })
}

/// Summary of one stage run for one subject.
#[derive(Debug)]
pub struct StageReport {
    pub stage: StageKind,
    pub subject: String,
    /// Iterations executed.
    pub iterations: usize,
    /// Total records appended across all iterations.
    pub records_appended: usize,
    /// Iterations that yielded zero records (failed call or malformed reply).
    pub empty_iterations: usize,
}

/// Drives N iterations of prompt -> complete -> parse -> append for one
/// stage and subject.
///
/// Failures are per-iteration: a failed completion or malformed reply is
/// logged and the loop moves on. Only irrecoverable I/O on the target file
/// aborts the stage; records appended by earlier iterations stay in place.
pub struct GenerationStage<'a> {
    config: &'a ForgeConfig,
    naming: &'a FileNamingScheme,
    backend: &'a dyn CompletionBackend,
}

impl<'a> GenerationStage<'a> {
    pub fn new(
        config: &'a ForgeConfig,
        naming: &'a FileNamingScheme,
        backend: &'a dyn CompletionBackend,
    ) -> Self {
        Self {
            config,
            naming,
            backend,
        }
    }

    /// Run the stage to completion for one subject.
    pub async fn run(&self, kind: StageKind, subject: &str) -> Result<StageReport, StoreError> {
        let iterations = kind.iterations(self.config);
        let target = self.naming.generated_path(subject);
        let prompts = PromptBuilder::new(self.config, self.naming);
        let sampling = SamplingParams {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut report = StageReport {
            stage: kind,
            subject: subject.to_string(),
            iterations: 0,
            records_appended: 0,
            empty_iterations: 0,
        };

        for iteration in 0..iterations {
            let prompt = match kind {
                StageKind::FirstGeneration => prompts.first_generation(subject),
                StageKind::SecondGeneration => prompts.second_generation(subject),
            };
            let request = CompletionRequest::new(self.config.model.clone(), prompt, sampling);

            let appended = match self.backend.complete(request).await {
                Ok(payload) => match parse_reply(&payload) {
                    Ok(parsed) => {
                        if parsed.skipped > 0 {
                            debug!(
                                stage = %kind,
                                subject,
                                iteration,
                                skipped = parsed.skipped,
                                "Dropped records missing required keys"
                            );
                        }
                        RecordStore::append(&target, &parsed.records)?
                    }
                    Err(e) => {
                        warn!(stage = %kind, subject, iteration, error = %e, "Malformed reply, skipping iteration");
                        0
                    }
                },
                Err(e) => {
                    warn!(stage = %kind, subject, iteration, error = %e, "Completion failed, skipping iteration");
                    0
                }
            };

            report.iterations += 1;
            report.records_appended += appended;
            if appended == 0 {
                report.empty_iterations += 1;
            }

            // External service pacing; not needed after the last iteration.
            if iteration + 1 < iterations {
                tokio::time::sleep(self.config.pacing_delay()).await;
            }
        }

        info!(
            stage = %kind,
            subject,
            iterations = report.iterations,
            records = report.records_appended,
            empty = report.empty_iterations,
            "Stage finished"
        );

        Ok(report)
    }
}
