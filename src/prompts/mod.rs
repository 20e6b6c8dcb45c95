//! Prompt construction for the generation stages.

use std::fs;
use std::path::Path;

use crate::config::ForgeConfig;
use crate::store::naming::FileNamingScheme;

/// Maximum number of sampled rows included in a prompt.
const SAMPLE_ROWS: usize = 5;

/// Prompt template for the first generation stage.
const FIRST_GENERATION_PROMPT: &str = r#"You are building a fine-tuning dataset of question/answer records.

Subject: {subject} ({description})

Generate exactly {count} new records about {subject}.
Respond with only a JSON array of objects, each with the keys
"instruction" (the question), "input" (optional context, may be empty)
and "output" (the answer). No prose, no markdown.
{examples}"#;

/// Prompt template for the second generation stage.
const SECOND_GENERATION_PROMPT: &str = r#"You are extending an existing fine-tuning dataset of question/answer records.

Subject: {subject} ({description})

Generate exactly {count} further records about {subject}, in the same
style as the dataset sampled below but covering new ground.
Respond with only a JSON array of objects, each with the keys
"instruction", "input" and "output". No prose, no markdown.
{examples}"#;

/// Builds stage- and subject-specific prompts.
///
/// A pure function of its inputs: the only side effect is reading the
/// seed or reference file named by the naming scheme, and a missing file
/// simply yields a prompt without examples.
pub struct PromptBuilder<'a> {
    config: &'a ForgeConfig,
    naming: &'a FileNamingScheme,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(config: &'a ForgeConfig, naming: &'a FileNamingScheme) -> Self {
        Self { config, naming }
    }

    /// Prompt for the first generation stage, seeded from the manual
    /// questions file for the subject when it exists.
    pub fn first_generation(&self, subject: &str) -> String {
        let sample = sample_rows(&self.naming.seed_path(subject));
        self.render(FIRST_GENERATION_PROMPT, subject, &sample, "seed questions")
    }

    /// Prompt for the second generation stage, referencing the dataset
    /// generated so far for the subject.
    pub fn second_generation(&self, subject: &str) -> String {
        let sample = sample_rows(&self.naming.generated_path(subject));
        self.render(
            SECOND_GENERATION_PROMPT,
            subject,
            &sample,
            "existing records",
        )
    }

    fn render(&self, template: &str, subject: &str, sample: &[String], label: &str) -> String {
        let description = self
            .config
            .themes
            .get(subject)
            .map(String::as_str)
            .unwrap_or(subject);

        let examples = if sample.is_empty() {
            String::new()
        } else {
            format!("\nSome {} for reference:\n{}\n", label, sample.join("\n"))
        };

        template
            .replace("{subject}", subject)
            .replace("{description}", description)
            .replace("{count}", &self.config.records_per_batch.to_string())
            .replace("{examples}", &examples)
    }
}

/// Read up to [`SAMPLE_ROWS`] data rows from a delimited file, header
/// excluded. Missing or unreadable files yield an empty sample.
fn sample_rows(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .skip(1)
            .filter(|line| !line.is_empty())
            .take(SAMPLE_ROWS)
            .map(String::from)
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> ForgeConfig {
        let mut config = ForgeConfig::default();
        config
            .themes
            .insert("math".to_string(), "mathematics questions".to_string());
        config
    }

    #[test]
    fn test_first_generation_includes_seed_sample() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = test_config();
        config.data_dir = dir.path().to_path_buf();
        let naming = FileNamingScheme::new(dir.path());

        std::fs::write(
            naming.seed_path("math"),
            "instruction;topic;subject\nWhat is 2+2?;arithmetic;math\nWhat is a prime?;numbers;math\n",
        )
        .expect("write seed");

        let prompt = PromptBuilder::new(&config, &naming).first_generation("math");

        assert!(prompt.contains("Subject: math (mathematics questions)"));
        assert!(prompt.contains("exactly 5 new records"));
        assert!(prompt.contains("What is 2+2?;arithmetic;math"));
        assert!(!prompt.contains("instruction;topic;subject"), "header must not leak");
    }

    #[test]
    fn test_first_generation_without_seed_file() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config();
        let naming = FileNamingScheme::new(dir.path());

        let prompt = PromptBuilder::new(&config, &naming).first_generation("math");

        assert!(prompt.contains("Subject: math"));
        assert!(!prompt.contains("for reference"));
        assert!(!prompt.contains("{examples}"));
    }

    #[test]
    fn test_second_generation_references_generated_dataset() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config();
        let naming = FileNamingScheme::new(dir.path());

        std::fs::write(
            naming.generated_path("math"),
            "instruction;input;output\nWhat is 3*3?;;9\n",
        )
        .expect("write dataset");

        let prompt = PromptBuilder::new(&config, &naming).second_generation("math");

        assert!(prompt.contains("existing records"));
        assert!(prompt.contains("What is 3*3?;;9"));
    }

    #[test]
    fn test_sample_is_capped() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("manual-questions-math.csv");
        let mut content = String::from("header\n");
        for i in 0..20 {
            content.push_str(&format!("row {}\n", i));
        }
        std::fs::write(&path, content).expect("write");

        assert_eq!(sample_rows(&path).len(), SAMPLE_ROWS);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let dir = TempDir::new().expect("tempdir");
        let config = test_config();
        let naming = FileNamingScheme::new(dir.path());
        let builder = PromptBuilder::new(&config, &naming);

        assert_eq!(
            builder.first_generation("math"),
            builder.first_generation("math")
        );
    }
}
