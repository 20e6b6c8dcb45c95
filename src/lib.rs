//! corpus-forge: instruction-tuning corpus generator.
//!
//! This library provides the pieces of a dataset-generation pipeline:
//! templated prompts against an LLM completion endpoint, delimited-file
//! accumulation of the structured replies, corpus merging and
//! deduplication.

// Core modules
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod store;

// Re-export commonly used error types
pub use config::ConfigError;
pub use error::{LlmError, StoreError};
pub use pipeline::PipelineError;
