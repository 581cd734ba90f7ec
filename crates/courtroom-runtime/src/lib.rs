//! # courtroom-runtime
//!
//! LLM-backed trial orchestration for the hallucination courtroom.
//!
//! `courtroom-core` owns the data and the verdict contract; this crate makes
//! the three backend calls of a trial and turns the judge's output into a
//! [`TrialResult`](courtroom_core::TrialResult).
//!
//! ## Example
//!
//! ```rust,ignore
//! use courtroom_runtime::{ProviderRegistry, RuntimeConfig, TrialOrchestrator};
//!
//! let config = RuntimeConfig::from_yaml_file("courtroom.yaml")?;
//! let provider = ProviderRegistry::with_defaults().create_from_config(&config.provider)?;
//! let orchestrator = TrialOrchestrator::new(provider, config);
//!
//! let result = orchestrator
//!     .run_trial("COVID-19 Misinformation", "Does ivermectin cure COVID-19?")
//!     .await?;
//! println!("{}: {}", result.verdict.classification, result.verdict.reasoning);
//! ```

pub mod config;
pub mod fakes;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod stages;

pub use config::{ConfigError, ProviderConfig, RuntimeConfig};
pub use orchestrator::{
    NoopObserver, PartialTranscript, TrialError, TrialObserver, TrialOrchestrator,
    TrialOrchestratorBuilder,
};
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, KeyOrigin,
    LlmProvider, ProviderError, ProviderFactory, ProviderRegistry, TokenUsage,
};
pub use resilience::{LlmUsage, RetryPolicy, UsageTracker};
pub use stages::{Stage, StagePrompt};

#[cfg(feature = "groq")]
pub use providers::{GroqProvider, GroqProviderFactory, GROQ_API_KEY_ENV};
