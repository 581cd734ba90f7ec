//! Trial orchestrator.
//!
//! A trial is three dependent backend calls in strict order:
//! witness, then prosecutor (sees the testimony), then judge (sees both).
//! Any failure aborts the trial. The text of stages that did complete is
//! returned inside the error as a [`PartialTranscript`], but no
//! [`TrialResult`] is built.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use courtroom_core::{parse_verdict, CaseLibrary, ParsePath, Session, TrialResult, VerdictError};

use crate::config::RuntimeConfig;
use crate::providers::{CompletionConfig, LlmProvider, ProviderError};
use crate::resilience::{LlmUsage, RetryPolicy, UsageTracker};
use crate::stages::{self, Stage, StagePrompt};

/// Outputs of the stages that completed before a trial failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialTranscript {
    pub case_study: String,
    pub question: String,
    pub witness_answer: Option<String>,
    pub prosecutor_challenge: Option<String>,
    /// Raw judge output, present when the verdict failed to parse
    pub judge_output: Option<String>,
}

impl PartialTranscript {
    fn new(case_study: &str, question: &str) -> Self {
        Self {
            case_study: case_study.to_string(),
            question: question.to_string(),
            ..Default::default()
        }
    }

    /// Completed stages and their text, in order.
    pub fn completed(&self) -> Vec<(Stage, &str)> {
        [
            (Stage::Witness, &self.witness_answer),
            (Stage::Prosecutor, &self.prosecutor_challenge),
            (Stage::Judge, &self.judge_output),
        ]
        .into_iter()
        .filter_map(|(stage, text)| text.as_deref().map(|t| (stage, t)))
        .collect()
    }
}

/// Errors from running a trial.
#[derive(Error, Debug)]
pub enum TrialError {
    /// Rejected before any backend call.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Backend unavailable during {stage} stage: {source}")]
    BackendUnavailable {
        stage: Stage,
        #[source]
        source: ProviderError,
        transcript: PartialTranscript,
    },

    #[error("{source}")]
    VerdictParse {
        #[source]
        source: VerdictError,
        transcript: PartialTranscript,
    },
}

impl TrialError {
    /// Stage outputs gathered before the failure, if any call was made.
    pub fn transcript(&self) -> Option<&PartialTranscript> {
        match self {
            TrialError::InvalidSelection(_) => None,
            TrialError::BackendUnavailable { transcript, .. }
            | TrialError::VerdictParse { transcript, .. } => Some(transcript),
        }
    }

    /// Stage that failed, if the failure happened during a stage.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TrialError::InvalidSelection(_) => None,
            TrialError::BackendUnavailable { stage, .. } => Some(*stage),
            TrialError::VerdictParse { .. } => Some(Stage::Judge),
        }
    }
}

/// Progress callbacks, invoked in stage order on the trial's task.
pub trait TrialObserver: Send + Sync {
    fn stage_started(&self, _stage: Stage) {}

    /// `text` is the stage output exactly as the model returned it.
    fn stage_completed(&self, _stage: Stage, _text: &str) {}
}

/// Observer that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TrialObserver for NoopObserver {}

/// Runs trials against one provider and case library.
///
/// `run_trial` takes `&self`; several trials may run concurrently on one
/// orchestrator. Usage is accumulated across all of them.
pub struct TrialOrchestrator {
    provider: Arc<dyn LlmProvider>,
    cases: Arc<CaseLibrary>,
    completion: CompletionConfig,
    retry: RetryPolicy,
    usage: UsageTracker,
}

impl TrialOrchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            cases: Arc::new(CaseLibrary::builtin().clone()),
            completion: config.completion,
            retry: config.retry,
            usage: UsageTracker::new(),
        }
    }

    pub fn builder() -> TrialOrchestratorBuilder {
        TrialOrchestratorBuilder::new()
    }

    pub fn cases(&self) -> &CaseLibrary {
        &self.cases
    }

    /// Run one trial.
    pub async fn run_trial(
        &self,
        case_study: &str,
        question: &str,
    ) -> Result<TrialResult, TrialError> {
        self.run_trial_observed(case_study, question, &NoopObserver)
            .await
    }

    /// Run one trial, reporting each stage to `observer` as it starts and completes.
    pub async fn run_trial_observed(
        &self,
        case_study: &str,
        question: &str,
        observer: &dyn TrialObserver,
    ) -> Result<TrialResult, TrialError> {
        let case = self
            .cases
            .lookup(case_study)
            .map_err(|e| TrialError::InvalidSelection(e.to_string()))?;

        if question.trim().is_empty() {
            return Err(TrialError::InvalidSelection(
                "question must not be blank".to_string(),
            ));
        }

        if !self.provider.health_check().await {
            return Err(TrialError::InvalidSelection(format!(
                "provider '{}' has no usable API credential",
                self.provider.name()
            )));
        }

        info!(case_study = %case.name, provider = self.provider.name(), "Trial started");
        let started = Instant::now();
        let mut transcript = PartialTranscript::new(&case.name, question);

        let witness_answer = self
            .call_stage(&stages::witness(question), observer)
            .await
            .map_err(|e| unavailable(Stage::Witness, e, &transcript))?;
        transcript.witness_answer = Some(witness_answer.clone());

        let prosecutor_challenge = self
            .call_stage(
                &stages::prosecutor(case, question, &witness_answer),
                observer,
            )
            .await
            .map_err(|e| unavailable(Stage::Prosecutor, e, &transcript))?;
        transcript.prosecutor_challenge = Some(prosecutor_challenge.clone());

        let judge_output = self
            .call_stage(
                &stages::judge(case, question, &witness_answer, &prosecutor_challenge),
                observer,
            )
            .await
            .map_err(|e| unavailable(Stage::Judge, e, &transcript))?;

        debug!(raw = %judge_output, "Judge output");

        let parsed = match parse_verdict(&judge_output) {
            Ok(parsed) => parsed,
            Err(source) => {
                warn!(error = %source, "Judge verdict rejected");
                transcript.judge_output = Some(judge_output);
                return Err(TrialError::VerdictParse { source, transcript });
            }
        };

        if parsed.path == ParsePath::Extracted {
            debug!("Verdict extracted from surrounding prose");
        }

        info!(
            case_study = %case.name,
            truth_score = parsed.verdict.truth_score,
            verdict = %parsed.verdict.classification,
            risk_level = %parsed.verdict.risk_level,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trial completed"
        );

        Ok(TrialResult {
            case_study: case.name.clone(),
            question: question.to_string(),
            witness_answer,
            prosecutor_challenge,
            verdict: parsed.verdict,
            timestamp: Utc::now(),
        })
    }

    /// Run the session's selected trial.
    ///
    /// On success the result is appended to the history and the selection is
    /// cleared. On failure the session is left exactly as it was.
    pub async fn run_pending(&self, session: &mut Session) -> Result<TrialResult, TrialError> {
        self.run_pending_observed(session, &NoopObserver).await
    }

    pub async fn run_pending_observed(
        &self,
        session: &mut Session,
        observer: &dyn TrialObserver,
    ) -> Result<TrialResult, TrialError> {
        let request = session
            .pending()
            .cloned()
            .ok_or_else(|| TrialError::InvalidSelection("no trial selected".to_string()))?;

        let result = self
            .run_trial_observed(&request.case_study, &request.question, observer)
            .await?;

        session.record(result.clone());
        Ok(result)
    }

    /// One backend call with timeout, retry and usage accounting.
    async fn call_stage(
        &self,
        prompt: &StagePrompt,
        observer: &dyn TrialObserver,
    ) -> Result<String, ProviderError> {
        let stage = prompt.stage;
        observer.stage_started(stage);
        info!(stage = %stage, "Stage started");

        let started = Instant::now();
        let provider = &self.provider;
        let completion = &self.completion;
        let messages = prompt.to_messages();
        let messages = &messages;

        let response = self
            .retry
            .run(stage.as_str(), move || async move {
                match tokio::time::timeout(
                    completion.timeout,
                    provider.complete(messages.clone(), completion),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(completion.timeout)),
                }
            })
            .await?;

        if response.content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        self.usage.record(&response.usage, &response.model);

        info!(
            stage = %stage,
            latency_ms = started.elapsed().as_millis() as u64,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Stage completed"
        );

        observer.stage_completed(stage, &response.content);
        Ok(response.content)
    }

    /// Usage accumulated across every trial run so far.
    pub fn usage(&self) -> LlmUsage {
        self.usage.snapshot()
    }
}

fn unavailable(stage: Stage, source: ProviderError, transcript: &PartialTranscript) -> TrialError {
    warn!(stage = %stage, error = %source, "Stage failed, trial aborted");
    TrialError::BackendUnavailable {
        stage,
        source,
        transcript: transcript.clone(),
    }
}

/// Builder for [`TrialOrchestrator`].
pub struct TrialOrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    cases: Option<Arc<CaseLibrary>>,
    config: RuntimeConfig,
}

impl TrialOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            cases: None,
            config: RuntimeConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the built-in case library.
    pub fn cases(mut self, cases: CaseLibrary) -> Self {
        self.cases = Some(Arc::new(cases));
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn completion(mut self, completion: CompletionConfig) -> Self {
        self.config.completion = completion;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn build(self) -> Result<TrialOrchestrator, ProviderError> {
        let provider = self
            .provider
            .ok_or_else(|| ProviderError::NotConfigured("No provider set".to_string()))?;

        let mut orchestrator = TrialOrchestrator::new(provider, self.config);
        if let Some(cases) = self.cases {
            orchestrator.cases = cases;
        }

        Ok(orchestrator)
    }
}

impl Default for TrialOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
