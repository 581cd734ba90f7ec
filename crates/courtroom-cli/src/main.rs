//! Hallucination Courtroom CLI
//!
//! The `courtroom` command puts an LLM witness on trial: a prosecutor
//! cross-examines its testimony against a case study's reference facts and
//! a magistrate delivers a structured verdict.
//!
//! ## Commands
//!
//! - `cases`: List the case studies
//! - `show`: Print a case study's reference facts and sample questions
//! - `trial`: Run one or more trials and print verdicts and session history

mod render;
mod telemetry;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use courtroom_core::{CaseLibrary, CaseStudy, Session, TrialRequest};
use courtroom_runtime::{
    ProviderRegistry, RuntimeConfig, Stage, TrialError, TrialObserver, TrialOrchestrator,
};

#[derive(Parser)]
#[command(name = "courtroom")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Put LLM answers on trial against known facts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Runtime config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Case library file (YAML), replacing the built-in cases
    #[arg(long, global = true)]
    cases: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available case studies
    Cases,

    /// Show a case study's reference facts and sample questions
    Show {
        /// Case study name
        case: String,
    },

    /// Put the witness on trial
    Trial {
        /// Case study name
        #[arg(long = "case")]
        case_study: String,

        /// Free-text question (repeatable)
        #[arg(short, long)]
        question: Vec<String>,

        /// Sample question number from `show` (repeatable)
        #[arg(short, long)]
        sample: Vec<usize>,

        /// Run every sample question of the case
        #[arg(long, conflicts_with_all = ["question", "sample"])]
        all_samples: bool,

        /// Groq API key
        #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Model override
        #[arg(short, long)]
        model: Option<String>,

        /// Print each trial result as a JSON line instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    telemetry::init_tracing(cli.log_json, level);

    let cases = load_cases(cli.cases.as_ref())?;

    match cli.command {
        Commands::Cases => {
            for case in cases.iter() {
                println!("{}", render::case_summary(case));
            }
            Ok(())
        }
        Commands::Show { case } => {
            let case = cases.lookup(&case)?;
            print!("{}", render::case_detail(case));
            Ok(())
        }
        Commands::Trial {
            case_study,
            question,
            sample,
            all_samples,
            api_key,
            model,
            json,
        } => {
            let case = cases.lookup(&case_study)?;
            let questions = select_questions(case, question, &sample, all_samples)?;

            let mut config = match &cli.config {
                Some(path) => RuntimeConfig::from_yaml_file(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => RuntimeConfig::default(),
            };
            if let Some(key) = api_key {
                config.provider.set_setting("api_key", key);
            }
            if let Some(model) = model {
                config.completion.model = model;
            }
            config.validate()?;

            let provider = ProviderRegistry::with_defaults()
                .create_from_config(&config.provider)
                .context("Failed to create provider")?;

            let orchestrator = TrialOrchestrator::builder()
                .provider(provider)
                .cases(cases.clone())
                .config(config)
                .build()?;

            cmd_trial(&orchestrator, &case.name, questions, json).await
        }
    }
}

fn load_cases(path: Option<&PathBuf>) -> Result<CaseLibrary> {
    match path {
        Some(path) => CaseLibrary::from_yaml_file(path)
            .with_context(|| format!("Failed to load cases {}", path.display())),
        None => Ok(CaseLibrary::builtin().clone()),
    }
}

/// Resolve the trial's questions. Sample numbers are 1-based, as printed by `show`.
fn select_questions(
    case: &CaseStudy,
    free_text: Vec<String>,
    samples: &[usize],
    all_samples: bool,
) -> Result<Vec<String>> {
    if all_samples {
        return Ok(case.sample_questions.clone());
    }

    let mut questions = Vec::with_capacity(samples.len() + free_text.len());
    for &number in samples {
        let question = number
            .checked_sub(1)
            .and_then(|idx| case.sample(idx))
            .with_context(|| {
                format!(
                    "'{}' has no sample question #{} (1-{})",
                    case.name,
                    number,
                    case.sample_questions.len()
                )
            })?;
        questions.push(question.to_string());
    }
    questions.extend(free_text);

    if questions.is_empty() {
        bail!("No question given: use --question, --sample or --all-samples");
    }
    Ok(questions)
}

/// Prints witness and prosecutor stages to stdout as they complete.
struct StagePrinter;

impl TrialObserver for StagePrinter {
    fn stage_completed(&self, stage: Stage, text: &str) {
        if let Some(block) = render::live_stage(stage, text) {
            println!("{}", block);
        }
    }
}

async fn cmd_trial(
    orchestrator: &TrialOrchestrator,
    case_study: &str,
    questions: Vec<String>,
    json: bool,
) -> Result<()> {
    let mut session = Session::new();
    let mut failure: Option<TrialError> = None;

    for question in questions {
        if !json {
            print!("{}", render::case_header(case_study, &question));
        }
        session.select(TrialRequest::new(case_study, question));

        let outcome = if json {
            orchestrator.run_pending(&mut session).await
        } else {
            orchestrator
                .run_pending_observed(&mut session, &StagePrinter)
                .await
        };

        match outcome {
            Ok(result) if json => println!("{}", serde_json::to_string(&result)?),
            Ok(result) => println!("{}", render::verdict(&result.verdict)),
            Err(err) => {
                // Text mode already printed the live stages; JSON mode printed none
                if let Some(transcript) = err.transcript() {
                    if json {
                        eprint!("{}", render::partial_transcript(transcript, &[]));
                    } else {
                        print!(
                            "{}",
                            render::partial_transcript(transcript, &render::LIVE_STAGES)
                        );
                    }
                }
                failure = Some(err);
                break;
            }
        }
    }

    if !json {
        print!("{}", render::history(session.history()));
    }

    let usage = orchestrator.usage();
    info!(
        trials = session.history().len(),
        llm_calls = usage.llm_calls,
        total_tokens = usage.total_tokens,
        estimated_cost = usage.estimated_cost,
        "Session finished"
    );

    match failure {
        Some(err) => Err(err).context("Trial failed"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climate() -> &'static CaseStudy {
        CaseLibrary::builtin()
            .lookup("Climate Change Denial")
            .unwrap()
    }

    #[test]
    fn test_samples_are_one_based() {
        let questions = select_questions(climate(), vec![], &[1, 5], false).unwrap();
        assert_eq!(
            questions,
            vec![
                climate().sample_questions[0].clone(),
                climate().sample_questions[4].clone(),
            ]
        );
    }

    #[test]
    fn test_samples_come_before_free_text() {
        let questions =
            select_questions(climate(), vec!["Is the sun hot?".to_string()], &[2], false).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0], climate().sample_questions[1]);
        assert_eq!(questions[1], "Is the sun hot?");
    }

    #[test]
    fn test_sample_zero_is_rejected() {
        let err = select_questions(climate(), vec![], &[0], false).unwrap_err();
        assert!(err.to_string().contains("no sample question #0 (1-5)"));
    }

    #[test]
    fn test_out_of_range_sample_is_rejected() {
        let err = select_questions(climate(), vec![], &[6], false).unwrap_err();
        assert!(err.to_string().contains("no sample question #6 (1-5)"));
    }

    #[test]
    fn test_no_question_is_rejected() {
        let err = select_questions(climate(), vec![], &[], false).unwrap_err();
        assert!(err.to_string().starts_with("No question given"));
    }

    #[test]
    fn test_all_samples() {
        let questions = select_questions(climate(), vec![], &[], true).unwrap();
        assert_eq!(questions, climate().sample_questions);
    }

    #[test]
    fn test_cli_parses_trial_flags() {
        let cli = Cli::try_parse_from([
            "courtroom",
            "trial",
            "--case",
            "Climate Change Denial",
            "-s",
            "3",
            "-q",
            "Is the sun hot?",
        ])
        .unwrap();

        match cli.command {
            Commands::Trial {
                case_study,
                question,
                sample,
                all_samples,
                ..
            } => {
                assert_eq!(case_study, "Climate Change Denial");
                assert_eq!(question, vec!["Is the sun hot?"]);
                assert_eq!(sample, vec![3]);
                assert!(!all_samples);
            }
            _ => panic!("expected trial command"),
        }
    }

    #[test]
    fn test_all_samples_conflicts_with_sample() {
        assert!(Cli::try_parse_from([
            "courtroom",
            "trial",
            "--case",
            "Climate Change Denial",
            "--all-samples",
            "--sample",
            "1",
        ])
        .is_err());
    }
}
