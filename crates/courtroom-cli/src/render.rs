//! Plain-text rendering of transcripts, verdicts and history.

use std::fmt::Write;

use courtroom_core::{CaseStudy, ScoreBand, TrialHistory, Verdict};
use courtroom_runtime::{PartialTranscript, Stage};

const RULE: &str = "------------------------------------------------------------";

/// Longest question prefix shown in a history line.
pub const HISTORY_QUESTION_CHARS: usize = 60;

/// Stages printed as soon as they complete. The judge's raw output is
/// shown only through its parsed verdict.
pub const LIVE_STAGES: [Stage; 2] = [Stage::Witness, Stage::Prosecutor];

pub fn stage_block(stage: Stage, text: &str) -> String {
    format!("[{}]\n{}\n", stage.title(), text.trim_end())
}

/// Block for a stage that just completed, if it is printed live.
pub fn live_stage(stage: Stage, text: &str) -> Option<String> {
    LIVE_STAGES
        .contains(&stage)
        .then(|| stage_block(stage, text))
}

pub fn case_header(case_study: &str, question: &str) -> String {
    format!("{RULE}\nCase: {case_study}\nQuestion under examination: {question}\n{RULE}\n")
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Reliable => "reliable",
        ScoreBand::Mixed => "mixed",
        ScoreBand::Unreliable => "unreliable",
    }
}

pub fn verdict(verdict: &Verdict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "MAGISTRATE'S VERDICT");
    let _ = writeln!(out, "  Classification: {}", verdict.classification);
    let _ = writeln!(
        out,
        "  Truth score:    {}% ({})",
        verdict.truth_score,
        band_label(verdict.score_band())
    );
    let _ = writeln!(out, "  Risk level:     {}", verdict.risk_level);
    let _ = writeln!(out, "  Reasoning:      {}", verdict.reasoning);
    let _ = writeln!(out, "SANCTION REPORT - REAL-WORLD HARM ASSESSMENT");
    let _ = writeln!(out, "  {}", verdict.harm_assessment);
    out
}

/// Stages that completed before a trial failed, skipping those in `shown`.
pub fn partial_transcript(transcript: &PartialTranscript, shown: &[Stage]) -> String {
    transcript
        .completed()
        .into_iter()
        .filter(|(stage, _)| !shown.contains(stage))
        .map(|(stage, text)| stage_block(stage, text))
        .collect()
}

/// Cut `text` to `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Newest trial first, numbered chronologically.
pub fn history(history: &TrialHistory) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut out = format!("{RULE}\nTRIAL HISTORY\n");
    for (number, trial) in history.iter_recent_first() {
        let _ = writeln!(
            out,
            "Trial #{}: {} | Truth: {}% | Risk: {}",
            number,
            truncate(&trial.question, HISTORY_QUESTION_CHARS),
            trial.verdict.truth_score,
            trial.verdict.risk_level
        );
        let _ = writeln!(
            out,
            "  {} | {} | {}",
            trial.display_timestamp(),
            trial.case_study,
            trial.verdict.classification
        );
    }
    out
}

pub fn case_summary(case: &CaseStudy) -> String {
    format!("{} ({} sample questions)", case.name, case.sample_questions.len())
}

pub fn case_detail(case: &CaseStudy) -> String {
    let mut out = format!("{}\n\n{}\n\nSample questions:\n", case.name, case.reference_facts);
    for (i, question) in case.sample_questions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, question);
    }
    out
}
