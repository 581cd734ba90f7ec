//! Trial records: requests, verdicts and results.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A topic with reference facts and example questions.
///
/// Case studies are immutable once a [`CaseLibrary`](crate::CaseLibrary) is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseStudy {
    /// Unique key within a library
    pub name: String,

    /// Ground truth given to the prosecutor and judge
    pub reference_facts: String,

    /// Example questions, in display order
    pub sample_questions: Vec<String>,
}

impl CaseStudy {
    /// Sample question by zero-based index.
    pub fn sample(&self, index: usize) -> Option<&str> {
        self.sample_questions.get(index).map(String::as_str)
    }
}

/// A request to put one question to the witness under one case study.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialRequest {
    /// Name of the case study whose facts the prosecutor and judge use
    pub case_study: String,

    /// The question put to the witness
    pub question: String,
}

impl TrialRequest {
    pub fn new(case_study: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            case_study: case_study.into(),
            question: question.into(),
        }
    }
}

/// The judge's classification of the witness testimony.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Truthful,
    Partial,
    Fabricated,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Truthful => write!(f, "TRUTHFUL"),
            Classification::Partial => write!(f, "PARTIAL"),
            Classification::Fabricated => write!(f, "FABRICATED"),
        }
    }
}

/// How much real-world harm the testimony could cause.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Coarse bucket of a truth score, used when displaying verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 70-100
    Reliable,
    /// 40-69
    Mixed,
    /// 0-39
    Unreliable,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => ScoreBand::Reliable,
            40..=69 => ScoreBand::Mixed,
            _ => ScoreBand::Unreliable,
        }
    }
}

/// The judge's structured verdict.
///
/// Field names on the wire follow the judge's output contract:
/// `truth_score`, `verdict`, `reasoning`, `sanction_report`, `risk_level`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    /// Factual accuracy, 0-100
    #[serde(deserialize_with = "deserialize_score")]
    pub truth_score: u8,

    /// TRUTHFUL, PARTIAL or FABRICATED
    #[serde(rename = "verdict")]
    pub classification: Classification,

    /// Short explanation of the score
    pub reasoning: String,

    /// Real-world harm assessment
    #[serde(rename = "sanction_report")]
    pub harm_assessment: String,

    /// HIGH, MEDIUM or LOW
    pub risk_level: RiskLevel,
}

impl Verdict {
    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_score(self.truth_score)
    }
}

/// Models occasionally emit `85.0` for an integer score.
/// Range is enforced by the verdict schema before this runs.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !(0.0..=100.0).contains(&raw) {
        return Err(serde::de::Error::custom(format!(
            "truth_score {} outside 0-100",
            raw
        )));
    }
    Ok(raw.round() as u8)
}

/// A completed trial. Only ever built once every stage has succeeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialResult {
    /// Case study the trial ran under
    pub case_study: String,

    /// The question put to the witness
    pub question: String,

    /// Witness testimony, verbatim
    pub witness_answer: String,

    /// Prosecutor cross-examination, verbatim
    pub prosecutor_challenge: String,

    /// Parsed judge verdict
    pub verdict: Verdict,

    /// When the trial completed
    pub timestamp: DateTime<Utc>,
}

impl TrialResult {
    /// Timestamp in local time, `%Y-%m-%d %H:%M:%S`.
    pub fn display_timestamp(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}
