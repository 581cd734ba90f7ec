//! # courtroom-core
//!
//! Deterministic building blocks of the hallucination courtroom.
//!
//! A trial puts one question to a *witness* model, has a *prosecutor* model
//! cross-examine the answer against a case study's reference facts, and asks
//! a *judge* model for a structured verdict. This crate holds everything about
//! that process that does not talk to a model:
//!
//! - [`CaseLibrary`]: the closed set of case studies
//! - [`Verdict`] and [`parse_verdict`]: the judge's output contract
//! - [`Session`]: the pending selection and the append-only trial history
//!
//! ## Example
//!
//! ```rust
//! use courtroom_core::{parse_verdict, CaseLibrary, Classification};
//!
//! let case = CaseLibrary::builtin().lookup("COVID-19 Misinformation").unwrap();
//! assert!(!case.sample_questions.is_empty());
//!
//! let raw = r#"Here is my verdict: {"truth_score": 85, "verdict": "TRUTHFUL",
//!     "reasoning": "r", "sanction_report": "s", "risk_level": "LOW"} Thank you."#;
//! let parsed = parse_verdict(raw).unwrap();
//! assert_eq!(parsed.verdict.classification, Classification::Truthful);
//! ```

pub mod cases;
pub mod session;
pub mod types;
pub mod verdict;

pub use cases::{CaseError, CaseLibrary};
pub use session::{Session, TrialHistory};
pub use types::{
    CaseStudy, Classification, RiskLevel, ScoreBand, TrialRequest, TrialResult, Verdict,
};
pub use verdict::{parse_verdict, validate_verdict_schema, ParsePath, ParsedVerdict, VerdictError};
