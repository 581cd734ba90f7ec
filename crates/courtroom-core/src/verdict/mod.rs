//! Verdict parsing and validation.
//!
//! The judge is a free-text model asked to return one JSON object.
//! This module turns its raw output into a [`Verdict`](crate::Verdict)
//! or a [`VerdictError`]; there is no fallback verdict.

mod parser;
mod schema;

pub use parser::{parse_verdict, ParsePath, ParsedVerdict, VerdictError};
pub use schema::validate_verdict_schema;
