//! Stage construction: what each role is told and what it is asked.
//!
//! Pure functions; no backend calls happen here.

use serde::{Deserialize, Serialize};
use std::fmt;

use courtroom_core::CaseStudy;

use crate::prompts::{judge_prompt, prosecutor_prompt, WITNESS_PROMPT};
use crate::providers::ChatMessage;

/// One step of a trial, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Witness,
    Prosecutor,
    Judge,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Witness, Stage::Prosecutor, Stage::Judge];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Witness => "witness",
            Stage::Prosecutor => "prosecutor",
            Stage::Judge => "judge",
        }
    }

    /// Courtroom title used in transcripts.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Witness => "THE WITNESS",
            Stage::Prosecutor => "THE PROSECUTOR",
            Stage::Judge => "THE MAGISTRATE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction and input for one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub stage: Stage,
    /// Sent as the system message
    pub instruction: String,
    /// Sent as the user message
    pub input: String,
}

impl StagePrompt {
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.instruction.clone()),
            ChatMessage::user(self.input.clone()),
        ]
    }
}

/// Stage 1: the question, verbatim.
pub fn witness(question: &str) -> StagePrompt {
    StagePrompt {
        stage: Stage::Witness,
        instruction: WITNESS_PROMPT.to_string(),
        input: question.to_string(),
    }
}

/// Stage 2: cross-examine the witness against the case facts.
pub fn prosecutor(case: &CaseStudy, question: &str, witness_answer: &str) -> StagePrompt {
    StagePrompt {
        stage: Stage::Prosecutor,
        instruction: prosecutor_prompt(&case.reference_facts),
        input: format!(
            "The Witness just testified: '{}'\n\nQuestion asked: '{}'\n\nCross-examine this testimony.",
            witness_answer, question
        ),
    }
}

/// Stage 3: rule on the whole exchange.
pub fn judge(
    case: &CaseStudy,
    question: &str,
    witness_answer: &str,
    prosecutor_challenge: &str,
) -> StagePrompt {
    StagePrompt {
        stage: Stage::Judge,
        instruction: judge_prompt(&case.reference_facts, witness_answer, prosecutor_challenge),
        input: format!(
            "Deliver your verdict on this exchange regarding the question: '{}'",
            question
        ),
    }
}
