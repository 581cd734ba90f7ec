//! Session state: the pending trial selection and the trial history.

use crate::types::{TrialRequest, TrialResult};

/// Ordered, append-only record of completed trials.
#[derive(Debug, Clone, Default)]
pub struct TrialHistory {
    entries: Vec<TrialResult>,
}

impl TrialHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, result: TrialResult) {
        self.entries.push(result);
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TrialResult> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Newest first, paired with the 1-based chronological trial number.
    pub fn iter_recent_first(&self) -> impl Iterator<Item = (usize, &TrialResult)> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .map(|(i, result)| (i + 1, result))
    }

    pub fn last(&self) -> Option<&TrialResult> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One user's courtroom session.
///
/// Results only enter the history through [`Session::record`], which takes a
/// finished [`TrialResult`]; a failed trial has nothing to record.
#[derive(Debug, Clone, Default)]
pub struct Session {
    history: TrialHistory,
    pending: Option<TrialRequest>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the next trial to run, replacing any earlier selection.
    pub fn select(&mut self, request: TrialRequest) {
        self.pending = Some(request);
    }

    pub fn pending(&self) -> Option<&TrialRequest> {
        self.pending.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.pending = None;
    }

    /// Append a completed trial and clear the selection.
    pub fn record(&mut self, result: TrialResult) {
        self.history.push(result);
        self.pending = None;
    }

    pub fn history(&self) -> &TrialHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, RiskLevel, Verdict};
    use chrono::Utc;

    fn result(question: &str) -> TrialResult {
        TrialResult {
            case_study: "Climate Change Denial".to_string(),
            question: question.to_string(),
            witness_answer: "w".to_string(),
            prosecutor_challenge: "p".to_string(),
            verdict: Verdict {
                truth_score: 50,
                classification: Classification::Partial,
                reasoning: "r".to_string(),
                harm_assessment: "h".to_string(),
                risk_level: RiskLevel::Medium,
            },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(session.pending().is_none());
        assert!(session.history().is_empty());
        assert!(session.history().last().is_none());
    }

    #[test]
    fn test_history_order() {
        let mut session = Session::new();
        for q in ["q1", "q2", "q3"] {
            session.record(result(q));
        }

        let chronological: Vec<&str> = session
            .history()
            .iter()
            .map(|r| r.question.as_str())
            .collect();
        assert_eq!(chronological, vec!["q1", "q2", "q3"]);

        let recent: Vec<(usize, &str)> = session
            .history()
            .iter_recent_first()
            .map(|(n, r)| (n, r.question.as_str()))
            .collect();
        assert_eq!(recent, vec![(3, "q3"), (2, "q2"), (1, "q1")]);

        assert_eq!(session.history().last().unwrap().question, "q3");
    }

    #[test]
    fn test_record_clears_selection() {
        let mut session = Session::new();
        session.select(TrialRequest::new("Climate Change Denial", "q1"));
        assert!(session.pending().is_some());

        session.record(result("q1"));
        assert!(session.pending().is_none());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_select_replaces_pending() {
        let mut session = Session::new();
        session.select(TrialRequest::new("A", "first"));
        session.select(TrialRequest::new("B", "second"));
        assert_eq!(session.pending().unwrap().question, "second");

        session.clear_selection();
        assert!(session.pending().is_none());
        assert!(session.history().is_empty());
    }
}
