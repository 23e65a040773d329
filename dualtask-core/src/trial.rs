use serde::{Deserialize, Serialize};

/// Resolution of one N-back trial. Exactly one is produced per resolved trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialOutcome {
    /// Pressed on a match.
    Correct,
    /// Pressed on a non-match.
    Wrong,
    /// Let a match time out.
    Missed,
    /// Let a non-match time out.
    NoOp,
}

impl TrialOutcome {
    /// The outcome is fully determined by whether the word matched and
    /// whether the response key was pressed.
    pub fn classify(is_match: bool, pressed: bool) -> Self {
        match (is_match, pressed) {
            (true, true) => TrialOutcome::Correct,
            (true, false) => TrialOutcome::Missed,
            (false, true) => TrialOutcome::Wrong,
            (false, false) => TrialOutcome::NoOp,
        }
    }

    /// Whether the outcome changes a counter (and so gets feedback).
    pub fn is_scored(&self) -> bool {
        !matches!(self, TrialOutcome::NoOp)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NBackScore {
    pub correct: u32,
    pub wrong: u32,
    pub missed: u32,
}

impl NBackScore {
    pub fn record(&mut self, outcome: TrialOutcome) {
        match outcome {
            TrialOutcome::Correct => self.correct += 1,
            TrialOutcome::Wrong => self.wrong += 1,
            TrialOutcome::Missed => self.missed += 1,
            TrialOutcome::NoOp => {}
        }
    }

    /// `correct - wrong - missed`; may be negative.
    pub fn total(&self) -> i64 {
        self.correct as i64 - self.wrong as i64 - self.missed as i64
    }
}
