/// Session lifecycle. Transitions only move forward, except that a finished
/// session may be started again.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Countdown,
    Running,
    Finished,
}

impl SessionPhase {
    /// Phase the session moves to when the current one completes.
    pub fn next(&self) -> Self {
        use SessionPhase::*;
        match self {
            Idle => Countdown,
            Countdown => Running,
            Running => Finished,
            Finished => Countdown,
        }
    }

    /// Whether the start key is listened to in this phase.
    pub fn accepts_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Finished)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Display-only split of the countdown.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum CountdownStage {
    Ready,
    Go,
}

impl CountdownStage {
    /// Seconds of the countdown spent showing "ready".
    pub const READY_SECS: f64 = 1.0;

    pub fn at(elapsed: f64) -> Self {
        if elapsed < Self::READY_SECS {
            CountdownStage::Ready
        } else {
            CountdownStage::Go
        }
    }
}
