/// Defines game phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn label(&self) -> &'static str;

    fn is_idle(&self) -> bool {
        false
    }
}

/// Reaction game: `Idle -> Waiting -> Ready -> Idle`.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum ReactionPhase {
    Idle,
    Waiting,
    Ready,
}

impl Default for ReactionPhase {
    fn default() -> Self {
        ReactionPhase::Idle
    }
}

impl Phase for ReactionPhase {
    fn allows_input(&self) -> bool {
        !matches!(self, Self::Idle)
    }
    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Ready => "ready",
        }
    }
    fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Stream games (Stroop, N-back, Go/No-Go) alternate between a visible
/// stimulus and a blank interval.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TrialPhase {
    #[default]
    Idle,
    Stimulus,
    Interval,
}

impl Phase for TrialPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Stimulus)
    }
    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Stimulus => "stimulus",
            Self::Interval => "interval",
        }
    }
    fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SimonPhase {
    #[default]
    Idle,
    LeadIn,
    Replay,
    Input,
    Failed,
}

impl Phase for SimonPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Input)
    }
    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LeadIn => "lead-in",
            Self::Replay => "replay",
            Self::Input => "input",
            Self::Failed => "failed",
        }
    }
    fn is_idle(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum GridPhase {
    #[default]
    Idle,
    Showing,
    Input,
    Failed,
}

impl Phase for GridPhase {
    fn allows_input(&self) -> bool {
        matches!(self, Self::Input)
    }
    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Showing => "showing",
            Self::Input => "input",
            Self::Failed => "failed",
        }
    }
    fn is_idle(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed)
    }
}
