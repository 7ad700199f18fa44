//! Launch phase state machine.
//!
//! A launch is `Pending` from spawn until its outcome resolves; all
//! four terminal phases are absorbing.

use chrono::{DateTime, Utc};
use replaunch_shared::{LaunchError, LaunchResult};
use serde::{Deserialize, Serialize};

/// Phase of a launch.
///
/// ```text
/// Pending -> Connected   (ack arrived, session attached)
/// Pending -> TimedOut    (no ack in time, runtime terminated)
/// Pending -> Cancelled   (user cancel, runtime terminated)
/// Pending -> Failed      (attach failed, runtime left running)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchPhase {
    /// Waiting for the runtime's ack.
    Pending,

    /// Session attached; the launch succeeded.
    Connected,

    /// No ack arrived within the timeout.
    TimedOut,

    /// The wait was cancelled by the user.
    Cancelled,

    /// The ack arrived but the session could not be attached.
    Failed,
}

impl LaunchPhase {
    /// Terminal phases are absorbing: no further transition is valid.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LaunchPhase::Pending)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, LaunchPhase::Connected)
    }

    /// Check if transition to the target phase is valid.
    pub fn can_transition_to(&self, target: LaunchPhase) -> bool {
        matches!(self, LaunchPhase::Pending) && target.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchPhase::Pending => "pending",
            LaunchPhase::Connected => "connected",
            LaunchPhase::TimedOut => "timed-out",
            LaunchPhase::Cancelled => "cancelled",
            LaunchPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LaunchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LaunchPhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LaunchPhase::Pending),
            "connected" => Ok(LaunchPhase::Connected),
            "timed-out" => Ok(LaunchPhase::TimedOut),
            "cancelled" => Ok(LaunchPhase::Cancelled),
            "failed" => Ok(LaunchPhase::Failed),
            _ => Err(()),
        }
    }
}

/// Dynamic state of a launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchState {
    /// Current phase.
    pub phase: LaunchPhase,
    /// Pid of the spawned runtime, while known.
    pub pid: Option<u32>,
    /// Last phase change timestamp (UTC).
    pub last_updated: DateTime<Utc>,
}

impl LaunchState {
    /// Fresh state for a just-spawned launch.
    pub fn new(pid: Option<u32>) -> Self {
        Self {
            phase: LaunchPhase::Pending,
            pid,
            last_updated: Utc::now(),
        }
    }

    /// Attempt a phase transition with validation.
    pub fn transition_to(&mut self, target: LaunchPhase) -> LaunchResult<()> {
        if !self.phase.can_transition_to(target) {
            return Err(LaunchError::InvalidState(format!(
                "cannot transition from {} to {}",
                self.phase, target
            )));
        }
        self.phase = target;
        self.last_updated = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_reaches_every_terminal_phase() {
        for target in [
            LaunchPhase::Connected,
            LaunchPhase::TimedOut,
            LaunchPhase::Cancelled,
            LaunchPhase::Failed,
        ] {
            assert!(LaunchPhase::Pending.can_transition_to(target));
        }
    }

    #[test]
    fn test_terminal_phases_are_absorbing() {
        for source in [
            LaunchPhase::Connected,
            LaunchPhase::TimedOut,
            LaunchPhase::Cancelled,
            LaunchPhase::Failed,
        ] {
            assert!(source.is_terminal());
            for target in [
                LaunchPhase::Pending,
                LaunchPhase::Connected,
                LaunchPhase::TimedOut,
                LaunchPhase::Cancelled,
                LaunchPhase::Failed,
            ] {
                assert!(!source.can_transition_to(target));
            }
        }
    }

    #[test]
    fn test_state_transition() {
        let mut state = LaunchState::new(Some(42));
        assert_eq!(state.phase, LaunchPhase::Pending);

        state.transition_to(LaunchPhase::Connected).unwrap();
        assert_eq!(state.phase, LaunchPhase::Connected);

        let result = state.transition_to(LaunchPhase::Cancelled);
        assert!(matches!(result, Err(LaunchError::InvalidState(_))));
        assert_eq!(state.phase, LaunchPhase::Connected);
    }

    #[test]
    fn test_phase_string_roundtrip() {
        for phase in [
            LaunchPhase::Pending,
            LaunchPhase::Connected,
            LaunchPhase::TimedOut,
            LaunchPhase::Cancelled,
            LaunchPhase::Failed,
        ] {
            assert_eq!(phase.as_str().parse::<LaunchPhase>(), Ok(phase));
        }
        assert!("bogus".parse::<LaunchPhase>().is_err());
    }
}
