//! VM lifecycle state machine (spec §3 "Lifecycles", §4.5).

use crate::error::{Error, Result};

/// Lifecycle state of a [`VmSpec`](crate::spec::VmSpec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum VmState {
    Initial,
    Started,
    Running,
    Paused,
    Shutdown,
    Exited,
}

/// Outcome of checking whether a lifecycle transition is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The operation proceeds and the state advances to the given state.
    Advance(VmState),
    /// The operation is legal but a no-op; the state is unchanged.
    Idempotent,
}

/// Check whether `operation` may run from `state`, per spec §4.5.
pub fn check_transition(operation: &str, state: VmState) -> Result<Transition> {
    use VmState::*;
    let transition = match (operation, state) {
        ("start", Initial) => Transition::Advance(Started),
        ("start", Started) => Transition::Idempotent,

        ("boot", Started) | ("boot", Shutdown) => Transition::Advance(Running),
        ("boot", Running) => Transition::Idempotent,

        ("pause", Running) => Transition::Advance(Paused),
        ("pause", Paused) => Transition::Idempotent,

        ("resume", Paused) => Transition::Advance(Running),
        ("resume", Running) => Transition::Idempotent,

        ("shutdown", Running) => Transition::Advance(Shutdown),
        ("shutdown", Shutdown) => Transition::Idempotent,

        ("stop", Started) | ("stop", Running) | ("stop", Paused) => Transition::Advance(Exited),
        ("stop", Exited) => Transition::Idempotent,

        ("snapshot_save", Paused) => Transition::Idempotent,
        ("snapshot_load", Started) => Transition::Idempotent,

        ("flush_metrics", Started)
        | ("flush_metrics", Running)
        | ("flush_metrics", Paused)
        | ("flush_metrics", Shutdown) => Transition::Idempotent,

        _ => return Err(Error::invalid_state(operation, state)),
    };
    Ok(transition)
}

/// Whether `set_option`/`jail` are legal: only while `state == Initial`.
pub fn require_initial(operation: &str, state: VmState) -> Result<()> {
    if state == VmState::Initial {
        Ok(())
    } else {
        Err(Error::invalid_state(operation, state))
    }
}

/// Whether any mutation is legal at all: never once `Exited`.
pub fn require_not_exited(operation: &str, state: VmState) -> Result<()> {
    if state == VmState::Exited {
        Err(Error::invalid_state(operation, state))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_only_from_initial_or_idempotent_from_started() {
        assert_eq!(
            check_transition("start", VmState::Initial).unwrap(),
            Transition::Advance(VmState::Started)
        );
        assert_eq!(
            check_transition("start", VmState::Started).unwrap(),
            Transition::Idempotent
        );
        assert!(check_transition("start", VmState::Running).is_err());
    }

    #[test]
    fn boot_from_started_or_shutdown() {
        assert_eq!(
            check_transition("boot", VmState::Started).unwrap(),
            Transition::Advance(VmState::Running)
        );
        assert_eq!(
            check_transition("boot", VmState::Shutdown).unwrap(),
            Transition::Advance(VmState::Running)
        );
        assert_eq!(
            check_transition("boot", VmState::Running).unwrap(),
            Transition::Idempotent
        );
        assert!(check_transition("boot", VmState::Initial).is_err());
    }

    #[test]
    fn stop_is_idempotent_from_exited() {
        assert_eq!(
            check_transition("stop", VmState::Exited).unwrap(),
            Transition::Idempotent
        );
        assert!(matches!(
            check_transition("stop", VmState::Running).unwrap(),
            Transition::Advance(VmState::Exited)
        ));
    }

    #[test]
    fn pause_resume_roundtrip() {
        assert_eq!(
            check_transition("pause", VmState::Running).unwrap(),
            Transition::Advance(VmState::Paused)
        );
        assert_eq!(
            check_transition("resume", VmState::Paused).unwrap(),
            Transition::Advance(VmState::Running)
        );
        assert!(check_transition("pause", VmState::Initial).is_err());
    }

    #[test]
    fn exited_forbids_mutation() {
        assert!(require_not_exited("configure", VmState::Exited).is_err());
        assert!(require_not_exited("configure", VmState::Running).is_ok());
    }
}
