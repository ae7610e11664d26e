//! Worker thread lifecycle states

use core::fmt;

/// State of a pool worker thread
///
/// ```text
/// Starting ──▶ Running ◀──▶ Idle ──▶ Exiting
///     │                      ▲         ▲
///     └──────────────────────┴─────────┘
/// ```
///
/// A worker only moves to `Exiting` from the idle check, when the pool's
/// thread ceiling no longer leaves room for it. A new worker whose job was
/// taken by a busy peer goes straight from `Starting` to the idle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// OS thread created, not yet in the dequeue loop
    Starting = 0,

    /// Dequeuing or executing jobs
    Running = 1,

    /// Parked on the work-available condition
    Idle = 2,

    /// Leaving the loop; `live_threads` already decremented
    Exiting = 3,
}

impl WorkerState {
    /// Check if the transition `self -> next` is allowed
    #[inline]
    pub const fn can_transition_to(&self, next: WorkerState) -> bool {
        matches!(
            (self, next),
            (WorkerState::Starting, WorkerState::Running)
                | (WorkerState::Starting, WorkerState::Idle)
                | (WorkerState::Starting, WorkerState::Exiting)
                | (WorkerState::Running, WorkerState::Idle)
                | (WorkerState::Idle, WorkerState::Running)
                | (WorkerState::Running, WorkerState::Exiting)
                | (WorkerState::Idle, WorkerState::Exiting)
        )
    }

    /// Check if the worker has left the loop
    #[inline]
    pub const fn is_terminated(&self) -> bool {
        matches!(self, WorkerState::Exiting)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Starting => write!(f, "STARTING"),
            WorkerState::Running => write!(f, "RUNNING"),
            WorkerState::Idle => write!(f, "IDLE"),
            WorkerState::Exiting => write!(f, "EXITING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        assert!(WorkerState::Starting.can_transition_to(WorkerState::Running));
        assert!(WorkerState::Running.can_transition_to(WorkerState::Idle));
        assert!(WorkerState::Idle.can_transition_to(WorkerState::Running));
        assert!(WorkerState::Idle.can_transition_to(WorkerState::Exiting));

        assert!(WorkerState::Starting.can_transition_to(WorkerState::Idle));

        assert!(!WorkerState::Running.can_transition_to(WorkerState::Starting));
        assert!(!WorkerState::Exiting.can_transition_to(WorkerState::Running));
        assert!(!WorkerState::Exiting.can_transition_to(WorkerState::Idle));

        assert!(WorkerState::Exiting.is_terminated());
        assert!(!WorkerState::Idle.is_terminated());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", WorkerState::Starting), "STARTING");
        assert_eq!(format!("{}", WorkerState::Idle), "IDLE");
        assert_eq!(WorkerState::Exiting.to_string(), "EXITING");
    }
}
