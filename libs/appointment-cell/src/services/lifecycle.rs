// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Pure transition table for the appointment state machine:
///
/// ```text
/// [none] --create--> upcoming --cancel--> canceled (terminal)
///                    upcoming --external completion--> completed (terminal)
/// pending --> upcoming | canceled
/// ```
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_transition(
        &self,
        current: &AppointmentStatus,
        next: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, next);

        if !self.valid_transitions(current).contains(next) {
            warn!("Invalid status transition attempted: {} -> {}", current, next);
            return Err(AppointmentError::InvalidTransition(*current));
        }

        Ok(())
    }

    pub fn valid_transitions(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Upcoming,
                AppointmentStatus::Canceled,
            ],
            AppointmentStatus::Upcoming => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Canceled,
            ],
            // Terminal states
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Canceled => vec![],
        }
    }

    /// Owner-initiated cancellation is legal only from a non-terminal status.
    pub fn validate_cancellation(
        &self,
        current: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        self.validate_transition(current, &AppointmentStatus::Canceled)
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn cancel_allowed_from_non_terminal_statuses() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_cancellation(&AppointmentStatus::Pending).is_ok());
        assert!(lifecycle.validate_cancellation(&AppointmentStatus::Upcoming).is_ok());
    }

    #[test]
    fn cancel_rejected_from_terminal_statuses() {
        let lifecycle = AppointmentLifecycleService::new();

        assert_matches!(
            lifecycle.validate_cancellation(&AppointmentStatus::Completed),
            Err(AppointmentError::InvalidTransition(AppointmentStatus::Completed))
        );
        // Re-canceling an already-canceled appointment must fail, never
        // silently succeed, so client retry semantics stay explicit.
        assert_matches!(
            lifecycle.validate_cancellation(&AppointmentStatus::Canceled),
            Err(AppointmentError::InvalidTransition(AppointmentStatus::Canceled))
        );
    }

    #[test]
    fn completion_only_from_upcoming() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_transition(&AppointmentStatus::Upcoming, &AppointmentStatus::Completed)
            .is_ok());
        assert!(lifecycle
            .validate_transition(&AppointmentStatus::Pending, &AppointmentStatus::Completed)
            .is_err());
        assert!(lifecycle
            .validate_transition(&AppointmentStatus::Canceled, &AppointmentStatus::Completed)
            .is_err());
    }

    #[test]
    fn terminal_states_have_no_exits() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.valid_transitions(&AppointmentStatus::Completed).is_empty());
        assert!(lifecycle.valid_transitions(&AppointmentStatus::Canceled).is_empty());
    }

    #[test]
    fn pending_can_become_upcoming() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_transition(&AppointmentStatus::Pending, &AppointmentStatus::Upcoming)
            .is_ok());
    }
}
