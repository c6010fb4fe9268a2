//! Pure predicates with no side effects (spec.md §4.B).
//!
//! Everything here is a function of its arguments alone; callers decide what
//! to do with a rejected result (log and drop, in the sync loop's case).

use crate::error::ValidationError;
use crate::hallcall::HallCallState;
use crate::remote::{Floor, RemoteElevatorState};

pub fn is_valid_floor(floor: Floor, num_floors: u8) -> bool {
    floor >= 0 && floor < num_floors as i32
}

pub fn is_valid_dir_transition(from: HallCallState, to: HallCallState) -> Result<(), ValidationError> {
    crate::hallcall::validate_transition(from, to)
}

pub fn validate_remote(state: &RemoteElevatorState, num_floors: u8) -> Result<(), ValidationError> {
    state.validate(num_floors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteElevatorState;

    #[test]
    fn is_valid_floor_bounds() {
        assert!(is_valid_floor(0, 4));
        assert!(is_valid_floor(3, 4));
        assert!(!is_valid_floor(4, 4));
        assert!(!is_valid_floor(-1, 4));
    }

    #[test]
    fn validate_remote_delegates_to_remote_elevator_state() {
        let state = RemoteElevatorState::new(1, 4);
        assert!(validate_remote(&state, 4).is_ok());
        assert!(validate_remote(&state, 3).is_err());
    }
}
