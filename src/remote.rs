//! Value types describing one peer's observable state.
//!
//! `RemoteElevatorState` carries no behavior of its own and no internal
//! synchronization; it is owned and mutated only through the containing
//! [`crate::worldview::Worldview`].

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ValidationError;

/// Unique identity of a physical elevator within the fixed cluster.
pub type NodeId = u16;

/// A floor index in `[0, NumFloors)`, or `-1` meaning "between floors".
pub type Floor = i32;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MotorDirection {
    Up,
    Down,
    Stop,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Behavior {
    Idle,
    Moving,
    DoorOpen,
    Obstructed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DoorState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// A peer's observable state as broadcast on the wire.
///
/// `last_seen_at` is stamped locally (either on arrival of a broadcast, or on
/// our own periodic re-stamp of the local entry) and is excluded from the
/// checksum — see [`crate::checksum`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteElevatorState {
    pub id: NodeId,
    pub target_floor: Floor,
    pub current_floor: Floor,
    pub direction: MotorDirection,
    pub door_state: DoorState,
    pub behavior: Behavior,
    pub cab_calls: Vec<bool>,
    pub last_seen_at: Instant,
}

impl RemoteElevatorState {
    pub fn new(id: NodeId, num_floors: u8) -> Self {
        RemoteElevatorState {
            id,
            target_floor: 0,
            current_floor: -1,
            direction: MotorDirection::Stop,
            door_state: DoorState::Closed,
            behavior: Behavior::Idle,
            cab_calls: vec![false; num_floors as usize],
            last_seen_at: Instant::now(),
        }
    }

    /// Floor used for cost/target computations: the current floor, or the
    /// target floor while between floors (`current_floor == -1`), per the
    /// "between floors" sentinel handling in the design notes.
    pub fn effective_floor(&self) -> Floor {
        if self.current_floor < 0 {
            self.target_floor
        } else {
            self.current_floor
        }
    }

    pub fn validate(&self, num_floors: u8) -> Result<(), ValidationError> {
        if self.behavior == Behavior::Moving && self.door_state == DoorState::Open {
            return Err(ValidationError::MovingWithDoorOpen);
        }

        if self.target_floor < 0 || self.target_floor >= num_floors as i32 {
            return Err(ValidationError::FloorOutOfRange {
                floor: self.target_floor,
                num_floors,
            });
        }

        if self.current_floor < -1 || self.current_floor >= num_floors as i32 {
            return Err(ValidationError::FloorOutOfRange {
                floor: self.current_floor,
                num_floors,
            });
        }

        if self.cab_calls.len() != num_floors as usize {
            return Err(ValidationError::CabCallsLengthMismatch {
                expected: num_floors,
                actual: self.cab_calls.len(),
            });
        }

        Ok(())
    }
}
