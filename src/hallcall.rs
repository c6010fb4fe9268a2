//! The hall-call table: a small CRDT-like lattice per (floor, direction).
//!
//! Each entry is `None ≤ Available ≤ Processing → None`, with the terminal
//! transition gated on claimant identity (see [`crate::worldview::Worldview::merge`]).
//! This module owns the state machine; nothing outside it may write a
//! `HallCallEntry` directly.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::remote::NodeId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HallDirection {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HallCallState {
    None = 0,
    Available = 1,
    Processing = 2,
}

/// One (floor, direction) entry: state plus claimant.
///
/// Invariant (spec.md §3.3): `state == None` implies `by == 0`;
/// `state != None` implies `by != 0`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HallCallEntry {
    pub state: HallCallState,
    pub by: NodeId,
}

impl HallCallEntry {
    pub const fn none() -> Self {
        HallCallEntry {
            state: HallCallState::None,
            by: 0,
        }
    }

    pub fn available(by: NodeId) -> Self {
        HallCallEntry {
            state: HallCallState::Available,
            by,
        }
    }

    pub fn processing(by: NodeId) -> Self {
        HallCallEntry {
            state: HallCallState::Processing,
            by,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self.state {
            HallCallState::None => self.by == 0,
            HallCallState::Available | HallCallState::Processing => self.by != 0,
        }
    }
}

impl Default for HallCallEntry {
    fn default() -> Self {
        HallCallEntry::none()
    }
}

/// One floor's pair of hall-call entries. `up` is not defined at the top
/// floor and `down` is not defined at the bottom floor, but both slots are
/// always present so the table stays a fixed-length array indexable by
/// floor (callers must not act on the undefined end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HallCallRow {
    pub up: HallCallEntry,
    pub down: HallCallEntry,
}

impl HallCallRow {
    pub fn get(&self, dir: HallDirection) -> HallCallEntry {
        match dir {
            HallDirection::Up => self.up,
            HallDirection::Down => self.down,
        }
    }

    pub fn set(&mut self, dir: HallDirection, entry: HallCallEntry) {
        match dir {
            HallDirection::Up => self.up = entry,
            HallDirection::Down => self.down = entry,
        }
    }
}

/// Validates a direct local transition against the §4.D state machine.
/// `None -> Processing`, `Available -> None` and `Processing -> Available`
/// are the only illegal direct transitions; everything else (including
/// self-transitions) is permitted.
pub fn validate_transition(from: HallCallState, to: HallCallState) -> Result<(), ValidationError> {
    use HallCallState::*;
    let illegal = matches!(
        (from, to),
        (None, Processing) | (Available, None) | (Processing, Available)
    );

    if illegal {
        Err(ValidationError::InvalidHallCallTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        })
    } else {
        Ok(())
    }
}
