//! Canonical, self-describing wire encoding of a Worldview (spec.md §6).
//!
//! `elevator_states` is a `BTreeMap` rather than a `HashMap` specifically so
//! that serialization order is pinned by `NodeId` ascending — the digest in
//! [`crate::checksum`] depends on byte-exact output, and a `HashMap`'s
//! iteration order is not stable across processes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::hallcall::{HallCallRow, HallCallState};
use crate::remote::{Behavior, DoorState, Floor, MotorDirection, NodeId, RemoteElevatorState};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireRemoteElevatorState {
    pub id: NodeId,
    pub target_floor: Floor,
    pub current_floor: Floor,
    pub direction: MotorDirection,
    pub door_state: DoorState,
    pub behavior: Behavior,
    pub cab_calls: Vec<bool>,
}

impl From<&RemoteElevatorState> for WireRemoteElevatorState {
    fn from(state: &RemoteElevatorState) -> Self {
        WireRemoteElevatorState {
            id: state.id,
            target_floor: state.target_floor,
            current_floor: state.current_floor,
            direction: state.direction,
            door_state: state.door_state,
            behavior: state.behavior,
            cab_calls: state.cab_calls.clone(),
        }
    }
}

impl WireRemoteElevatorState {
    /// Reconstitutes a `RemoteElevatorState`, stamping `last_seen_at` to
    /// `now` — the timestamp is never carried on the wire (spec.md §4.A: the
    /// digest excludes receive-side timestamp adjustments, and §6's wire
    /// field list has no `lastSeenAt` entry).
    pub fn into_remote_state(self) -> RemoteElevatorState {
        RemoteElevatorState {
            id: self.id,
            target_floor: self.target_floor,
            current_floor: self.current_floor,
            direction: self.direction,
            door_state: self.door_state,
            behavior: self.behavior,
            cab_calls: self.cab_calls,
            last_seen_at: std::time::Instant::now(),
        }
    }
}

#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum WireHallCallStateTag {
    None = 0,
    Available = 1,
    Processing = 2,
}

impl From<HallCallState> for WireHallCallStateTag {
    fn from(state: HallCallState) -> Self {
        match state {
            HallCallState::None => WireHallCallStateTag::None,
            HallCallState::Available => WireHallCallStateTag::Available,
            HallCallState::Processing => WireHallCallStateTag::Processing,
        }
    }
}

impl From<WireHallCallStateTag> for HallCallState {
    fn from(tag: WireHallCallStateTag) -> Self {
        match tag {
            WireHallCallStateTag::None => HallCallState::None,
            WireHallCallStateTag::Available => HallCallState::Available,
            WireHallCallStateTag::Processing => HallCallState::Processing,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHallCallEntry {
    state: WireHallCallStateTag,
    by: NodeId,
}

impl From<crate::hallcall::HallCallEntry> for WireHallCallEntry {
    fn from(entry: crate::hallcall::HallCallEntry) -> Self {
        WireHallCallEntry {
            state: entry.state.into(),
            by: entry.by,
        }
    }
}

impl From<WireHallCallEntry> for crate::hallcall::HallCallEntry {
    fn from(entry: WireHallCallEntry) -> Self {
        crate::hallcall::HallCallEntry {
            state: entry.state.into(),
            by: entry.by,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHallCallRow(WireHallCallEntry, WireHallCallEntry);

impl From<&HallCallRow> for WireHallCallRow {
    fn from(row: &HallCallRow) -> Self {
        WireHallCallRow(row.up.into(), row.down.into())
    }
}

impl From<WireHallCallRow> for HallCallRow {
    fn from(row: WireHallCallRow) -> Self {
        HallCallRow {
            up: row.0.into(),
            down: row.1.into(),
        }
    }
}

/// The canonical, byte-exact encoding of a Worldview snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireWorldview {
    pub local_id: NodeId,
    pub num_floors: u8,
    pub elevator_states: BTreeMap<NodeId, WireRemoteElevatorState>,
    pub hall_calls: Vec<WireHallCallRow>,
}

/// The datagram payload: a worldview snapshot plus its sender-computed
/// digest, per spec.md §6.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireMessage {
    pub wv: WireWorldview,
    pub digest: u64,
}
