//! The order-assignment function (spec.md §4.G).
//!
//! A pure-ish function of a worldview snapshot and the local ID: it reads a
//! consistent view through the accessors in [`crate::worldview`], decides
//! the next `(Behavior, MotorDirection)`, and writes back any induced
//! hall-call transitions through the same accessors. Calling it twice on an
//! otherwise-unchanged worldview is a no-op the second time, since the only
//! mutating step (claiming an `Available` entry) leaves the entry
//! `Processing` afterwards.

use std::collections::HashMap;

use crate::hallcall::{HallCallState, HallDirection};
use crate::remote::{Behavior, Floor, MotorDirection, NodeId, RemoteElevatorState};
use crate::worldview::Worldview;

const REVERSAL_PENALTY: i64 = 2;
const PENDING_STOP_PENALTY: i64 = 1;

/// floors-to-target in the travel direction, plus a penalty for reversing
/// direction, plus a small penalty per already-pending cab stop. Every peer
/// must compute this same function over the same snapshot for claims to
/// converge (spec.md §4.G/§9).
fn cost(peer: &RemoteElevatorState, floor: Floor) -> i64 {
    let from = peer.effective_floor();
    let distance = (floor - from).unsigned_abs() as i64;

    let reversal = match peer.direction {
        MotorDirection::Stop => 0,
        MotorDirection::Up if floor >= from => 0,
        MotorDirection::Down if floor <= from => 0,
        _ => 1,
    };

    let pending_stops = peer.cab_calls.iter().filter(|&&c| c).count() as i64;

    distance + REVERSAL_PENALTY * reversal + PENDING_STOP_PENALTY * pending_stops
}

/// Picks the minimum-cost peer for a call at `floor`, tie-broken by lowest
/// `NodeId`. All peers are candidates, including the local node.
fn pick_assignee(peers: &HashMap<NodeId, RemoteElevatorState>, floor: Floor) -> Option<NodeId> {
    peers
        .values()
        .map(|peer| (cost(peer, floor), peer.id))
        .min_by_key(|&(cost, id)| (cost, id))
        .map(|(_, id)| id)
}

/// True if the local node is committed to serving `floor` in `dir`: either
/// a cab call there, or a hall call it has already claimed.
fn has_local_commitment_in_direction(wv: &Worldview, local_id: NodeId, from_floor: Floor, dir: MotorDirection) -> bool {
    let num_floors = wv.num_floors() as i32;
    let local = wv.get_local_elevator();

    let floors: Vec<Floor> = match dir {
        MotorDirection::Up => ((from_floor + 1)..num_floors).collect(),
        MotorDirection::Down => (0..from_floor).rev().collect(),
        MotorDirection::Stop => Vec::new(),
    };

    floors.iter().any(|&f| {
        local.cab_calls[f as usize]
            || is_local_claim(wv, f, HallDirection::Up, local_id)
            || is_local_claim(wv, f, HallDirection::Down, local_id)
    })
}

fn is_local_claim(wv: &Worldview, floor: Floor, dir: HallDirection, local_id: NodeId) -> bool {
    wv.get_hall_call(floor, dir)
        .map(|entry| entry.state == HallCallState::Processing && entry.by == local_id)
        .unwrap_or(false)
}

fn choose_direction(wv: &Worldview, local_id: NodeId, current_floor: Floor, current_direction: MotorDirection) -> MotorDirection {
    if has_local_commitment_in_direction(wv, local_id, current_floor, current_direction) {
        return current_direction;
    }

    let opposite = match current_direction {
        MotorDirection::Up => Some(MotorDirection::Down),
        MotorDirection::Down => Some(MotorDirection::Up),
        MotorDirection::Stop => None,
    };
    if let Some(opposite) = opposite {
        if has_local_commitment_in_direction(wv, local_id, current_floor, opposite) {
            return opposite;
        }
    }

    if current_direction == MotorDirection::Stop {
        if has_local_commitment_in_direction(wv, local_id, current_floor, MotorDirection::Up) {
            return MotorDirection::Up;
        }
        if has_local_commitment_in_direction(wv, local_id, current_floor, MotorDirection::Down) {
            return MotorDirection::Down;
        }
    }

    MotorDirection::Stop
}

/// Runs one assigner pass: clears an arrived-at cab call or claimed hall
/// call (opening the door), otherwise claims any `Available` hall calls
/// this node wins, then picks a travel direction from local commitments.
pub fn decide(wv: &Worldview) -> (Behavior, MotorDirection) {
    let local_id = wv.local_id();
    let local = wv.get_local_elevator();
    let current_floor = local.current_floor;

    if current_floor >= 0 {
        let floor = current_floor;

        if local.cab_calls[floor as usize] {
            let _ = wv.set_cab_call(floor, false);
            return (Behavior::DoorOpen, MotorDirection::Stop);
        }

        for dir in [HallDirection::Up, HallDirection::Down] {
            if is_local_claim(wv, floor, dir, local_id) {
                let _ = wv.set_hall_call(floor, dir, HallCallState::None);
                return (Behavior::DoorOpen, MotorDirection::Stop);
            }
        }
    }

    let peers = wv.get_all_peers();
    let num_floors = wv.num_floors() as i32;

    for floor in 0..num_floors {
        for dir in [HallDirection::Up, HallDirection::Down] {
            let Some(entry) = wv.get_hall_call(floor, dir) else {
                continue;
            };
            if entry.state != HallCallState::Available {
                continue;
            }

            if let Some(winner) = pick_assignee(&peers, floor) {
                if winner == local_id {
                    let _ = wv.set_hall_call(floor, dir, HallCallState::Processing);
                }
            }
        }
    }

    let direction = choose_direction(wv, local_id, current_floor, local.direction);
    let behavior = if direction == MotorDirection::Stop {
        Behavior::Idle
    } else {
        Behavior::Moving
    };

    (behavior, direction)
}
