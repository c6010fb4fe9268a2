//! The replicated aggregate and its merge operator (spec.md §4.E).
//!
//! `Worldview` is the one piece of state genuinely shared across threads in
//! this crate, so it is the one thing guarded by a mutex (spec.md §5). Every
//! accessor takes the lock once, copies what it needs, and releases it —
//! nothing here ever hands out a reference into the interior, and nothing
//! ever calls back into a `Worldview` method while already holding the lock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::checksum;
use crate::error::{MergeError, ValidationError};
use crate::hallcall::{HallCallEntry, HallCallRow, HallCallState, HallDirection};
use crate::remote::{NodeId, RemoteElevatorState};
use crate::validate;
use crate::wire::WireWorldview;

struct Inner {
    num_floors: u8,
    peers: HashMap<NodeId, RemoteElevatorState>,
    lost_peers: HashMap<NodeId, RemoteElevatorState>,
    hall_calls: Vec<HallCallRow>,
}

pub struct Worldview {
    local_id: NodeId,
    inner: Mutex<Inner>,
}

impl Worldview {
    pub fn new(local_id: NodeId, num_floors: u8) -> Self {
        let mut peers = HashMap::new();
        peers.insert(local_id, RemoteElevatorState::new(local_id, num_floors));

        Worldview {
            local_id,
            inner: Mutex::new(Inner {
                num_floors,
                peers,
                lost_peers: HashMap::new(),
                hall_calls: vec![HallCallRow::default(); num_floors as usize],
            }),
        }
    }

    pub fn local_id(&self) -> NodeId {
        self.local_id
    }

    pub fn num_floors(&self) -> u8 {
        self.inner.lock().unwrap().num_floors
    }

    /// Validates the floor and the requested transition, then writes
    /// `{state: new_state, by: local_id}` to the entry. A transition to
    /// `None` clears the claimant regardless of who held it; claiming
    /// transitions (`Available`/`Processing`) are always attributed to the
    /// local node, since only the local node may act through this method
    /// (remote claims arrive only via [`Worldview::merge`]).
    pub fn set_hall_call(
        &self,
        floor: i32,
        dir: HallDirection,
        new_state: HallCallState,
    ) -> Result<(), ValidationError> {
        let mut inner = self.inner.lock().unwrap();

        if !validate::is_valid_floor(floor, inner.num_floors) {
            return Err(ValidationError::FloorOutOfRange {
                floor,
                num_floors: inner.num_floors,
            });
        }

        let row = &mut inner.hall_calls[floor as usize];
        let current = row.get(dir);
        validate::is_valid_dir_transition(current.state, new_state)?;

        let entry = match new_state {
            HallCallState::None => HallCallEntry::none(),
            _ => HallCallEntry {
                state: new_state,
                by: self.local_id,
            },
        };
        row.set(dir, entry);
        Ok(())
    }

    /// Writes `peers[local_id].cab_calls[floor]`. Returns the previous
    /// value, so a caller driving a button lamp can tell whether this call
    /// actually changed anything.
    pub fn set_cab_call(&self, floor: i32, on: bool) -> Result<bool, ValidationError> {
        let mut inner = self.inner.lock().unwrap();

        if !validate::is_valid_floor(floor, inner.num_floors) {
            return Err(ValidationError::FloorOutOfRange {
                floor,
                num_floors: inner.num_floors,
            });
        }

        let local_id = self.local_id;
        let local = inner
            .peers
            .get_mut(&local_id)
            .expect("invariant: local_id always present in peers");
        let previous = local.cab_calls[floor as usize];
        local.cab_calls[floor as usize] = on;
        Ok(previous)
    }

    /// Validates `state` and replaces `peers[local_id]` with it wholesale.
    pub fn set_local_elevator(&self, state: RemoteElevatorState) -> Result<(), ValidationError> {
        let mut inner = self.inner.lock().unwrap();
        state.validate(inner.num_floors)?;
        inner.peers.insert(self.local_id, state);
        Ok(())
    }

    /// Deep copy of the local node's own state.
    pub fn get_local_elevator(&self) -> RemoteElevatorState {
        let inner = self.inner.lock().unwrap();
        inner.peers[&self.local_id].clone()
    }

    /// Deep copy of a peer's state, if currently tracked as live.
    pub fn get_peer(&self, id: NodeId) -> Option<RemoteElevatorState> {
        self.inner.lock().unwrap().peers.get(&id).cloned()
    }

    /// Deep copy of every live peer, local node included.
    pub fn get_all_peers(&self) -> HashMap<NodeId, RemoteElevatorState> {
        self.inner.lock().unwrap().peers.clone()
    }

    /// Deep copy of every peer aged out past `NodeTimeoutDelay`.
    pub fn get_lost_peers(&self) -> HashMap<NodeId, RemoteElevatorState> {
        self.inner.lock().unwrap().lost_peers.clone()
    }

    /// Deep copy of the hall-call table.
    pub fn get_all_hall_calls(&self) -> Vec<HallCallRow> {
        self.inner.lock().unwrap().hall_calls.clone()
    }

    pub fn get_hall_call(&self, floor: i32, dir: HallDirection) -> Option<HallCallEntry> {
        let inner = self.inner.lock().unwrap();
        if !validate::is_valid_floor(floor, inner.num_floors) {
            return None;
        }
        Some(inner.hall_calls[floor as usize].get(dir))
    }

    /// Stamps the local entry's `last_seen_at` to now, for the sync loop's
    /// per-tick bookkeeping (spec.md §4.F step 1).
    pub fn touch_local_last_seen(&self) {
        let mut inner = self.inner.lock().unwrap();
        let local_id = self.local_id;
        inner
            .peers
            .get_mut(&local_id)
            .expect("invariant: local_id always present in peers")
            .last_seen_at = Instant::now();
    }

    /// Moves any non-local peer whose `last_seen_at` is older than
    /// `timeout` into `lost_peers`. Returns the IDs moved, for the caller to
    /// emit `NodeEvent::PeerLost` observability events.
    pub fn reap_timed_out_peers(&self, timeout: std::time::Duration) -> Vec<NodeId> {
        let mut inner = self.inner.lock().unwrap();
        let local_id = self.local_id;
        let now = Instant::now();

        let expired: Vec<NodeId> = inner
            .peers
            .iter()
            .filter(|(&id, state)| id != local_id && now.duration_since(state.last_seen_at) > timeout)
            .map(|(&id, _)| id)
            .collect();

        for id in &expired {
            if let Some(state) = inner.peers.remove(id) {
                inner.lost_peers.insert(*id, state);
            }
        }

        expired
    }

    /// Removes `id` from `lost_peers` if present, returning whether it was
    /// there. Called by the sync loop before merging a datagram from a
    /// previously-lost peer, so it can emit a "peer reappeared" event
    /// (spec.md §4.F step 3).
    pub fn take_lost_peer(&self, id: NodeId) -> bool {
        self.inner.lock().unwrap().lost_peers.remove(&id).is_some()
    }

    /// Builds the canonical wire snapshot of this worldview, for broadcast
    /// and for digest computation.
    pub fn to_wire(&self) -> WireWorldview {
        let inner = self.inner.lock().unwrap();
        Self::wire_from_inner(self.local_id, &inner)
    }

    fn wire_from_inner(local_id: NodeId, inner: &Inner) -> WireWorldview {
        WireWorldview {
            local_id,
            num_floors: inner.num_floors,
            elevator_states: inner
                .peers
                .iter()
                .map(|(&id, state)| (id, state.into()))
                .collect(),
            hall_calls: inner.hall_calls.iter().map(Into::into).collect(),
        }
    }

    /// The join operator for the hall-call lattice: accepts the remote's
    /// state only for the transitions the design allows (spec.md §4.D/§4.E
    /// step 5); otherwise keeps the local entry.
    fn merge_hall_call_entry(local: HallCallEntry, remote: HallCallEntry, remote_local_id: NodeId) -> HallCallEntry {
        use HallCallState::*;
        match (local.state, remote.state) {
            (Processing, None) if remote_local_id == local.by => remote,
            (None, Available) => remote,
            (Available, Processing) => remote,
            _ => local,
        }
    }

    /// Accepts a peer's worldview into this one under the acceptance rules
    /// of spec.md §4.E. Rejects (without mutating `self`) if the floor
    /// counts differ, the hall-call table lengths differ, the digest does
    /// not match, or the remote's own state fails validation.
    pub fn merge(&self, other: &WireWorldview, other_digest: u64) -> Result<(), MergeError> {
        let mut inner = self.inner.lock().unwrap();

        if other.num_floors != inner.num_floors {
            return Err(MergeError::FloorCountMismatch {
                local: inner.num_floors,
                remote: other.num_floors,
            });
        }

        if other.hall_calls.len() != inner.hall_calls.len() {
            return Err(MergeError::HallCallLengthMismatch {
                local: inner.hall_calls.len(),
                remote: other.hall_calls.len(),
            });
        }

        let computed = checksum::digest(other);
        if computed != other_digest {
            return Err(MergeError::ChecksumMismatch {
                expected: other_digest,
                computed,
            });
        }

        let remote_own_state = other
            .elevator_states
            .get(&other.local_id)
            .ok_or(MergeError::MissingWorldview)?
            .clone()
            .into_remote_state();
        remote_own_state.validate(inner.num_floors)?;

        // Self-authority: a node's view of itself always wins; never import
        // a peer's view of third parties (prevents stale cycles).
        inner.peers.insert(other.local_id, remote_own_state);

        for (floor, remote_row) in other.hall_calls.iter().enumerate() {
            let remote_row: HallCallRow = (*remote_row).into();
            let local_row = &mut inner.hall_calls[floor];

            let up = Self::merge_hall_call_entry(local_row.up, remote_row.up, other.local_id);
            let down = Self::merge_hall_call_entry(local_row.down, remote_row.down, other.local_id);
            local_row.up = up;
            local_row.down = down;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hallcall::HallDirection::{Down, Up};
    use std::time::Duration;

    fn remote_wire(local_id: NodeId, num_floors: u8) -> WireWorldview {
        let wv = Worldview::new(local_id, num_floors);
        wv.to_wire()
    }

    #[test]
    fn invariant_local_id_always_present_and_never_lost() {
        let wv = Worldview::new(1, 4);
        assert!(wv.get_peer(1).is_some());
        let lost = wv.reap_timed_out_peers(Duration::from_secs(0));
        assert!(lost.is_empty() || !lost.contains(&1));
        assert!(wv.get_peer(1).is_some());
    }

    #[test]
    fn set_hall_call_rejects_out_of_range_floor() {
        let wv = Worldview::new(1, 4);
        let err = wv.set_hall_call(4, Up, HallCallState::Available).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FloorOutOfRange {
                floor: 4,
                num_floors: 4,
            }
        );
    }

    #[test]
    fn set_hall_call_rejects_illegal_transition() {
        let wv = Worldview::new(1, 4);
        // None -> Processing is illegal.
        let err = wv.set_hall_call(0, Up, HallCallState::Processing).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidHallCallTransition { .. }));
    }

    #[test]
    fn set_hall_call_claims_as_local_node() {
        let wv = Worldview::new(7, 4);
        wv.set_hall_call(2, Up, HallCallState::Available).unwrap();
        let entry = wv.get_hall_call(2, Up).unwrap();
        assert_eq!(entry, HallCallEntry::available(7));

        wv.set_hall_call(2, Up, HallCallState::Processing).unwrap();
        let entry = wv.get_hall_call(2, Up).unwrap();
        assert_eq!(entry, HallCallEntry::processing(7));

        wv.set_hall_call(2, Up, HallCallState::None).unwrap();
        assert_eq!(wv.get_hall_call(2, Up).unwrap(), HallCallEntry::none());
    }

    #[test]
    fn set_cab_call_returns_previous_value() {
        let wv = Worldview::new(1, 4);
        let previous = wv.set_cab_call(2, true).unwrap();
        assert!(!previous);
        let previous = wv.set_cab_call(2, true).unwrap();
        assert!(previous);
    }

    #[test]
    fn merge_rejects_floor_count_mismatch() {
        let wv1 = Worldview::new(1, 4);
        let other = remote_wire(2, 3);
        let digest = checksum::digest(&other);
        let err = wv1.merge(&other, digest).unwrap_err();
        assert_eq!(
            err,
            MergeError::FloorCountMismatch { local: 4, remote: 3 }
        );
    }

    #[test]
    fn merge_rejects_checksum_mismatch() {
        let wv1 = Worldview::new(1, 4);
        let other = remote_wire(2, 4);
        let err = wv1.merge(&other, 0xDEADBEEF).unwrap_err();
        assert!(matches!(err, MergeError::ChecksumMismatch { .. }));
    }

    #[test]
    fn merge_accepts_remotes_own_state_only() {
        let wv1 = Worldview::new(1, 4);
        let wv2 = Worldview::new(2, 4);
        wv2.set_cab_call(3, true).unwrap();
        let other = wv2.to_wire();
        let digest = checksum::digest(&other);

        wv1.merge(&other, digest).unwrap();

        let peer = wv1.get_peer(2).unwrap();
        assert!(peer.cab_calls[3]);
        // wv1's own state is untouched.
        assert_eq!(wv1.get_local_elevator().id, 1);
    }

    #[test]
    fn merge_new_hall_call_is_adopted() {
        let wv1 = Worldview::new(1, 4);
        let wv2 = Worldview::new(2, 4);
        wv2.set_hall_call(1, Up, HallCallState::Available).unwrap();
        let other = wv2.to_wire();
        let digest = checksum::digest(&other);

        wv1.merge(&other, digest).unwrap();
        assert_eq!(wv1.get_hall_call(1, Up).unwrap(), HallCallEntry::available(2));
    }

    #[test]
    fn merge_claim_is_adopted_over_available() {
        let wv1 = Worldview::new(1, 4);
        wv1.set_hall_call(1, Up, HallCallState::Available).unwrap();
        // wv1 thinks floor 1 up is Available, claimed by no one specific —
        // actually by wv1 itself per set_hall_call. Node 2 claims it first.
        let wv2 = Worldview::new(2, 4);
        wv2.set_hall_call(1, Up, HallCallState::Available).unwrap();
        wv2.set_hall_call(1, Up, HallCallState::Processing).unwrap();
        let other = wv2.to_wire();
        let digest = checksum::digest(&other);

        wv1.merge(&other, digest).unwrap();
        assert_eq!(wv1.get_hall_call(1, Up).unwrap(), HallCallEntry::processing(2));
    }

    #[test]
    fn merge_completion_adopted_only_if_remote_is_claimant() {
        let wv1 = Worldview::new(1, 4);
        wv1.set_hall_call(1, Up, HallCallState::Available).unwrap();
        wv1.set_hall_call(1, Up, HallCallState::Processing).unwrap();
        // wv1 claimed it itself (by = 1). Node 3 completing it should NOT
        // be accepted, since it isn't the claimant.
        let wv3 = Worldview::new(3, 4);
        let other = wv3.to_wire();
        let digest = checksum::digest(&other);
        wv1.merge(&other, digest).unwrap();
        assert_eq!(wv1.get_hall_call(1, Up).unwrap(), HallCallEntry::processing(1));
    }

    #[test]
    fn merge_duplicate_claim_keeps_local_first_claim() {
        let wv1 = Worldview::new(1, 4);
        wv1.set_hall_call(1, Up, HallCallState::Available).unwrap();
        wv1.set_hall_call(1, Up, HallCallState::Processing).unwrap();

        let wv2 = Worldview::new(2, 4);
        wv2.set_hall_call(1, Up, HallCallState::Available).unwrap();
        wv2.set_hall_call(1, Up, HallCallState::Processing).unwrap();
        let other = wv2.to_wire();
        let digest = checksum::digest(&other);

        wv1.merge(&other, digest).unwrap();
        // local (by=1) wins over remote's duplicate claim (by=2).
        assert_eq!(wv1.get_hall_call(1, Up).unwrap(), HallCallEntry::processing(1));
    }

    #[test]
    fn merge_is_idempotent() {
        let wv1 = Worldview::new(1, 4);
        let wv2 = Worldview::new(2, 4);
        wv2.set_hall_call(1, Down, HallCallState::Available).unwrap();
        let other = wv2.to_wire();
        let digest = checksum::digest(&other);

        wv1.merge(&other, digest).unwrap();
        let after_first = wv1.get_all_hall_calls();
        wv1.merge(&other, digest).unwrap();
        let after_second = wv1.get_all_hall_calls();

        assert_eq!(after_first, after_second);
    }
}
