//! Deterministic 64-bit digest of a Worldview snapshot (spec.md §4.A).
//!
//! The digest detects transport corruption, not malicious tampering: SHA-256
//! is used for its ubiquity and well-understood avalanche properties, not
//! for any cryptographic guarantee, and collisions are explicitly not a
//! security concern here.

use sha2::{Digest, Sha256};

use crate::wire::WireWorldview;

/// Computes the digest of a canonical wire snapshot: SHA-256 of its JSON
/// encoding, truncated to the leading 8 bytes, read big-endian.
pub fn digest(wv: &WireWorldview) -> u64 {
    let encoded = serde_json::to_vec(wv).expect("WireWorldview always serializes");
    let hash = Sha256::digest(&encoded);

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hallcall::{HallCallEntry, HallCallRow};
    use crate::remote::{Behavior, DoorState, MotorDirection};
    use crate::wire::WireRemoteElevatorState;
    use std::collections::BTreeMap;

    fn sample_wv() -> WireWorldview {
        let mut elevator_states = BTreeMap::new();
        elevator_states.insert(
            1,
            WireRemoteElevatorState {
                id: 1,
                target_floor: 2,
                current_floor: 1,
                direction: MotorDirection::Up,
                door_state: DoorState::Closed,
                behavior: Behavior::Moving,
                cab_calls: vec![false, false, true, false],
            },
        );

        WireWorldview {
            local_id: 1,
            num_floors: 4,
            elevator_states,
            hall_calls: vec![
                (&HallCallRow::default()).into(),
                (&HallCallRow {
                    up: HallCallEntry::available(1),
                    down: HallCallEntry::none(),
                })
                    .into(),
                (&HallCallRow::default()).into(),
                (&HallCallRow::default()).into(),
            ],
        }
    }

    #[test]
    fn identical_snapshots_produce_identical_digests() {
        let a = sample_wv();
        let b = sample_wv();
        assert_eq!(digest(&a), digest(&b));
    }

    #[test]
    fn differing_snapshots_produce_different_digests() {
        let a = sample_wv();
        let mut b = sample_wv();
        b.num_floors = 5;
        assert_ne!(digest(&a), digest(&b));
    }

    #[test]
    fn digest_is_stable_across_repeated_calls() {
        let wv = sample_wv();
        let first = digest(&wv);
        for _ in 0..10 {
            assert_eq!(digest(&wv), first);
        }
    }
}
