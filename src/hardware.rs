//! Hardware driver port (spec.md §6) — consumed, not implemented.
//!
//! The motor, floor sensor, button lamps and obstruction switch are out of
//! scope; this module only defines the channel-shaped boundary the rest of
//! the crate talks across, the way the teacher's `ElevatorDriver` exposes a
//! `cbc::Sender`/`cbc::Receiver` surface without this crate needing to own
//! an actual hardware thread.

use crossbeam_channel as cbc;

use crate::hallcall::HallDirection;
use crate::remote::Floor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Hall(HallDirection),
    Cab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub floor: Floor,
    pub kind: ButtonKind,
}

/// Inbound events the hardware poller delivers.
pub struct HardwareInputs {
    pub button_rx: cbc::Receiver<ButtonEvent>,
    pub floor_arrival_rx: cbc::Receiver<Floor>,
    pub obstruction_rx: cbc::Receiver<bool>,
    pub stop_rx: cbc::Receiver<bool>,
}

/// Outbound actuation calls, each a channel so the hardware thread (or a
/// test double) can own the actual write.
pub struct HardwareOutputs {
    pub motor_direction_tx: cbc::Sender<crate::remote::MotorDirection>,
    pub button_lamp_tx: cbc::Sender<(Floor, ButtonKind, bool)>,
    pub floor_indicator_tx: cbc::Sender<Floor>,
    pub door_open_lamp_tx: cbc::Sender<bool>,
    pub stop_lamp_tx: cbc::Sender<bool>,
}

pub struct HardwarePort {
    pub inputs: HardwareInputs,
    pub outputs: HardwareOutputs,
}

/// A hardware double that never produces input events and discards every
/// actuation call; useful for wiring tests that need a `HardwarePort`
/// without a real driver thread, analogous to the teacher's pattern of
/// mock `crossbeam_channel` pairs in `coordinator_tests.rs`.
pub fn null_hardware() -> (HardwarePort, HardwareSenders) {
    let (button_tx, button_rx) = cbc::unbounded();
    let (floor_arrival_tx, floor_arrival_rx) = cbc::unbounded();
    let (obstruction_tx, obstruction_rx) = cbc::unbounded();
    let (stop_tx, stop_rx) = cbc::unbounded();

    let (motor_direction_tx, motor_direction_rx) = cbc::unbounded();
    let (button_lamp_tx, button_lamp_rx) = cbc::unbounded();
    let (floor_indicator_tx, floor_indicator_rx) = cbc::unbounded();
    let (door_open_lamp_tx, door_open_lamp_rx) = cbc::unbounded();
    let (stop_lamp_tx, stop_lamp_rx) = cbc::unbounded();

    // Draining receivers are kept alive only so senders don't error on a
    // disconnected channel; tests observe output via `HardwareSenders`'
    // counterpart receivers if they choose to, otherwise these sinks idle.
    std::mem::drop(motor_direction_rx);
    std::mem::drop(button_lamp_rx);
    std::mem::drop(floor_indicator_rx);
    std::mem::drop(door_open_lamp_rx);
    std::mem::drop(stop_lamp_rx);

    (
        HardwarePort {
            inputs: HardwareInputs {
                button_rx,
                floor_arrival_rx,
                obstruction_rx,
                stop_rx,
            },
            outputs: HardwareOutputs {
                motor_direction_tx,
                button_lamp_tx,
                floor_indicator_tx,
                door_open_lamp_tx,
                stop_lamp_tx,
            },
        },
        HardwareSenders {
            button_tx,
            floor_arrival_tx,
            obstruction_tx,
            stop_tx,
        },
    )
}

/// The input-side senders a test harness drives to simulate hardware
/// events against a `HardwarePort`'s receivers.
pub struct HardwareSenders {
    pub button_tx: cbc::Sender<ButtonEvent>,
    pub floor_arrival_tx: cbc::Sender<Floor>,
    pub obstruction_tx: cbc::Sender<bool>,
    pub stop_tx: cbc::Sender<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_hardware_delivers_simulated_button_events() {
        let (port, senders) = null_hardware();
        senders
            .button_tx
            .send(ButtonEvent {
                floor: 2,
                kind: ButtonKind::Hall(HallDirection::Up),
            })
            .unwrap();

        let event = port.inputs.button_rx.recv().unwrap();
        assert_eq!(event.floor, 2);
        assert_eq!(event.kind, ButtonKind::Hall(HallDirection::Up));
    }
}
