//! Worldview synchronization core for a fault-tolerant multi-elevator system.
//!
//! A fixed-size cluster of elevator nodes cooperates over an unreliable UDP
//! broadcast network so that every hall call is eventually served by exactly
//! one elevator, even across crashes, partitions and power cycles. This crate
//! is the replicated state (`worldview`), its merge function, the failure
//! detector and broadcast loop (`sync`), and the order-assignment function
//! (`assign`) that depends on worldview invariants.

pub mod assign;
pub mod checksum;
pub mod config;
pub mod error;
pub mod hallcall;
pub mod hardware;
pub mod remote;
pub mod sync;
pub mod transport;
pub mod validate;
pub mod wire;
pub mod worldview;

pub use config::Config;
pub use error::{ConfigError, MergeError, TransportError, ValidationError, WireError};
pub use hallcall::{HallCallEntry, HallCallState, HallDirection};
pub use remote::{Behavior, DoorState, Floor, MotorDirection, NodeId, RemoteElevatorState};
pub use worldview::Worldview;
