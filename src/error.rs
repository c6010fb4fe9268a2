//! Error kinds for the worldview core.
//!
//! Grouped to match the failure taxonomy in the design: validation errors are
//! local and recoverable, merge/wire errors reject a single incoming
//! datagram, transport errors are logged and retried by the next broadcast.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("floor {floor} out of range [0, {num_floors})")]
    FloorOutOfRange { floor: i32, num_floors: u8 },

    #[error("invalid hall call transition from {from:?} to {to:?}")]
    InvalidHallCallTransition { from: String, to: String },

    #[error("remote elevator is moving with an open door")]
    MovingWithDoorOpen,

    #[error("cab calls length {actual} does not match num_floors {expected}")]
    CabCallsLengthMismatch { expected: u8, actual: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("cannot merge an absent worldview")]
    MissingWorldview,

    #[error("worldviews have different floor counts: {local} vs {remote}")]
    FloorCountMismatch { local: u8, remote: u8 },

    #[error("worldviews have different hall-call table lengths: {local} vs {remote}")]
    HallCallLengthMismatch { local: usize, remote: usize },

    #[error("checksum mismatch: expected {expected:#018x}, computed {computed:#018x}")]
    ChecksumMismatch { expected: u64, computed: u64 },

    #[error("remote elevator state is invalid: {0}")]
    InvalidRemoteState(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to deserialize datagram: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("merge rejected: {0}")]
    Merge(#[from] MergeError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind UDP socket on port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    #[error("failed to send datagram: {0}")]
    Send(std::io::Error),

    #[error("failed to receive datagram: {0}")]
    Recv(std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}
