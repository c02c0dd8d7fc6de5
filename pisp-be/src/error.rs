//! Error types.
//!
//! Only two kinds of failure ever reach a caller: a rejected submission and
//! a failed bring-up or channel stop. Hardware anomalies seen while jobs are
//! running are recovered in place and counted instead (see
//! [`AnomalyCounts`](crate::backend::AnomalyCounts)).

use thiserror::Error;

use crate::buffer::Buffer;
use crate::channel::ChannelId;

/// A config payload that can never be run as submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("exactly one of the bayer and rgb inputs must be enabled")]
    InputEnables,
    #[error("{channel} plane {plane}: stride {declared} exceeds negotiated {negotiated}")]
    StrideTooLarge {
        channel: ChannelId,
        plane: usize,
        declared: u32,
        negotiated: u32,
    },
    #[error("{channel} plane {plane}: size {declared} exceeds negotiated {negotiated}")]
    SizeTooLarge {
        channel: ChannelId,
        plane: usize,
        declared: u64,
        negotiated: u32,
    },
}

/// Why a buffer submission was refused.
///
/// The buffer is dropped by the backend in every case except
/// [`SubmitError::QueueFull`], which hands it back.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("config buffer carries no payload")]
    MissingPayload,
    #[error("{0} buffers cannot carry a config payload")]
    UnexpectedPayload(ChannelId),
    #[error("{channel} plane {plane}: {len} bytes, need {required}")]
    PlaneTooSmall {
        channel: ChannelId,
        plane: usize,
        len: u32,
        required: u32,
    },
    #[error("{channel} queue is full")]
    QueueFull { channel: ChannelId, buffer: Buffer },
}

/// Engine bring-up failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unsupported hardware version {0:#010x}")]
    UnknownVersion(u32),
    #[error("hardware is stuck or busy (status {status:#x}, started {started}, done {done})")]
    Stuck { status: u32, started: u8, done: u8 },
}

/// Backend-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0} is streaming")]
    ChannelStreaming(ChannelId),
    #[error("timed out waiting for {0} jobs to finish")]
    StopTimeout(ChannelId),
}
