//! Error types for the histogram equalizer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using EqualizeError.
pub type EqualizeResult<T> = Result<T, EqualizeError>;

/// The working stages of a frame, used to say where a frame stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStage {
    Building,
    Mapping,
    Remapping,
}

impl FrameStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameStage::Building => "building",
            FrameStage::Mapping => "mapping",
            FrameStage::Remapping => "remapping",
        }
    }
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary error type for equalization frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EqualizeError {
    // === Caller Errors ===
    #[error("Invalid input image: {0}")]
    InvalidInput(String),

    #[error("Histogram index out of range: channel {channel}, intensity {intensity}")]
    InvalidIndex { channel: usize, intensity: usize },

    // === Frame Aborts ===
    #[error(
        "Parallel histogram disagrees with reference at channel {channel}, intensity {intensity}: {parallel} != {reference}"
    )]
    AccumulationMismatch {
        channel: usize,
        intensity: usize,
        parallel: u64,
        reference: u64,
    },

    #[error("Frame cancelled before {stage}")]
    Cancelled { stage: FrameStage },

    #[error("Frame deadline exceeded before {stage} ({elapsed_ms} ms elapsed)")]
    DeadlineExceeded { stage: FrameStage, elapsed_ms: u64 },

    #[error("Another frame is already in flight on this pipeline")]
    FrameInFlight,

    // === Infrastructure Errors ===
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl EqualizeError {
    /// Stable short code for this error, suitable for logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            EqualizeError::InvalidInput(_) => "InvalidInput",
            EqualizeError::InvalidIndex { .. } => "InvalidIndex",
            EqualizeError::AccumulationMismatch { .. } => "AccumulationMismatch",
            EqualizeError::Cancelled { .. } => "Cancelled",
            EqualizeError::DeadlineExceeded { .. } => "DeadlineExceeded",
            EqualizeError::FrameInFlight => "FrameInFlight",
            EqualizeError::WorkerPool(_) => "WorkerPool",
        }
    }

    /// True when the caller handed over something unusable, as opposed to a
    /// frame that was aborted while running.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EqualizeError::InvalidInput(_) | EqualizeError::InvalidIndex { .. }
        )
    }

    /// Stage the frame was about to enter when it was abandoned, if any.
    pub fn stage(&self) -> Option<FrameStage> {
        match self {
            EqualizeError::Cancelled { stage } | EqualizeError::DeadlineExceeded { stage, .. } => {
                Some(*stage)
            }
            EqualizeError::AccumulationMismatch { .. } => Some(FrameStage::Building),
            _ => None,
        }
    }
}
