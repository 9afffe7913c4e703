//! Error types for the simulation core.
//!
//! Every failure the engine can hit is one of these variants. Genetics and
//! spawn failures are normally reported as events rather than returned, but
//! they share this type so the event text and the `Result` paths agree.

use meadow_data::ActorId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// The genetics capability did not initialize or answer in time.
    #[error("genetics {operation} timed out after {timeout_ms} ms")]
    GeneticsTimeout { operation: String, timeout_ms: u64 },

    /// The genetics capability answered with an error or a malformed result.
    #[error("genetics failure: {0}")]
    GeneticsFailure(String),

    /// No free cell was available for a hatch or reproduction.
    #[error("no free cell next to ({x}, {y})")]
    SpawnRejected { x: u16, y: u16 },

    /// A snapshot does not fit the current grid dimensions.
    #[error(
        "saved grid is {found_width}x{found_height} but params expect {expected_width}x{expected_height}"
    )]
    LoadStateMismatch {
        expected_width: u16,
        expected_height: u16,
        found_width: u16,
        found_height: u16,
    },

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// Dimensions or population counts changed; `initialize_grid` must run first.
    #[error("grid must be re-initialized after a params change")]
    GridInvalidated,

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },

    #[error("actor {0} already exists")]
    DuplicateActor(ActorId),

    #[error("engine has been disposed")]
    Disposed,
}

pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    #[must_use]
    pub fn genetics_failure<S: Into<String>>(msg: S) -> Self {
        Self::GeneticsFailure(msg.into())
    }

    #[must_use]
    pub fn genetics_timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::GeneticsTimeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    #[must_use]
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Errors that only cost one spawn attempt.
    #[must_use]
    pub fn is_genetics(&self) -> bool {
        matches!(
            self,
            Self::GeneticsTimeout { .. } | Self::GeneticsFailure(_)
        )
    }
}
