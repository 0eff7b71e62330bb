//! Error type shared by the decoder, the render pipeline, and the shell around it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The supplied bytes could not be interpreted as audio.
    #[error("invalid input format: {0}")]
    InvalidInputFormat(String),

    /// The decoded source has no samples.
    #[error("decoded source is empty")]
    EmptySource,

    #[error("channel length mismatch: left={left} right={right}")]
    ChannelLengthMismatch { left: usize, right: usize },

    #[error("parameter '{name}' out of range: {value}")]
    ParameterOutOfRange { name: &'static str, value: f64 },

    /// Rendered program does not fit the 32-bit RIFF size fields.
    #[error("output of {samples} samples per channel exceeds the container size limit")]
    ContainerTooLarge { samples: usize },

    #[error("profile config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render worker is not running")]
    WorkerUnavailable,
}

impl RenderError {
    pub fn out_of_range(name: &'static str, value: f64) -> Self {
        Self::ParameterOutOfRange { name, value }
    }

    /// Only a bad input file is worth retrying (with a different file).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::InvalidInputFormat(_))
    }
}
