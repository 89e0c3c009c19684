use crate::format::SampleFormat;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("No conversion path from {from} to {to}")]
    UnsupportedConversion { from: SampleFormat, to: SampleFormat },
    #[error("Invalid sample count: {0}")]
    InvalidSampleCount(usize),
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    #[error("Invalid plane alignment: {0}")]
    InvalidAlignment(usize),
    #[error("Buffer size mismatch: format requires {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("Sample {index} of channel {channel} is out of range")]
    SampleOutOfRange { channel: usize, index: usize },
    #[error("Buffer holds no samples")]
    EmptyBuffer,
    #[error("Unknown sample format '{0}'")]
    UnknownSampleFormat(String),
    #[error("Unknown channel layout '{0}'")]
    UnknownChannelLayout(String),
    #[error("Unknown resample method '{0}'")]
    UnknownResampleMethod(String),
}
