pub mod buffer;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod mixer;
pub mod planar;
pub mod resample;
pub mod sample;

pub use buffer::{AudioBuffer, TimeBase};
pub use config::AudioConfig;
pub use convert::{can_convert, convert_format};
pub use error::AudioError;
pub use format::{AudioFormat, ChannelLayout, SampleFormat, Speaker};
pub use mixer::convert_layout;
pub use planar::convert_planar;
pub use resample::{ResampleMethod, StreamResampler, convert_sample_rate, scale};
pub use sample::Endianness;

/// Plane alignment in bytes used unless one is configured, i.e. no padding.
pub const DEFAULT_ALIGN: usize = 1;
