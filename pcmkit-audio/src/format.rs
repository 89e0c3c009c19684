use crate::error::AudioError;
use crate::sample::Endianness;
use crate::DEFAULT_ALIGN;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    S8,
    U8,
    S16Le,
    S16Be,
    U16Le,
    U16Be,
    S32Le,
    S32Be,
    U32Le,
    U32Be,
    S64Le,
    S64Be,
    U64Le,
    U64Be,
    FltLe,
    FltBe,
    DblLe,
    DblBe,
}

macro_rules! native_alias {
    ($($name:ident => $le:ident, $be:ident;)+) => {
        $(
            pub const $name: Self = if cfg!(target_endian = "little") {
                Self::$le
            } else {
                Self::$be
            };
        )+
    };
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 18] = [
        Self::S8,
        Self::U8,
        Self::S16Le,
        Self::S16Be,
        Self::U16Le,
        Self::U16Be,
        Self::S32Le,
        Self::S32Be,
        Self::U32Le,
        Self::U32Be,
        Self::S64Le,
        Self::S64Be,
        Self::U64Le,
        Self::U64Be,
        Self::FltLe,
        Self::FltBe,
        Self::DblLe,
        Self::DblBe,
    ];

    native_alias! {
        S16 => S16Le, S16Be;
        U16 => U16Le, U16Be;
        S32 => S32Le, S32Be;
        U32 => U32Le, U32Be;
        S64 => S64Le, S64Be;
        U64 => U64Le, U64Be;
        FLT => FltLe, FltBe;
        DBL => DblLe, DblBe;
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::S8 => "s8",
            Self::U8 => "u8",
            Self::S16Le => "s16le",
            Self::S16Be => "s16be",
            Self::U16Le => "u16le",
            Self::U16Be => "u16be",
            Self::S32Le => "s32le",
            Self::S32Be => "s32be",
            Self::U32Le => "u32le",
            Self::U32Be => "u32be",
            Self::S64Le => "s64le",
            Self::S64Be => "s64be",
            Self::U64Le => "u64le",
            Self::U64Be => "u64be",
            Self::FltLe => "fltle",
            Self::FltBe => "fltbe",
            Self::DblLe => "dblle",
            Self::DblBe => "dblbe",
        }
    }

    pub const fn bits(self) -> usize {
        match self {
            Self::S8 | Self::U8 => 8,
            Self::S16Le | Self::S16Be | Self::U16Le | Self::U16Be => 16,
            Self::S32Le | Self::S32Be | Self::U32Le | Self::U32Be | Self::FltLe | Self::FltBe => 32,
            Self::S64Le | Self::S64Be | Self::U64Le | Self::U64Be | Self::DblLe | Self::DblBe => 64,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }

    pub const fn is_float(self) -> bool {
        matches!(
            self,
            Self::FltLe | Self::FltBe | Self::DblLe | Self::DblBe
        )
    }

    pub const fn is_signed(self) -> bool {
        !matches!(
            self,
            Self::U8 | Self::U16Le | Self::U16Be | Self::U32Le | Self::U32Be | Self::U64Le | Self::U64Be
        )
    }

    /// Byte order of the encoding. Single byte formats report the native order.
    pub const fn endianness(self) -> Endianness {
        match self {
            Self::S8 | Self::U8 => Endianness::NATIVE,
            Self::S16Le
            | Self::U16Le
            | Self::S32Le
            | Self::U32Le
            | Self::S64Le
            | Self::U64Le
            | Self::FltLe
            | Self::DblLe => Endianness::Little,
            _ => Endianness::Big,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == needle)
            .ok_or_else(|| AudioError::UnknownSampleFormat(s.to_string()))
    }
}

/// Physical loudspeaker a channel is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    FrontLeft,
    FrontRight,
    FrontCenter,
    LowFrequency,
    BackLeft,
    BackRight,
    BackCenter,
    SideLeft,
    SideRight,
    TopFrontLeft,
    TopFrontRight,
    TopBackLeft,
    TopBackRight,
}

impl Speaker {
    /// Azimuth of the speaker in units of 90 degrees. Front centre is 0,
    /// left is negative, right is positive. Height speakers share the
    /// azimuth of the bed speaker below them.
    pub const fn position(self) -> f64 {
        match self {
            Self::FrontCenter | Self::LowFrequency => 0.0,
            Self::FrontLeft | Self::TopFrontLeft => -1.0 / 3.0,
            Self::FrontRight | Self::TopFrontRight => 1.0 / 3.0,
            Self::SideLeft => -1.0,
            Self::SideRight => 1.0,
            Self::BackLeft | Self::TopBackLeft => -1.5,
            Self::BackRight | Self::TopBackRight => 1.5,
            Self::BackCenter => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
    #[serde(rename = "mono")]
    Mono,
    #[serde(rename = "stereo")]
    Stereo,
    #[serde(rename = "2.1")]
    Surround21,
    #[serde(rename = "3.0")]
    Surround30,
    #[serde(rename = "4.0")]
    Surround40,
    #[serde(rename = "quad")]
    Quad,
    #[serde(rename = "5.0")]
    Surround50,
    #[serde(rename = "5.1")]
    Surround51,
    #[serde(rename = "6.1")]
    Surround61,
    #[serde(rename = "7.1")]
    Surround71,
    #[serde(rename = "hexagonal")]
    Hexagonal,
    #[serde(rename = "octagonal")]
    Octagonal,
    #[serde(rename = "7.1.4")]
    Surround714,
}

impl ChannelLayout {
    pub const ALL: [ChannelLayout; 13] = [
        Self::Mono,
        Self::Stereo,
        Self::Surround21,
        Self::Surround30,
        Self::Surround40,
        Self::Quad,
        Self::Surround50,
        Self::Surround51,
        Self::Surround61,
        Self::Surround71,
        Self::Hexagonal,
        Self::Octagonal,
        Self::Surround714,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::Stereo => "stereo",
            Self::Surround21 => "2.1",
            Self::Surround30 => "3.0",
            Self::Surround40 => "4.0",
            Self::Quad => "quad",
            Self::Surround50 => "5.0",
            Self::Surround51 => "5.1",
            Self::Surround61 => "6.1",
            Self::Surround71 => "7.1",
            Self::Hexagonal => "hexagonal",
            Self::Octagonal => "octagonal",
            Self::Surround714 => "7.1.4",
        }
    }

    /// Speakers in channel order.
    pub const fn speakers(self) -> &'static [Speaker] {
        use Speaker::*;

        match self {
            Self::Mono => &[FrontCenter],
            Self::Stereo => &[FrontLeft, FrontRight],
            Self::Surround21 => &[FrontLeft, FrontRight, LowFrequency],
            Self::Surround30 => &[FrontLeft, FrontRight, FrontCenter],
            Self::Surround40 => &[FrontLeft, FrontRight, FrontCenter, BackCenter],
            Self::Quad => &[FrontLeft, FrontRight, BackLeft, BackRight],
            Self::Surround50 => &[FrontLeft, FrontRight, FrontCenter, SideLeft, SideRight],
            Self::Surround51 => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                SideLeft,
                SideRight,
            ],
            Self::Surround61 => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                BackCenter,
                SideLeft,
                SideRight,
            ],
            Self::Surround71 => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                BackLeft,
                BackRight,
                SideLeft,
                SideRight,
            ],
            Self::Hexagonal => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                BackLeft,
                BackRight,
                BackCenter,
            ],
            Self::Octagonal => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                BackLeft,
                BackRight,
                BackCenter,
                SideLeft,
                SideRight,
            ],
            Self::Surround714 => &[
                FrontLeft,
                FrontRight,
                FrontCenter,
                LowFrequency,
                BackLeft,
                BackRight,
                SideLeft,
                SideRight,
                TopFrontLeft,
                TopFrontRight,
                TopBackLeft,
                TopBackRight,
            ],
        }
    }

    pub const fn channels(self) -> usize {
        self.speakers().len()
    }

    /// Position of the given channel, see [`Speaker::position`].
    pub fn position(self, channel: usize) -> Option<f64> {
        self.speakers().get(channel).map(|speaker| speaker.position())
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelLayout {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|layout| layout.name() == needle)
            .ok_or_else(|| AudioError::UnknownChannelLayout(s.to_string()))
    }
}

/// Describes how the samples of an [`AudioBuffer`](crate::AudioBuffer) are laid out in memory.
///
/// The derived plane geometry is recomputed whenever one of the defining
/// fields changes, so it never goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    sample_format: SampleFormat,
    layout: ChannelLayout,
    planar: bool,
    rate: u32,
    samples: usize,
    align: usize,
    bytes_per_plane: usize,
    plane_size: usize,
}

impl AudioFormat {
    pub fn new(
        sample_format: SampleFormat,
        layout: ChannelLayout,
        planar: bool,
        rate: u32,
        samples: usize,
    ) -> Self {
        let mut format = Self {
            sample_format,
            layout,
            planar,
            rate,
            samples,
            align: DEFAULT_ALIGN,
            bytes_per_plane: 0,
            plane_size: 0,
        };
        format.update();
        format
    }

    fn update(&mut self) {
        self.bytes_per_plane = self.samples * self.bytes_per_sample() * self.channels_per_plane();
        self.plane_size = self.bytes_per_plane.div_ceil(self.align) * self.align;
    }

    pub fn with_sample_format(mut self, sample_format: SampleFormat) -> Self {
        self.sample_format = sample_format;
        self.update();
        self
    }

    pub fn with_layout(mut self, layout: ChannelLayout) -> Self {
        self.layout = layout;
        self.update();
        self
    }

    pub fn with_planar(mut self, planar: bool) -> Self {
        self.planar = planar;
        self.update();
        self
    }

    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self.update();
        self
    }

    pub fn with_align(mut self, align: usize) -> Result<Self, AudioError> {
        if align == 0 {
            return Err(AudioError::InvalidAlignment(align));
        }
        self.align = align;
        self.update();
        Ok(self)
    }

    #[inline]
    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    #[inline]
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    #[inline]
    pub fn planar(&self) -> bool {
        self.planar
    }

    #[inline]
    pub fn rate(&self) -> u32 {
        self.rate
    }

    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    #[inline]
    pub fn bits_per_sample(&self) -> usize {
        self.sample_format.bits()
    }

    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.sample_format.bytes()
    }

    #[inline]
    pub fn planes(&self) -> usize {
        if self.planar { self.channels() } else { 1 }
    }

    #[inline]
    fn channels_per_plane(&self) -> usize {
        if self.planar { 1 } else { self.channels() }
    }

    /// Unpadded number of bytes stored in each plane.
    #[inline]
    pub fn bytes_per_plane(&self) -> usize {
        self.bytes_per_plane
    }

    /// Size of each plane including alignment padding.
    #[inline]
    pub fn plane_size(&self) -> usize {
        self.plane_size
    }

    #[inline]
    pub fn plane_offset(&self, plane: usize) -> usize {
        plane * self.plane_size
    }

    /// Total number of bytes a buffer of this format occupies.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.planes() * self.plane_size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Byte offset of the first sample of `channel` and the distance between
    /// two consecutive samples of that channel.
    pub(crate) fn sample_span(&self, channel: usize) -> (usize, usize) {
        let bps = self.bytes_per_sample();
        if self.planar {
            (self.plane_offset(channel), bps)
        } else {
            (channel * bps, bps * self.channels())
        }
    }

    /// Byte offset of sample `index` of `channel`, if both are in range.
    pub(crate) fn sample_offset(&self, channel: usize, index: usize) -> Option<usize> {
        if channel >= self.channels() || index >= self.samples {
            return None;
        }
        let (base, stride) = self.sample_span(channel);
        Some(base + index * stride)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}Hz {} samples",
            self.sample_format,
            self.layout,
            if self.planar { "planar" } else { "interleaved" },
            self.rate,
            self.samples
        )?;
        if self.align != DEFAULT_ALIGN {
            write!(f, " align {}", self.align)?;
        }
        Ok(())
    }
}
