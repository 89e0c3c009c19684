use crate::error::AudioError;
use crate::format::{AudioFormat, ChannelLayout, SampleFormat};
use crate::resample::ResampleMethod;
use crate::sample::{ByteOrder, Sample};
use crate::{convert, mixer, planar, resample};
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::ops::{Add, AddAssign, Range};
use tracing::instrument;

/// Rational unit of the presentation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimeBase {
    pub num: i64,
    pub den: i64,
}

impl TimeBase {
    pub const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Value of the time base in seconds, `0.0` for an undefined time base.
    pub fn value(&self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Raw audio samples together with the [`AudioFormat`] describing them.
///
/// The byte length of the storage always equals the frame size of the
/// format. Every conversion returns a new buffer and leaves the source
/// untouched.
#[derive(Clone, PartialEq)]
pub struct AudioBuffer {
    format: AudioFormat,
    data: BytesMut,
    pts: i64,
    time_base: TimeBase,
    index: Option<usize>,
    id: Option<u64>,
}

impl AudioBuffer {
    /// Creates a zero filled buffer for `format`.
    pub fn new(format: AudioFormat) -> Self {
        Self::from_parts(format, BytesMut::zeroed(format.frame_size()))
    }

    fn from_parts(format: AudioFormat, data: BytesMut) -> Self {
        Self {
            format,
            data,
            pts: 0,
            time_base: TimeBase::default(),
            index: None,
            id: None,
        }
    }

    pub fn from_bytes(bytes: &[u8], format: AudioFormat) -> Result<Self, AudioError> {
        if bytes.len() != format.frame_size() {
            return Err(AudioError::SizeMismatch {
                expected: format.frame_size(),
                actual: bytes.len(),
            });
        }

        Ok(Self::from_parts(format, BytesMut::from(bytes)))
    }

    /// Copies timestamp, time base, stream index and id from `other`.
    pub fn copy_metadata(&mut self, other: &AudioBuffer) {
        self.pts = other.pts;
        self.time_base = other.time_base;
        self.index = other.index;
        self.id = other.id;
    }

    #[inline]
    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn pts(&self) -> i64 {
        self.pts
    }

    pub fn set_pts(&mut self, pts: i64) {
        self.pts = pts;
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    pub fn set_time_base(&mut self, time_base: TimeBase) {
        self.time_base = time_base;
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    /// Duration of the buffer in seconds.
    pub fn duration(&self) -> f64 {
        if self.format.rate() == 0 {
            return 0.0;
        }
        self.format.samples() as f64 / f64::from(self.format.rate())
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Freezes the storage for zero copy hand-off.
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    fn plane_range(&self, plane: usize) -> Option<Range<usize>> {
        if plane >= self.format.planes() {
            return None;
        }
        let start = self.format.plane_offset(plane);
        Some(start..start + self.format.plane_size())
    }

    /// Full plane including alignment padding.
    pub fn plane_data(&self, plane: usize) -> Option<&[u8]> {
        let range = self.plane_range(plane)?;
        Some(&self.data[range])
    }

    pub fn plane_data_mut(&mut self, plane: usize) -> Option<&mut [u8]> {
        let range = self.plane_range(plane)?;
        Some(&mut self.data[range])
    }

    /// Sample bytes of a plane without padding. Panics if `plane` is out of range.
    pub(crate) fn payload(&self, plane: usize) -> &[u8] {
        let start = self.format.plane_offset(plane);
        &self.data[start..start + self.format.bytes_per_plane()]
    }

    pub(crate) fn payload_mut(&mut self, plane: usize) -> &mut [u8] {
        let start = self.format.plane_offset(plane);
        &mut self.data[start..start + self.format.bytes_per_plane()]
    }

    /// Encoded bytes of sample `index` of `channel`.
    pub fn sample(&self, channel: usize, index: usize) -> Option<&[u8]> {
        let offset = self.format.sample_offset(channel, index)?;
        Some(&self.data[offset..offset + self.format.bytes_per_sample()])
    }

    pub fn sample_mut(&mut self, channel: usize, index: usize) -> Option<&mut [u8]> {
        let offset = self.format.sample_offset(channel, index)?;
        let bps = self.format.bytes_per_sample();
        Some(&mut self.data[offset..offset + bps])
    }

    /// Overwrites sample `index` of `channel` with already encoded bytes.
    pub fn set_sample(&mut self, channel: usize, index: usize, value: &[u8]) -> Result<(), AudioError> {
        let expected = self.format.bytes_per_sample();
        if value.len() != expected {
            return Err(AudioError::SizeMismatch {
                expected,
                actual: value.len(),
            });
        }
        self.sample_mut(channel, index)
            .ok_or(AudioError::SampleOutOfRange { channel, index })?
            .copy_from_slice(value);
        Ok(())
    }

    /// Decodes a sample. `T` and `E` must match the sample format, and the
    /// position must be in range.
    #[inline]
    pub(crate) fn read_sample<T: Sample, E: ByteOrder>(&self, channel: usize, index: usize) -> T {
        let (base, stride) = self.format.sample_span(channel);
        T::read::<E>(&self.data[base + index * stride..])
    }

    #[inline]
    pub(crate) fn write_sample<T: Sample, E: ByteOrder>(&mut self, channel: usize, index: usize, value: T) {
        let (base, stride) = self.format.sample_span(channel);
        value.write::<E>(&mut self.data[base + index * stride..]);
    }

    /// Converts sample format, channel layout and planarity to those of `target`,
    /// in that order. Rate, sample count and alignment are left as they are.
    #[instrument(level = "trace", skip(self), fields(from = %self.format), err)]
    pub fn convert(&self, target: &AudioFormat) -> Result<AudioBuffer, AudioError> {
        let buffer = self.convert_format(target.sample_format())?;
        let buffer = buffer.convert_layout(target.layout());
        Ok(buffer.convert_planar(target.planar()))
    }

    pub fn can_convert_format(&self, to: SampleFormat) -> bool {
        convert::can_convert(self.format.sample_format(), to)
    }

    pub fn convert_format(&self, to: SampleFormat) -> Result<AudioBuffer, AudioError> {
        convert::convert_format(self, to)
    }

    pub fn convert_layout(&self, layout: ChannelLayout) -> AudioBuffer {
        mixer::convert_layout(self, layout)
    }

    pub fn convert_planar(&self, planar: bool) -> AudioBuffer {
        planar::convert_planar(self, planar)
    }

    pub fn scale(&self, samples: usize, method: ResampleMethod) -> Result<AudioBuffer, AudioError> {
        resample::scale(self, samples, method)
    }

    pub fn convert_sample_rate(
        &self,
        rate: u32,
        drift: &mut f64,
        method: ResampleMethod,
    ) -> Result<AudioBuffer, AudioError> {
        resample::convert_sample_rate(self, rate, drift, method)
    }

    /// Appends `other` to this buffer.
    ///
    /// `other` is first converted to this buffer's sample format, layout and
    /// planarity. The result carries the metadata of `other`.
    #[instrument(level = "trace", skip_all, fields(head = %self.format, tail = %other.format), err)]
    pub fn concat(&self, other: &AudioBuffer) -> Result<AudioBuffer, AudioError> {
        let tail = other.convert(&self.format)?;
        let format = self
            .format
            .with_samples(self.format.samples() + tail.format.samples());

        let mut output = AudioBuffer::new(format);
        output.copy_metadata(&tail);
        for plane in 0..format.planes() {
            let head = self.payload(plane);
            let dst = output.payload_mut(plane);
            dst[..head.len()].copy_from_slice(head);
            dst[head.len()..].copy_from_slice(tail.payload(plane));
        }
        Ok(output)
    }

    /// Splits off the first `samples` samples (or all of them if there are
    /// fewer) and returns them. This buffer keeps the remainder. Both parts
    /// carry this buffer's metadata.
    #[instrument(level = "trace", skip(self), fields(format = %self.format), err)]
    pub fn pop(&mut self, samples: usize) -> Result<AudioBuffer, AudioError> {
        let taken = samples.min(self.format.samples());
        if taken < 1 {
            return Err(AudioError::InvalidSampleCount(taken));
        }

        let front_format = self.format.with_samples(taken);
        let rest_format = self.format.with_samples(self.format.samples() - taken);

        let mut front = AudioBuffer::new(front_format);
        let mut rest = AudioBuffer::new(rest_format);
        front.copy_metadata(self);
        rest.copy_metadata(self);

        let split = front_format.bytes_per_plane();
        for plane in 0..self.format.planes() {
            let payload = self.payload(plane);
            front.payload_mut(plane).copy_from_slice(&payload[..split]);
            rest.payload_mut(plane).copy_from_slice(&payload[split..]);
        }

        *self = rest;
        Ok(front)
    }

    /// Repacks the planes with a new alignment.
    #[instrument(level = "trace", skip(self), fields(from = self.format.align()), err)]
    pub fn realign(&self, align: usize) -> Result<AudioBuffer, AudioError> {
        let format = self.format.with_align(align)?;
        if format.plane_size() == self.format.plane_size() {
            tracing::trace!("Plane size unchanged, skipping repack");
            let mut output = self.clone();
            output.format = format;
            return Ok(output);
        }

        let mut output = AudioBuffer::new(format);
        output.copy_metadata(self);
        let len = format.plane_size().min(self.format.plane_size());
        for plane in 0..format.planes() {
            let src = self.format.plane_offset(plane);
            let dst = format.plane_offset(plane);
            output.data[dst..dst + len].copy_from_slice(&self.data[src..src + len]);
        }
        Ok(output)
    }
}

impl Add<&AudioBuffer> for &AudioBuffer {
    type Output = AudioBuffer;

    /// See [`AudioBuffer::concat`]. Returns a copy of `self` if `rhs` can't be converted.
    fn add(self, rhs: &AudioBuffer) -> AudioBuffer {
        self.concat(rhs).unwrap_or_else(|err| {
            tracing::warn!(?err, "Failed to append audio buffer, keeping original");
            self.clone()
        })
    }
}

impl AddAssign<&AudioBuffer> for AudioBuffer {
    /// See [`AudioBuffer::concat`]. Leaves `self` unchanged if `rhs` can't be converted.
    fn add_assign(&mut self, rhs: &AudioBuffer) {
        match self.concat(rhs) {
            Ok(buffer) => *self = buffer,
            Err(err) => {
                tracing::warn!(?err, "Failed to append audio buffer, keeping original");
            }
        }
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("format", &self.format)
            .field("pts", &self.pts)
            .field("time_base", &self.time_base)
            .field("index", &self.index)
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}

impl fmt::Display for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, pts {} ({}), {} bytes",
            self.format,
            self.pts,
            self.time_base,
            self.data.len()
        )
    }
}
