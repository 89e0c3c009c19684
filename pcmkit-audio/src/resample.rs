use crate::buffer::AudioBuffer;
use crate::config::AudioConfig;
use crate::error::AudioError;
use crate::format::AudioFormat;
use crate::sample::{ByteOrder, Sample, with_sample_type};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMethod {
    /// Nearest neighbour.
    Fast,
    #[default]
    Linear,
    Quadratic,
}

impl ResampleMethod {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
        }
    }
}

impl fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResampleMethod {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "linear" => Ok(Self::Linear),
            "quadratic" => Ok(Self::Quadratic),
            _ => Err(AudioError::UnknownResampleMethod(s.to_string())),
        }
    }
}

/// Stretches or shrinks every channel of `buffer` to `samples` samples.
///
/// Shrinking always uses nearest neighbour selection, regardless of `method`.
#[instrument(level = "trace", skip(buffer), fields(from = buffer.format().samples()), err)]
pub fn scale(
    buffer: &AudioBuffer,
    samples: usize,
    method: ResampleMethod,
) -> Result<AudioBuffer, AudioError> {
    if samples == buffer.format().samples() {
        return Ok(buffer.clone());
    }
    if samples < 1 {
        return Err(AudioError::InvalidSampleCount(samples));
    }

    resample(buffer, buffer.format().with_samples(samples), method)
}

/// Resamples `buffer` to `rate`.
///
/// The ideal output length is usually fractional; the remainder that rounding
/// discards is carried in `drift` and added to the next call, so a stream
/// converted chunk by chunk doesn't lose or gain samples over time. `drift`
/// is only updated when the conversion succeeds.
#[instrument(level = "trace", skip(buffer, drift), fields(from = buffer.format().rate()), err)]
pub fn convert_sample_rate(
    buffer: &AudioBuffer,
    rate: u32,
    drift: &mut f64,
    method: ResampleMethod,
) -> Result<AudioBuffer, AudioError> {
    let format = buffer.format();
    if rate == format.rate() {
        return Ok(buffer.clone());
    }
    if rate == 0 {
        return Err(AudioError::InvalidSampleRate(rate));
    }
    if format.rate() == 0 {
        return Err(AudioError::InvalidSampleRate(format.rate()));
    }

    let ideal = format.samples() as f64 * f64::from(rate) / f64::from(format.rate()) + *drift;
    let rounded = ideal.round();
    if rounded.is_nan() || rounded < 1.0 {
        return Err(AudioError::InvalidSampleCount(0));
    }

    let samples = rounded as usize;
    let output = resample(buffer, format.with_samples(samples).with_rate(rate), method)?;
    *drift = ideal - rounded;
    tracing::trace!(samples, drift = *drift, "Converted sample rate");
    Ok(output)
}

fn resample(
    buffer: &AudioBuffer,
    format: AudioFormat,
    method: ResampleMethod,
) -> Result<AudioBuffer, AudioError> {
    if buffer.format().is_empty() {
        return Err(AudioError::EmptyBuffer);
    }

    let method = if format.samples() < buffer.format().samples() && method != ResampleMethod::Fast {
        tracing::trace!(%method, "Shrinking buffer, falling back to fast resampling");
        ResampleMethod::Fast
    } else {
        method
    };

    let mut output = AudioBuffer::new(format);
    output.copy_metadata(buffer);
    with_sample_type!(format.sample_format(), |T, E| {
        resample_channels::<T, E>(buffer, &mut output, method)
    });
    Ok(output)
}

fn resample_channels<T: Sample, E: ByteOrder>(
    input: &AudioBuffer,
    output: &mut AudioBuffer,
    method: ResampleMethod,
) {
    let in_samples = input.format().samples();
    let out_samples = output.format().samples();
    let step = if out_samples > 1 {
        (in_samples - 1) as f64 / (out_samples - 1) as f64
    } else {
        0.0
    };

    let mut values = Vec::with_capacity(in_samples);
    for channel in 0..input.format().channels() {
        values.clear();
        values.extend((0..in_samples).map(|index| input.read_sample::<T, E>(channel, index)));

        for index in 0..out_samples {
            let x = index as f64 * step;
            let value = match method {
                ResampleMethod::Fast => nearest(&values, x),
                ResampleMethod::Linear => linear(&values, x),
                ResampleMethod::Quadratic => quadratic(&values, x),
            };
            output.write_sample::<T, E>(channel, index, value);
        }
    }
}

#[inline]
fn bracket(len: usize, x: f64) -> (usize, usize) {
    let last = len - 1;
    ((x.floor() as usize).min(last), (x.ceil() as usize).min(last))
}

fn nearest<T: Sample>(values: &[T], x: f64) -> T {
    values[(x.round() as usize).min(values.len() - 1)]
}

fn linear<T: Sample>(values: &[T], x: f64) -> T {
    let (s1, s2) = bracket(values.len(), x);
    if s1 == s2 {
        return values[s1];
    }

    let (x1, x2) = (s1 as f64, s2 as f64);
    let (v1, v2) = (values[s1].to_f64(), values[s2].to_f64());
    T::from_f64(((x - x1) * (v2 - v1) + v1 * (x2 - x1)) / (x2 - x1))
}

/// Fits a parabola through the two samples around `x` and the closer of
/// their outer neighbours. Falls back to [`linear`] at the buffer edges.
fn quadratic<T: Sample>(values: &[T], x: f64) -> T {
    let (s1, s2) = bracket(values.len(), x);
    if s1 == s2 {
        return values[s1];
    }

    let s3 = if x - (s1 as f64) < (s2 as f64) - x {
        s1.saturating_sub(1)
    } else {
        (s2 + 1).min(values.len() - 1)
    };
    if s3 == s1 || s3 == s2 {
        return linear(values, x);
    }

    let mut points = [s1, s2, s3];
    points.sort_unstable();
    let origin = points[0] as f64;
    let xs = points.map(|point| point as f64 - origin);
    let ys = points.map(|point| values[point].to_f64());

    match solve_quadratic(xs, ys) {
        Some([a, b, c]) => {
            let t = x - origin;
            T::from_f64(a + b * t + c * t * t)
        }
        None => linear(values, x),
    }
}

/// Solves `y = a + b*x + c*x^2` for `[a, b, c]` through three points by
/// inverting the Vandermonde matrix. Returns `None` if it is singular.
fn solve_quadratic(xs: [f64; 3], ys: [f64; 3]) -> Option<[f64; 3]> {
    let m = xs.map(|x| [1.0, x, x * x]);
    // 3x3 cofactors, the cyclic index order folds in the sign.
    let cofactor = |r: usize, c: usize| {
        let (r1, r2) = ((r + 1) % 3, (r + 2) % 3);
        let (c1, c2) = ((c + 1) % 3, (c + 2) % 3);
        m[r1][c1] * m[r2][c2] - m[r1][c2] * m[r2][c1]
    };

    let det = (0..3).map(|c| m[0][c] * cofactor(0, c)).sum::<f64>();
    if det.abs() < f64::EPSILON {
        return None;
    }

    // inverse = adjugate / det, adjugate[i][j] = cofactor(j, i)
    Some([0, 1, 2].map(|i| (0..3).map(|j| cofactor(j, i) * ys[j]).sum::<f64>() / det))
}

/// Rate converter for a continuous stream split into chunks.
///
/// Keep the resampler alive between chunks so the fractional remainder of
/// each chunk's output length carries over into the next one.
#[derive(Debug, Clone)]
pub struct StreamResampler {
    rate: u32,
    method: ResampleMethod,
    drift: f64,
}

impl StreamResampler {
    pub fn new(rate: u32, method: ResampleMethod) -> Self {
        Self {
            rate,
            method,
            drift: 0.0,
        }
    }

    pub fn from_config(rate: u32, config: &AudioConfig) -> Self {
        Self::new(rate, config.resample_method)
    }

    #[instrument(level = "trace", skip_all, err)]
    pub fn process(&mut self, buffer: &AudioBuffer) -> Result<AudioBuffer, AudioError> {
        convert_sample_rate(buffer, self.rate, &mut self.drift, self.method)
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn method(&self) -> ResampleMethod {
        self.method
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn reset(&mut self) {
        self.drift = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ChannelLayout, SampleFormat};
    use crate::sample::NativeEndian;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn mono_s16(rate: u32, values: &[i16]) -> AudioBuffer {
        let format = AudioFormat::new(SampleFormat::S16, ChannelLayout::Mono, false, rate, values.len());
        let mut buffer = AudioBuffer::new(format);
        for (index, value) in values.iter().enumerate() {
            buffer.write_sample::<i16, NativeEndian>(0, index, *value);
        }
        buffer
    }

    fn values_of(buffer: &AudioBuffer) -> Vec<i16> {
        (0..buffer.format().samples())
            .map(|index| buffer.read_sample::<i16, NativeEndian>(0, index))
            .collect()
    }

    #[test]
    fn method_names() {
        assert_eq!("Quadratic".parse::<ResampleMethod>(), Ok(ResampleMethod::Quadratic));
        assert_eq!(ResampleMethod::Fast.to_string(), "fast");
        assert_eq!(ResampleMethod::default(), ResampleMethod::Linear);
        assert_eq!(
            "cubic".parse::<ResampleMethod>(),
            Err(AudioError::UnknownResampleMethod("cubic".to_string()))
        );
    }

    #[test]
    fn linear_interpolates_between_neighbours() {
        let buffer = mono_s16(8000, &[0, 100, 200]);
        let scaled = scale(&buffer, 5, ResampleMethod::Linear).unwrap();
        assert_eq!(values_of(&scaled), vec![0, 50, 100, 150, 200]);
    }

    #[test]
    fn linear_rounds_integer_results() {
        let buffer = mono_s16(8000, &[0, 1]);
        let scaled = scale(&buffer, 3, ResampleMethod::Linear).unwrap();
        assert_eq!(values_of(&scaled), vec![0, 1, 1]);
    }

    #[test]
    fn quadratic_follows_a_parabola() {
        // y = 100 * x^2 sampled at 0..5
        let buffer = mono_s16(8000, &[0, 100, 400, 900, 1600]);
        let scaled = scale(&buffer, 9, ResampleMethod::Quadratic).unwrap();
        // The last interval has no outer neighbour and falls back to linear.
        assert_eq!(
            values_of(&scaled),
            vec![0, 25, 100, 225, 400, 625, 900, 1250, 1600]
        );
    }

    #[test]
    fn quadratic_with_two_samples_matches_linear() {
        let buffer = mono_s16(8000, &[-300, 300]);
        let quadratic = scale(&buffer, 7, ResampleMethod::Quadratic).unwrap();
        let linear = scale(&buffer, 7, ResampleMethod::Linear).unwrap();
        assert_eq!(values_of(&quadratic), values_of(&linear));
    }

    #[test]
    fn shrinking_forces_nearest_neighbour() {
        let buffer = mono_s16(8000, &[0, 10, 20, 30, 40]);
        let scaled = scale(&buffer, 3, ResampleMethod::Quadratic).unwrap();
        assert_eq!(values_of(&scaled), vec![0, 20, 40]);
    }

    #[test]
    fn single_output_sample_takes_the_first_input() {
        let buffer = mono_s16(8000, &[7, 8, 9]);
        let scaled = scale(&buffer, 1, ResampleMethod::Linear).unwrap();
        assert_eq!(values_of(&scaled), vec![7]);
    }

    #[test]
    fn scale_rejects_zero_samples() {
        let buffer = mono_s16(8000, &[1, 2]);
        assert_eq!(scale(&buffer, 0, ResampleMethod::Fast), Err(AudioError::InvalidSampleCount(0)));
    }

    #[test]
    fn scale_rejects_empty_source() {
        let buffer = mono_s16(8000, &[]);
        assert_eq!(scale(&buffer, 4, ResampleMethod::Linear), Err(AudioError::EmptyBuffer));
    }

    #[test]
    fn solve_quadratic_recovers_coefficients() {
        let [a, b, c] = solve_quadratic([0.0, 1.0, 2.0], [1.0, 6.0, 17.0]).unwrap();
        assert!((a - 1.0).abs() < 1e-9);
        assert!((b - 2.0).abs() < 1e-9);
        assert!((c - 3.0).abs() < 1e-9);

        assert_eq!(solve_quadratic([0.0, 0.0, 2.0], [1.0, 1.0, 3.0]), None);
    }

    #[test]
    fn sample_rate_conversion_threads_drift() {
        let buffer = mono_s16(3, &[1, 2, 3, 4, 5]);
        let mut drift = 0.0;

        // 5 * 2 / 3 = 3.33
        let first = convert_sample_rate(&buffer, 2, &mut drift, ResampleMethod::Fast).unwrap();
        assert_eq!(first.format().samples(), 3);
        assert_eq!(first.format().rate(), 2);
        assert!((drift - 1.0 / 3.0).abs() < 1e-9);

        // 3.33 + 0.33 = 3.67
        let second = convert_sample_rate(&buffer, 2, &mut drift, ResampleMethod::Fast).unwrap();
        assert_eq!(second.format().samples(), 4);
        assert!((drift + 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn failed_rate_conversion_keeps_drift() {
        let buffer = mono_s16(48000, &[1]);
        let mut drift = 0.25;
        assert_eq!(
            convert_sample_rate(&buffer, 8000, &mut drift, ResampleMethod::Linear),
            Err(AudioError::InvalidSampleCount(0))
        );
        assert_eq!(drift, 0.25);

        assert_eq!(
            convert_sample_rate(&buffer, 0, &mut drift, ResampleMethod::Linear),
            Err(AudioError::InvalidSampleRate(0))
        );
        assert_eq!(drift, 0.25);
    }

    #[test]
    fn nan_drift_is_rejected() {
        let buffer = mono_s16(48000, &[1, 2, 3]);
        let mut drift = f64::NAN;
        assert_eq!(
            convert_sample_rate(&buffer, 96000, &mut drift, ResampleMethod::Linear),
            Err(AudioError::InvalidSampleCount(0))
        );
        assert!(drift.is_nan());
    }

    #[test]
    fn same_rate_is_a_copy() {
        let buffer = mono_s16(8000, &[1, 2, 3]);
        let mut drift = 0.4;
        let converted = convert_sample_rate(&buffer, 8000, &mut drift, ResampleMethod::Linear).unwrap();
        assert_eq!(converted.data(), buffer.data());
        assert_eq!(drift, 0.4);
    }

    #[test]
    fn stream_resampler_keeps_total_length() {
        let mut resampler = StreamResampler::new(44100, ResampleMethod::Linear);
        // 100 samples at 48kHz are 91.875 samples at 44.1kHz
        let chunk = mono_s16(48000, &[0; 100]);

        let total: usize = (0..480)
            .map(|_| resampler.process(&chunk).unwrap().format().samples())
            .sum();
        assert_eq!(total, 44100);
        assert!(resampler.drift().abs() < 1e-6);

        resampler.reset();
        assert_eq!(resampler.drift(), 0.0);
        assert_eq!(resampler.rate(), 44100);
        assert_eq!(resampler.method(), ResampleMethod::Linear);
    }
}
