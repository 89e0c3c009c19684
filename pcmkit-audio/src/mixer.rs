use crate::buffer::AudioBuffer;
use crate::convert::remap_f64;
use crate::format::ChannelLayout;
use crate::sample::{ByteOrder, NumericDomain, Sample, with_sample_type};
use tracing::instrument;

/// Remixes `buffer` into `layout`.
///
/// Every output channel is the sum of all input channels, each attenuated by
/// the inverse square of `1 + distance` between the two speaker positions.
/// If the sums overflow the range of the sample type, the whole buffer is
/// scaled back into range.
///
/// Unsigned samples are summed as stored, without removing their midpoint
/// offset, so silence in an unsigned format does not stay at the midpoint.
#[instrument(level = "trace", skip(buffer), fields(from = %buffer.format().layout()))]
pub fn convert_layout(buffer: &AudioBuffer, layout: ChannelLayout) -> AudioBuffer {
    if buffer.format().layout() == layout {
        return buffer.clone();
    }

    let format = buffer.format().with_layout(layout);
    let mut output = AudioBuffer::new(format);
    output.copy_metadata(buffer);
    with_sample_type!(format.sample_format(), |T, E| mix::<T, E>(buffer, &mut output));
    output
}

fn mix<T: Sample, E: ByteOrder>(input: &AudioBuffer, output: &mut AudioBuffer) {
    let samples = input.format().samples();
    let in_speakers = input.format().layout().speakers();
    let out_speakers = output.format().layout().speakers();

    let mut sums = vec![T::Wide::default(); out_speakers.len() * samples];
    for (out_channel, out_speaker) in out_speakers.iter().enumerate() {
        let channel_sums = &mut sums[out_channel * samples..(out_channel + 1) * samples];
        for (in_channel, in_speaker) in in_speakers.iter().enumerate() {
            let distance = (out_speaker.position() - in_speaker.position()).abs();
            let weight = (1.0 + distance).powi(2);
            for (index, sum) in channel_sums.iter_mut().enumerate() {
                let value = input.read_sample::<T, E>(in_channel, index).to_f64();
                *sum = sum.accumulate(T::Wide::from_f64(value / weight));
            }
        }
    }

    // Never shrink below the native range, so in-range sums pass through unchanged.
    let mut min = <T as NumericDomain>::MIN.to_f64();
    let mut max = <T as NumericDomain>::MAX.to_f64();
    for sum in &sums {
        let value = sum.to_f64();
        min = min.min(value);
        max = max.max(value);
    }

    for out_channel in 0..out_speakers.len() {
        for index in 0..samples {
            let sum = sums[out_channel * samples + index].to_f64();
            output.write_sample::<T, E>(out_channel, index, remap_f64::<T>(sum, min, max));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AudioFormat, SampleFormat};
    use crate::sample::NativeEndian;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn buffer_of(layout: ChannelLayout, channels: &[&[i16]]) -> AudioBuffer {
        let samples = channels[0].len();
        let format = AudioFormat::new(SampleFormat::S16, layout, true, 48000, samples);
        let mut buffer = AudioBuffer::new(format);
        for (channel, values) in channels.iter().enumerate() {
            for (index, value) in values.iter().enumerate() {
                buffer.write_sample::<i16, NativeEndian>(channel, index, *value);
            }
        }
        buffer
    }

    fn channel_of(buffer: &AudioBuffer, channel: usize) -> Vec<i16> {
        (0..buffer.format().samples())
            .map(|index| buffer.read_sample::<i16, NativeEndian>(channel, index))
            .collect()
    }

    #[test]
    fn mono_to_stereo_attenuates_by_distance() {
        let buffer = buffer_of(ChannelLayout::Mono, &[&[900, -900, 0]]);
        let stereo = convert_layout(&buffer, ChannelLayout::Stereo);

        assert_eq!(stereo.format().layout(), ChannelLayout::Stereo);
        assert_eq!(stereo.format().samples(), 3);
        // weight (1 + 1/3)^2 = 16/9
        assert_eq!(channel_of(&stereo, 0), vec![506, -506, 0]);
        assert_eq!(channel_of(&stereo, 1), vec![506, -506, 0]);
    }

    #[test]
    fn stereo_to_mono_sums_both_sides() {
        let buffer = buffer_of(ChannelLayout::Stereo, &[&[1600], &[-1600]]);
        let mono = convert_layout(&buffer, ChannelLayout::Mono);
        assert_eq!(channel_of(&mono, 0), vec![0]);

        let buffer = buffer_of(ChannelLayout::Stereo, &[&[1600], &[1600]]);
        let mono = convert_layout(&buffer, ChannelLayout::Mono);
        assert_eq!(channel_of(&mono, 0), vec![1800]);
    }

    #[test]
    fn overflowing_sums_are_rescaled_into_range() {
        let loud = [i16::MAX; 4];
        let quiet = [i16::MIN; 4];
        let buffer = buffer_of(
            ChannelLayout::Surround51,
            &[&loud, &loud, &loud, &loud, &quiet, &loud],
        );

        let mono = convert_layout(&buffer, ChannelLayout::Mono);
        for value in channel_of(&mono, 0) {
            assert_eq!(value, i16::MAX);
        }
    }

    #[test]
    fn same_layout_is_a_copy() {
        let buffer = buffer_of(ChannelLayout::Stereo, &[&[1, 2], &[3, 4]]);
        assert_eq!(convert_layout(&buffer, ChannelLayout::Stereo).data(), buffer.data());
    }

    #[test]
    fn metadata_and_format_survive_remix() {
        let mut buffer = buffer_of(ChannelLayout::Stereo, &[&[1, 2], &[3, 4]]);
        buffer.set_pts(42);
        let remixed = convert_layout(&buffer, ChannelLayout::Quad);
        assert_eq!(remixed.pts(), 42);
        assert_eq!(remixed.format().sample_format(), SampleFormat::S16);
        assert!(remixed.format().planar());
        assert_eq!(remixed.format().channels(), 4);
    }
}
