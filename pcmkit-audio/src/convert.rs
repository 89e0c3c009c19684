use crate::buffer::AudioBuffer;
use crate::error::AudioError;
use crate::format::SampleFormat;
use crate::sample::{ByteOrder, NativeEndian, NumericDomain, Sample, with_sample_type};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::instrument;

/// Converts a run of encoded samples from `src` into `dst`. Both slices
/// hold the same number of samples.
pub(crate) type ConvertFn = fn(&[u8], &mut [u8]);

static CONVERTERS: LazyLock<HashMap<(SampleFormat, SampleFormat), ConvertFn>> =
    LazyLock::new(|| {
        let mut table = HashMap::new();
        for format in SampleFormat::ALL {
            register::<i64>(&mut table, SampleFormat::S64, format);
            if format.is_float() {
                register::<f64>(&mut table, SampleFormat::DBL, format);
            }
        }
        tracing::debug!(entries = table.len(), "Built sample format conversion table");
        table
    });

/// Registers `format` in both directions against `hub`, whose samples are
/// of type `H` in native byte order.
fn register<H: Sample>(
    table: &mut HashMap<(SampleFormat, SampleFormat), ConvertFn>,
    hub: SampleFormat,
    format: SampleFormat,
) {
    if format == hub {
        return;
    }
    with_sample_type!(format, |T, E| {
        table.insert((format, hub), convert_samples::<T, E, H, NativeEndian> as ConvertFn);
        table.insert((hub, format), convert_samples::<H, NativeEndian, T, E> as ConvertFn);
    });
}

fn convert_samples<I: Sample, IE: ByteOrder, O: Sample, OE: ByteOrder>(src: &[u8], dst: &mut [u8]) {
    for (input, output) in src.chunks_exact(I::BYTES).zip(dst.chunks_exact_mut(O::BYTES)) {
        scale_value::<I, O>(I::read::<IE>(input)).write::<OE>(output);
    }
}

/// Maps `value` from the numeric domain of `I` onto the numeric domain of `O`.
fn scale_value<I: Sample, O: Sample>(value: I) -> O {
    if !I::FLOAT && !O::FLOAT {
        let src_min = <I as NumericDomain>::MIN.to_i128();
        let src_range = (<I as NumericDomain>::MAX.to_i128() - src_min) as u128;
        let dst_min = <O as NumericDomain>::MIN.to_i128();
        let dst_range = (<O as NumericDomain>::MAX.to_i128() - dst_min) as u128;

        // Both ranges fit in 64 bits, so the product can't overflow.
        let offset = (value.to_i128() - src_min) as u128;
        let scaled = offset * dst_range / src_range;
        O::from_i128(dst_min + scaled as i128)
    } else {
        remap_f64::<O>(
            value.clamp_to_domain().to_f64(),
            <I as NumericDomain>::MIN.to_f64(),
            <I as NumericDomain>::MAX.to_f64(),
        )
    }
}

/// Maps `value` from `[min, max]` onto the numeric domain of `O`.
pub(crate) fn remap_f64<O: Sample>(value: f64, min: f64, max: f64) -> O {
    let dst_min = <O as NumericDomain>::MIN.to_f64();
    let dst_max = <O as NumericDomain>::MAX.to_f64();
    O::from_f64(dst_min + (value - min) * (dst_max - dst_min) / (max - min))
}

enum Route {
    Identity,
    Direct(ConvertFn),
    Hub {
        hub: SampleFormat,
        first: ConvertFn,
        second: ConvertFn,
    },
}

fn hub_for(from: SampleFormat, to: SampleFormat) -> SampleFormat {
    if from.is_float() && to.is_float() {
        SampleFormat::DBL
    } else {
        SampleFormat::S64
    }
}

fn route(from: SampleFormat, to: SampleFormat) -> Option<Route> {
    if from == to {
        return Some(Route::Identity);
    }
    if let Some(convert) = CONVERTERS.get(&(from, to)) {
        return Some(Route::Direct(*convert));
    }

    let hub = hub_for(from, to);
    let first = CONVERTERS.get(&(from, hub))?;
    let second = CONVERTERS.get(&(hub, to))?;
    Some(Route::Hub {
        hub,
        first: *first,
        second: *second,
    })
}

/// Returns true if samples encoded as `from` can be converted to `to`.
pub fn can_convert(from: SampleFormat, to: SampleFormat) -> bool {
    route(from, to).is_some()
}

/// Converts every sample of `buffer` to the `to` sample format, keeping
/// layout, planarity, rate and metadata.
#[instrument(level = "trace", skip(buffer), fields(from = %buffer.format().sample_format()), err)]
pub fn convert_format(buffer: &AudioBuffer, to: SampleFormat) -> Result<AudioBuffer, AudioError> {
    let from = buffer.format().sample_format();
    match route(from, to).ok_or(AudioError::UnsupportedConversion { from, to })? {
        Route::Identity => Ok(buffer.clone()),
        Route::Direct(convert) => Ok(apply(buffer, to, convert)),
        Route::Hub { hub, first, second } => {
            tracing::trace!(%hub, "Converting through hub format");
            let intermediate = apply(buffer, hub, first);
            Ok(apply(&intermediate, to, second))
        }
    }
}

fn apply(buffer: &AudioBuffer, to: SampleFormat, convert: ConvertFn) -> AudioBuffer {
    let format = buffer.format().with_sample_format(to);
    let mut output = AudioBuffer::new(format);
    output.copy_metadata(buffer);
    for plane in 0..format.planes() {
        convert(buffer.payload(plane), output.payload_mut(plane));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AudioFormat, ChannelLayout};
    use crate::sample::{BigEndian, LittleEndian};
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn mono(sample_format: SampleFormat, samples: usize) -> AudioFormat {
        AudioFormat::new(sample_format, ChannelLayout::Mono, false, 48000, samples)
    }

    #[test]
    fn integer_scaling_hits_the_extremes() {
        assert_eq!(scale_value::<i16, u8>(i16::MIN), 0);
        assert_eq!(scale_value::<i16, u8>(i16::MAX), u8::MAX);
        assert_eq!(scale_value::<u8, i16>(u8::MAX), i16::MAX);
        assert_eq!(scale_value::<u8, i16>(0), i16::MIN);
        assert_eq!(scale_value::<i64, u64>(i64::MIN), 0);
        assert_eq!(scale_value::<u64, i64>(u64::MAX), i64::MAX);
    }

    #[test]
    fn widening_through_s64_is_exact() {
        for value in [i16::MIN, -1234, -1, 0, 1, 4321, i16::MAX] {
            let wide = scale_value::<i16, i64>(value);
            assert_eq!(scale_value::<i64, i16>(wide), value);
        }
        for value in [0u8, 1, 127, 128, 254, 255] {
            let wide = scale_value::<u8, i64>(value);
            assert_eq!(scale_value::<i64, u8>(wide), value);
        }
    }

    #[test]
    fn float_sources_are_clamped() {
        assert_eq!(scale_value::<f32, i16>(4.0), i16::MAX);
        assert_eq!(scale_value::<f64, i16>(-4.0), i16::MIN);
        assert_eq!(scale_value::<f32, f64>(0.5), 0.5);
        assert_eq!(scale_value::<i16, f32>(i16::MAX), 1.0);
        assert_eq!(scale_value::<i16, f32>(i16::MIN), -1.0);
    }

    #[test]
    fn convert_samples_swaps_byte_order() {
        let src = [0x12, 0x34, 0x56, 0x78];
        let mut dst = [0u8; 4];
        convert_samples::<i16, BigEndian, i16, LittleEndian>(&src, &mut dst);
        assert_eq!(dst, [0x34, 0x12, 0x78, 0x56]);
    }

    #[test]
    fn identity_is_a_copy() {
        let buffer = AudioBuffer::from_bytes(&[1, 2, 3, 4], mono(SampleFormat::S16Be, 2)).unwrap();
        let converted = convert_format(&buffer, SampleFormat::S16Be).unwrap();
        assert_eq!(converted.data(), buffer.data());
    }

    #[test]
    fn endianness_conversion_through_hub() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1000i16.to_le_bytes());
        bytes.extend_from_slice(&(-2000i16).to_le_bytes());
        let buffer = AudioBuffer::from_bytes(&bytes, mono(SampleFormat::S16Le, 2)).unwrap();

        let converted = convert_format(&buffer, SampleFormat::S16Be).unwrap();
        assert_eq!(converted.format().sample_format(), SampleFormat::S16Be);
        assert_eq!(&converted.data()[..2], &1000i16.to_be_bytes());
        assert_eq!(&converted.data()[2..], &(-2000i16).to_be_bytes());
    }

    #[test]
    fn float_to_float_keeps_values() {
        let mut bytes = Vec::new();
        for value in [0.25f32, -0.5, 1.0] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        let buffer = AudioBuffer::from_bytes(&bytes, mono(SampleFormat::FltBe, 3)).unwrap();

        let converted = convert_format(&buffer, SampleFormat::DblLe).unwrap();
        let values: Vec<f64> = converted
            .data()
            .chunks_exact(8)
            .map(|chunk| f64::from_le_bytes(chunk.try_into().unwrap()))
            .collect();
        assert_eq!(values, vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn every_pair_is_routable() {
        for from in SampleFormat::ALL {
            for to in SampleFormat::ALL {
                assert!(can_convert(from, to), "{from} -> {to}");
            }
        }
    }
}
