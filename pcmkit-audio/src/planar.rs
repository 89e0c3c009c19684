use crate::buffer::AudioBuffer;
use tracing::instrument;

/// Reorders the samples of `buffer` into planar (`planar == true`) or
/// interleaved storage. Sample values are copied byte for byte.
#[instrument(level = "trace", skip(buffer), fields(format = %buffer.format()))]
pub fn convert_planar(buffer: &AudioBuffer, planar: bool) -> AudioBuffer {
    let src_format = buffer.format();
    if src_format.planar() == planar {
        return buffer.clone();
    }

    let format = src_format.with_planar(planar);
    let mut output = AudioBuffer::new(format);
    output.copy_metadata(buffer);

    let bps = format.bytes_per_sample();
    let src = buffer.data();
    let dst = output.data_mut();
    for channel in 0..format.channels() {
        let (src_base, src_stride) = src_format.sample_span(channel);
        let (dst_base, dst_stride) = format.sample_span(channel);
        for index in 0..format.samples() {
            let from = src_base + index * src_stride;
            let to = dst_base + index * dst_stride;
            dst[to..to + bps].copy_from_slice(&src[from..from + bps]);
        }
    }

    output
}
