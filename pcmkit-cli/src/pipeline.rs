use crate::config::AppConfig;
use anyhow::Context;
use pcmkit_audio::{AudioBuffer, AudioError, StreamResampler, TimeBase, DEFAULT_ALIGN};
use std::io::{ErrorKind, Read, Write};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub chunks: usize,
    pub input_samples: usize,
    pub output_samples: usize,
}

/// Streams raw PCM from `reader` to `writer`, converting chunk by chunk.
#[tracing::instrument(level = "debug", skip_all, err)]
pub fn convert_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    config: &AppConfig,
) -> anyhow::Result<Stats> {
    let chunk_format = config.input.format(config.chunk_samples);
    let target = config.output.format(config.chunk_samples);
    let frame_bytes = chunk_format.bytes_per_sample() * chunk_format.channels();
    let mut resampler = StreamResampler::from_config(config.output.rate, &config.audio);
    tracing::debug!(input = %chunk_format, output = %target, "Starting conversion");

    let mut chunk = vec![0u8; chunk_format.frame_size()];
    let mut stats = Stats::default();
    // Converted input that was too short to yield an output sample on its own.
    let mut pending: Option<AudioBuffer> = None;
    loop {
        let read = read_chunk(reader, &mut chunk).context("Failed to read input")?;
        let samples = read / frame_bytes;
        if read % frame_bytes != 0 {
            tracing::warn!(
                trailing = read % frame_bytes,
                "Dropping incomplete trailing frame"
            );
        }
        if samples == 0 {
            break;
        }

        let format = config.input.format(samples);
        let mut buffer = AudioBuffer::from_bytes(&chunk[..format.frame_size()], format)?;
        buffer.set_pts(stats.input_samples as i64);
        buffer.set_time_base(TimeBase::new(1, i64::from(config.input.rate)));
        stats.input_samples += samples;

        let converted = buffer
            .convert(&target)
            .context("Failed to convert chunk")?;
        let converted = match pending.take() {
            Some(head) => {
                let mut joined = head.concat(&converted).context("Failed to join chunks")?;
                joined.set_pts(head.pts());
                joined
            }
            None => converted,
        };
        let resampled = match resampler.process(&converted) {
            Ok(resampled) => resampled,
            Err(AudioError::InvalidSampleCount(_)) => {
                tracing::trace!(
                    samples = converted.format().samples(),
                    "Chunk too short for target rate, carrying over"
                );
                pending = Some(converted);
                if samples < config.chunk_samples {
                    break;
                }
                continue;
            }
            Err(err) => return Err(err).context("Failed to resample chunk"),
        };
        let output = if config.audio.align == DEFAULT_ALIGN {
            resampled
        } else {
            resampled.realign(config.audio.align)?
        };

        writer
            .write_all(output.data())
            .context("Failed to write output")?;

        stats.chunks += 1;
        stats.output_samples += output.format().samples();
        tracing::trace!(chunk = stats.chunks, drift = resampler.drift(), "Converted chunk");

        if samples < config.chunk_samples {
            break;
        }
    }

    if let Some(rest) = pending {
        tracing::debug!(
            samples = rest.format().samples(),
            "Dropping input shorter than one output sample"
        );
    }
    writer.flush().context("Failed to flush output")?;
    Ok(stats)
}

/// Fills `buf` as far as the reader allows, returning the number of bytes read.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
