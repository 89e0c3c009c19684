mod config;
mod pipeline;

use crate::config::AppConfig;
use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,pcmkit_audio=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(input_path), Some(output_path)) = (args.next(), args.next()) else {
        anyhow::bail!("Usage: pcmkit <input.raw> <output.raw>");
    };

    let config = AppConfig::parse()?;
    tracing::debug!(?config, "Loaded config");

    let mut reader = BufReader::new(
        File::open(&input_path).with_context(|| format!("Failed to open {input_path}"))?,
    );
    let mut writer = BufWriter::new(
        File::create(&output_path).with_context(|| format!("Failed to create {output_path}"))?,
    );

    let stats = pipeline::convert_stream(&mut reader, &mut writer, &config)?;
    tracing::info!(
        chunks = stats.chunks,
        input_samples = stats.input_samples,
        output_samples = stats.output_samples,
        "Conversion finished"
    );
    Ok(())
}
