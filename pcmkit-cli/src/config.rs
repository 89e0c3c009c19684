use anyhow::Context;
use config::{Config, Environment, File};
use pcmkit_audio::{AudioConfig, AudioFormat, ChannelLayout, SampleFormat};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "pcmkit.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub input: StreamConfig,
    pub output: StreamConfig,
    pub audio: AudioConfig,
    /// Number of input samples per channel read and converted at once.
    pub chunk_samples: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: StreamConfig::default(),
            output: StreamConfig {
                sample_format: SampleFormat::FltLe,
                ..Default::default()
            },
            audio: AudioConfig::default(),
            chunk_samples: 1024,
        }
    }
}

impl AppConfig {
    pub fn parse() -> anyhow::Result<Self> {
        // No try_parsing, layout names such as 5.1 would otherwise turn into floats.
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name(CONFIG_FILE_NAME).required(false))
            .add_source(
                Environment::with_prefix("PCMKIT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build config")?
            .try_deserialize::<Self>()
            .context("Failed to deserialize config")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_samples == 0 {
            anyhow::bail!("Chunk size must be at least one sample");
        } else if self.input.rate == 0 {
            anyhow::bail!("Input sample rate is zero");
        } else if self.output.rate == 0 {
            anyhow::bail!("Output sample rate is zero");
        }
        self.audio.validate().context("Invalid audio config")?;
        Ok(())
    }
}

/// Layout of a raw PCM stream.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StreamConfig {
    pub sample_format: SampleFormat,
    pub layout: ChannelLayout,
    pub planar: bool,
    pub rate: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_format: SampleFormat::S16Le,
            layout: ChannelLayout::Stereo,
            planar: false,
            rate: 48_000,
        }
    }
}

impl StreamConfig {
    pub fn format(&self, samples: usize) -> AudioFormat {
        AudioFormat::new(self.sample_format, self.layout, self.planar, self.rate, samples)
    }
}
