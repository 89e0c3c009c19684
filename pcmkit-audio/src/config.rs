use crate::error::AudioError;
use crate::resample::ResampleMethod;
use crate::DEFAULT_ALIGN;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub resample_method: ResampleMethod,
    /// Plane alignment in bytes applied to converted buffers.
    pub align: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            resample_method: ResampleMethod::default(),
            align: DEFAULT_ALIGN,
        }
    }
}

impl AudioConfig {
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.align == 0 {
            return Err(AudioError::InvalidAlignment(self.align));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn defaults() {
        let config = AudioConfig::default();
        assert_eq!(config.resample_method, ResampleMethod::Linear);
        assert_eq!(config.align, 1);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_alignment_is_invalid() {
        let config = AudioConfig {
            align: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(AudioError::InvalidAlignment(0)));
    }
}
