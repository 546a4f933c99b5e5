//! Engine configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result, MAX_BLOCK_SIZE};

/// Fixed parameters of an [`AudioEngine`](crate::AudioEngine).
///
/// Sample rate and block size stay constant for the lifetime of the engine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Frames rendered per block (`nFrames`).
    pub block_size: usize,
    /// Capacity of the rewiring command queue.
    pub command_capacity: usize,
    /// Longest delay any delay unit can be asked for, in seconds.
    pub max_delay_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            block_size: 256,
            command_capacity: 1024,
            max_delay_seconds: 2.0,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub fn with_max_delay_seconds(mut self, seconds: f32) -> Self {
        self.max_delay_seconds = seconds;
        self
    }

    /// Check that the configuration can drive an engine.
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "block size must be in 1..={MAX_BLOCK_SIZE}, got {}",
                self.block_size
            )));
        }
        if self.command_capacity == 0 {
            return Err(Error::InvalidConfig(
                "command capacity must be non-zero".to_string(),
            ));
        }
        if !self.max_delay_seconds.is_finite() || self.max_delay_seconds <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max delay must be positive, got {}",
                self.max_delay_seconds
            )));
        }
        Ok(())
    }

    /// Length in samples of the longest delay buffer.
    pub fn max_delay_samples(&self) -> usize {
        (self.max_delay_seconds * self.sample_rate).ceil() as usize + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let base = EngineConfig::default();
        assert!(base.clone().with_sample_rate(0.0).validate().is_err());
        assert!(base.clone().with_sample_rate(f32::NAN).validate().is_err());
        assert!(base.clone().with_block_size(0).validate().is_err());
        assert!(base
            .clone()
            .with_block_size(MAX_BLOCK_SIZE + 1)
            .validate()
            .is_err());
        assert!(base.clone().with_command_capacity(0).validate().is_err());
        assert!(base.with_max_delay_seconds(-1.0).validate().is_err());
    }

    #[test]
    fn max_delay_samples_covers_interpolation_guard() {
        let config = EngineConfig::default()
            .with_sample_rate(1_000.0)
            .with_max_delay_seconds(1.0);
        assert_eq!(config.max_delay_samples(), 1_002);
    }
}
