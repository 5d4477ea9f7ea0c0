// src/audio.rs

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, SampleFormat, StreamConfig};

use crate::error::EditorError;

/// Helper struct to hold output device info
pub struct OutputConfig {
    pub device: Device,
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Finds the default audio output device and its config.
pub fn setup_output_device() -> Result<OutputConfig, EditorError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| EditorError::DriverCommand("no output device available".into()))?;
    let supported_config = device
        .default_output_config()
        .map_err(|e| EditorError::DriverCommand(e.to_string()))?;
    let sample_format = supported_config.sample_format();
    let config = supported_config.config();
    let output_channels = config.channels as usize;
    let output_sample_rate = config.sample_rate.0;

    log::info!(
        "output device: channels: {}, sample_rate: {:?}",
        output_channels,
        config.sample_rate
    );

    Ok(OutputConfig {
        device,
        config,
        sample_format,
        output_channels,
        output_sample_rate,
    })
}
