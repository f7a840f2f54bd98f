//! Capture configuration.
//!
//! There is no config file and no environment lookup: everything comes from
//! the command line on top of the well-known AD9361 defaults below.

use std::time::Duration;

use crate::error::{AcqResult, AcquisitionError};

/// Context URI used when none is given.
pub const DEFAULT_LOCATOR: &str = "ip:192.168.2.1";
/// Capture duration used when none is given.
pub const DEFAULT_DURATION_SECS: i64 = 5;
/// Sample rate used when none is given.
pub const DEFAULT_SAMPLE_RATE_MSPS: f64 = 2.0;

/// Streaming RX endpoint of the AD9361.
pub const RX_DEVICE: &str = "cf-ad9361-lpc";
/// AD9361 control endpoint.
pub const PHY_DEVICE: &str = "ad9361-phy";
/// PHY channel carrying the RX sample-rate attribute.
pub const PHY_RATE_CHANNEL: &str = "voltage0";
pub const SAMPLE_RATE_ATTR: &str = "sampling_frequency";
/// In-phase and quadrature channels, in buffer order.
pub const IQ_CHANNELS: [&str; 2] = ["voltage0", "voltage1"];
/// Capture buffer capacity in samples per channel.
pub const BUFFER_SAMPLES: usize = 16384;

/// Everything a session needs to know before it connects.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Context URI (`ip:...`, `usb:...`, `local:`, or `mock:`)
    pub locator: String,
    /// Requested capture time in whole seconds; zero or less captures nothing
    pub duration_secs: i64,
    /// Requested sample rate in samples per second
    pub sample_rate_hz: i64,
    /// Name of the streaming device
    pub rx_device: String,
    /// Name of the configuration device
    pub phy_device: String,
    /// PHY channel that holds the sample-rate attribute
    pub phy_channel: String,
    /// Sample-rate attribute name
    pub rate_attr: String,
    /// Channels to enable, in order
    pub channels: Vec<String>,
    /// Buffer capacity in samples per channel
    pub buffer_samples: usize,
    /// Create the buffer in cyclic mode
    pub cyclic: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            locator: DEFAULT_LOCATOR.to_string(),
            duration_secs: DEFAULT_DURATION_SECS,
            sample_rate_hz: msps_to_hz(DEFAULT_SAMPLE_RATE_MSPS),
            rx_device: RX_DEVICE.to_string(),
            phy_device: PHY_DEVICE.to_string(),
            phy_channel: PHY_RATE_CHANNEL.to_string(),
            rate_attr: SAMPLE_RATE_ATTR.to_string(),
            channels: IQ_CHANNELS.iter().map(|c| c.to_string()).collect(),
            buffer_samples: BUFFER_SAMPLES,
            cyclic: false,
        }
    }
}

impl CaptureConfig {
    /// Create a new builder for capture configuration.
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AcqResult<()> {
        if self.locator.is_empty() {
            return Err(AcquisitionError::InvalidConfig(
                "connection locator is empty".to_string(),
            ));
        }

        if self.channels.is_empty() {
            return Err(AcquisitionError::InvalidConfig(
                "at least one channel is required".to_string(),
            ));
        }

        if self.buffer_samples == 0 {
            return Err(AcquisitionError::InvalidConfig(
                "buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Capture time limit; zero when the requested duration is not positive.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs.max(0) as u64)
    }

    /// Requested sample rate in MSPS, for display.
    pub fn sample_rate_msps(&self) -> f64 {
        self.sample_rate_hz as f64 / 1e6
    }

    /// Whether the locator selects the built-in simulated device.
    pub fn is_mock(&self) -> bool {
        self.locator.starts_with(crate::hardware::mock::MOCK_SCHEME)
    }
}

/// Convert MSPS to integer samples per second, rounding to nearest.
///
/// Non-finite input maps to 0, which the device rejects.
pub fn msps_to_hz(msps: f64) -> i64 {
    let hz = (msps * 1e6).round();
    if hz.is_finite() {
        hz as i64
    } else {
        0
    }
}

/// Builder for CaptureConfig.
#[derive(Debug, Default)]
pub struct CaptureConfigBuilder {
    config: CaptureConfig,
}

impl CaptureConfigBuilder {
    /// Set the context URI.
    pub fn locator(mut self, locator: impl Into<String>) -> Self {
        self.config.locator = locator.into();
        self
    }

    /// Set the capture duration in seconds.
    pub fn duration_secs(mut self, secs: i64) -> Self {
        self.config.duration_secs = secs;
        self
    }

    /// Set the sample rate in samples per second.
    pub fn sample_rate_hz(mut self, hz: i64) -> Self {
        self.config.sample_rate_hz = hz;
        self
    }

    /// Set the sample rate in MSPS.
    pub fn sample_rate_msps(mut self, msps: f64) -> Self {
        self.config.sample_rate_hz = msps_to_hz(msps);
        self
    }

    /// Set the channels to enable.
    pub fn channels(mut self, channels: &[&str]) -> Self {
        self.config.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Set the buffer capacity in samples per channel.
    pub fn buffer_samples(mut self, samples: usize) -> Self {
        self.config.buffer_samples = samples;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AcqResult<CaptureConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
