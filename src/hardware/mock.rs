//! Simulated AD9361 hardware.
//!
//! Selected on the command line with the `mock:` locator, and used by the
//! integration tests to drive the session without a radio attached.
//!
//! The mock behaves like a LibreSDR/PlutoSDR context: an `ad9361-phy`
//! control device and a `cf-ad9361-lpc` streaming device with interleaved
//! little-endian I/Q. Every failure path of a real device can be switched
//! on, and resource acquisition and release are recorded as
//! [`ResourceEvent`]s so tests can check release order.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::new().scans_per_refill(8192).fail_on_refill(5);
//! let report = run_session(&backend, &config, &cancel, &mut ())?;
//! assert_eq!(report.stats.aggregates.refills, 4);
//! ```

use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use daq_driver_iio::{
    ChannelSamples, ContextInfo, DeviceSummary, IioError, Result, SampleLayout, SAMPLE_WIDTH,
};

use super::{CaptureBuffer, ChannelStatus, HardwareBackend, HardwareContext};
use crate::cancel::CancellationToken;
use crate::config::{
    msps_to_hz, DEFAULT_SAMPLE_RATE_MSPS, IQ_CHANNELS, PHY_DEVICE, PHY_RATE_CHANNEL, RX_DEVICE,
    SAMPLE_RATE_ATTR,
};

/// Locator prefix that selects the simulated device.
pub const MOCK_SCHEME: &str = "mock:";

/// Lowest rate the simulated front end accepts, in samples per second.
pub const MIN_RATE_HZ: i64 = 521_000;
/// Highest rate the simulated front end accepts, in samples per second.
pub const MAX_RATE_HZ: i64 = 61_440_000;

/// Device ids, as libiio would number them.
const PHY_DEVICE_ID: &str = "iio:device0";
const RX_DEVICE_ID: &str = "iio:device3";

/// Scans per tone period.
const TONE_PERIOD: f64 = 64.0;

/// Waveform delivered on the I/Q channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockSignal {
    /// Quadrature tone: cosine on even channels, sine on odd ones
    Tone { amplitude: i16 },
    /// Constant value on every channel
    Flat(i16),
}

/// Resource acquisition and release, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvent {
    ContextOpened,
    BufferCreated,
    BufferReleased,
    ContextReleased,
}

#[derive(Debug, Clone)]
struct MockSettings {
    reachable: bool,
    rx_present: bool,
    phy_present: bool,
    rate_write_fails: bool,
    channels: Vec<(String, u32)>,
    buffer_fails: bool,
    signal: MockSignal,
    scans_per_refill: Option<usize>,
    fail_on_refill: Option<u64>,
    cancel_after: Option<(u64, CancellationToken)>,
    paced: bool,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            reachable: true,
            rx_present: true,
            phy_present: true,
            rate_write_fails: false,
            channels: IQ_CHANNELS.iter().map(|c| (c.to_string(), 16)).collect(),
            buffer_fails: false,
            signal: MockSignal::Tone { amplitude: 1000 },
            scans_per_refill: None,
            fail_on_refill: None,
            cancel_after: None,
            paced: false,
        }
    }
}

/// Backend producing simulated contexts.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    settings: MockSettings,
    events: Arc<Mutex<Vec<ResourceEvent>>>,
}

impl MockBackend {
    /// A healthy device streaming a tone on `voltage0`/`voltage1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `open` as if the host did not answer.
    pub fn unreachable(mut self) -> Self {
        self.settings.reachable = false;
        self
    }

    /// Leave the streaming device out of the context.
    pub fn without_rx_device(mut self) -> Self {
        self.settings.rx_present = false;
        self
    }

    /// Leave the control device out of the context.
    pub fn without_phy_device(mut self) -> Self {
        self.settings.phy_present = false;
        self
    }

    /// Reject sample-rate writes. Non-positive rates are always rejected.
    pub fn failing_rate_write(mut self) -> Self {
        self.settings.rate_write_fails = true;
        self
    }

    /// Replace the streaming device's channels with `(id, storage bits)`.
    pub fn with_channels(mut self, channels: &[(&str, u32)]) -> Self {
        self.settings.channels = channels
            .iter()
            .map(|(id, bits)| (id.to_string(), *bits))
            .collect();
        self
    }

    /// Fail buffer allocation.
    pub fn failing_buffer(mut self) -> Self {
        self.settings.buffer_fails = true;
        self
    }

    pub fn signal(mut self, signal: MockSignal) -> Self {
        self.settings.signal = signal;
        self
    }

    /// Deliver `scans` scans per refill instead of a full buffer.
    pub fn scans_per_refill(mut self, scans: usize) -> Self {
        self.settings.scans_per_refill = Some(scans);
        self
    }

    /// Fail the `n`-th refill (1-based).
    pub fn fail_on_refill(mut self, n: u64) -> Self {
        self.settings.fail_on_refill = Some(n);
        self
    }

    /// Cancel `token` while the `n`-th refill (1-based) is being delivered.
    pub fn cancel_after(mut self, n: u64, token: CancellationToken) -> Self {
        self.settings.cancel_after = Some((n, token));
        self
    }

    /// Block each refill for as long as the scans take at the applied rate.
    pub fn paced(mut self) -> Self {
        self.settings.paced = true;
        self
    }

    /// Snapshot of recorded resource events.
    pub fn events(&self) -> Vec<ResourceEvent> {
        self.events.lock().clone()
    }

    fn record(&self, event: ResourceEvent) {
        self.events.lock().push(event);
    }
}

impl HardwareBackend for MockBackend {
    type Context = MockContext;

    fn open(&self, locator: &str) -> Result<MockContext> {
        if !self.settings.reachable {
            return Err(IioError::ContextCreation {
                uri: locator.to_string(),
                errno: 110,
                message: "Connection timed out".to_string(),
            });
        }

        debug!(uri = %locator, "Opened simulated IIO context");
        self.record(ResourceEvent::ContextOpened);

        Ok(MockContext {
            uri: locator.to_string(),
            settings: self.settings.clone(),
            events: Arc::clone(&self.events),
            applied_rate_hz: Mutex::new(None),
        })
    }
}

/// A simulated context.
#[derive(Debug)]
pub struct MockContext {
    uri: String,
    settings: MockSettings,
    events: Arc<Mutex<Vec<ResourceEvent>>>,
    applied_rate_hz: Mutex<Option<i64>>,
}

impl MockContext {
    /// Devices are found by name or id, as `iio_context_find_device` does.
    fn is_rx(&self, device: &str) -> bool {
        self.settings.rx_present && (device == RX_DEVICE || device == RX_DEVICE_ID)
    }

    fn is_phy(&self, device: &str) -> bool {
        self.settings.phy_present && (device == PHY_DEVICE || device == PHY_DEVICE_ID)
    }

    fn channel_bits(&self, channel: &str) -> Option<u32> {
        self.settings
            .channels
            .iter()
            .find(|(id, _)| id == channel)
            .map(|(_, bits)| *bits)
    }

    fn applied_rate_hz(&self) -> i64 {
        let applied = *self.applied_rate_hz.lock();
        applied.unwrap_or_else(|| msps_to_hz(DEFAULT_SAMPLE_RATE_MSPS))
    }
}

impl HardwareContext for MockContext {
    type Buffer<'a> = MockBuffer<'a>;

    fn summary(&self) -> ContextInfo {
        let mut devices = Vec::new();
        if self.settings.phy_present {
            devices.push(DeviceSummary {
                id: PHY_DEVICE_ID.to_string(),
                name: Some(PHY_DEVICE.to_string()),
                n_channels: 9,
            });
        }
        if self.settings.rx_present {
            devices.push(DeviceSummary {
                id: RX_DEVICE_ID.to_string(),
                name: Some(RX_DEVICE.to_string()),
                n_channels: self.settings.channels.len() as u32,
            });
        }

        ContextInfo {
            uri: self.uri.clone(),
            description: "Simulated AD9361 transceiver".to_string(),
            attributes: vec![
                ("hw_model".to_string(), "Simulated LibreSDR Rev.5".to_string()),
                ("fw_version".to_string(), "mock".to_string()),
            ],
            devices,
        }
    }

    fn device_channels(&self, device: &str) -> Option<Vec<String>> {
        if self.is_rx(device) {
            Some(self.settings.channels.iter().map(|(id, _)| id.clone()).collect())
        } else if self.is_phy(device) {
            Some(vec![PHY_RATE_CHANNEL.to_string()])
        } else {
            None
        }
    }

    fn write_sample_rate(
        &self,
        device: &str,
        channel: &str,
        attr: &str,
        rate_hz: i64,
    ) -> Result<i64> {
        if !self.is_phy(device) {
            return Err(IioError::DeviceNotFound {
                name: device.to_string(),
            });
        }
        if channel != PHY_RATE_CHANNEL {
            return Err(IioError::ChannelNotFound {
                device: device.to_string(),
                channel: channel.to_string(),
            });
        }
        if attr != SAMPLE_RATE_ATTR {
            return Err(IioError::AttributeNotFound {
                channel: channel.to_string(),
                attr: attr.to_string(),
            });
        }
        if self.settings.rate_write_fails || rate_hz <= 0 {
            return Err(IioError::AttributeWrite {
                channel: channel.to_string(),
                attr: attr.to_string(),
                errno: 22,
                message: "Invalid argument".to_string(),
            });
        }

        let applied = rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ);
        *self.applied_rate_hz.lock() = Some(applied);
        Ok(applied)
    }

    fn enable_channel(&self, device: &str, channel: &str) -> ChannelStatus {
        if !self.is_rx(device) {
            return ChannelStatus::Missing;
        }
        match self.channel_bits(channel) {
            None => ChannelStatus::Missing,
            Some(16) => ChannelStatus::Enabled,
            Some(bits) => ChannelStatus::Unsupported { bits },
        }
    }

    fn create_buffer(
        &self,
        device: &str,
        channels: &[String],
        samples: usize,
        _cyclic: bool,
    ) -> Result<MockBuffer<'_>> {
        if !self.is_rx(device) {
            return Err(IioError::DeviceNotFound {
                name: device.to_string(),
            });
        }
        if let Some(missing) = channels.iter().find(|ch| self.channel_bits(ch).is_none()) {
            return Err(IioError::ChannelNotFound {
                device: device.to_string(),
                channel: missing.clone(),
            });
        }
        if samples == 0 {
            return Err(IioError::InvalidArgument {
                message: "buffer must hold at least one sample".to_string(),
            });
        }
        if self.settings.buffer_fails {
            return Err(IioError::BufferCreation {
                device: device.to_string(),
                samples,
                errno: 12,
                message: "Cannot allocate memory".to_string(),
            });
        }

        debug!(device = %device, samples, "Created simulated buffer");
        self.events.lock().push(ResourceEvent::BufferCreated);

        Ok(MockBuffer {
            ctx: self,
            channels: channels.len(),
            scans: self.settings.scans_per_refill.unwrap_or(samples),
            bytes: Vec::new(),
            refills: 0,
            phase: 0,
        })
    }
}

impl Drop for MockContext {
    fn drop(&mut self) {
        debug!(uri = %self.uri, "Destroying simulated IIO context");
        self.events.lock().push(ResourceEvent::ContextReleased);
    }
}

/// A simulated capture buffer holding interleaved little-endian scans.
pub struct MockBuffer<'ctx> {
    ctx: &'ctx MockContext,
    channels: usize,
    scans: usize,
    bytes: Vec<u8>,
    refills: u64,
    phase: u64,
}

impl MockBuffer<'_> {
    fn sample(&self, scan: u64, channel: usize) -> i16 {
        match self.ctx.settings.signal {
            MockSignal::Flat(value) => value,
            MockSignal::Tone { amplitude } => {
                let angle = TAU * (scan % TONE_PERIOD as u64) as f64 / TONE_PERIOD;
                let wave = if channel % 2 == 0 { angle.cos() } else { angle.sin() };
                (f64::from(amplitude) * wave).round() as i16
            }
        }
    }

    fn step(&self) -> usize {
        self.channels * SAMPLE_WIDTH
    }
}

impl CaptureBuffer for MockBuffer<'_> {
    fn refill(&mut self) -> Result<usize> {
        self.refills += 1;

        if self.ctx.settings.fail_on_refill == Some(self.refills) {
            return Err(IioError::Refill {
                code: -5,
                message: "Input/output error".to_string(),
            });
        }

        if self.ctx.settings.paced {
            let rate = self.ctx.applied_rate_hz().max(1) as f64;
            std::thread::sleep(Duration::from_secs_f64(self.scans as f64 / rate));
        }

        let mut bytes = Vec::with_capacity(self.scans * self.step());
        for scan in 0..self.scans as u64 {
            for channel in 0..self.channels {
                let value = self.sample(self.phase + scan, channel);
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        self.bytes = bytes;
        self.phase += self.scans as u64;

        if let Some((n, token)) = &self.ctx.settings.cancel_after {
            if *n == self.refills {
                token.cancel();
            }
        }

        Ok(self.bytes.len())
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn channel_samples(&self, index: usize) -> Result<ChannelSamples<'_>> {
        if index >= self.channels {
            return Err(IioError::InvalidArgument {
                message: format!(
                    "channel index {} out of range ({} channels)",
                    index, self.channels
                ),
            });
        }
        ChannelSamples::new(
            &self.bytes,
            SampleLayout::new(index * SAMPLE_WIDTH, self.step()),
        )
    }
}

impl Drop for MockBuffer<'_> {
    fn drop(&mut self) {
        debug!(refills = self.refills, "Destroying simulated buffer");
        self.ctx.events.lock().push(ResourceEvent::BufferReleased);
    }
}
