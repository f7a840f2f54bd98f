//! Session setup: connect, introspect, configure, enable, allocate.
//!
//! Every step either hands back what it acquired or fails with a typed
//! [`AcquisitionError`]. Nothing here releases resources explicitly; the
//! caller's locals are dropped buffer-first on every early return.

use tracing::{debug, info, warn};

use super::SessionObserver;
use crate::config::CaptureConfig;
use crate::error::{AcqResult, AcquisitionError};
use crate::hardware::{ChannelStatus, HardwareBackend, HardwareContext};

/// Open the context and describe what it contains.
pub fn connect<B, O>(backend: &B, config: &CaptureConfig, observer: &mut O) -> AcqResult<B::Context>
where
    B: HardwareBackend,
    O: SessionObserver + ?Sized,
{
    observer.status("Connecting to device...");

    let ctx = backend
        .open(&config.locator)
        .map_err(|source| AcquisitionError::Connection {
            locator: config.locator.clone(),
            source,
        })?;

    let info = ctx.summary();
    observer.status(&format!("✓ Connected: {}", info.description));
    for attr in ["hw_model", "fw_version"] {
        if let Some(value) = info.attribute(attr) {
            observer.status(&format!("  {}: {}", attr, value));
        }
    }
    observer.status("");

    observer.status("Available IIO devices:");
    for dev in &info.devices {
        observer.status(&format!("  - {}: {} channels", dev.label(), dev.n_channels));
    }
    observer.status("");

    debug!(uri = %config.locator, devices = info.devices.len(), "Context ready");
    Ok(ctx)
}

/// Check that the capture device exists and list its input channels.
pub fn locate_capture_device<C, O>(
    ctx: &C,
    config: &CaptureConfig,
    observer: &mut O,
) -> AcqResult<Vec<String>>
where
    C: HardwareContext,
    O: SessionObserver + ?Sized,
{
    let channels =
        ctx.device_channels(&config.rx_device)
            .ok_or_else(|| AcquisitionError::DeviceNotFound {
                device: config.rx_device.clone(),
            })?;

    let label = ctx
        .summary()
        .device(&config.rx_device)
        .map_or_else(|| config.rx_device.clone(), |dev| dev.label().to_string());
    observer.status(&format!("Using RX device: {}", label));
    observer.status(&format!("Channels: [{}]", channels.join(", ")));
    observer.status("");
    Ok(channels)
}

/// Best-effort sample-rate write on the configuration device.
///
/// Returns the rate the device reports after the write, or `None` when the
/// rate could not be set. Failures are logged and never abort the session.
pub fn configure_sample_rate<C, O>(ctx: &C, config: &CaptureConfig, observer: &mut O) -> Option<i64>
where
    C: HardwareContext,
    O: SessionObserver + ?Sized,
{
    if ctx.device_channels(&config.phy_device).is_none() {
        info!(device = %config.phy_device, "Configuration device absent; sample rate left unchanged");
        observer.status(&format!(
            "✗ WARNING: {} not found, cannot configure sample rate",
            config.phy_device
        ));
        return None;
    }

    match ctx.write_sample_rate(
        &config.phy_device,
        &config.phy_channel,
        &config.rate_attr,
        config.sample_rate_hz,
    ) {
        Ok(applied) => {
            observer.status(&format!("✓ Sample rate set to: {:.3} MSPS", applied as f64 / 1e6));
            Some(applied)
        }
        Err(source) => {
            let err = AcquisitionError::Configuration {
                what: format!("sample rate of {} S/s", config.sample_rate_hz),
                source,
            };
            info!(error = %err, cause = %err.cause(), "Continuing with the device's current sample rate");
            None
        }
    }
}

/// Enable the configured channels; fails when none could be enabled.
pub fn enable_channels<C, O>(
    ctx: &C,
    config: &CaptureConfig,
    observer: &mut O,
) -> AcqResult<Vec<String>>
where
    C: HardwareContext,
    O: SessionObserver + ?Sized,
{
    let mut enabled = Vec::with_capacity(config.channels.len());

    for name in &config.channels {
        match ctx.enable_channel(&config.rx_device, name) {
            ChannelStatus::Enabled => {
                observer.status(&format!("✓ Enabled channel: {}", name));
                enabled.push(name.clone());
            }
            ChannelStatus::Missing => {
                debug!(channel = %name, device = %config.rx_device, "Channel not present");
            }
            ChannelStatus::Unsupported { bits } => {
                warn!(channel = %name, bits, "Skipping channel: only 16-bit samples are decoded");
            }
        }
    }

    if enabled.is_empty() {
        return Err(AcquisitionError::NoChannels {
            device: config.rx_device.clone(),
        });
    }

    observer.status("");
    Ok(enabled)
}

/// Allocate the capture buffer over the enabled channels.
pub fn allocate_buffer<'a, C, O>(
    ctx: &'a C,
    config: &CaptureConfig,
    channels: &[String],
    observer: &mut O,
) -> AcqResult<C::Buffer<'a>>
where
    C: HardwareContext,
    O: SessionObserver + ?Sized,
{
    observer.status(&format!("Creating buffer ({} samples)...", config.buffer_samples));

    let buffer = ctx
        .create_buffer(&config.rx_device, channels, config.buffer_samples, config.cyclic)
        .map_err(|source| AcquisitionError::BufferAllocation {
            device: config.rx_device.clone(),
            samples: config.buffer_samples,
            source,
        })?;

    observer.status(&format!("✓ Buffer created: {} samples", config.buffer_samples));
    observer.status("");
    Ok(buffer)
}
