//! libiio-backed hardware, via `daq-driver-iio`.

use tracing::warn;

use daq_driver_iio::{
    ChannelSamples, ContextInfo, IioBuffer, IioChannel, IioContext, IioError, Result,
};

use super::{CaptureBuffer, ChannelStatus, HardwareBackend, HardwareContext};

/// Backend that opens real libiio contexts.
#[derive(Debug, Default, Clone, Copy)]
pub struct IioBackend;

impl HardwareBackend for IioBackend {
    type Context = IioContext;

    fn open(&self, locator: &str) -> Result<IioContext> {
        IioContext::from_uri(locator)
    }
}

impl HardwareContext for IioContext {
    type Buffer<'a> = IioCapture<'a>;

    fn summary(&self) -> ContextInfo {
        self.info()
    }

    fn device_channels(&self, device: &str) -> Option<Vec<String>> {
        let dev = self.find_device(device)?;
        Some(
            dev.channels()
                .iter()
                .filter(|ch| !ch.is_output())
                .map(IioChannel::id)
                .collect(),
        )
    }

    fn write_sample_rate(
        &self,
        device: &str,
        channel: &str,
        attr: &str,
        rate_hz: i64,
    ) -> Result<i64> {
        let dev = self.require_device(device)?;
        let ch = dev.require_channel(channel, false)?;
        ch.require_attr(attr)?;
        ch.attr_write(attr, &rate_hz.to_string())?;
        ch.attr_read_i64(attr)
    }

    fn enable_channel(&self, device: &str, channel: &str) -> ChannelStatus {
        let Some(ch) = self
            .find_device(device)
            .and_then(|dev| dev.find_channel(channel, false))
        else {
            return ChannelStatus::Missing;
        };

        match ch.require_16_bit() {
            Ok(_) => {
                ch.enable();
                ChannelStatus::Enabled
            }
            Err(IioError::UnsupportedFormat { bits, .. }) => ChannelStatus::Unsupported { bits },
            Err(e) => {
                warn!(channel = %channel, error = %e, "Could not read channel data format");
                ChannelStatus::Unsupported { bits: 0 }
            }
        }
    }

    fn create_buffer(
        &self,
        device: &str,
        channels: &[String],
        samples: usize,
        cyclic: bool,
    ) -> Result<IioCapture<'_>> {
        let dev = self.require_device(device)?;
        let channels = channels
            .iter()
            .map(|name| dev.require_channel(name, false))
            .collect::<Result<Vec<_>>>()?;
        let buffer = dev.create_buffer(samples, cyclic)?;

        Ok(IioCapture { buffer, channels })
    }
}

/// A libiio buffer plus the channels it captures, in enable order.
pub struct IioCapture<'ctx> {
    buffer: IioBuffer<'ctx>,
    channels: Vec<IioChannel<'ctx>>,
}

impl CaptureBuffer for IioCapture<'_> {
    fn refill(&mut self) -> Result<usize> {
        self.buffer.refill()
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn channel_samples(&self, index: usize) -> Result<ChannelSamples<'_>> {
        let channel = self
            .channels
            .get(index)
            .ok_or_else(|| IioError::InvalidArgument {
                message: format!(
                    "channel index {} out of range ({} channels)",
                    index,
                    self.channels.len()
                ),
            })?;
        self.buffer.channel_samples(channel)
    }
}
