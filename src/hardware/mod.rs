//! Hardware seam for the acquisition session.
//!
//! The session never talks to libiio directly. It drives three small traits:
//!
//! - [`HardwareBackend`] - opens a context from a connection locator
//! - [`HardwareContext`] - introspection, channel enabling, sample-rate
//!   writes and buffer allocation on an open context
//! - [`CaptureBuffer`] - blocking refill plus per-channel sample views
//!
//! Two implementations exist: [`iio::IioBackend`] over `daq-driver-iio`, and
//! [`mock::MockBackend`], a simulated AD9361 used by the `mock:` locator and
//! by the integration tests.
//!
//! A buffer borrows its context (`Buffer<'a>` is tied to `&'a self`), so
//! every implementation releases the buffer before the context.

use daq_driver_iio::{ChannelSamples, ContextInfo, Result};

pub mod iio;
pub mod mock;

pub use iio::IioBackend;
pub use mock::{MockBackend, MockSignal, ResourceEvent};

/// Outcome of trying to enable one capture channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Channel found and enabled
    Enabled,
    /// No input channel of that name on the device
    Missing,
    /// Channel exists but its storage is not 16 bits wide
    Unsupported { bits: u32 },
}

/// Opens hardware contexts.
pub trait HardwareBackend {
    type Context: HardwareContext;

    /// Open a context from a connection locator (e.g. `ip:192.168.2.1`).
    fn open(&self, locator: &str) -> Result<Self::Context>;
}

/// An open hardware context.
pub trait HardwareContext {
    type Buffer<'a>: CaptureBuffer
    where
        Self: 'a;

    /// Description, attributes and device list.
    fn summary(&self) -> ContextInfo;

    /// Input channel ids of a device, or `None` if the device is absent.
    fn device_channels(&self, device: &str) -> Option<Vec<String>>;

    /// Write `rate_hz` as an integer string to a channel attribute of
    /// `device` and read the applied value back.
    fn write_sample_rate(&self, device: &str, channel: &str, attr: &str, rate_hz: i64)
        -> Result<i64>;

    /// Enable an input channel of `device` for capture.
    fn enable_channel(&self, device: &str, channel: &str) -> ChannelStatus;

    /// Allocate a capture buffer over the given (already enabled) channels.
    fn create_buffer(
        &self,
        device: &str,
        channels: &[String],
        samples: usize,
        cyclic: bool,
    ) -> Result<Self::Buffer<'_>>;
}

/// A capture buffer bound to an ordered set of channels.
pub trait CaptureBuffer {
    /// Block until the next chunk arrives; returns the bytes delivered.
    fn refill(&mut self) -> Result<usize>;

    /// Number of channels the buffer was created with.
    fn channel_count(&self) -> usize;

    /// Samples of the `index`-th channel from the last refill.
    fn channel_samples(&self, index: usize) -> Result<ChannelSamples<'_>>;
}
