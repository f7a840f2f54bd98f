//! Capture buffers.
//!
//! [`IioBuffer`] owns a libiio buffer bound to a device and the channels that
//! were enabled when it was created. It borrows the context, so it is always
//! destroyed before the context is.
//!
//! # Example
//!
//! ```no_run
//! use daq_driver_iio::IioContext;
//!
//! # fn example() -> anyhow::Result<()> {
//! let ctx = IioContext::from_uri("ip:192.168.2.1")?;
//! let rx = ctx.require_device("cf-ad9361-lpc")?;
//! let i = rx.require_channel("voltage0", false)?;
//! i.enable();
//!
//! let mut buffer = rx.create_buffer(16384, false)?;
//! let bytes = buffer.refill()?;
//! let peak = buffer.channel_samples(&i)?.map(i16::unsigned_abs).max();
//! println!("{} bytes, peak {:?}", bytes, peak);
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::{debug, trace};

use iio_sys::iio_buffer;

use crate::channel::IioChannel;
use crate::context::IioContext;
use crate::device::IioDevice;
use crate::error::{IioError, Result};
use crate::samples::ChannelSamples;

/// A fixed-capacity buffer streaming samples from a device.
pub struct IioBuffer<'ctx> {
    handle: NonNull<iio_buffer>,
    device: String,
    samples: usize,
    cyclic: bool,
    _ctx: PhantomData<&'ctx IioContext>,
}

impl<'ctx> IioBuffer<'ctx> {
    pub(crate) fn create(device: &IioDevice<'ctx>, samples: usize, cyclic: bool) -> Result<Self> {
        if samples == 0 {
            return Err(IioError::InvalidArgument {
                message: "buffer must hold at least one sample".to_string(),
            });
        }

        // SAFETY: device handle is valid while the context is borrowed
        let handle = unsafe { iio_sys::iio_device_create_buffer(device.as_ptr(), samples, cyclic) };

        let Some(handle) = NonNull::new(handle) else {
            let errno = IioError::last_errno();
            return Err(IioError::BufferCreation {
                device: device.label(),
                samples,
                errno,
                message: IioError::describe_errno(errno),
            });
        };

        debug!(device = %device.label(), samples, cyclic, "Created IIO buffer");

        Ok(Self {
            handle,
            device: device.label(),
            samples,
            cyclic,
            _ctx: PhantomData,
        })
    }

    fn as_ptr(&self) -> *const iio_buffer {
        self.handle.as_ptr()
    }

    /// Fetch the next block of samples from the device.
    ///
    /// This blocks until the device has delivered a full buffer or an I/O
    /// error occurs. Returns the number of bytes now held.
    pub fn refill(&mut self) -> Result<usize> {
        // SAFETY: handle is valid and &mut self guarantees no live sample views
        let ret = unsafe { iio_sys::iio_buffer_refill(self.handle.as_ptr()) } as isize;

        if ret < 0 {
            let code = ret as i64;
            let errno = i32::try_from(-code).unwrap_or(i32::MAX);
            return Err(IioError::Refill {
                code,
                message: IioError::describe_errno(errno),
            });
        }

        trace!(device = %self.device, bytes = ret, "Refilled IIO buffer");
        Ok(ret as usize)
    }

    /// Bytes between consecutive scans.
    pub fn step(&self) -> usize {
        // SAFETY: handle is valid
        let step = unsafe { iio_sys::iio_buffer_step(self.as_ptr()) } as isize;
        step.max(0) as usize
    }

    /// The bytes delivered by the last refill.
    pub fn bytes(&self) -> &[u8] {
        // SAFETY: handle is valid; libiio keeps [start, end) allocated and
        // unchanged until the next refill or destroy, both of which need
        // &mut self or ownership.
        unsafe {
            let start = iio_sys::iio_buffer_start(self.as_ptr()) as *const u8;
            let end = iio_sys::iio_buffer_end(self.as_ptr()) as *const u8;
            if start.is_null() || end <= start {
                return &[];
            }
            let len = end.offset_from(start) as usize;
            std::slice::from_raw_parts(start, len)
        }
    }

    /// Byte offset of a channel's first slot from the start of the buffer.
    fn first_offset(&self, channel: &IioChannel<'ctx>) -> Result<usize> {
        // SAFETY: both handles are valid while the context is borrowed
        let (start, first) = unsafe {
            (
                iio_sys::iio_buffer_start(self.as_ptr()) as usize,
                iio_sys::iio_buffer_first(self.as_ptr(), channel.as_ptr()) as usize,
            )
        };

        if first == 0 || first < start {
            return Err(IioError::NullPointer {
                function: "iio_buffer_first".to_string(),
            });
        }

        Ok(first - start)
    }

    /// The signed 16-bit samples of one enabled channel from the last refill.
    pub fn channel_samples(&self, channel: &IioChannel<'ctx>) -> Result<ChannelSamples<'_>> {
        let layout = channel.layout(self.first_offset(channel)?, self.step())?;
        ChannelSamples::new(self.bytes(), layout)
    }
}

impl Drop for IioBuffer<'_> {
    fn drop(&mut self) {
        debug!(device = %self.device, "Destroying IIO buffer");
        // SAFETY: handle is valid and we own it
        unsafe { iio_sys::iio_buffer_destroy(self.handle.as_ptr()) };
    }
}

impl std::fmt::Debug for IioBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IioBuffer")
            .field("device", &self.device)
            .field("samples", &self.samples)
            .field("cyclic", &self.cyclic)
            .finish()
    }
}
