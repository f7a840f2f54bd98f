//! Non-owning device references.

use std::ffi::CString;
use std::marker::PhantomData;
use std::ptr::NonNull;

use iio_sys::iio_device;

use crate::buffer::IioBuffer;
use crate::channel::IioChannel;
use crate::context::IioContext;
use crate::error::{IioError, Result};
use crate::c_string_lossy;

/// A device inside an [`IioContext`].
///
/// This is a borrowed reference; it cannot outlive the context it came from.
#[derive(Clone, Copy)]
pub struct IioDevice<'ctx> {
    handle: NonNull<iio_device>,
    _ctx: PhantomData<&'ctx IioContext>,
}

impl<'ctx> IioDevice<'ctx> {
    pub(crate) fn from_raw(_ctx: &'ctx IioContext, handle: NonNull<iio_device>) -> Self {
        Self {
            handle,
            _ctx: PhantomData,
        }
    }

    pub(crate) fn as_ptr(&self) -> *const iio_device {
        self.handle.as_ptr()
    }

    /// Kernel id (e.g., "iio:device3").
    pub fn id(&self) -> String {
        // SAFETY: handle is valid while the context is borrowed
        unsafe { c_string_lossy(iio_sys::iio_device_get_id(self.as_ptr())) }.unwrap_or_default()
    }

    /// Driver name (e.g., "cf-ad9361-lpc"), if the device has one.
    pub fn name(&self) -> Option<String> {
        // SAFETY: handle is valid while the context is borrowed
        unsafe { c_string_lossy(iio_sys::iio_device_get_name(self.as_ptr())) }
    }

    /// Name if present, otherwise the id.
    pub fn label(&self) -> String {
        self.name().unwrap_or_else(|| self.id())
    }

    /// Number of channels.
    pub fn channels_count(&self) -> u32 {
        // SAFETY: handle is valid
        unsafe { iio_sys::iio_device_get_channels_count(self.as_ptr()) }
    }

    /// All channels of the device.
    pub fn channels(&self) -> Vec<IioChannel<'ctx>> {
        (0..self.channels_count())
            .filter_map(|index| {
                // SAFETY: handle is valid and index is in range
                let chn = unsafe { iio_sys::iio_device_get_channel(self.as_ptr(), index) };
                NonNull::new(chn).map(IioChannel::from_raw)
            })
            .collect()
    }

    /// Find a channel by name or id in the given direction.
    pub fn find_channel(&self, name: &str, output: bool) -> Option<IioChannel<'ctx>> {
        let c_name = CString::new(name).ok()?;
        // SAFETY: handle is valid and c_name is null-terminated
        let chn =
            unsafe { iio_sys::iio_device_find_channel(self.as_ptr(), c_name.as_ptr(), output) };
        NonNull::new(chn).map(IioChannel::from_raw)
    }

    /// Find a channel, failing with [`IioError::ChannelNotFound`].
    pub fn require_channel(&self, name: &str, output: bool) -> Result<IioChannel<'ctx>> {
        self.find_channel(name, output)
            .ok_or_else(|| IioError::ChannelNotFound {
                device: self.label(),
                channel: name.to_string(),
            })
    }

    /// Allocate a buffer of `samples` scans over the currently enabled channels.
    ///
    /// # Errors
    ///
    /// Returns [`IioError::BufferCreation`] if the kernel cannot size the
    /// buffer; an undersized device-side `buffer/length` is the usual cause.
    pub fn create_buffer(&self, samples: usize, cyclic: bool) -> Result<IioBuffer<'ctx>> {
        IioBuffer::create(self, samples, cyclic)
    }
}

impl std::fmt::Debug for IioDevice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IioDevice")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}
