//! Channel references, attribute I/O and sample formats.

use std::marker::PhantomData;
use std::os::raw::c_longlong;
use std::ptr::NonNull;

use tracing::debug;

use iio_sys::{iio_channel, iio_data_format};

use crate::context::IioContext;
use crate::error::{IioError, Result};
use crate::samples::SampleLayout;
use crate::{c_string_lossy, to_cstring};

/// Storage layout of a channel's samples, as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFormat {
    /// Storage size of one element in bits (e.g., 16)
    pub length: u32,
    /// Number of valid data bits (e.g., 12 on the AD9361)
    pub bits: u32,
    /// Right shift to apply to extract the data bits
    pub shift: u32,
    /// Data is two's complement
    pub is_signed: bool,
    /// Data is stored big-endian
    pub is_big_endian: bool,
    /// Elements per sample
    pub repeat: u32,
}

impl DataFormat {
    fn from_raw(raw: &iio_data_format) -> Self {
        Self {
            length: raw.length as u32,
            bits: raw.bits as u32,
            shift: raw.shift as u32,
            is_signed: raw.is_signed,
            is_big_endian: raw.is_be,
            repeat: (raw.repeat as u32).max(1),
        }
    }

    /// Element width in bytes.
    pub fn width_bytes(&self) -> usize {
        (self.length / 8) as usize
    }

    /// Whether samples can be decoded as signed 16-bit words.
    pub fn is_16_bit(&self) -> bool {
        self.length == 16
    }
}

/// A channel of an IIO device.
///
/// This is a borrowed reference; it cannot outlive the context it came from.
#[derive(Clone, Copy)]
pub struct IioChannel<'ctx> {
    handle: NonNull<iio_channel>,
    _ctx: PhantomData<&'ctx IioContext>,
}

impl<'ctx> IioChannel<'ctx> {
    pub(crate) fn from_raw(handle: NonNull<iio_channel>) -> Self {
        Self {
            handle,
            _ctx: PhantomData,
        }
    }

    pub(crate) fn as_ptr(&self) -> *const iio_channel {
        self.handle.as_ptr()
    }

    /// Channel id (e.g., "voltage0").
    pub fn id(&self) -> String {
        // SAFETY: handle is valid while the context is borrowed
        unsafe { c_string_lossy(iio_sys::iio_channel_get_id(self.as_ptr())) }.unwrap_or_default()
    }

    /// Whether this is an output channel.
    pub fn is_output(&self) -> bool {
        // SAFETY: handle is valid
        unsafe { iio_sys::iio_channel_is_output(self.as_ptr()) }
    }

    /// Enable the channel for the next buffer created on its device.
    pub fn enable(&self) {
        debug!(channel = %self.id(), "Enabling IIO channel");
        // SAFETY: handle is valid; libiio only flips the channel's enable flag
        unsafe { iio_sys::iio_channel_enable(self.handle.as_ptr()) }
    }

    /// Whether the channel exposes an attribute of this name.
    pub fn has_attr(&self, attr: &str) -> bool {
        let Ok(c_attr) = to_cstring(attr) else {
            return false;
        };
        // SAFETY: handle is valid and c_attr is null-terminated
        !unsafe { iio_sys::iio_channel_find_attr(self.as_ptr(), c_attr.as_ptr()) }.is_null()
    }

    /// Find an attribute, failing with [`IioError::AttributeNotFound`].
    pub fn require_attr(&self, attr: &str) -> Result<()> {
        if self.has_attr(attr) {
            Ok(())
        } else {
            Err(IioError::AttributeNotFound {
                channel: self.id(),
                attr: attr.to_string(),
            })
        }
    }

    /// Write a string attribute.
    pub fn attr_write(&self, attr: &str, value: &str) -> Result<()> {
        let c_attr = to_cstring(attr)?;
        let c_value = to_cstring(value)?;
        // SAFETY: handle is valid and both strings are null-terminated
        let ret = unsafe {
            iio_sys::iio_channel_attr_write(self.as_ptr(), c_attr.as_ptr(), c_value.as_ptr())
        } as isize;

        if ret < 0 {
            let errno = i32::try_from(-ret).unwrap_or(i32::MAX);
            return Err(IioError::AttributeWrite {
                channel: self.id(),
                attr: attr.to_string(),
                errno,
                message: IioError::describe_errno(errno),
            });
        }

        debug!(channel = %self.id(), attr = %attr, value = %value, "Wrote IIO attribute");
        Ok(())
    }

    /// Read an integer attribute.
    pub fn attr_read_i64(&self, attr: &str) -> Result<i64> {
        let c_attr = to_cstring(attr)?;
        let mut value: c_longlong = 0;
        // SAFETY: handle is valid, c_attr is null-terminated, value is writable
        let ret = unsafe {
            iio_sys::iio_channel_attr_read_longlong(self.as_ptr(), c_attr.as_ptr(), &mut value)
        };

        if ret < 0 {
            let errno = -ret;
            return Err(IioError::AttributeRead {
                channel: self.id(),
                attr: attr.to_string(),
                errno,
                message: IioError::describe_errno(errno),
            });
        }

        Ok(value as i64)
    }

    /// Sample storage format of this channel.
    pub fn data_format(&self) -> Result<DataFormat> {
        // SAFETY: handle is valid; the returned struct is owned by the channel
        let raw = unsafe { iio_sys::iio_channel_get_data_format(self.as_ptr()) };
        // SAFETY: non-null pointers from libiio point to a live iio_data_format
        unsafe { raw.as_ref() }
            .map(DataFormat::from_raw)
            .ok_or_else(|| IioError::NullPointer {
                function: "iio_channel_get_data_format".to_string(),
            })
    }

    /// Require 16-bit storage, failing with [`IioError::UnsupportedFormat`].
    pub fn require_16_bit(&self) -> Result<DataFormat> {
        let format = self.data_format()?;
        if !format.is_16_bit() {
            return Err(IioError::UnsupportedFormat {
                channel: self.id(),
                bits: format.length,
            });
        }
        Ok(format)
    }

    /// Layout of this channel inside a buffer with the given first-slot
    /// offset and step.
    pub(crate) fn layout(&self, offset: usize, step: usize) -> Result<SampleLayout> {
        let format = self.require_16_bit()?;
        Ok(SampleLayout {
            offset,
            step,
            width: format.width_bytes(),
            big_endian: format.is_big_endian,
        })
    }
}

impl std::fmt::Debug for IioChannel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IioChannel").field("id", &self.id()).finish()
    }
}
