//! Error types for libiio operations.
//!
//! This module provides a comprehensive error type that covers the failure
//! modes of contexts, devices, channels and buffers.

use thiserror::Error;

/// Result type alias for libiio operations.
pub type Result<T> = std::result::Result<T, IioError>;

/// Errors that can occur when working with IIO devices.
#[derive(Error, Debug)]
pub enum IioError {
    /// Context could not be created (bad URI, host unreachable, no USB device)
    #[error("Failed to create IIO context for '{uri}': {message}")]
    ContextCreation {
        uri: String,
        errno: i32,
        message: String,
    },

    /// Driver was built without the `hardware` feature
    #[error("libiio support is not compiled in; rebuild with the `hardware` feature")]
    SdkUnavailable,

    /// Named device is not part of the context
    #[error("Device '{name}' not found in context")]
    DeviceNotFound { name: String },

    /// Named channel is not part of the device
    #[error("Channel '{channel}' not found on device '{device}'")]
    ChannelNotFound { device: String, channel: String },

    /// Channel does not expose the requested attribute
    #[error("Attribute '{attr}' not found on channel '{channel}'")]
    AttributeNotFound { channel: String, attr: String },

    /// Attribute write was rejected by the device
    #[error("Failed to write attribute '{attr}' on channel '{channel}': {message}")]
    AttributeWrite {
        channel: String,
        attr: String,
        errno: i32,
        message: String,
    },

    /// Attribute read failed or did not parse as an integer
    #[error("Failed to read attribute '{attr}' on channel '{channel}': {message}")]
    AttributeRead {
        channel: String,
        attr: String,
        errno: i32,
        message: String,
    },

    /// Buffer could not be allocated on the device
    #[error("Could not create buffer of {samples} samples on device '{device}': {message}")]
    BufferCreation {
        device: String,
        samples: usize,
        errno: i32,
        message: String,
    },

    /// Blocking refill returned a negative code
    #[error("Buffer refill failed (code {code}): {message}")]
    Refill { code: i64, message: String },

    /// Channel storage is not a 16-bit word
    #[error("Channel '{channel}' uses {bits}-bit storage; only 16-bit samples are supported")]
    UnsupportedFormat { channel: String, bits: u32 },

    /// Sample view parameters do not describe a valid layout
    #[error("Invalid sample layout: {message}")]
    InvalidLayout { message: String },

    /// Null pointer returned from FFI
    #[error("Null pointer returned from libiio function: {function}")]
    NullPointer { function: String },

    /// Invalid name or parameter passed by the caller
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl IioError {
    /// Build a human readable message for an errno value.
    pub(crate) fn describe_errno(errno: i32) -> String {
        #[cfg(feature = "hardware")]
        {
            let mut buf = [0 as std::os::raw::c_char; 256];
            // SAFETY: buf is writable for its full length and iio_strerror
            // always NUL-terminates within `len`.
            unsafe {
                iio_sys::iio_strerror(errno, buf.as_mut_ptr(), buf.len());
                std::ffi::CStr::from_ptr(buf.as_ptr())
                    .to_string_lossy()
                    .into_owned()
            }
        }

        #[cfg(not(feature = "hardware"))]
        {
            std::io::Error::from_raw_os_error(errno).to_string()
        }
    }

    /// Read errno left behind by a libiio call that returned NULL.
    pub(crate) fn last_errno() -> i32 {
        std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
    }

    /// The OS error number carried by this error, if any.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::ContextCreation { errno, .. }
            | Self::AttributeWrite { errno, .. }
            | Self::AttributeRead { errno, .. }
            | Self::BufferCreation { errno, .. } => Some(*errno),
            Self::Refill { code, .. } => i32::try_from(-*code).ok(),
            _ => None,
        }
    }

    /// Check if this is a "not found" type error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound { .. }
                | Self::ChannelNotFound { .. }
                | Self::AttributeNotFound { .. }
        )
    }
}
