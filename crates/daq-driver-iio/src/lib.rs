//! Safe Rust driver for Linux Industrial I/O (IIO) devices.
//!
//! This crate provides a safe interface to libiio, the user-space library
//! behind AD9361-based SDRs (PlutoSDR, LibreSDR, FMCOMMS boards) and many
//! other ADC/DAC devices. It wraps the low-level FFI bindings from `iio-sys`
//! with proper error handling and RAII resource management.
//!
//! # Architecture
//!
//! - [`IioContext`] - Owned connection to a device tree, destroyed on drop
//! - [`IioDevice`] - Borrowed device reference (lookup by name or index)
//! - [`IioChannel`] - Borrowed channel reference with attribute I/O
//! - [`IioBuffer`] - Owned capture buffer, destroyed on drop
//! - [`ChannelSamples`] - Bounds-checked iterator over one channel's samples
//!
//! Devices, channels and buffers carry the context's lifetime, so a buffer
//! can never outlive the context it was created from and is always released
//! first.
//!
//! # Features
//!
//! - `hardware`: link against the real libiio. Without it every attempt to
//!   open a context fails with [`IioError::SdkUnavailable`].
//!
//! # Example
//!
//! ```no_run
//! use daq_driver_iio::IioContext;
//!
//! # fn example() -> anyhow::Result<()> {
//! let ctx = IioContext::from_uri("ip:192.168.2.1")?;
//! println!("Connected: {}", ctx.description());
//!
//! for dev in ctx.devices() {
//!     println!("  - {}: {} channels", dev.label(), dev.channels_count());
//! }
//! # Ok(())
//! # }
//! ```

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

pub mod buffer;
pub mod channel;
pub mod context;
pub mod device;
pub mod error;
pub mod samples;

pub use buffer::IioBuffer;
pub use channel::{DataFormat, IioChannel};
pub use context::{ContextInfo, DeviceSummary, IioContext};
pub use device::IioDevice;
pub use error::{IioError, Result};
pub use samples::{ChannelSamples, SampleLayout, SAMPLE_WIDTH};

/// Copy a C string owned by libiio into a `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a valid null-terminated string.
pub(crate) unsafe fn c_string_lossy(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

pub(crate) fn to_cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| IioError::InvalidArgument {
        message: format!("name contains an interior NUL byte: {:?}", s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_string_lossy_null() {
        assert_eq!(unsafe { c_string_lossy(std::ptr::null()) }, None);
    }

    #[test]
    fn test_c_string_lossy_roundtrip() {
        let owned = CString::new("cf-ad9361-lpc").unwrap();
        let copied = unsafe { c_string_lossy(owned.as_ptr()) };
        assert_eq!(copied.as_deref(), Some("cf-ad9361-lpc"));
    }

    #[test]
    fn test_to_cstring_rejects_nul() {
        assert!(to_cstring("voltage0").is_ok());
        assert!(matches!(
            to_cstring("volt\0age0"),
            Err(IioError::InvalidArgument { .. })
        ));
    }
}
