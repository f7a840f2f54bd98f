//! IIO context: the owned connection to a device tree.
//!
//! This module provides [`IioContext`], which wraps a libiio context handle
//! with RAII semantics. Devices, channels and buffers obtained from it borrow
//! the context, so the compiler guarantees they are gone before it is
//! destroyed.

use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr::{self, NonNull};

use parking_lot::RwLock;
use tracing::{debug, info};

use iio_sys::iio_context;

use crate::device::IioDevice;
use crate::error::{IioError, Result};
use crate::{c_string_lossy, to_cstring};

/// Summary of one device in a context, for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    /// Kernel id (e.g., "iio:device3")
    pub id: String,
    /// Driver name (e.g., "cf-ad9361-lpc"), if the device has one
    pub name: Option<String>,
    /// Number of channels
    pub n_channels: u32,
}

impl DeviceSummary {
    /// Name if present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Information about an open context.
#[derive(Debug, Clone)]
pub struct ContextInfo {
    /// URI used to create the context
    pub uri: String,
    /// Backend description string
    pub description: String,
    /// Context attributes (hw_model, fw_version, ...)
    pub attributes: Vec<(String, String)>,
    /// Every device in the context
    pub devices: Vec<DeviceSummary>,
}

impl ContextInfo {
    /// Look up a context attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Find a device by id or name, the way libiio resolves device lookups.
    pub fn device(&self, name_or_id: &str) -> Option<&DeviceSummary> {
        self.devices
            .iter()
            .find(|dev| dev.id == name_or_id || dev.name.as_deref() == Some(name_or_id))
    }
}

/// A safe wrapper around a libiio context handle.
///
/// The context is destroyed when the `IioContext` is dropped. libiio
/// contexts are not thread-safe, so this type is neither `Send` nor `Sync`.
pub struct IioContext {
    handle: NonNull<iio_context>,
    uri: String,
    info: RwLock<Option<ContextInfo>>,
}

impl IioContext {
    /// Create a context from a URI such as `ip:192.168.2.1` or `usb:1.2.5`.
    ///
    /// # Errors
    ///
    /// Returns [`IioError::ContextCreation`] if the URI cannot be resolved or
    /// the transport cannot be established, and [`IioError::SdkUnavailable`]
    /// when built without the `hardware` feature.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let c_uri = to_cstring(uri)?;

        if !cfg!(feature = "hardware") {
            return Err(IioError::SdkUnavailable);
        }

        // SAFETY: c_uri is a valid null-terminated string
        let handle = unsafe { iio_sys::iio_create_context_from_uri(c_uri.as_ptr()) };

        let Some(handle) = NonNull::new(handle) else {
            let errno = IioError::last_errno();
            return Err(IioError::ContextCreation {
                uri: uri.to_string(),
                errno,
                message: IioError::describe_errno(errno),
            });
        };

        info!(uri = %uri, "Opened IIO context");

        Ok(Self {
            handle,
            uri: uri.to_string(),
            info: RwLock::new(None),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const iio_context {
        self.handle.as_ptr()
    }

    /// Backend description (kernel, firmware, transport).
    pub fn description(&self) -> String {
        // SAFETY: handle is valid for the lifetime of self
        unsafe { c_string_lossy(iio_sys::iio_context_get_description(self.as_ptr())) }
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// All context attributes as name/value pairs.
    pub fn attributes(&self) -> Vec<(String, String)> {
        // SAFETY: handle is valid
        let count = unsafe { iio_sys::iio_context_get_attrs_count(self.as_ptr()) };
        let mut attrs = Vec::with_capacity(count as usize);

        for index in 0..count {
            let mut name: *const c_char = ptr::null();
            let mut value: *const c_char = ptr::null();
            // SAFETY: handle is valid, index < count, out-pointers are writable
            let ret = unsafe {
                iio_sys::iio_context_get_attr(self.as_ptr(), index, &mut name, &mut value)
            };
            if ret != 0 {
                continue;
            }
            // SAFETY: on success both strings are owned by the context
            let pair = unsafe { (c_string_lossy(name), c_string_lossy(value)) };
            if let (Some(name), Some(value)) = pair {
                attrs.push((name, value));
            }
        }

        attrs
    }

    /// Number of devices in the context.
    pub fn devices_count(&self) -> u32 {
        // SAFETY: handle is valid
        unsafe { iio_sys::iio_context_get_devices_count(self.as_ptr()) }
    }

    /// All devices in the context.
    pub fn devices(&self) -> Vec<IioDevice<'_>> {
        (0..self.devices_count())
            .filter_map(|index| {
                // SAFETY: handle is valid and index is in range
                let dev = unsafe { iio_sys::iio_context_get_device(self.as_ptr(), index) };
                NonNull::new(dev).map(|dev| IioDevice::from_raw(self, dev))
            })
            .collect()
    }

    /// Find a device by name or id.
    pub fn find_device(&self, name: &str) -> Option<IioDevice<'_>> {
        let c_name = CString::new(name).ok()?;
        // SAFETY: handle is valid and c_name is null-terminated
        let dev = unsafe { iio_sys::iio_context_find_device(self.as_ptr(), c_name.as_ptr()) };
        NonNull::new(dev).map(|dev| IioDevice::from_raw(self, dev))
    }

    /// Find a device by name, failing with [`IioError::DeviceNotFound`].
    pub fn require_device(&self, name: &str) -> Result<IioDevice<'_>> {
        self.find_device(name)
            .ok_or_else(|| IioError::DeviceNotFound {
                name: name.to_string(),
            })
    }

    /// Get context information (cached after first call).
    pub fn info(&self) -> ContextInfo {
        if let Some(info) = self.info.read().as_ref() {
            return info.clone();
        }

        let devices = self
            .devices()
            .iter()
            .map(|dev| DeviceSummary {
                id: dev.id(),
                name: dev.name(),
                n_channels: dev.channels_count(),
            })
            .collect();

        let info = ContextInfo {
            uri: self.uri.clone(),
            description: self.description(),
            attributes: self.attributes(),
            devices,
        };

        *self.info.write() = Some(info.clone());
        info
    }
}

impl Drop for IioContext {
    fn drop(&mut self) {
        debug!(uri = %self.uri, "Destroying IIO context");
        // SAFETY: handle is valid, we own it, and every borrower is gone
        unsafe { iio_sys::iio_context_destroy(self.handle.as_ptr()) };
    }
}

impl std::fmt::Debug for IioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IioContext")
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_summary_label() {
        let named = DeviceSummary {
            id: "iio:device3".to_string(),
            name: Some("cf-ad9361-lpc".to_string()),
            n_channels: 4,
        };
        assert_eq!(named.label(), "cf-ad9361-lpc");

        let anonymous = DeviceSummary {
            name: None,
            ..named
        };
        assert_eq!(anonymous.label(), "iio:device3");
    }

    #[test]
    fn test_context_info_device_lookup() {
        let info = ContextInfo {
            uri: "ip:192.168.2.1".to_string(),
            description: "test".to_string(),
            attributes: Vec::new(),
            devices: vec![DeviceSummary {
                id: "iio:device3".to_string(),
                name: Some("cf-ad9361-lpc".to_string()),
                n_channels: 4,
            }],
        };
        assert_eq!(info.device("iio:device3").map(DeviceSummary::label), Some("cf-ad9361-lpc"));
        assert_eq!(info.device("cf-ad9361-lpc").map(|d| d.id.as_str()), Some("iio:device3"));
        assert!(info.device("ad9361-phy").is_none());
    }

    #[test]
    fn test_context_info_attribute() {
        let info = ContextInfo {
            uri: "ip:192.168.2.1".to_string(),
            description: "test".to_string(),
            attributes: vec![
                ("hw_model".to_string(), "LibreSDR".to_string()),
                ("fw_version".to_string(), "v0.38".to_string()),
            ],
            devices: Vec::new(),
        };
        assert_eq!(info.attribute("fw_version"), Some("v0.38"));
        assert_eq!(info.attribute("serial"), None);
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn test_open_without_sdk() {
        let err = IioContext::from_uri("ip:192.168.2.1").unwrap_err();
        assert!(matches!(err, IioError::SdkUnavailable));
    }

    #[test]
    fn test_open_rejects_interior_nul() {
        let err = IioContext::from_uri("ip:\0bad").unwrap_err();
        assert!(matches!(err, IioError::InvalidArgument { .. }));
    }
}
