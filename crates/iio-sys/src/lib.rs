//! Low-level FFI bindings for the Linux Industrial I/O library (libiio).
//!
//! libiio is the user-space interface to IIO devices: ADCs, DACs and RF
//! transceivers such as the AD9361 found in PlutoSDR-class radios. Devices
//! are reached locally or over the network through a *context*, identified
//! by a URI (`ip:192.168.2.1`, `usb:1.2.5`, `local:`).
//!
//! # Safety
//!
//! All functions in this crate are `unsafe` as they are direct FFI bindings.
//! For a safe wrapper, use the `daq-driver-iio` crate instead.
//!
//! # Features
//!
//! - `iio-sdk`: Generate bindings from system libiio headers and link
//!   against `libiio`. Without this feature, placeholder bindings are used
//!   and every function panics when called.
//!
//! # Example (unsafe)
//!
//! ```no_run
//! use iio_sys::*;
//! use std::ffi::{CStr, CString};
//!
//! unsafe {
//!     let uri = CString::new("ip:192.168.2.1").unwrap();
//!     let ctx = iio_create_context_from_uri(uri.as_ptr());
//!     if !ctx.is_null() {
//!         let n_devices = iio_context_get_devices_count(ctx);
//!         println!("Context has {} devices", n_devices);
//!         iio_context_destroy(ctx);
//!     }
//! }
//! ```

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
