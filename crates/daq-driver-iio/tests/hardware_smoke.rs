//! libiio Hardware Smoke Test
//!
//! Quick sanity check against a real AD9361-based radio.
//!
//! # Environment Variables
//!
//! Required:
//! - `IIO_SMOKE_TEST=1` - Enable the test suite
//!
//! Optional:
//! - `IIO_URI` - Context URI (default: "ip:192.168.2.1")
//!
//! # Running
//!
//! ```bash
//! export IIO_SMOKE_TEST=1
//! cargo test --features hardware -p daq-driver-iio --test hardware_smoke
//! ```

#![cfg(feature = "hardware")]

use daq_driver_iio::{IioContext, IioError};
use std::env;

fn smoke_test_enabled() -> bool {
    env::var("IIO_SMOKE_TEST")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

fn uri() -> String {
    env::var("IIO_URI").unwrap_or_else(|_| "ip:192.168.2.1".to_string())
}

macro_rules! skip_if_disabled {
    () => {
        if !smoke_test_enabled() {
            println!("IIO smoke test skipped (set IIO_SMOKE_TEST=1 to enable)");
            return;
        }
    };
}

#[test]
fn test_context_lists_devices() {
    skip_if_disabled!();

    let ctx = IioContext::from_uri(&uri()).expect("open context");
    let info = ctx.info();

    println!("Connected: {}", info.description);
    for dev in &info.devices {
        println!("  - {}: {} channels", dev.label(), dev.n_channels);
    }
    assert!(!info.devices.is_empty());
}

#[test]
fn test_unknown_device_is_not_found() {
    skip_if_disabled!();

    let ctx = IioContext::from_uri(&uri()).expect("open context");
    let err = ctx.require_device("no-such-device").unwrap_err();
    assert!(matches!(err, IioError::DeviceNotFound { .. }));
}

#[test]
fn test_unreachable_uri_fails() {
    skip_if_disabled!();

    // TEST-NET-1, never routed
    let err = IioContext::from_uri("ip:192.0.2.1").unwrap_err();
    assert!(matches!(err, IioError::ContextCreation { .. }));
}

#[test]
fn test_refill_delivers_iq() {
    skip_if_disabled!();

    let ctx = IioContext::from_uri(&uri()).expect("open context");
    let rx = ctx.require_device("cf-ad9361-lpc").expect("rx device");
    let i = rx.require_channel("voltage0", false).expect("I channel");
    let q = rx.require_channel("voltage1", false).expect("Q channel");
    i.enable();
    q.enable();

    let mut buffer = rx.create_buffer(4096, false).expect("create buffer");
    let bytes = buffer.refill().expect("refill");
    assert!(bytes > 0);

    let n_i = buffer.channel_samples(&i).expect("I view").count();
    let n_q = buffer.channel_samples(&q).expect("Q view").count();
    println!("Refill: {} bytes, {} I + {} Q samples", bytes, n_i, n_q);
    assert_eq!(n_i, 4096);
    assert_eq!(n_q, 4096);
}
