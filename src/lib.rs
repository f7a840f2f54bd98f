//! # IIO Sampling Diagnostic
//!
//! Connects to an AD9361-based software-defined radio (PlutoSDR, LibreSDR,
//! FMCOMMS) through libiio, sets its receive sample rate, captures I/Q
//! samples for a fixed wall-clock duration, and validates that acquisition
//! works: at least one sample arrived, and the signal is not stuck at one
//! value.
//!
//! ## Crate Structure
//!
//! - **`session`**: The acquisition session. Setup, the cancellable capture
//!   loop, and the report with its two pass/fail checks.
//! - **`hardware`**: Traits the session drives, with a libiio backend
//!   (`daq-driver-iio`) and a simulated one for tests and the `mock:` locator.
//! - **`config`**: `CaptureConfig` and the well-known AD9361 names and sizes.
//! - **`cancel`**: `CancellationToken`, shared between the interrupt handler
//!   and the capture loop.
//! - **`error`**: The `AcquisitionError` taxonomy.
//! - **`cli`** / **`logging`**: Command line and diagnostic log setup for the
//!   `iio-sampling-test` binary.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod session;

pub use cancel::CancellationToken;
pub use config::CaptureConfig;
pub use error::{AcqResult, AcquisitionError};
pub use session::{run_session, CaptureReport, SessionObserver};
