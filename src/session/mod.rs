//! The acquisition session: setup, capture loop, report.
//!
//! [`run_session`] is strictly sequential and blocking. Run it on a thread
//! that may block (the binary uses `tokio::task::spawn_blocking`).
//!
//! Resource lifecycle: the buffer borrows the context, so it is released
//! first on every path, including early setup failures.

pub mod capture;
pub mod report;
pub mod setup;

use tracing::info;

use crate::cancel::CancellationToken;
use crate::config::CaptureConfig;
use crate::error::AcqResult;
use crate::hardware::HardwareBackend;

pub use capture::{CaptureProgress, CaptureStats, RunningAggregates, StopReason};
pub use report::{failure_message, troubleshooting_tips, Advisory, CaptureReport};

/// Receives human-readable status while a session runs.
///
/// Both methods default to doing nothing; `()` is the silent observer.
pub trait SessionObserver {
    /// One line of setup status.
    fn status(&mut self, _line: &str) {}

    /// Progress after each successful refill.
    fn progress(&mut self, _progress: &CaptureProgress) {}
}

impl SessionObserver for () {}

/// Run one acquisition session against `backend`.
///
/// Returns a report whenever setup succeeded, whether or not validation
/// passes; setup failures are returned as errors.
pub fn run_session<B, O>(
    backend: &B,
    config: &CaptureConfig,
    cancel: &CancellationToken,
    observer: &mut O,
) -> AcqResult<CaptureReport>
where
    B: HardwareBackend,
    O: SessionObserver + ?Sized,
{
    config.validate()?;

    let ctx = setup::connect(backend, config, observer)?;
    setup::locate_capture_device(&ctx, config, observer)?;
    let applied_rate_hz = setup::configure_sample_rate(&ctx, config, observer);
    let channels = setup::enable_channels(&ctx, config, observer)?;
    let mut buffer = setup::allocate_buffer(&ctx, config, &channels, observer)?;

    observer.status(&format!("Capturing for {} seconds...", config.duration_secs));
    observer.status(&"-".repeat(60));

    let stats = capture::capture(&mut buffer, config.duration(), cancel, observer);
    info!(
        samples = stats.aggregates.total_samples,
        refills = stats.aggregates.refills,
        stop = %stats.stop,
        "Capture finished"
    );

    drop(buffer);
    drop(ctx);

    Ok(CaptureReport {
        locator: config.locator.clone(),
        requested_rate_hz: config.sample_rate_hz,
        applied_rate_hz,
        channels,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockBackend;
    use tracing_test::traced_test;

    fn config(duration_secs: i64) -> CaptureConfig {
        CaptureConfig::builder()
            .locator("mock:")
            .duration_secs(duration_secs)
            .build()
            .unwrap()
    }

    #[traced_test]
    #[test]
    fn test_rate_write_failure_is_logged_not_fatal() {
        let backend = MockBackend::new().failing_rate_write();
        let report = run_session(&backend, &config(0), &CancellationToken::new(), &mut ()).unwrap();

        assert_eq!(report.applied_rate_hz, None);
        assert!(logs_contain("Continuing with the device's current sample rate"));
        assert!(logs_contain("Invalid argument"));
    }

    #[traced_test]
    #[test]
    fn test_non_16_bit_channel_is_skipped() {
        let backend = MockBackend::new().with_channels(&[("voltage0", 16), ("voltage1", 24)]);
        let report = run_session(&backend, &config(0), &CancellationToken::new(), &mut ()).unwrap();

        assert_eq!(report.channels, vec!["voltage0".to_string()]);
        assert!(logs_contain("only 16-bit samples are decoded"));
    }

    #[traced_test]
    #[test]
    fn test_refill_failure_is_logged() {
        let backend = MockBackend::new().scans_per_refill(64).fail_on_refill(2);
        let report =
            run_session(&backend, &config(3600), &CancellationToken::new(), &mut ()).unwrap();

        assert_eq!(report.stats.stop, StopReason::RefillFailed);
        assert!(logs_contain("Capture stopped"));
        assert!(logs_contain("Buffer refill 2 failed"));
    }
}
