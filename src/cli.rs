//! Command-line interface.
//!
//! ```bash
//! iio-sampling-test [URI] [DURATION_SECS] [SAMPLE_RATE_MSPS] [--log-level LEVEL]
//! iio-sampling-test ip:192.168.2.1 5 2.0
//! iio-sampling-test mock: 2 --log-level debug
//! ```

use std::io::IsTerminal;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::Level;

use crate::config::{
    CaptureConfig, DEFAULT_DURATION_SECS, DEFAULT_LOCATOR, DEFAULT_SAMPLE_RATE_MSPS,
};
use crate::error::AcqResult;
use crate::logging::{parse_log_level, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "iio-sampling-test")]
#[command(
    about = "Capture I/Q samples from an AD9361-based SDR over libiio and validate acquisition",
    long_about = None
)]
pub struct Cli {
    /// Context URI (ip:..., usb:..., local:, or mock: for a simulated device)
    #[arg(default_value = DEFAULT_LOCATOR)]
    pub uri: String,

    /// Capture duration in whole seconds
    #[arg(default_value_t = DEFAULT_DURATION_SECS, allow_negative_numbers = true)]
    pub duration: i64,

    /// Target sample rate in MSPS
    #[arg(default_value_t = DEFAULT_SAMPLE_RATE_MSPS, allow_negative_numbers = true)]
    pub sample_rate_msps: f64,

    /// Diagnostic log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", value_parser = parse_log_level)]
    pub log_level: Level,
}

impl Cli {
    /// Build and validate the capture configuration.
    pub fn capture_config(&self) -> AcqResult<CaptureConfig> {
        CaptureConfig::builder()
            .locator(self.uri.clone())
            .duration_secs(self.duration)
            .sample_rate_msps(self.sample_rate_msps)
            .build()
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::new(self.log_level).with_ansi(std::io::stderr().is_terminal())
    }
}

/// Exit status for a failed `Cli::try_parse`.
///
/// Help and version output succeed; every usage error exits 1 like any
/// other failed run.
pub fn usage_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}
