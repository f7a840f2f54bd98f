//! CLI entry point for the IIO sampling diagnostic.
//!
//! ```bash
//! iio-sampling-test ip:192.168.2.1 5 2.0
//! ```
//!
//! Exit code 0 when both validation checks pass, 1 otherwise. Ctrl+C stops
//! the capture at the next refill boundary; a second Ctrl+C exits at once.

// Global allocator (Microsoft Rust Guidelines: M-MIMALLOC-APPS)
#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{debug, warn};

use iio_sampling::cli::{self, Cli};
use iio_sampling::hardware::{IioBackend, MockBackend};
use iio_sampling::session::{failure_message, troubleshooting_tips, CaptureProgress};
use iio_sampling::{
    logging, run_session, AcqResult, CancellationToken, CaptureConfig, CaptureReport,
    SessionObserver,
};

const RULE_WIDTH: usize = 60;

/// Prints setup status and an in-place progress line to stdout.
struct Console;

impl SessionObserver for Console {
    fn status(&mut self, line: &str) {
        println!("{}", line);
    }

    fn progress(&mut self, progress: &CaptureProgress) {
        print!("{}        \r", progress);
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(ExitCode::from(cli::usage_exit_code(&e)));
        }
    };
    logging::init(cli.logging_config()).map_err(anyhow::Error::msg)?;

    let config = match cli.capture_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    print_header(&config);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let locator = config.locator.clone();
    let outcome = tokio::task::spawn_blocking(move || run(&config, &cancel)).await?;

    // Terminate the progress line
    println!();

    let passed = match outcome {
        Ok(report) => {
            println!("{}", report);
            report.passed()
        }
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            debug!(fatal = e.is_fatal(), "Session aborted");
            false
        }
    };

    if passed {
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}", troubleshooting_tips(&locator));
        Ok(ExitCode::FAILURE)
    }
}

fn run(config: &CaptureConfig, cancel: &CancellationToken) -> AcqResult<CaptureReport> {
    if config.is_mock() {
        run_session(&MockBackend::new().paced(), config, cancel, &mut Console)
    } else {
        run_session(&IioBackend, config, cancel, &mut Console)
    }
}

fn print_header(config: &CaptureConfig) {
    println!("IIO Sampling Test");
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("URI: {}", config.locator);
    println!("Duration: {} seconds", config.duration_secs);
    println!("Sample rate: {} MSPS", config.sample_rate_msps());
    println!();
}

/// First Ctrl+C cancels the capture; the second one exits immediately.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
            return;
        }
        println!("\nInterrupted by user");
        cancel.cancel();

        if signal::ctrl_c().await.is_ok() {
            eprintln!("\nForced exit");
            std::process::exit(130);
        }
    });
}
