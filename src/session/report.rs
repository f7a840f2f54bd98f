//! Capture statistics and pass/fail validation.

use std::fmt;

use super::capture::{throughput_msps, CaptureStats, StopReason};
use crate::error::AcquisitionError;

const RULE_WIDTH: usize = 60;

/// Advisory notes that never change the pass/fail outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// Fewer than half of the expected samples arrived
    LowYield { expected: u64, actual: u64 },
    /// The signal varies, but only within +/-10 counts
    LowAmplitude { min: i16, max: i16 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowYield { expected, actual } => write!(
                f,
                "  ⚠ WARNING: Captured fewer samples than expected\n    Expected: ~{}\n    Actual: {}",
                expected, actual
            ),
            Self::LowAmplitude { min, max } => write!(
                f,
                "  ⚠ WARNING: Very low signal amplitude (range: {} to {})\n    Check antenna connection and RF gain settings",
                min, max
            ),
        }
    }
}

/// Everything the session learned, ready to print and judge.
#[derive(Debug)]
pub struct CaptureReport {
    pub locator: String,
    /// Rate asked for on the command line, samples per second
    pub requested_rate_hz: i64,
    /// Rate read back from the device, if it could be configured
    pub applied_rate_hz: Option<i64>,
    /// Channels that took part in the capture, in buffer order
    pub channels: Vec<String>,
    pub stats: CaptureStats,
}

impl CaptureReport {
    /// Average throughput over the whole capture in MSPS; 0 when no time
    /// elapsed.
    pub fn average_rate_msps(&self) -> f64 {
        throughput_msps(self.stats.aggregates.total_samples, self.stats.elapsed)
    }

    /// Mean samples per refill, rounded down; 0 when nothing was refilled.
    pub fn samples_per_refill(&self) -> u64 {
        let agg = &self.stats.aggregates;
        agg.total_samples.checked_div(agg.refills).unwrap_or(0)
    }

    /// At least one sample was captured.
    pub fn has_samples(&self) -> bool {
        self.stats.aggregates.total_samples > 0
    }

    /// Minimum and maximum differ.
    pub fn has_variation(&self) -> bool {
        self.stats.aggregates.min != self.stats.aggregates.max
    }

    /// Overall outcome: both checks pass.
    pub fn passed(&self) -> bool {
        self.has_samples() && self.has_variation()
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        let agg = &self.stats.aggregates;
        let mut notes = Vec::new();

        if self.has_samples() {
            let rate = self.applied_rate_hz.unwrap_or(self.requested_rate_hz).max(0) as f64;
            let expected =
                (rate * self.stats.elapsed.as_secs_f64() * self.channels.len() as f64) as u64;
            if agg.total_samples < expected / 2 {
                notes.push(Advisory::LowYield {
                    expected,
                    actual: agg.total_samples,
                });
            }

            if self.has_variation() && agg.min.unsigned_abs() < 10 && agg.max.unsigned_abs() < 10
            {
                notes.push(Advisory::LowAmplitude {
                    min: agg.min,
                    max: agg.max,
                });
            }
        }

        notes
    }
}

impl fmt::Display for CaptureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let agg = &self.stats.aggregates;

        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(f, "\n📊 Capture Statistics:")?;
        writeln!(f, "  Duration: {:.3} seconds", self.stats.elapsed.as_secs_f64())?;
        writeln!(f, "  Total samples: {}", agg.total_samples)?;
        writeln!(f, "  Average rate: {:.3} MSPS", self.average_rate_msps())?;
        writeln!(f, "  Buffer refills: {}", agg.refills)?;
        writeln!(f, "  Samples per refill: {}", self.samples_per_refill())?;
        writeln!(f, "  Sample range: [{}, {}]", agg.min, agg.max)?;
        if self.stats.stop != StopReason::DurationElapsed {
            writeln!(f, "  Stopped early: {}", self.stats.stop)?;
        }

        writeln!(f, "\n✅ Validation:")?;
        if self.has_samples() {
            writeln!(f, "  ✓ PASS: Sample capture working")?;
        } else {
            writeln!(f, "  ✗ FAIL: No samples captured!")?;
        }
        if self.has_variation() {
            writeln!(f, "  ✓ PASS: Signal shows variation")?;
        } else {
            writeln!(f, "  ✗ FAIL: All samples same value ({})", agg.min)?;
        }
        for note in self.advisories() {
            writeln!(f, "{}", note)?;
        }

        if self.passed() {
            writeln!(f, "\n{}", "=".repeat(RULE_WIDTH))?;
            writeln!(f, "✅ SUCCESS: Device is capturing samples correctly!")?;
            write!(f, "{}", "=".repeat(RULE_WIDTH))?;
        }

        Ok(())
    }
}

/// Error line for an aborted session, followed by the underlying cause.
pub fn failure_message(err: &AcquisitionError) -> String {
    let cause = err.cause();
    if cause.is_empty() {
        format!("✗ ERROR: {}", err)
    } else {
        format!("✗ ERROR: {}\n  Cause: {}", err, cause)
    }
}

/// Checklist printed when the session fails.
pub fn troubleshooting_tips(locator: &str) -> String {
    let host = locator.strip_prefix("ip:").unwrap_or("192.168.2.1");
    [
        "\n💡 Troubleshooting tips:".to_string(),
        format!("1. Check device connection: ping {}", host),
        format!("2. Verify IIO device: iio_info -u {}", locator),
        "3. Increase buffer size on device: \
         echo 131072 > /sys/bus/iio/devices/iio:deviceN/buffer/length"
            .to_string(),
        "4. Check USB stability (disconnect/reconnect issues)".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::capture::RunningAggregates;
    use std::time::Duration;

    fn report(total: u64, refills: u64, min: i16, max: i16, elapsed: Duration) -> CaptureReport {
        CaptureReport {
            locator: "ip:192.168.2.1".to_string(),
            requested_rate_hz: 2_000_000,
            applied_rate_hz: Some(2_000_000),
            channels: vec!["voltage0".to_string(), "voltage1".to_string()],
            stats: CaptureStats {
                aggregates: RunningAggregates {
                    total_samples: total,
                    refills,
                    min,
                    max,
                },
                elapsed,
                stop: StopReason::DurationElapsed,
                refill_error: None,
            },
        }
    }

    #[test]
    fn test_healthy_capture_passes() {
        let r = report(20_000_000, 611, -2048, 2047, Duration::from_secs(5));
        assert!(r.passed());
        assert_eq!(r.average_rate_msps(), 4.0);
        assert_eq!(r.samples_per_refill(), 32733);
        assert!(r.advisories().is_empty());

        let text = r.to_string();
        assert!(text.contains("Total samples: 20000000"));
        assert!(text.contains("✓ PASS: Sample capture working"));
        assert!(text.contains("SUCCESS"));
    }

    #[test]
    fn test_zero_samples_fails() {
        let r = report(0, 0, i16::MAX, i16::MIN, Duration::ZERO);
        assert!(!r.has_samples());
        assert!(!r.passed());
        assert_eq!(r.average_rate_msps(), 0.0);
        assert_eq!(r.samples_per_refill(), 0);

        let text = r.to_string();
        assert!(text.contains("FAIL: No samples captured!"));
        assert!(!text.contains("SUCCESS"));
    }

    #[test]
    fn test_flat_signal_fails() {
        let r = report(32768, 1, 0, 0, Duration::from_millis(10));
        assert!(r.has_samples());
        assert!(!r.has_variation());
        assert!(!r.passed());
        assert!(r.to_string().contains("All samples same value (0)"));
    }

    #[test]
    fn test_low_yield_advisory() {
        let r = report(1_000_000, 30, -500, 500, Duration::from_secs(5));
        assert!(r.passed());
        assert_eq!(
            r.advisories(),
            vec![Advisory::LowYield {
                expected: 20_000_000,
                actual: 1_000_000
            }]
        );
    }

    #[test]
    fn test_low_amplitude_advisory() {
        let r = report(20_000_000, 611, -3, 4, Duration::from_secs(5));
        assert!(r.passed());
        assert_eq!(r.advisories(), vec![Advisory::LowAmplitude { min: -3, max: 4 }]);
    }

    #[test]
    fn test_failure_message_shows_cause() {
        let err = AcquisitionError::Connection {
            locator: "ip:127.0.0.1".to_string(),
            source: daq_driver_iio::IioError::SdkUnavailable,
        };
        let text = failure_message(&err);
        assert!(text.starts_with("✗ ERROR: "));
        assert!(text.contains("\n  Cause: libiio support is not compiled in"));

        let bare = failure_message(&AcquisitionError::InvalidConfig("empty".to_string()));
        assert!(!bare.contains("Cause"));
    }

    #[test]
    fn test_tips_use_locator_host() {
        let tips = troubleshooting_tips("ip:10.0.0.7");
        assert!(tips.contains("ping 10.0.0.7"));
        assert!(tips.contains("iio_info -u ip:10.0.0.7"));
        assert!(tips.contains("131072"));
    }
}
