//! The bounded, cancellable capture loop.
//!
//! Each iteration performs one blocking refill, folds every enabled
//! channel's samples into [`RunningAggregates`], and emits a
//! [`CaptureProgress`] line. The loop stops when the wall-clock duration has
//! elapsed, when cancellation is observed at an iteration boundary, or when
//! a refill fails. A failed refill ends the loop but is not fatal: the
//! aggregates gathered so far still go to the report.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, trace, warn};

use super::SessionObserver;
use crate::cancel::CancellationToken;
use crate::error::AcquisitionError;
use crate::hardware::CaptureBuffer;

/// Totals and extremes over every sample read so far.
///
/// `min` starts at `i16::MAX` and `max` at `i16::MIN`; both stay at those
/// sentinels until the first sample is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningAggregates {
    pub total_samples: u64,
    pub refills: u64,
    pub min: i16,
    pub max: i16,
}

impl Default for RunningAggregates {
    fn default() -> Self {
        Self {
            total_samples: 0,
            refills: 0,
            min: i16::MAX,
            max: i16::MIN,
        }
    }
}

impl RunningAggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one channel's samples in; returns how many were read.
    pub fn absorb<I>(&mut self, samples: I) -> u64
    where
        I: IntoIterator<Item = i16>,
    {
        let mut count = 0u64;
        for value in samples {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
            count += 1;
        }
        self.total_samples += count;
        count
    }

    /// Observed `(min, max)`, or `None` before the first sample.
    pub fn range(&self) -> Option<(i16, i16)> {
        (self.total_samples > 0).then_some((self.min, self.max))
    }
}

/// Throughput in MSPS; 0 when no time has elapsed.
pub fn throughput_msps(total_samples: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        total_samples as f64 / secs / 1e6
    } else {
        0.0
    }
}

/// Why the capture loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    DurationElapsed,
    Cancelled,
    RefillFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DurationElapsed => write!(f, "duration elapsed"),
            Self::Cancelled => write!(f, "interrupted by user"),
            Self::RefillFailed => write!(f, "buffer refill failed"),
        }
    }
}

/// Final state of a capture loop.
#[derive(Debug)]
pub struct CaptureStats {
    pub aggregates: RunningAggregates,
    /// Wall-clock time from loop start to loop exit
    pub elapsed: Duration,
    pub stop: StopReason,
    /// The refill failure that ended the loop, if any
    pub refill_error: Option<AcquisitionError>,
}

/// Snapshot emitted after every successful iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureProgress {
    pub elapsed: Duration,
    pub total_samples: u64,
    pub rate_msps: f64,
    pub refills: u64,
    pub min: i16,
    pub max: i16,
}

impl CaptureProgress {
    pub fn new(aggregates: &RunningAggregates, elapsed: Duration) -> Self {
        Self {
            elapsed,
            total_samples: aggregates.total_samples,
            rate_msps: throughput_msps(aggregates.total_samples, elapsed),
            refills: aggregates.refills,
            min: aggregates.min,
            max: aggregates.max,
        }
    }
}

impl fmt::Display for CaptureProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  Elapsed: {:.1}s | Samples: {} | Rate: {:.2} MSPS | Refills: {} | Range: [{}, {}]",
            self.elapsed.as_secs_f64(),
            self.total_samples,
            self.rate_msps,
            self.refills,
            self.min,
            self.max
        )
    }
}

/// Refill `buffer` until `duration` has elapsed, `cancel` is set, or a
/// refill fails.
///
/// Cancellation is only checked between iterations; a refill in flight is
/// always completed and counted.
pub fn capture<B, O>(
    buffer: &mut B,
    duration: Duration,
    cancel: &CancellationToken,
    observer: &mut O,
) -> CaptureStats
where
    B: CaptureBuffer + ?Sized,
    O: SessionObserver + ?Sized,
{
    let start = Instant::now();
    let mut aggregates = RunningAggregates::new();
    let mut refill_error = None;

    let stop = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }
        if start.elapsed() >= duration {
            break StopReason::DurationElapsed;
        }

        let bytes = match buffer.refill() {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = AcquisitionError::Refill {
                    refill: aggregates.refills + 1,
                    source,
                };
                error!(error = %err, cause = %err.cause(), "Capture stopped");
                refill_error = Some(err);
                break StopReason::RefillFailed;
            }
        };

        let mut refill_samples = 0u64;
        for index in 0..buffer.channel_count() {
            match buffer.channel_samples(index) {
                Ok(samples) => refill_samples += aggregates.absorb(samples),
                Err(e) => warn!(channel = index, error = %e, "Skipping channel in refill"),
            }
        }
        aggregates.refills += 1;
        trace!(refill = aggregates.refills, bytes, samples = refill_samples, "Refill processed");

        observer.progress(&CaptureProgress::new(&aggregates, start.elapsed()));
    };

    CaptureStats {
        aggregates,
        elapsed: start.elapsed(),
        stop,
        refill_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_driver_iio::{ChannelSamples, IioError, SampleLayout};

    /// Buffer replaying fixed refills, then failing.
    struct Scripted {
        refills: Vec<Vec<u8>>,
        current: Vec<u8>,
        channels: usize,
    }

    impl Scripted {
        fn new(channels: usize, refills: Vec<Vec<i16>>) -> Self {
            Self {
                refills: refills
                    .into_iter()
                    .rev()
                    .map(|r| r.iter().flat_map(|v| v.to_le_bytes()).collect())
                    .collect(),
                current: Vec::new(),
                channels,
            }
        }
    }

    impl CaptureBuffer for Scripted {
        fn refill(&mut self) -> daq_driver_iio::Result<usize> {
            match self.refills.pop() {
                Some(bytes) => {
                    self.current = bytes;
                    Ok(self.current.len())
                }
                None => Err(IioError::Refill {
                    code: -32,
                    message: "Broken pipe".to_string(),
                }),
            }
        }

        fn channel_count(&self) -> usize {
            self.channels
        }

        fn channel_samples(&self, index: usize) -> daq_driver_iio::Result<ChannelSamples<'_>> {
            ChannelSamples::new(&self.current, SampleLayout::new(index * 2, self.channels * 2))
        }
    }

    const LONG: Duration = Duration::from_secs(3600);

    #[test]
    fn test_sentinels_until_first_sample() {
        let agg = RunningAggregates::new();
        assert_eq!((agg.min, agg.max), (i16::MAX, i16::MIN));
        assert_eq!(agg.range(), None);
    }

    #[test]
    fn test_absorb_tracks_extremes() {
        let mut agg = RunningAggregates::new();
        assert_eq!(agg.absorb([3, -7, 12, 0]), 4);
        assert_eq!(agg.absorb([i16::MIN]), 1);
        assert_eq!(agg.total_samples, 5);
        assert_eq!(agg.range(), Some((i16::MIN, 12)));
    }

    #[test]
    fn test_single_value_collapses_range() {
        let mut agg = RunningAggregates::new();
        agg.absorb([42, 42, 42]);
        assert_eq!(agg.range(), Some((42, 42)));
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        assert_eq!(throughput_msps(1_000_000, Duration::ZERO), 0.0);
        assert_eq!(throughput_msps(2_000_000, Duration::from_secs(1)), 2.0);
    }

    #[test]
    fn test_zero_duration_runs_no_iterations() {
        let mut buffer = Scripted::new(2, vec![vec![1, 2, 3, 4]]);
        let stats = capture(&mut buffer, Duration::ZERO, &CancellationToken::new(), &mut ());

        assert_eq!(stats.aggregates, RunningAggregates::new());
        assert_eq!(stats.stop, StopReason::DurationElapsed);
        assert!(stats.refill_error.is_none());
    }

    #[test]
    fn test_refill_failure_keeps_partial_totals() {
        // I/Q interleaved: I = [1, 3], Q = [-2, -4]
        let mut buffer = Scripted::new(2, vec![vec![1, -2, 3, -4], vec![5, -6]]);
        let stats = capture(&mut buffer, LONG, &CancellationToken::new(), &mut ());

        assert_eq!(stats.stop, StopReason::RefillFailed);
        assert_eq!(stats.aggregates.refills, 2);
        assert_eq!(stats.aggregates.total_samples, 6);
        assert_eq!(stats.aggregates.range(), Some((-6, 5)));
        assert!(matches!(
            stats.refill_error,
            Some(AcquisitionError::Refill { refill: 3, .. })
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut buffer = Scripted::new(1, vec![vec![1]]);
        let stats = capture(&mut buffer, LONG, &cancel, &mut ());

        assert_eq!(stats.stop, StopReason::Cancelled);
        assert_eq!(stats.aggregates.refills, 0);
    }

    #[test]
    fn test_progress_line_format() {
        let progress = CaptureProgress {
            elapsed: Duration::from_millis(2500),
            total_samples: 5_000_000,
            rate_msps: 2.0,
            refills: 153,
            min: -2048,
            max: 2047,
        };
        assert_eq!(
            progress.to_string(),
            "  Elapsed: 2.5s | Samples: 5000000 | Rate: 2.00 MSPS | Refills: 153 | Range: [-2048, 2047]"
        );
    }
}
