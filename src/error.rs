//! Custom error types for the acquisition session.
//!
//! `AcquisitionError` covers every way a session can go wrong. Using the
//! `thiserror` crate, each variant carries the context the operator needs and
//! keeps the underlying [`IioError`] as its source.
//!
//! ## Error Hierarchy
//!
//! - **Fatal setup errors** abort the session before any capture:
//!   `Connection`, `DeviceNotFound`, `NoChannels`, `BufferAllocation` and
//!   `InvalidConfig`.
//! - **`Refill`** ends the capture loop early; the report still runs on
//!   whatever was accumulated.
//! - **`Configuration`** covers the best-effort sample-rate write and is only
//!   ever logged.

use daq_driver_iio::IioError;
use thiserror::Error;

/// Convenience alias for results using the session error type.
pub type AcqResult<T> = std::result::Result<T, AcquisitionError>;

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error(
        "Could not create IIO context for {locator}. \
         Check connection: ping the device and verify its USB or network link"
    )]
    Connection {
        locator: String,
        #[source]
        source: IioError,
    },

    #[error("{device} device not found!")]
    DeviceNotFound { device: String },

    #[error("No RX channels could be enabled on {device}!")]
    NoChannels { device: String },

    #[error(
        "Could not create buffer of {samples} samples on {device}. \
         Hint: the device-side buffer length is usually too small; raise it, e.g. \
         'echo 131072 > /sys/bus/iio/devices/iio:deviceN/buffer/length'"
    )]
    BufferAllocation {
        device: String,
        samples: usize,
        #[source]
        source: IioError,
    },

    #[error("Buffer refill {refill} failed")]
    Refill {
        refill: u64,
        #[source]
        source: IioError,
    },

    #[error("Could not configure {what}")]
    Configuration {
        what: String,
        #[source]
        source: IioError,
    },

    #[error("Invalid capture configuration: {0}")]
    InvalidConfig(String),
}

impl AcquisitionError {
    /// Whether this error aborts the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Refill { .. } | Self::Configuration { .. })
    }

    /// Message of the underlying driver error, or empty.
    pub fn cause(&self) -> String {
        std::error::Error::source(self)
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_connection_message_suggests_connectivity_check() {
        let err = AcquisitionError::Connection {
            locator: "ip:192.168.2.1".to_string(),
            source: IioError::SdkUnavailable,
        };
        let message = err.to_string();
        assert!(message.contains("ip:192.168.2.1"));
        assert!(message.contains("ping"));
        assert!(err.source().is_some());
        assert!(err.cause().contains("hardware"));
    }

    #[test]
    fn test_buffer_message_hints_at_buffer_length() {
        let err = AcquisitionError::BufferAllocation {
            device: "cf-ad9361-lpc".to_string(),
            samples: 16384,
            source: IioError::InvalidArgument {
                message: "test".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("16384"));
        assert!(message.contains("buffer/length"));
    }

    #[test]
    fn test_fatality() {
        assert!(AcquisitionError::DeviceNotFound {
            device: "cf-ad9361-lpc".to_string()
        }
        .is_fatal());
        assert!(AcquisitionError::NoChannels {
            device: "cf-ad9361-lpc".to_string()
        }
        .is_fatal());
        assert!(!AcquisitionError::Refill {
            refill: 5,
            source: IioError::Refill {
                code: -5,
                message: "I/O error".to_string(),
            },
        }
        .is_fatal());
        assert!(!AcquisitionError::Configuration {
            what: "sample rate".to_string(),
            source: IioError::SdkUnavailable,
        }
        .is_fatal());
    }
}
