use core::fmt::{Debug, Display, Formatter};

use crate::config::DeviceVariant;
use crate::record::SensorType;
use crate::register_map::{AccelFullScale, GyroFullScale};

/// Register transaction failure. Aborts the cycle in progress.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Error on the underlying bus.
    Bus(E),
    /// Record read failed after `records_read` complete records.
    FifoRead { records_read: usize, error: E },
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::Bus(error)
    }
}

impl<E: Debug> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus error: {e:?}"),
            Self::FifoRead {
                records_read,
                error,
            } => write!(
                f,
                "FIFO read aborted after {records_read} records: {error:?}"
            ),
        }
    }
}

impl<E: Debug> core::error::Error for Error<E> {}

/// A single record that could not be decoded. The cycle carries on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Sensor tag bits outside the known tag set.
    UnknownTag(u8),
    /// Compressed or time-shifted record for a sensor with no batch rate.
    SensorNotBatched(SensorType),
    /// Compressed record after lost records, before a full sample of the
    /// same sensor.
    MissingReference(SensorType),
    /// Decoded sample buffer has no room left.
    OutputFull,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownTag(tag) => write!(f, "unknown FIFO tag {tag:#04x}"),
            Self::SensorNotBatched(sensor) => {
                write!(f, "{sensor:?} record without a batch data rate")
            }
            Self::MissingReference(sensor) => {
                write!(f, "compressed {sensor:?} record without a reference sample")
            }
            Self::OutputFull => f.write_str("decoded sample buffer full"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Decode failure tied to the record position within the cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecordError {
    pub index: usize,
    pub error: DecodeError,
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "record {}: {}", self.index, self.error)
    }
}

/// Rejected configuration, reported before any cycle runs.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    InvalidBatchRate(SensorType),
    UnsupportedAccelScale(DeviceVariant, AccelFullScale),
    UnsupportedGyroScale(DeviceVariant, GyroFullScale),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidBatchRate(sensor) => write!(f, "invalid {sensor:?} batch data rate"),
            Self::UnsupportedAccelScale(variant, scale) => {
                write!(f, "{variant:?} does not support accelerometer scale {scale:?}")
            }
            Self::UnsupportedGyroScale(variant, scale) => {
                write!(f, "{variant:?} does not support gyroscope scale {scale:?}")
            }
        }
    }
}

impl core::error::Error for ConfigError {}
