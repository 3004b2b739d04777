use crate::error::ConfigError;
use crate::record::SensorType;
use crate::register_map::{AccelFullScale, GyroFullScale};

/// Parts sharing the tagged FIFO layout handled by this crate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceVariant {
    #[default]
    Asm330lhhx,
    Lsm6dso,
    Lsm6dso32,
    Lsm6dsr,
    Lsm6dsrx,
    Ism330dhcx,
}

impl DeviceVariant {
    /// Timestamp counter resolution in microseconds per tick.
    pub fn timestamp_resolution_us(self) -> f32 {
        25.0
    }

    pub fn supports_accel_scale(self, scale: AccelFullScale) -> bool {
        match self {
            Self::Lsm6dso32 => scale != AccelFullScale::G2,
            _ => scale != AccelFullScale::G32,
        }
    }

    pub fn supports_gyro_scale(self, scale: GyroFullScale) -> bool {
        match self {
            Self::Lsm6dso | Self::Lsm6dso32 => scale != GyroFullScale::Dps4000,
            _ => true,
        }
    }
}

/// Highest batch data rate of the family, in Hz.
pub const MAX_BATCH_RATE: f32 = 6667.0;

/// Decoder and unit conversion settings. Must mirror what the application
/// programmed into the device.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoConfig {
    pub variant: DeviceVariant,
    /// Accelerometer batch data rate in Hz, 0 when not batched.
    pub accel_batch_rate: f32,
    /// Gyroscope batch data rate in Hz, 0 when not batched.
    pub gyro_batch_rate: f32,
    pub accel_scale: AccelFullScale,
    pub gyro_scale: GyroFullScale,
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self {
            variant: DeviceVariant::Asm330lhhx,
            accel_batch_rate: 12.5,
            gyro_batch_rate: 12.5,
            accel_scale: AccelFullScale::G2,
            gyro_scale: GyroFullScale::Dps2000,
        }
    }
}

impl FifoConfig {
    pub fn with_variant(self, variant: DeviceVariant) -> Self {
        Self { variant, ..self }
    }

    pub fn with_accel_batch_rate(self, hz: f32) -> Self {
        Self {
            accel_batch_rate: hz,
            ..self
        }
    }

    pub fn with_gyro_batch_rate(self, hz: f32) -> Self {
        Self {
            gyro_batch_rate: hz,
            ..self
        }
    }

    pub fn with_accel_scale(self, scale: AccelFullScale) -> Self {
        Self {
            accel_scale: scale,
            ..self
        }
    }

    pub fn with_gyro_scale(self, scale: GyroFullScale) -> Self {
        Self {
            gyro_scale: scale,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !valid_batch_rate(self.accel_batch_rate) {
            return Err(ConfigError::InvalidBatchRate(SensorType::Accelerometer));
        }

        if !valid_batch_rate(self.gyro_batch_rate) {
            return Err(ConfigError::InvalidBatchRate(SensorType::Gyroscope));
        }

        if !self.variant.supports_accel_scale(self.accel_scale) {
            return Err(ConfigError::UnsupportedAccelScale(
                self.variant,
                self.accel_scale,
            ));
        }

        if !self.variant.supports_gyro_scale(self.gyro_scale) {
            return Err(ConfigError::UnsupportedGyroScale(
                self.variant,
                self.gyro_scale,
            ));
        }

        Ok(())
    }

    /// Batch period of a sensor in timestamp ticks, 0 when not batched.
    pub fn batch_period_ticks(&self, sensor: SensorType) -> u32 {
        let rate = match sensor {
            SensorType::Accelerometer => self.accel_batch_rate,
            SensorType::Gyroscope => self.gyro_batch_rate,
            _ => return 0,
        };

        self.rate_to_ticks(rate)
    }

    /// Period of the fastest batched sensor in timestamp ticks.
    pub fn min_period_ticks(&self) -> u32 {
        self.rate_to_ticks(self.accel_batch_rate.max(self.gyro_batch_rate))
    }

    fn rate_to_ticks(&self, rate: f32) -> u32 {
        if rate <= 0.0 {
            return 0;
        }

        let ticks_per_second = 1_000_000.0 / self.variant.timestamp_resolution_us();

        libm::roundf(ticks_per_second / rate) as u32
    }
}

fn valid_batch_rate(rate: f32) -> bool {
    rate.is_finite() && (0.0..=MAX_BATCH_RATE).contains(&rate)
}
