use crate::raw_data::RawData;
use crate::record::FifoTag;
use crate::register_map::{AccelFullScale, GyroFullScale};

impl AccelFullScale {
    /// mg per LSB
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::G2 => 0.061,
            Self::G4 => 0.122,
            Self::G8 => 0.244,
            Self::G16 => 0.488,
            Self::G32 => 0.976,
        }
    }

    pub fn to_mg(self, lsb: i16) -> f32 {
        lsb as f32 * self.sensitivity()
    }

    /// Nearest raw value, saturated to the i16 range.
    pub fn from_mg(self, mg: f32) -> i16 {
        to_lsb(mg / self.sensitivity())
    }
}

impl GyroFullScale {
    /// mdps per LSB
    pub const fn sensitivity(self) -> f32 {
        match self {
            Self::Dps125 => 4.375,
            Self::Dps250 => 8.75,
            Self::Dps500 => 17.5,
            Self::Dps1000 => 35.0,
            Self::Dps2000 => 70.0,
            Self::Dps4000 => 140.0,
        }
    }

    pub fn to_mdps(self, lsb: i16) -> f32 {
        lsb as f32 * self.sensitivity()
    }

    /// Nearest raw value, saturated to the i16 range.
    pub fn from_mdps(self, mdps: f32) -> i16 {
        to_lsb(mdps / self.sensitivity())
    }
}

fn to_lsb(value: f32) -> i16 {
    // `as` saturates out of range values
    libm::roundf(value) as i16
}

/// Sample in physical units: mg for the accelerometer, mdps for the gyroscope.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaledSample {
    timestamp: i64,
    tag: FifoTag,
    x: f32,
    y: f32,
    z: f32,
}

impl ScaledSample {
    pub fn new(timestamp: i64, tag: FifoTag, x: f32, y: f32, z: f32) -> Self {
        Self {
            timestamp,
            tag,
            x,
            y,
            z,
        }
    }

    pub fn accel(timestamp: i64, tag: FifoTag, data: RawData, scale: AccelFullScale) -> Self {
        Self::new(
            timestamp,
            tag,
            scale.to_mg(data.x),
            scale.to_mg(data.y),
            scale.to_mg(data.z),
        )
    }

    pub fn gyro(timestamp: i64, tag: FifoTag, data: RawData, scale: GyroFullScale) -> Self {
        Self::new(
            timestamp,
            tag,
            scale.to_mdps(data.x),
            scale.to_mdps(data.y),
            scale.to_mdps(data.z),
        )
    }

    /// Timestamp ticks
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn tag(&self) -> FifoTag {
        self.tag
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn z(&self) -> f32 {
        self.z
    }
}
