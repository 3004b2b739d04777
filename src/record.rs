use crate::raw_data::RawData;

/// One FIFO slot: tag byte followed by the 6 byte payload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawRecord {
    tag: u8,
    data: [u8; RawData::SIZE],
}

impl RawRecord {
    pub const SIZE: usize = 1 + RawData::SIZE;

    pub fn new(tag: u8, data: [u8; RawData::SIZE]) -> Self {
        Self { tag, data }
    }

    pub fn tag(&self) -> TagByte {
        TagByte(self.tag)
    }

    pub fn data(&self) -> &[u8; RawData::SIZE] {
        &self.data
    }
}

impl From<[u8; RawRecord::SIZE]> for RawRecord {
    fn from(value: [u8; RawRecord::SIZE]) -> Self {
        let mut data = [0; RawData::SIZE];
        data.copy_from_slice(&value[1..]);

        Self {
            tag: value[0],
            data,
        }
    }
}

/// `FIFO_DATA_OUT_TAG` layout: sensor tag in bits 7..3, rolling counter in
/// bits 2..1, parity in bit 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TagByte(pub u8);

impl TagByte {
    pub fn sensor(&self) -> u8 {
        self.0 >> 3
    }

    pub fn counter(&self) -> u8 {
        (self.0 >> 1) & 0b11
    }

    pub fn parity(&self) -> bool {
        self.0 & 1 != 0
    }

    pub fn fifo_tag(&self) -> Option<FifoTag> {
        FifoTag::from_bits(self.sensor())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoTag {
    GyroNc = 0x01,
    XlNc = 0x02,
    Temperature = 0x03,
    Timestamp = 0x04,
    CfgChange = 0x05,
    XlNcT2 = 0x06,
    XlNcT1 = 0x07,
    Xl2xC = 0x08,
    Xl3xC = 0x09,
    GyroNcT2 = 0x0A,
    GyroNcT1 = 0x0B,
    Gyro2xC = 0x0C,
    Gyro3xC = 0x0D,
    SensorHubSlave0 = 0x0E,
    SensorHubSlave1 = 0x0F,
    SensorHubSlave2 = 0x10,
    SensorHubSlave3 = 0x11,
    StepCounter = 0x12,
    SensorHubNack = 0x19,
}

impl FifoTag {
    pub fn from_bits(bits: u8) -> Option<Self> {
        let tag = match bits {
            0x01 => Self::GyroNc,
            0x02 => Self::XlNc,
            0x03 => Self::Temperature,
            0x04 => Self::Timestamp,
            0x05 => Self::CfgChange,
            0x06 => Self::XlNcT2,
            0x07 => Self::XlNcT1,
            0x08 => Self::Xl2xC,
            0x09 => Self::Xl3xC,
            0x0A => Self::GyroNcT2,
            0x0B => Self::GyroNcT1,
            0x0C => Self::Gyro2xC,
            0x0D => Self::Gyro3xC,
            0x0E => Self::SensorHubSlave0,
            0x0F => Self::SensorHubSlave1,
            0x10 => Self::SensorHubSlave2,
            0x11 => Self::SensorHubSlave3,
            0x12 => Self::StepCounter,
            0x19 => Self::SensorHubNack,
            _ => return None,
        };

        Some(tag)
    }

    pub fn sensor_type(self) -> SensorType {
        match self {
            Self::XlNc | Self::XlNcT1 | Self::XlNcT2 | Self::Xl2xC | Self::Xl3xC => {
                SensorType::Accelerometer
            }
            Self::GyroNc | Self::GyroNcT1 | Self::GyroNcT2 | Self::Gyro2xC | Self::Gyro3xC => {
                SensorType::Gyroscope
            }
            Self::Timestamp => SensorType::Timestamp,
            _ => SensorType::Other,
        }
    }

    pub fn compression(self) -> Compression {
        match self {
            Self::XlNcT1 | Self::GyroNcT1 => Compression::TimeShifted(1),
            Self::XlNcT2 | Self::GyroNcT2 => Compression::TimeShifted(2),
            Self::Xl2xC | Self::Gyro2xC => Compression::Compressed2x,
            Self::Xl3xC | Self::Gyro3xC => Compression::Compressed3x,
            _ => Compression::Uncompressed,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorType {
    Accelerometer,
    Gyroscope,
    Timestamp,
    Other,
}

/// How a record's payload maps onto samples.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Compression {
    Uncompressed,
    /// Full sample taken this many batch periods before the slot time.
    TimeShifted(u8),
    /// Two samples as 8-bit deltas.
    Compressed2x,
    /// Three samples as 5-bit deltas.
    Compressed3x,
}

impl Compression {
    /// Samples produced by one record.
    pub fn sub_slots(self) -> usize {
        match self {
            Self::Uncompressed | Self::TimeShifted(_) => 1,
            Self::Compressed2x => 2,
            Self::Compressed3x => 3,
        }
    }
}
