/// Registers touched by the FIFO reader. `FIFO_STATUS2` (0x3B) is read in
/// the same burst as `FifoStatus1`.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterMap {
    FifoStatus1 = 0x3A,
    FifoDataOutTag = 0x78,
    FifoDataOutXL = 0x79,
}

impl RegisterMap {
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelFullScale {
    G2,
    G4,
    G8,
    G16,
    /// LSM6DSO32 only
    G32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroFullScale {
    Dps125,
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
    Dps4000,
}

/// Decoded `FIFO_STATUS1` / `FIFO_STATUS2` pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoStatus {
    level: u16,
    watermark: bool,
    overrun: bool,
    full: bool,
    counter_bdr: bool,
    overrun_latched: bool,
}

impl FifoStatus {
    pub const SIZE: usize = 2;

    /// Number of unread records (tag + 6 bytes each).
    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn watermark(&self) -> bool {
        self.watermark
    }

    pub fn overrun(&self) -> bool {
        self.overrun
    }

    pub fn full(&self) -> bool {
        self.full
    }

    pub fn counter_bdr(&self) -> bool {
        self.counter_bdr
    }

    pub fn overrun_latched(&self) -> bool {
        self.overrun_latched
    }
}

impl From<[u8; FifoStatus::SIZE]> for FifoStatus {
    fn from(value: [u8; FifoStatus::SIZE]) -> Self {
        let status2 = value[1];

        Self {
            level: u16::from_le_bytes([value[0], status2 & 0b11]),
            watermark: status2 & (1 << 7) != 0,
            overrun: status2 & (1 << 6) != 0,
            full: status2 & (1 << 5) != 0,
            counter_bdr: status2 & (1 << 4) != 0,
            overrun_latched: status2 & (1 << 3) != 0,
        }
    }
}
