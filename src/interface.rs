use core::fmt::Debug;

use embedded_hal_async::i2c::{self, I2c, SevenBitAddress};
use embedded_hal_async::spi::{self, SpiDevice};

/// Burst register access, relying on the device's address auto-increment.
#[allow(async_fn_in_trait)]
pub trait RegisterAccess {
    type Error: Debug;

    async fn write_registers(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error>;

    async fn read_registers(&mut self, register: u8, data: &mut [u8]) -> Result<(), Self::Error>;
}

const I2C_ADDR_SA0_LOW: SevenBitAddress = 0b1101010;
const I2C_ADDR_SA0_HIGH: SevenBitAddress = 0b1101011;

pub struct I2cInterface<T> {
    dev: T,
    address: SevenBitAddress,
}

impl<T> I2cInterface<T>
where
    T: I2c,
{
    /// Use default I2C address (SA0 line low)
    pub fn new(dev: T) -> Self {
        Self {
            dev,
            address: I2C_ADDR_SA0_LOW,
        }
    }

    /// SA0 line is high, adjust device I2C address accordingly
    pub fn with_sa0_high(self) -> Self {
        Self {
            dev: self.dev,
            address: I2C_ADDR_SA0_HIGH,
        }
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn release(self) -> T {
        self.dev
    }
}

impl<T> RegisterAccess for I2cInterface<T>
where
    T: I2c,
{
    type Error = T::Error;

    async fn write_registers(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        // adjacent writes go out as one bus write
        self.dev
            .transaction(
                self.address,
                &mut [i2c::Operation::Write(&[register]), i2c::Operation::Write(data)],
            )
            .await
    }

    async fn read_registers(&mut self, register: u8, data: &mut [u8]) -> Result<(), Self::Error> {
        self.dev.write_read(self.address, &[register], data).await
    }
}

const SPI_READ: u8 = 1 << 7;

pub struct SpiInterface<T> {
    dev: T,
}

impl<T> SpiInterface<T>
where
    T: SpiDevice,
{
    pub fn new(dev: T) -> Self {
        Self { dev }
    }

    pub fn release(self) -> T {
        self.dev
    }
}

impl<T> RegisterAccess for SpiInterface<T>
where
    T: SpiDevice,
{
    type Error = T::Error;

    async fn write_registers(&mut self, register: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.dev
            .transaction(&mut [
                spi::Operation::Write(&[register & !SPI_READ]),
                spi::Operation::Write(data),
            ])
            .await
    }

    async fn read_registers(&mut self, register: u8, data: &mut [u8]) -> Result<(), Self::Error> {
        self.dev
            .transaction(&mut [
                spi::Operation::Write(&[register | SPI_READ]),
                spi::Operation::Read(data),
            ])
            .await
    }
}
