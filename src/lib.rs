#![no_std]

pub mod buffers;
pub mod config;
pub mod decoder;
pub mod error;
pub mod interface;
pub mod raw_data;
pub mod record;
pub mod register_map;
pub mod report;
pub mod sort;
pub mod units;

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

pub use buffers::{CycleResult, FifoBuffers};
pub use config::{DeviceVariant, FifoConfig};
pub use decoder::{DecodedSample, Decoder};
pub use error::{ConfigError, DecodeError, Error, RecordError};
pub use interface::{I2cInterface, RegisterAccess, SpiInterface};
pub use raw_data::RawData;
pub use record::{FifoTag, RawRecord, SensorType};
pub use register_map::{AccelFullScale, FifoStatus, GyroFullScale, RegisterMap};
pub use units::ScaledSample;

/// FIFO reader. The device is configured by the application and
/// [`FifoConfig`] must mirror it.
pub struct Asm330lhhx<B> {
    bus: B,
    config: FifoConfig,
    decoder: Decoder,
}

impl<B> Asm330lhhx<B>
where
    B: RegisterAccess,
{
    /// Fails when `config` is not valid for the configured device variant.
    pub fn new(bus: B, config: FifoConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            bus,
            decoder: Decoder::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &FifoConfig {
        &self.config
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Drop decoder stream state. Required after flushing the device FIFO.
    pub fn reset_decoder(&mut self) {
        self.decoder.reset();
    }

    /// Bus access for device configuration between cycles.
    pub fn bus(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn release(self) -> B {
        self.bus
    }

    pub async fn fifo_status(&mut self) -> Result<FifoStatus, Error<B::Error>> {
        let mut data = [0; FifoStatus::SIZE];

        self.bus
            .read_registers(RegisterMap::FifoStatus1.addr(), &mut data)
            .await?;

        Ok(data.into())
    }

    pub async fn watermark_reached(&mut self) -> Result<bool, Error<B::Error>> {
        Ok(self.fifo_status().await?.watermark())
    }

    /// Read up to `count` records into `records`, bounded by its free space.
    /// Records that do not fit stay in the device FIFO.
    pub async fn read_records<const RAW: usize>(
        &mut self,
        count: usize,
        records: &mut Vec<RawRecord, RAW>,
    ) -> Result<usize, Error<B::Error>> {
        let available = records.capacity() - records.len();

        let count = if count > available {
            #[cfg(feature = "defmt")]
            defmt::warn!("{} FIFO records pending, room for {}", count, available);

            available
        } else {
            count
        };

        for records_read in 0..count {
            let record = self
                .read_record()
                .await
                .map_err(|error| Error::FifoRead {
                    records_read,
                    error,
                })?;

            if records.push(record).is_err() {
                return Ok(records_read);
            }
        }

        Ok(count)
    }

    async fn read_record(&mut self) -> Result<RawRecord, B::Error> {
        let mut tag = [0; 1];
        let mut data = [0; RawData::SIZE];

        self.bus
            .read_registers(RegisterMap::FifoDataOutTag.addr(), &mut tag)
            .await?;
        self.bus
            .read_registers(RegisterMap::FifoDataOutXL.addr(), &mut data)
            .await?;

        Ok(RawRecord::new(tag[0], data))
    }

    /// Read every pending record and run it through the pipeline.
    pub async fn read_cycle<'b, const RAW: usize, const OUT: usize>(
        &mut self,
        buffers: &'b mut FifoBuffers<RAW, OUT>,
    ) -> Result<CycleResult<'b>, Error<B::Error>> {
        buffers.clear();

        let status = self.fifo_status().await?;

        #[cfg(feature = "defmt")]
        defmt::trace!("FIFO status: {:?}", status);

        if status.level() > 0 {
            let read = self
                .read_records(status.level() as usize, &mut buffers.raw)
                .await;

            // dequeued records are lost, deltas must re-anchor
            if let Err(error) = read {
                self.decoder.mark_gap();

                return Err(error);
            }
        }

        Ok(self.run(buffers))
    }

    /// Run a cycle when the FIFO watermark flag is set, `None` otherwise.
    pub async fn poll_cycle<'b, const RAW: usize, const OUT: usize>(
        &mut self,
        buffers: &'b mut FifoBuffers<RAW, OUT>,
    ) -> Result<Option<CycleResult<'b>>, Error<B::Error>> {
        if !self.watermark_reached().await? {
            return Ok(None);
        }

        self.read_cycle(buffers).await.map(Some)
    }

    /// Poll the watermark flag every `poll_interval_ms` until it is set, then
    /// run a cycle.
    pub async fn wait_for_cycle<'b, const RAW: usize, const OUT: usize>(
        &mut self,
        buffers: &'b mut FifoBuffers<RAW, OUT>,
        delay: &mut impl DelayNs,
        poll_interval_ms: u32,
    ) -> Result<CycleResult<'b>, Error<B::Error>> {
        loop {
            if self.watermark_reached().await? {
                return self.read_cycle(buffers).await;
            }

            delay.delay_ms(poll_interval_ms).await;
        }
    }

    /// Run already read records through the pipeline, no bus access.
    /// Records beyond the `RAW` capacity are ignored.
    pub fn process<'b, const RAW: usize, const OUT: usize>(
        &mut self,
        records: &[RawRecord],
        buffers: &'b mut FifoBuffers<RAW, OUT>,
    ) -> CycleResult<'b> {
        buffers.clear();

        let count = records.len().min(RAW);
        // cannot fail, count is bounded by the capacity
        let _ = buffers.raw.extend_from_slice(&records[..count]);

        self.run(buffers)
    }

    fn run<'b, const RAW: usize, const OUT: usize>(
        &mut self,
        buffers: &'b mut FifoBuffers<RAW, OUT>,
    ) -> CycleResult<'b> {
        self.decoder
            .decode(&buffers.raw, &mut buffers.decoded, &mut buffers.errors);

        sort::sort_by_timestamp(&mut buffers.decoded);

        sort::extract_sensor(
            &buffers.decoded,
            SensorType::Accelerometer,
            &mut buffers.extracted,
        );
        for sample in &buffers.extracted {
            let scaled = ScaledSample::accel(
                sample.timestamp(),
                sample.tag(),
                sample.data(),
                self.config.accel_scale,
            );
            // same capacity as `extracted`
            let _ = buffers.accel.push(scaled);
        }

        buffers.extracted.clear();
        sort::extract_sensor(
            &buffers.decoded,
            SensorType::Gyroscope,
            &mut buffers.extracted,
        );
        for sample in &buffers.extracted {
            let scaled = ScaledSample::gyro(
                sample.timestamp(),
                sample.tag(),
                sample.data(),
                self.config.gyro_scale,
            );
            let _ = buffers.gyro.push(scaled);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "FIFO cycle: {} records, {} acc, {} gyr, {} errors",
            buffers.raw.len(),
            buffers.accel.len(),
            buffers.gyro.len(),
            buffers.errors.len()
        );

        buffers.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    const RAW: usize = 16;
    const OUT: usize = 48;

    #[derive(Debug, PartialEq)]
    struct BusFault;

    /// FIFO register window backed by a list of records.
    #[derive(Default)]
    struct FakeFifo {
        records: Vec<RawRecord, 32>,
        position: usize,
        polls_before_watermark: usize,
        fail_at_record: Option<usize>,
        status_reads: usize,
    }

    impl FakeFifo {
        fn with_records(records: &[RawRecord]) -> Self {
            Self {
                records: Vec::from_slice(records).unwrap(),
                ..Default::default()
            }
        }

        fn pending(&self) -> usize {
            self.records.len() - self.position
        }
    }

    impl RegisterAccess for FakeFifo {
        type Error = BusFault;

        async fn write_registers(&mut self, _register: u8, _data: &[u8]) -> Result<(), BusFault> {
            Ok(())
        }

        async fn read_registers(&mut self, register: u8, data: &mut [u8]) -> Result<(), BusFault> {
            match register {
                0x3A => {
                    self.status_reads += 1;
                    let level = self.pending() as u16;
                    let watermark = self.status_reads > self.polls_before_watermark;

                    data[0] = level as u8;
                    data[1] = (level >> 8) as u8 | (watermark as u8) << 7;
                }
                0x78 => data[0] = self.records[self.position].tag().0,
                0x79 => {
                    if self.fail_at_record == Some(self.position) {
                        return Err(BusFault);
                    }
                    data.copy_from_slice(self.records[self.position].data());
                    self.position += 1;
                }
                _ => return Err(BusFault),
            }

            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    fn config() -> FifoConfig {
        // 1000 ticks per batch period
        FifoConfig::default()
            .with_accel_batch_rate(40.0)
            .with_gyro_batch_rate(40.0)
    }

    fn tag(tag: FifoTag, counter: u8) -> u8 {
        (tag as u8) << 3 | counter << 1
    }

    fn sample_record(fifo_tag: FifoTag, counter: u8, x: i16, y: i16, z: i16) -> RawRecord {
        let (x, y, z) = (x.to_le_bytes(), y.to_le_bytes(), z.to_le_bytes());

        RawRecord::new(tag(fifo_tag, counter), [x[0], x[1], y[0], y[1], z[0], z[1]])
    }

    fn timestamp_record(ticks: u32) -> RawRecord {
        let t = ticks.to_le_bytes();

        RawRecord::new(tag(FifoTag::Timestamp, 0), [t[0], t[1], t[2], t[3], 0, 0])
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = FifoConfig::default().with_accel_batch_rate(-12.5);

        let result = Asm330lhhx::new(FakeFifo::default(), config);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidBatchRate(SensorType::Accelerometer))
        ));
    }

    #[test]
    fn mixed_stream_is_merged_and_split() {
        let records = [
            timestamp_record(5000),
            sample_record(FifoTag::XlNc, 0, 1000, 0, -1000),
            sample_record(FifoTag::GyroNc, 0, 100, 200, 300),
            // counter step: slot time 6000, sub-samples at 4000 and 5000
            RawRecord::new(tag(FifoTag::Xl2xC, 1), [2, 0, 0, 3, 0, 0]),
        ];
        let mut imu = Asm330lhhx::new(FakeFifo::with_records(&records), config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let cycle = block_on(imu.read_cycle(&mut buffers)).unwrap();

        assert_eq!(cycle.records_read(), 4);
        assert!(cycle.errors().is_empty());

        let timeline: [(SensorType, i64); 4] = core::array::from_fn(|i| {
            let s = &cycle.samples()[i];
            (s.sensor(), s.timestamp())
        });
        assert_eq!(
            timeline,
            [
                (SensorType::Accelerometer, 4000),
                (SensorType::Accelerometer, 5000),
                (SensorType::Gyroscope, 5000),
                (SensorType::Accelerometer, 5000),
            ]
        );

        assert_eq!(cycle.accel().len(), 3);
        assert_eq!(cycle.gyro().len(), 1);

        // compressed deltas apply on top of the uncompressed sample, ±2g
        let first = cycle.accel()[0];
        assert!((first.x() - 1002.0 * 0.061).abs() < 1e-3);
        assert_eq!(first.tag(), FifoTag::Xl2xC);
        let last = cycle.accel()[2];
        assert!((last.x() - 1005.0 * 0.061).abs() < 1e-3);

        // ±2000 dps
        assert_eq!(cycle.gyro()[0].y(), 14_000.0);
    }

    #[test]
    fn malformed_record_does_not_abort_the_cycle() {
        let records = [
            sample_record(FifoTag::XlNc, 0, 1, 1, 1),
            sample_record(FifoTag::GyroNc, 0, 2, 2, 2),
            RawRecord::new(0xFF, [0; 6]),
            sample_record(FifoTag::XlNc, 1, 3, 3, 3),
            sample_record(FifoTag::GyroNc, 1, 4, 4, 4),
        ];
        let mut imu = Asm330lhhx::new(FakeFifo::with_records(&records), config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let cycle = block_on(imu.read_cycle(&mut buffers)).unwrap();

        assert_eq!(cycle.samples().len(), records.len() - 1);
        assert_eq!(
            cycle.errors(),
            &[RecordError {
                index: 2,
                error: DecodeError::UnknownTag(0x1F)
            }]
        );
        assert_eq!(cycle.accel().len(), 2);
        assert_eq!(cycle.gyro().len(), 2);
    }

    #[test]
    fn empty_fifo_gives_empty_cycle() {
        let mut imu = Asm330lhhx::new(FakeFifo::default(), config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let cycle = block_on(imu.poll_cycle(&mut buffers)).unwrap().unwrap();

        assert!(cycle.is_empty());
        assert_eq!(cycle.records_read(), 0);
        assert!(cycle.accel().is_empty());
        assert!(cycle.gyro().is_empty());
    }

    #[test]
    fn poll_without_watermark_reads_nothing() {
        let records = [sample_record(FifoTag::XlNc, 0, 1, 1, 1)];
        let mut fifo = FakeFifo::with_records(&records);
        fifo.polls_before_watermark = 1;
        let mut imu = Asm330lhhx::new(fifo, config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let cycle = block_on(imu.poll_cycle(&mut buffers)).unwrap();

        assert!(cycle.is_none());
        assert_eq!(imu.release().pending(), 1);
    }

    #[test]
    fn wait_for_cycle_polls_until_watermark() {
        let records = [sample_record(FifoTag::GyroNc, 0, 1, 1, 1)];
        let mut fifo = FakeFifo::with_records(&records);
        fifo.polls_before_watermark = 3;
        let mut imu = Asm330lhhx::new(fifo, config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let cycle = block_on(imu.wait_for_cycle(&mut buffers, &mut NoDelay, 10)).unwrap();

        assert_eq!(cycle.gyro().len(), 1);
        // three clear polls, the set one, then the level read
        assert_eq!(imu.release().status_reads, 5);
    }

    #[test]
    fn bus_failure_aborts_and_counts_records() {
        let records = [
            sample_record(FifoTag::XlNc, 0, 1, 1, 1),
            sample_record(FifoTag::XlNc, 1, 2, 2, 2),
            sample_record(FifoTag::XlNc, 2, 3, 3, 3),
        ];
        let mut fifo = FakeFifo::with_records(&records);
        fifo.fail_at_record = Some(2);
        let mut imu = Asm330lhhx::new(fifo, config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let result = block_on(imu.read_cycle(&mut buffers));

        assert!(matches!(
            result,
            Err(Error::FifoRead {
                records_read: 2,
                error: BusFault
            })
        ));
    }

    #[test]
    fn dropped_compressed_record_keeps_deltas_anchored() {
        let mut imu = Asm330lhhx::new(FakeFifo::default(), config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, 2>::new();

        let cycle = imu.process(
            &[
                sample_record(FifoTag::XlNc, 0, 100, 0, 0),
                RawRecord::new(tag(FifoTag::Xl2xC, 0), [1, 0, 0, 1, 0, 0]),
            ],
            &mut buffers,
        );
        assert_eq!(
            cycle.errors(),
            &[RecordError {
                index: 1,
                error: DecodeError::OutputFull
            }]
        );

        let cycle = imu.process(
            &[RawRecord::new(tag(FifoTag::Xl2xC, 1), [1, 0, 0, 1, 0, 0])],
            &mut buffers,
        );

        assert!(cycle.errors().is_empty());
        assert_eq!(cycle.samples()[0].data().x(), 103);
        assert_eq!(cycle.samples()[1].data().x(), 104);
    }

    #[test]
    fn aborted_read_requires_full_sample_before_deltas() {
        let records = [
            sample_record(FifoTag::XlNc, 0, 10, 0, 0),
            RawRecord::new(tag(FifoTag::Xl2xC, 1), [1, 0, 0, 1, 0, 0]),
            sample_record(FifoTag::XlNc, 2, 50, 0, 0),
            RawRecord::new(tag(FifoTag::Xl2xC, 3), [1, 0, 0, 1, 0, 0]),
        ];
        let mut fifo = FakeFifo::with_records(&records);
        fifo.fail_at_record = Some(1);
        let mut imu = Asm330lhhx::new(fifo, config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let result = block_on(imu.read_cycle(&mut buffers));
        assert!(matches!(
            result,
            Err(Error::FifoRead {
                records_read: 1,
                ..
            })
        ));

        imu.bus().fail_at_record = None;
        let cycle = block_on(imu.read_cycle(&mut buffers)).unwrap();

        assert_eq!(
            cycle.errors(),
            &[RecordError {
                index: 0,
                error: DecodeError::MissingReference(SensorType::Accelerometer)
            }]
        );
        let x: [i16; 3] = core::array::from_fn(|i| cycle.samples()[i].data().x());
        assert_eq!(x, [51, 50, 52]);
    }

    #[test]
    fn reads_are_bounded_by_buffer_capacity() {
        let records: [RawRecord; 6] =
            core::array::from_fn(|i| sample_record(FifoTag::XlNc, (i % 4) as u8, i as i16, 0, 0));
        let mut imu = Asm330lhhx::new(FakeFifo::with_records(&records), config()).unwrap();
        let mut buffers = FifoBuffers::<4, 8>::new();

        let cycle = block_on(imu.read_cycle(&mut buffers)).unwrap();
        assert_eq!(cycle.records_read(), 4);
        assert_eq!(cycle.accel().len(), 4);

        let cycle = block_on(imu.read_cycle(&mut buffers)).unwrap();
        assert_eq!(cycle.records_read(), 2);
        assert_eq!(cycle.accel()[0].x(), 4.0 * 0.061);
    }

    #[test]
    fn process_runs_without_bus() {
        let records = [
            sample_record(FifoTag::GyroNc, 0, 10, 0, 0),
            sample_record(FifoTag::Temperature, 0, 25, 0, 0),
        ];
        let mut imu = Asm330lhhx::new(FakeFifo::default(), config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();

        let cycle = imu.process(&records, &mut buffers);

        assert_eq!(cycle.samples().len(), 2);
        assert_eq!(cycle.gyro().len(), 1);
        assert!(cycle.accel().is_empty());
        assert_eq!(imu.release().status_reads, 0);
    }

    #[test]
    fn cycle_report_lines() {
        let records = [
            timestamp_record(100),
            sample_record(FifoTag::GyroNc, 0, 1, 0, 0),
            sample_record(FifoTag::XlNc, 0, 0, 0, 1000),
        ];
        let mut imu = Asm330lhhx::new(FakeFifo::default(), config()).unwrap();
        let mut buffers = FifoBuffers::<RAW, OUT>::new();
        let cycle = imu.process(&records, &mut buffers);
        let mut text: heapless::String<128> = heapless::String::new();

        report::write_cycle(&mut text, &cycle).unwrap();

        assert_eq!(
            text.as_str(),
            "ACC:\t100\t2\t0.00\t0.00\t61.00\r\nGYR:\t100\t1\t70.00\t0.00\t0.00\r\n"
        );
    }
}
