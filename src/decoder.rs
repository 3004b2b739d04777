use heapless::Vec;

use crate::config::FifoConfig;
use crate::error::{DecodeError, RecordError};
use crate::raw_data::RawData;
use crate::record::{Compression, FifoTag, RawRecord, SensorType};

const TAG_COUNTER_MODULO: u8 = 4;

/// One reconstructed sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedSample {
    sensor: SensorType,
    tag: FifoTag,
    timestamp: i64,
    data: RawData,
}

impl DecodedSample {
    pub fn new(tag: FifoTag, timestamp: i64, data: RawData) -> Self {
        Self {
            sensor: tag.sensor_type(),
            tag,
            timestamp,
            data,
        }
    }

    pub fn sensor(&self) -> SensorType {
        self.sensor
    }

    pub fn tag(&self) -> FifoTag {
        self.tag
    }

    /// Timestamp ticks. Negative before the first timestamp record when a
    /// slot is dated back from tick 0.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn data(&self) -> RawData {
        self.data
    }
}

/// Stream decoder for tagged FIFO records.
///
/// Compressed slots are deltas against the previous full sample of the same
/// sensor. The FIFO is one continuous stream, so that sample, the running
/// timestamp and the tag counter persist between [`decode`](Self::decode)
/// calls. Call [`reset`](Self::reset) after flushing or reconfiguring the
/// device FIFO.
///
/// A 2x slot holds the samples at `t - 2dt` and `t - dt`, a 3x slot those at
/// `t - 2dt`, `t - dt` and `t`, and `NC_T_1` / `NC_T_2` slots a full sample
/// at `t - dt` / `t - 2dt`, `dt` being the batch period of that sensor.
#[derive(Clone, Debug)]
pub struct Decoder {
    dtime_min: i64,
    dtime_xl: i64,
    dtime_gy: i64,
    timestamp: i64,
    timestamp_epoch: i64,
    last_raw_timestamp: Option<u32>,
    tag_counter: u8,
    // `None` after lost records, until the next full sample
    last_xl: Option<RawData>,
    last_gy: Option<RawData>,
}

impl Decoder {
    pub fn new(config: &FifoConfig) -> Self {
        Self {
            dtime_min: config.min_period_ticks() as i64,
            dtime_xl: config.batch_period_ticks(SensorType::Accelerometer) as i64,
            dtime_gy: config.batch_period_ticks(SensorType::Gyroscope) as i64,
            timestamp: 0,
            timestamp_epoch: 0,
            last_raw_timestamp: None,
            tag_counter: 0,
            last_xl: Some(RawData::default()),
            last_gy: Some(RawData::default()),
        }
    }

    /// Forget the stream state: timestamp, tag counter and delta references.
    pub fn reset(&mut self) {
        self.timestamp = 0;
        self.timestamp_epoch = 0;
        self.last_raw_timestamp = None;
        self.tag_counter = 0;
        self.last_xl = Some(RawData::default());
        self.last_gy = Some(RawData::default());
    }

    /// Records were dequeued from the device but never decoded. Compressed
    /// records fail with [`DecodeError::MissingReference`] until each sensor
    /// delivers a full sample again.
    pub fn mark_gap(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::warn!("FIFO stream gap, delta references dropped");

        self.last_xl = None;
        self.last_gy = None;
    }

    /// Running timestamp in ticks.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Decode `records` in FIFO order, appending samples to `out` and
    /// per-record failures to `errors`. Returns the number of samples
    /// appended.
    ///
    /// `errors` needs room for one entry per record, failures beyond its
    /// capacity are not reported.
    pub fn decode<const OUT: usize, const ERR: usize>(
        &mut self,
        records: &[RawRecord],
        out: &mut Vec<DecodedSample, OUT>,
        errors: &mut Vec<RecordError, ERR>,
    ) -> usize {
        let start = out.len();

        for (index, record) in records.iter().enumerate() {
            if let Err(error) = self.decode_record(record, out) {
                #[cfg(feature = "defmt")]
                defmt::warn!("FIFO record {} dropped: {}", index, error);

                if errors.push(RecordError { index, error }).is_err() {
                    #[cfg(feature = "defmt")]
                    defmt::error!("decode error buffer full");
                }
            }
        }

        out.len() - start
    }

    fn decode_record<const OUT: usize>(
        &mut self,
        record: &RawRecord,
        out: &mut Vec<DecodedSample, OUT>,
    ) -> Result<(), DecodeError> {
        let tag_byte = record.tag();
        let tag = tag_byte
            .fifo_tag()
            .ok_or(DecodeError::UnknownTag(tag_byte.sensor()))?;

        self.advance_counter(tag_byte.counter());

        let data = record.data();

        match tag.sensor_type() {
            SensorType::Timestamp => {
                self.set_timestamp(u32::from_le_bytes([data[0], data[1], data[2], data[3]]));

                return Ok(());
            }
            SensorType::Other => {
                if tag != FifoTag::CfgChange {
                    push(out, DecodedSample::new(tag, self.timestamp, (*data).into()))?;
                }

                return Ok(());
            }
            SensorType::Accelerometer | SensorType::Gyroscope => (),
        }

        let compression = tag.compression();
        let sensor = tag.sensor_type();
        let dtime = match sensor {
            SensorType::Accelerometer => self.dtime_xl,
            _ => self.dtime_gy,
        };

        if compression != Compression::Uncompressed && dtime == 0 {
            return Err(DecodeError::SensorNotBatched(sensor));
        }

        let mut samples = [DecodedSample::new(tag, self.timestamp, RawData::default()); 3];

        let last = match compression {
            Compression::Uncompressed => {
                let full = (*data).into();
                samples[0] = DecodedSample::new(tag, self.timestamp, full);
                full
            }
            Compression::TimeShifted(shift) => {
                let full = (*data).into();
                let timestamp = self.timestamp - shift as i64 * dtime;
                samples[0] = DecodedSample::new(tag, timestamp, full);
                full
            }
            Compression::Compressed2x => {
                let reference = self.reference(sensor)?;
                expand(tag, self.timestamp, dtime, reference, &diff_2x(data), &mut samples)
            }
            Compression::Compressed3x => {
                let reference = self.reference(sensor)?;
                expand(tag, self.timestamp, dtime, reference, &diff_3x(data), &mut samples)
            }
        };

        // the reference follows the stream even when the samples are dropped
        match sensor {
            SensorType::Accelerometer => self.last_xl = Some(last),
            _ => self.last_gy = Some(last),
        }

        let count = compression.sub_slots();

        if out.capacity() - out.len() < count {
            return Err(DecodeError::OutputFull);
        }

        for sample in &samples[..count] {
            push(out, *sample)?;
        }

        Ok(())
    }

    fn reference(&self, sensor: SensorType) -> Result<RawData, DecodeError> {
        match sensor {
            SensorType::Accelerometer => self.last_xl,
            _ => self.last_gy,
        }
        .ok_or(DecodeError::MissingReference(sensor))
    }

    /// Each counter step is one period of the fastest batched sensor.
    fn advance_counter(&mut self, counter: u8) {
        if counter == self.tag_counter {
            return;
        }

        let steps = (counter + TAG_COUNTER_MODULO - self.tag_counter) % TAG_COUNTER_MODULO;

        self.timestamp += self.dtime_min * steps as i64;
        self.tag_counter = counter;
    }

    fn set_timestamp(&mut self, raw: u32) {
        if let Some(previous) = self.last_raw_timestamp {
            if raw < previous {
                #[cfg(feature = "defmt")]
                defmt::debug!("timestamp rollover at {}", previous);

                self.timestamp_epoch += 1 << 32;
            }
        }

        self.last_raw_timestamp = Some(raw);
        self.timestamp = self.timestamp_epoch + raw as i64;
    }
}

fn push<const OUT: usize>(
    out: &mut Vec<DecodedSample, OUT>,
    sample: DecodedSample,
) -> Result<(), DecodeError> {
    out.push(sample).map_err(|_| DecodeError::OutputFull)
}

/// Chain `diff` (x, y, z per sample) onto `last`, dating sample `i` at
/// `timestamp - (2 - i) * dtime`. Returns the final sample.
fn expand(
    tag: FifoTag,
    timestamp: i64,
    dtime: i64,
    mut last: RawData,
    diff: &[i16],
    samples: &mut [DecodedSample],
) -> RawData {
    for (i, (d, sample)) in diff.chunks_exact(3).zip(samples.iter_mut()).enumerate() {
        last = last.offset(d[0], d[1], d[2]);
        *sample = DecodedSample::new(tag, timestamp - (2 - i as i64) * dtime, last);
    }

    last
}

/// Six signed 8-bit deltas: x, y, z of the first then the second sample.
fn diff_2x(data: &[u8; RawData::SIZE]) -> [i16; 6] {
    let mut diff = [0; 6];

    for (d, byte) in diff.iter_mut().zip(data) {
        *d = *byte as i8 as i16;
    }

    diff
}

/// Three little-endian words, each packing x, y, z as signed 5-bit deltas
/// in bits 4..0, 9..5 and 14..10.
fn diff_3x(data: &[u8; RawData::SIZE]) -> [i16; 9] {
    let mut diff = [0; 9];

    for (i, word) in data.chunks_exact(2).enumerate() {
        let word = u16::from_le_bytes([word[0], word[1]]);

        for axis in 0..3 {
            let value = ((word >> (5 * axis)) & 0x1F) as i16;
            diff[3 * i + axis] = if value < 16 { value } else { value - 32 };
        }
    }

    diff
}
