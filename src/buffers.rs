use heapless::Vec;

use crate::decoder::DecodedSample;
use crate::error::RecordError;
use crate::record::RawRecord;
use crate::units::ScaledSample;

/// Caller-owned storage for one read/decode cycle, reused across cycles.
///
/// `RAW` bounds the records read per cycle, `OUT` the decoded samples. With
/// 3x compression enabled, one record expands into up to three samples, so
/// size `OUT` to `3 * RAW` in that case.
pub struct FifoBuffers<const RAW: usize, const OUT: usize> {
    pub(crate) raw: Vec<RawRecord, RAW>,
    pub(crate) decoded: Vec<DecodedSample, OUT>,
    pub(crate) extracted: Vec<DecodedSample, OUT>,
    pub(crate) accel: Vec<ScaledSample, OUT>,
    pub(crate) gyro: Vec<ScaledSample, OUT>,
    pub(crate) errors: Vec<RecordError, RAW>,
}

impl<const RAW: usize, const OUT: usize> FifoBuffers<RAW, OUT> {
    pub const fn new() -> Self {
        Self {
            raw: Vec::new(),
            decoded: Vec::new(),
            extracted: Vec::new(),
            accel: Vec::new(),
            gyro: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.raw.clear();
        self.decoded.clear();
        self.extracted.clear();
        self.accel.clear();
        self.gyro.clear();
        self.errors.clear();
    }

    pub(crate) fn result(&self) -> CycleResult<'_> {
        CycleResult {
            records_read: self.raw.len(),
            samples: &self.decoded,
            accel: &self.accel,
            gyro: &self.gyro,
            errors: &self.errors,
        }
    }
}

impl<const RAW: usize, const OUT: usize> Default for FifoBuffers<RAW, OUT> {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one cycle, borrowed from the [`FifoBuffers`] it was built in.
///
/// Decode failures do not fail the cycle: they are listed in
/// [`errors`](Self::errors) next to the samples that did decode.
#[derive(Copy, Clone, Debug)]
pub struct CycleResult<'a> {
    records_read: usize,
    samples: &'a [DecodedSample],
    accel: &'a [ScaledSample],
    gyro: &'a [ScaledSample],
    errors: &'a [RecordError],
}

impl<'a> CycleResult<'a> {
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// All decoded samples in timestamp order, including unsupported sensors.
    pub fn samples(&self) -> &'a [DecodedSample] {
        self.samples
    }

    /// Accelerometer samples in mg.
    pub fn accel(&self) -> &'a [ScaledSample] {
        self.accel
    }

    /// Gyroscope samples in mdps.
    pub fn gyro(&self) -> &'a [ScaledSample] {
        self.gyro
    }

    pub fn errors(&self) -> &'a [RecordError] {
        self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.errors.is_empty()
    }
}
