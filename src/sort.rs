use heapless::Vec;

use crate::decoder::DecodedSample;
use crate::record::SensorType;

/// Stable in-place sort by timestamp.
///
/// FIFO order interleaves sensors batched at different rates, and
/// compressed slots are dated back, so decode order is not chronological.
/// Samples sharing a timestamp keep their decode order. Insertion sort: the
/// input is short and mostly ordered already.
pub fn sort_by_timestamp(samples: &mut [DecodedSample]) {
    for i in 1..samples.len() {
        let mut j = i;

        while j > 0 && samples[j - 1].timestamp() > samples[j].timestamp() {
            samples.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Sensor types that can be extracted into their own stream.
fn extractable(sensor: SensorType) -> bool {
    matches!(sensor, SensorType::Accelerometer | SensorType::Gyroscope)
}

/// Number of samples of `sensor` in `samples`.
pub fn sensor_occurrence(samples: &[DecodedSample], sensor: SensorType) -> usize {
    if !extractable(sensor) {
        return 0;
    }

    samples.iter().filter(|s| s.sensor() == sensor).count()
}

/// Append the samples of `sensor` to `out`, keeping their order.
///
/// Returns how many were appended; stops early once `out` is full.
pub fn extract_sensor<const N: usize>(
    samples: &[DecodedSample],
    sensor: SensorType,
    out: &mut Vec<DecodedSample, N>,
) -> usize {
    if !extractable(sensor) {
        return 0;
    }

    let mut count = 0;

    for sample in samples.iter().filter(|s| s.sensor() == sensor) {
        if out.push(*sample).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("{} extraction truncated at {}", sensor, count);

            break;
        }

        count += 1;
    }

    count
}
