use core::fmt::{self, Display, Formatter, Write};

use crate::buffers::CycleResult;
use crate::units::ScaledSample;

/// `ACC:\t<timestamp>\t<tag>\t<x>\t<y>\t<z>\r\n`, axes in mg.
pub struct AccelLine<'a>(pub &'a ScaledSample);

pub struct GyroLine<'a>(pub &'a ScaledSample);

fn write_line(f: &mut Formatter<'_>, prefix: &str, sample: &ScaledSample) -> fmt::Result {
    write!(
        f,
        "{}:\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\r\n",
        prefix,
        sample.timestamp(),
        sample.tag() as u8,
        sample.x(),
        sample.y(),
        sample.z()
    )
}

impl Display for AccelLine<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_line(f, "ACC", self.0)
    }
}

impl Display for GyroLine<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_line(f, "GYR", self.0)
    }
}

/// Accelerometer lines first, then gyroscope lines.
pub fn write_cycle<W: Write>(out: &mut W, cycle: &CycleResult<'_>) -> fmt::Result {
    for sample in cycle.accel() {
        write!(out, "{}", AccelLine(sample))?;
    }

    for sample in cycle.gyro() {
        write!(out, "{}", GyroLine(sample))?;
    }

    Ok(())
}
