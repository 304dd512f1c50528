//! DHT11 frame decoding (hardware-independent)
//!
//! The sensor answers a start signal with 40 bits. Each bit is a ~50 µs low
//! pulse followed by a high pulse of ~27 µs (0) or ~70 µs (1). The pin
//! driver in `hardware` measures the pulse widths; everything after that
//! lives here.

use crate::error::SensorError;

pub const FRAME_BITS: usize = 40;

/// Measured (low, high) pulse widths for one bit, in any common unit.
pub type Pulse = (u32, u32);

/// Raw 5-byte frame: humidity int/dec, temperature int/dec, checksum.
pub type Frame = [u8; 5];

/// Decoded DHT11 measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature: f32,
    pub humidity: f32,
}

/// Pack pulse pairs into bytes, MSB first.
///
/// A bit is set when its high pulse outlasts its low pulse; comparing the
/// two avoids depending on the absolute clock rate.
pub fn frame_from_pulses(pulses: &[Pulse; FRAME_BITS]) -> Frame {
    let mut frame = [0u8; 5];
    for (i, &(low, high)) in pulses.iter().enumerate() {
        frame[i / 8] <<= 1;
        if high > low {
            frame[i / 8] |= 1;
        }
    }
    frame
}

/// Walk one transaction, starting right after the host releases the line.
///
/// `pulse_width(level)` busy-waits while the line sits at `level` (high when
/// `true`) and returns how long that took; it returns 0 when the line is
/// already elsewhere. The line needs a few µs to rise through the pull-up,
/// so the first wait covers that rise before the release gap is measured.
pub fn capture_frame<F>(mut pulse_width: F) -> Result<Frame, SensorError>
where
    F: FnMut(bool) -> Result<u32, SensorError>,
{
    // Rise, then the 20-40 µs gap until the sensor pulls the line low.
    pulse_width(false).map_err(|_| SensorError::NotReady)?;
    pulse_width(true).map_err(|_| SensorError::NotReady)?;
    // Response: ~80 µs low, ~80 µs high.
    pulse_width(false)?;
    pulse_width(true)?;

    let mut pulses: [Pulse; FRAME_BITS] = [(0, 0); FRAME_BITS];
    for pulse in pulses.iter_mut() {
        let low = pulse_width(false)?;
        let high = pulse_width(true)?;
        *pulse = (low, high);
    }
    Ok(frame_from_pulses(&pulses))
}

pub fn checksum_ok(frame: &Frame) -> bool {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b));
    sum == frame[4]
}

pub fn decode(frame: &Frame) -> Result<Measurement, SensorError> {
    if !checksum_ok(frame) {
        return Err(SensorError::Checksum);
    }

    let humidity = f32::from(frame[0]) + f32::from(frame[1]) * 0.1;

    // Newer DHT11 revisions flag sub-zero readings in bit 7 of the decimal
    // byte.
    let mut temperature = if frame[3] & 0x80 != 0 {
        -1.0 - f32::from(frame[2])
    } else {
        f32::from(frame[2])
    };
    temperature += f32::from(frame[3] & 0x0F) * 0.1;

    Ok(Measurement {
        temperature,
        humidity,
    })
}
