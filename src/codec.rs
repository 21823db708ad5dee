//! Conversions between physical units and raw register encodings.

use crate::registers;
use crate::Sensor;
use byteorder::{BigEndian, ByteOrder};

/// A value was outside the legal interval of the register it targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeError {
    /// The rejected value.
    pub value: u16,
    /// Smallest accepted value.
    pub min: u16,
    /// Largest accepted value.
    pub max: u16,
}

/// Linear mapping `physical = bias + raw * unit` over `0..=max_raw`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Scale {
    unit: u16,
    bias: u16,
    max_raw: u8,
}

impl Scale {
    const fn new(unit: u16, bias: u16, max_raw: u8) -> Self {
        Self {
            unit,
            bias,
            max_raw,
        }
    }

    pub(crate) const fn min(&self) -> u16 {
        self.bias
    }

    pub(crate) const fn max(&self) -> u16 {
        self.bias + self.max_raw as u16 * self.unit
    }

    /// Encodes a physical value, truncating to the unit below.
    pub(crate) fn encode(&self, value: u16) -> Result<u8, RangeError> {
        if value < self.min() || value > self.max() {
            return Err(RangeError {
                value,
                min: self.min(),
                max: self.max(),
            });
        }
        // Bounded by `max_raw` after the range check above.
        Ok(((value - self.bias) / self.unit) as u8)
    }

    pub(crate) fn decode(&self, raw: u8) -> u16 {
        self.bias + u16::from(raw) * self.unit
    }
}

/// ALS measurement interval in milliseconds, 6 bit field in 50 ms units.
pub(crate) const ALS_INTERVAL_MS: Scale = Scale::new(50, 0, registers::ALS_INTERVAL.max());

/// PS measurement interval in milliseconds, 8 bit field in 5 ms units.
pub(crate) const PS_INTERVAL_MS: Scale = Scale::new(5, 0, registers::PS_INTERVAL.max());

/// LED drive current in milliamps, 5 mA steps with a 5 mA bias.
pub(crate) const LED_CURRENT_MA: Scale = Scale::new(5, 5, registers::PS_LED_CURRENT.max());

pub(crate) const fn interval_scale(sensor: Sensor) -> Scale {
    match sensor {
        Sensor::Als => ALS_INTERVAL_MS,
        Sensor::Ps => PS_INTERVAL_MS,
    }
}

/// Largest ALS interval accepted, in milliseconds.
pub const ALS_INTERVAL_MAX_MS: u16 = ALS_INTERVAL_MS.max();
/// Largest PS interval accepted, in milliseconds.
pub const PS_INTERVAL_MAX_MS: u16 = PS_INTERVAL_MS.max();
/// Smallest LED current accepted, in milliamps.
pub const LED_CURRENT_MIN_MA: u16 = LED_CURRENT_MA.min();
/// Largest LED current accepted, in milliamps.
pub const LED_CURRENT_MAX_MA: u16 = LED_CURRENT_MA.max();

/// Smallest PS filter count. Zero is reserved.
pub const FILTER_MIN: u8 = 1;
/// Largest PS filter count.
pub const FILTER_MAX: u8 = registers::PS_FILTER_N.max();

/// Splits a 16 bit value into its MSB and LSB register bytes.
pub(crate) fn encode_u16(value: u16) -> [u8; 2] {
    let mut buf = [0u8; 2];
    BigEndian::write_u16(&mut buf, value);
    buf
}

/// Joins MSB and LSB register bytes.
pub(crate) fn decode_u16(buf: [u8; 2]) -> u16 {
    BigEndian::read_u16(&buf)
}

pub(crate) fn encode_filter(count: u8) -> Result<u8, RangeError> {
    if !(FILTER_MIN..=FILTER_MAX).contains(&count) {
        return Err(RangeError {
            value: count.into(),
            min: FILTER_MIN.into(),
            max: FILTER_MAX.into(),
        });
    }
    Ok(count)
}
