#![allow(dead_code)]

use crate::{Bound, FilterCounter, Sensor};

/// Represents the register addresses in the NOA3301.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Register {
    /// Part number (upper nibble) and revision (lower nibble).
    PartId = 0x00,
    /// Software reset.
    Reset = 0x01,
    /// Interrupt pin configuration.
    IntConfig = 0x02,
    /// Proximity LED drive current.
    PsLedCurrent = 0x0F,
    /// Proximity upper threshold MSB
    PsThUpMsb = 0x10,
    /// Proximity upper threshold LSB
    PsThUpLsb,
    /// Proximity lower threshold MSB
    PsThLoMsb,
    /// Proximity lower threshold LSB
    PsThLoLsb,
    /// Proximity filter N/M counters.
    PsFilterConfig = 0x14,
    /// Proximity hysteresis configuration.
    PsConfig,
    /// Proximity measurement interval.
    PsInterval,
    /// Proximity measurement control.
    PsControl,
    /// Ambient light upper threshold MSB
    AlsThUpMsb = 0x20,
    /// Ambient light upper threshold LSB
    AlsThUpLsb,
    /// Ambient light lower threshold MSB
    AlsThLoMsb,
    /// Ambient light lower threshold LSB
    AlsThLoLsb,
    /// Ambient light hysteresis configuration.
    AlsConfig = 0x25,
    /// Ambient light measurement interval.
    AlsInterval,
    /// Ambient light measurement control.
    AlsControl,
    /// Interrupt status.
    Interrupt = 0x40,
    /// Proximity result MSB
    PsDataMsb,
    /// Proximity result LSB
    PsDataLsb,
    /// Ambient light result MSB
    AlsDataMsb,
    /// Ambient light result LSB
    AlsDataLsb,
}

impl Register {
    /// Physical bus address of the register.
    pub(crate) const fn addr(self) -> u8 {
        self as u8
    }

    /// MSB and LSB registers holding a threshold.
    pub(crate) const fn threshold(sensor: Sensor, bound: Bound) -> (Self, Self) {
        match (sensor, bound) {
            (Sensor::Als, Bound::Upper) => (Self::AlsThUpMsb, Self::AlsThUpLsb),
            (Sensor::Als, Bound::Lower) => (Self::AlsThLoMsb, Self::AlsThLoLsb),
            (Sensor::Ps, Bound::Upper) => (Self::PsThUpMsb, Self::PsThUpLsb),
            (Sensor::Ps, Bound::Lower) => (Self::PsThLoMsb, Self::PsThLoLsb),
        }
    }

    /// MSB and LSB registers holding the latest measurement.
    pub(crate) const fn data(sensor: Sensor) -> (Self, Self) {
        match sensor {
            Sensor::Als => (Self::AlsDataMsb, Self::AlsDataLsb),
            Sensor::Ps => (Self::PsDataMsb, Self::PsDataLsb),
        }
    }
}

/// A bit range inside a single register.
///
/// `mask` is right aligned, the field occupies `mask << shift` in the raw byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Field {
    pub(crate) reg: Register,
    mask: u8,
    shift: u8,
}

impl Field {
    const fn new(reg: Register, mask: u8, shift: u8) -> Self {
        Self { reg, mask, shift }
    }

    /// Largest value the field can hold.
    pub(crate) const fn max(self) -> u8 {
        self.mask
    }

    /// Bits occupied by the field within the register.
    pub(crate) const fn bits(self) -> u8 {
        self.mask << self.shift
    }

    /// Reads the field out of a raw register value.
    pub(crate) const fn extract(self, raw: u8) -> u8 {
        (raw >> self.shift) & self.mask
    }

    /// Replaces the field in `raw`, leaving every other bit untouched.
    pub(crate) const fn merge(self, raw: u8, value: u8) -> u8 {
        (raw & !self.bits()) | ((value & self.mask) << self.shift)
    }

    /// Interval field of the given subsystem.
    ///
    /// ALS uses the 6 bit layout (63 * 50 ms).
    pub(crate) const fn interval(sensor: Sensor) -> Self {
        match sensor {
            Sensor::Als => ALS_INTERVAL,
            Sensor::Ps => PS_INTERVAL,
        }
    }

    pub(crate) const fn mode(sensor: Sensor) -> Self {
        match sensor {
            Sensor::Als => ALS_MODE,
            Sensor::Ps => PS_MODE,
        }
    }

    pub(crate) const fn filter(counter: FilterCounter) -> Self {
        match counter {
            FilterCounter::N => PS_FILTER_N,
            FilterCounter::M => PS_FILTER_M,
        }
    }

    /// Hysteresis enable and trigger fields of the given subsystem.
    pub(crate) const fn hysteresis(sensor: Sensor) -> (Self, Self) {
        match sensor {
            Sensor::Als => (ALS_HYST_ENABLE, ALS_HYST_TRIGGER),
            Sensor::Ps => (PS_HYST_ENABLE, PS_HYST_TRIGGER),
        }
    }
}

pub(crate) const PART: Field = Field::new(Register::PartId, 0x0f, 4);
pub(crate) const REVISION: Field = Field::new(Register::PartId, 0x0f, 0);

pub(crate) const INT_ACTIVE_HIGH: Field = Field::new(Register::IntConfig, 0x01, 0);
pub(crate) const INT_AUTO_CLEAR: Field = Field::new(Register::IntConfig, 0x01, 1);

pub(crate) const PS_LED_CURRENT: Field = Field::new(Register::PsLedCurrent, 0x1f, 0);
pub(crate) const PS_FILTER_N: Field = Field::new(Register::PsFilterConfig, 0x0f, 4);
pub(crate) const PS_FILTER_M: Field = Field::new(Register::PsFilterConfig, 0x0f, 0);
pub(crate) const PS_HYST_ENABLE: Field = Field::new(Register::PsConfig, 0x01, 5);
pub(crate) const PS_HYST_TRIGGER: Field = Field::new(Register::PsConfig, 0x01, 4);
pub(crate) const PS_INTERVAL: Field = Field::new(Register::PsInterval, 0xff, 0);
pub(crate) const PS_MODE: Field = Field::new(Register::PsControl, 0x03, 0);

pub(crate) const ALS_HYST_ENABLE: Field = Field::new(Register::AlsConfig, 0x01, 5);
pub(crate) const ALS_HYST_TRIGGER: Field = Field::new(Register::AlsConfig, 0x01, 4);
pub(crate) const ALS_INTERVAL: Field = Field::new(Register::AlsInterval, 0x3f, 0);
pub(crate) const ALS_MODE: Field = Field::new(Register::AlsControl, 0x03, 0);

/// Trait for register bit manipulation.
pub(crate) trait RegisterBit {
    fn mask(&self) -> u8;
}

/// Bit definitions for the `Interrupt` status register.
#[derive(Clone, Copy)]
#[repr(u8)]
pub(crate) enum Interrupt {
    /// Proximity result below the lower threshold.
    PsLo = 0,
    /// Proximity result above the upper threshold.
    PsHi,
    /// Ambient light result below the lower threshold.
    AlsLo,
    /// Ambient light result above the upper threshold.
    AlsHi,
    /// Interrupt pin is asserted.
    Asserted,
}

impl RegisterBit for Interrupt {
    fn mask(&self) -> u8 {
        1 << *self as u8
    }
}

/// Value written to `Reset` to trigger a soft reset.
pub(crate) const RESET_PULSE: u8 = 0x01;

/// Expected value of the `PART` field.
pub(crate) const PART_CODE: u8 = 0x09;
