//! Interrupt configuration and status decoding.

use crate::registers::{self, Interrupt, RegisterBit};

/// Threshold events latched in the interrupt status register.
///
/// Flags are independent, any combination may be reported by a single read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptEvents {
    /// Ambient light crossed the upper threshold.
    pub als_high: bool,
    /// Ambient light crossed the lower threshold.
    pub als_low: bool,
    /// Proximity crossed the upper threshold.
    pub ps_high: bool,
    /// Proximity crossed the lower threshold.
    pub ps_low: bool,
}

impl InterruptEvents {
    /// Decodes a raw status byte. Bits other than the four event flags are ignored.
    pub fn decode(status: u8) -> Self {
        Self {
            als_high: status & Interrupt::AlsHi.mask() != 0,
            als_low: status & Interrupt::AlsLo.mask() != 0,
            ps_high: status & Interrupt::PsHi.mask() != 0,
            ps_low: status & Interrupt::PsLo.mask() != 0,
        }
    }

    /// Returns `true` when no event is set.
    pub const fn is_empty(&self) -> bool {
        !(self.als_high || self.als_low || self.ps_high || self.ps_low)
    }
}

/// Electrical level of the asserted interrupt pin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Pin is driven low while an interrupt is pending.
    #[default]
    ActiveLow,
    /// Pin is driven high while an interrupt is pending.
    ActiveHigh,
}

/// How latched interrupt flags are released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClearMode {
    /// The driver clears the status register after reading it.
    #[default]
    Manual,
    /// The chip clears the status register when it is read.
    Auto,
}

/// Interrupt pin configuration (INT_CONFIG), applied by `initialize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptConfig {
    /// Pin polarity.
    pub polarity: Polarity,
    /// Flag clearing strategy.
    pub clear_mode: ClearMode,
}

impl InterruptConfig {
    /// Active low pin, cleared by the driver.
    pub const DEFAULT: Self = Self {
        polarity: Polarity::ActiveLow,
        clear_mode: ClearMode::Manual,
    };

    /// Creates a new interrupt configuration.
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Sets the pin polarity.
    #[must_use]
    pub const fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Sets the clearing strategy.
    #[must_use]
    pub const fn with_clear_mode(mut self, clear_mode: ClearMode) -> Self {
        self.clear_mode = clear_mode;
        self
    }

    pub(crate) const fn to_register(self) -> u8 {
        let raw = registers::INT_ACTIVE_HIGH.merge(
            0,
            matches!(self.polarity, Polarity::ActiveHigh) as u8,
        );
        registers::INT_AUTO_CLEAR.merge(raw, matches!(self.clear_mode, ClearMode::Auto) as u8)
    }
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
