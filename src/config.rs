//! Driver configuration applied at initialization.

use crate::interrupt::InterruptConfig;

/// Lower and upper interrupt thresholds of one subsystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    pub lower: u16,
    pub upper: u16,
}

/// Which threshold crossing the hysteresis applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HysteresisTrigger {
    Lower,
    #[default]
    Upper,
}

/// Hysteresis settings of one subsystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hysteresis {
    pub enabled: bool,
    pub trigger: HysteresisTrigger,
}

/// PS filter counters. An interrupt fires once `m` of the last `n`
/// measurements crossed a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Filter {
    pub n: u8,
    pub m: u8,
}

impl Default for Filter {
    fn default() -> Self {
        Self { n: 1, m: 1 }
    }
}

/// Default timeout for a single register transaction.
pub const DEFAULT_TRANSACTION_TIMEOUT_MS: u32 = 25;

/// NOA3301 configuration.
///
/// Defaults follow the reference board setup: full range ALS thresholds,
/// PS thresholds at 1200/1500 counts, 500 ms ALS and 100 ms PS intervals,
/// 85 mA LED drive and filter 1/1 with hysteresis disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub interrupt: InterruptConfig,
    pub als_thresholds: Thresholds,
    pub ps_thresholds: Thresholds,
    /// Milliseconds, multiple of 50 up to 3150.
    pub als_interval_ms: u16,
    /// Milliseconds, multiple of 5 up to 1275.
    pub ps_interval_ms: u16,
    /// Milliamps, 5 to 160 in steps of 5.
    pub led_current_ma: u16,
    pub ps_filter: Filter,
    pub als_hysteresis: Hysteresis,
    pub ps_hysteresis: Hysteresis,
    /// Upper bound for every single register transaction. With `0` only
    /// transactions that complete on their first poll succeed.
    pub transaction_timeout_ms: u32,
}

impl Config {
    pub const DEFAULT: Self = Self {
        interrupt: InterruptConfig::DEFAULT,
        als_thresholds: Thresholds {
            lower: 0,
            upper: u16::MAX,
        },
        ps_thresholds: Thresholds {
            lower: 1200,
            upper: 1500,
        },
        als_interval_ms: 500,
        ps_interval_ms: 100,
        led_current_ma: 85,
        ps_filter: Filter { n: 1, m: 1 },
        als_hysteresis: Hysteresis {
            enabled: false,
            trigger: HysteresisTrigger::Upper,
        },
        ps_hysteresis: Hysteresis {
            enabled: false,
            trigger: HysteresisTrigger::Upper,
        },
        transaction_timeout_ms: DEFAULT_TRANSACTION_TIMEOUT_MS,
    };

    pub const fn new() -> Self {
        Self::DEFAULT
    }

    #[must_use]
    pub const fn with_interrupt(mut self, interrupt: InterruptConfig) -> Self {
        self.interrupt = interrupt;
        self
    }

    #[must_use]
    pub const fn with_als_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.als_thresholds = thresholds;
        self
    }

    #[must_use]
    pub const fn with_ps_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.ps_thresholds = thresholds;
        self
    }

    #[must_use]
    pub const fn with_als_interval_ms(mut self, ms: u16) -> Self {
        self.als_interval_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_ps_interval_ms(mut self, ms: u16) -> Self {
        self.ps_interval_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_led_current_ma(mut self, ma: u16) -> Self {
        self.led_current_ma = ma;
        self
    }

    #[must_use]
    pub const fn with_ps_filter(mut self, filter: Filter) -> Self {
        self.ps_filter = filter;
        self
    }

    #[must_use]
    pub const fn with_als_hysteresis(mut self, hysteresis: Hysteresis) -> Self {
        self.als_hysteresis = hysteresis;
        self
    }

    #[must_use]
    pub const fn with_ps_hysteresis(mut self, hysteresis: Hysteresis) -> Self {
        self.ps_hysteresis = hysteresis;
        self
    }

    /// Sets the per transaction timeout.
    ///
    /// `0` is accepted and means the bus must answer without ever returning
    /// `Poll::Pending`, anything slower fails with `TransportError::Timeout`.
    #[must_use]
    pub const fn with_transaction_timeout_ms(mut self, ms: u32) -> Self {
        self.transaction_timeout_ms = ms;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
