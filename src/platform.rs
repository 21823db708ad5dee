//! Board hooks invoked by the driver during its lifecycle.

/// Power state requested from the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HwConfig {
    /// Supplies and pins are being brought up before detection.
    pub init: bool,
    /// The chip is measuring.
    pub active: bool,
    /// The chip is idle but configured.
    pub standby: bool,
    /// The chip is being removed.
    pub shutdown: bool,
}

impl HwConfig {
    pub const INIT: Self = Self {
        init: true,
        active: false,
        standby: false,
        shutdown: false,
    };
    pub const ACTIVE: Self = Self {
        init: false,
        active: true,
        standby: false,
        shutdown: false,
    };
    pub const STANDBY: Self = Self {
        init: false,
        active: false,
        standby: true,
        shutdown: false,
    };
    pub const SHUTDOWN: Self = Self {
        init: false,
        active: false,
        standby: false,
        shutdown: true,
    };
}

/// The board could not reserve or release the interrupt GPIO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResourceError(pub i32);

/// Board specific power and GPIO control.
pub trait Platform {
    /// Switches supplies, regulators or pins for the requested state.
    fn hw_config(&mut self, config: HwConfig);

    /// Reserves (`true`) or releases (`false`) the interrupt GPIO.
    fn gpio_setup(&mut self, request: bool) -> Result<i32, ResourceError>;
}

impl<T: Platform + ?Sized> Platform for &mut T {
    fn hw_config(&mut self, config: HwConfig) {
        T::hw_config(self, config)
    }

    fn gpio_setup(&mut self, request: bool) -> Result<i32, ResourceError> {
        T::gpio_setup(self, request)
    }
}
