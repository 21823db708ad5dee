//! Errors that can occur when using the NOA3301 driver.

use crate::codec::RangeError;
use crate::platform::ResourceError;
use crate::Lifecycle;

/// A single register transaction failed.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<I2cErr> {
    /// The I2C implementation reported an error.
    Bus(I2cErr),
    /// The transaction did not complete within the configured timeout.
    Timeout,
}

/// Steps of the initialization sequence, in execution order.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitStep {
    Reset,
    InterruptConfig,
    AlsMode,
    PsMode,
}

impl InitStep {
    /// One based position of the step in the sequence.
    pub const fn index(self) -> u8 {
        self as u8 + 1
    }
}

/// Errors that can occur when using the NOA3301 driver.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<I2cErr, PinErr> {
    /// A register transaction failed.
    Transport(TransportError<I2cErr>),
    /// The interrupt pin reported an error.
    Pin(PinErr),
    /// A parameter was rejected before touching the bus.
    Range(RangeError),
    /// The part id register did not identify a NOA3301.
    DeviceNotFound { part_id: u8 },
    /// The operation is not valid in the current lifecycle state.
    Lifecycle(Lifecycle),
    /// Platform hooks or the interrupt pin were not provided.
    Configuration,
    /// The platform failed to reserve or release the interrupt GPIO.
    Resource(ResourceError),
    /// `initialize` stopped at `step`.
    Initialize {
        step: InitStep,
        source: TransportError<I2cErr>,
    },
}

impl<I2cErr, PinErr> From<TransportError<I2cErr>> for Error<I2cErr, PinErr> {
    fn from(err: TransportError<I2cErr>) -> Self {
        Error::Transport(err)
    }
}

impl<I2cErr, PinErr> From<RangeError> for Error<I2cErr, PinErr> {
    fn from(err: RangeError) -> Self {
        Error::Range(err)
    }
}

impl<I2cErr, PinErr> From<ResourceError> for Error<I2cErr, PinErr> {
    fn from(err: ResourceError) -> Self {
        Error::Resource(err)
    }
}

impl<I2cErr, PinErr> From<Lifecycle> for Error<I2cErr, PinErr> {
    fn from(state: Lifecycle) -> Self {
        Error::Lifecycle(state)
    }
}
