//! # ON Semiconductor NOA3301 Driver
//!
//! Async driver for the NOA3301 combined proximity (PS) and ambient light
//! (ALS) sensor.
//!
//! The driver is a shared handle: every method takes `&self` and holds an
//! internal mutex for its whole register sequence, so several tasks may use
//! the same instance without interleaving bus transactions. Sixteen bit
//! values are still read with two single byte transactions, a chip side
//! update between them can produce a torn value.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod codec;
mod config;
mod error;
mod interrupt;
mod platform;
mod registers;

pub use crate::codec::{
    RangeError, ALS_INTERVAL_MAX_MS, FILTER_MAX, FILTER_MIN, LED_CURRENT_MAX_MA,
    LED_CURRENT_MIN_MA, PS_INTERVAL_MAX_MS,
};
pub use crate::config::{
    Config, Filter, Hysteresis, HysteresisTrigger, Thresholds, DEFAULT_TRANSACTION_TIMEOUT_MS,
};
pub use crate::error::{Error, InitStep, TransportError};
pub use crate::interrupt::{ClearMode, InterruptConfig, InterruptEvents, Polarity};
pub use crate::platform::{HwConfig, Platform, ResourceError};

use crate::registers::{Field, Register};
use core::future::Future;
use core::result::Result;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::{delay, digital, i2c};

/// Default I2C device address.
pub const DEFAULT_DEVICE_ADDRESS: u8 = 0x54;

/// Measurement subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sensor {
    /// Ambient light.
    Als,
    /// Proximity.
    Ps,
}

/// Threshold bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bound {
    Upper,
    Lower,
}

/// PS filter counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterCounter {
    /// Window length.
    N,
    /// Crossings required within the window.
    M,
}

/// Measurement mode of a subsystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    #[default]
    Standby = 0b00,
    /// Single measurement, the chip returns to standby afterwards.
    OneShot = 0b01,
    /// Periodic measurement at the configured interval.
    Repeat = 0b10,
}

impl Mode {
    fn from_bits(bits: u8) -> Self {
        if bits & Mode::Repeat as u8 != 0 {
            Mode::Repeat
        } else if bits & Mode::OneShot as u8 != 0 {
            Mode::OneShot
        } else {
            Mode::Standby
        }
    }
}

/// Driver lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Detecting,
    Configured,
    Active,
    Removed,
}

/// Snapshot of the driver's view of the chip.
///
/// Parameter fields hold the last value written or read. They are zero until
/// then and again after every soft reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipState {
    pub lifecycle: Lifecycle,
    pub part_id: u8,
    pub revision: u8,
    pub als_interval_ms: u16,
    pub ps_interval_ms: u16,
    pub led_current_ma: u16,
    pub ps_filter: Filter,
    pub als_value: u16,
    pub ps_value: u16,
    pub als_mode: Mode,
    pub ps_mode: Mode,
}

impl ChipState {
    const fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            part_id: 0,
            revision: 0,
            als_interval_ms: 0,
            ps_interval_ms: 0,
            led_current_ma: 0,
            ps_filter: Filter { n: 0, m: 0 },
            als_value: 0,
            ps_value: 0,
            als_mode: Mode::Standby,
            ps_mode: Mode::Standby,
        }
    }

    /// Returns `true` once `initialize` completed and measurements are running.
    pub const fn is_active(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Active)
    }

    /// Forgets cached parameters after the chip returned to its reset defaults.
    fn clear_parameters(&mut self) {
        self.als_interval_ms = 0;
        self.ps_interval_ms = 0;
        self.led_current_ma = 0;
        self.ps_filter = Filter { n: 0, m: 0 };
        self.als_mode = Mode::Standby;
        self.ps_mode = Mode::Standby;
    }

    fn interval_mut(&mut self, sensor: Sensor) -> &mut u16 {
        match sensor {
            Sensor::Als => &mut self.als_interval_ms,
            Sensor::Ps => &mut self.ps_interval_ms,
        }
    }

    fn value_mut(&mut self, sensor: Sensor) -> &mut u16 {
        match sensor {
            Sensor::Als => &mut self.als_value,
            Sensor::Ps => &mut self.ps_value,
        }
    }

    fn mode_mut(&mut self, sensor: Sensor) -> &mut Mode {
        match sensor {
            Sensor::Als => &mut self.als_mode,
            Sensor::Ps => &mut self.ps_mode,
        }
    }

    fn filter_mut(&mut self, counter: FilterCounter) -> &mut u8 {
        match counter {
            FilterCounter::N => &mut self.ps_filter.n,
            FilterCounter::M => &mut self.ps_filter.m,
        }
    }
}

/// State guarded by the per device mutex.
struct Inner<D, DELAY, P> {
    i2c_dev: D,
    delay: DELAY,
    platform: Option<P>,
    gpio_reserved: bool,
    config_applied: bool,
    address: u8,
    config: Config,
    state: ChipState,
}

/// NOA3301 async driver.
pub struct Noa3301<M, D, IRQ, DELAY, P, const DEVICE_ADDRESS: u8 = DEFAULT_DEVICE_ADDRESS>
where
    M: RawMutex,
    D: i2c::I2c,
    IRQ: digital::Wait,
    DELAY: delay::DelayNs,
    P: Platform,
{
    inner: Mutex<M, Inner<D, DELAY, P>>,
    irq_pin: Mutex<M, Option<IRQ>>,
}

impl<M, D, IRQ, DELAY, P, const DEVICE_ADDRESS: u8, I2cErr, PinErr>
    Noa3301<M, D, IRQ, DELAY, P, DEVICE_ADDRESS>
where
    M: RawMutex,
    D: i2c::I2c<Error = I2cErr>,
    IRQ: digital::Wait<Error = PinErr>,
    DELAY: delay::DelayNs,
    P: Platform,
{
    /// Creates a new, undetected NOA3301 driver instance. No bus access is made.
    ///
    /// # Arguments
    /// i2c_dev: The I2C device.
    /// irq_pin: The interrupt pin. If not used, set to `None`.
    /// delay: The delay provider, used for transaction timeouts.
    /// platform: The board hooks. `detect` fails if set to `None`.
    /// config: The configuration applied by `initialize` and `apply_config`.
    ///
    pub fn new(
        i2c_dev: D,
        irq_pin: Option<IRQ>,
        delay: DELAY,
        platform: Option<P>,
        config: Config,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                i2c_dev,
                delay,
                platform,
                gpio_reserved: false,
                config_applied: false,
                address: DEVICE_ADDRESS,
                config,
                state: ChipState::new(),
            }),
            irq_pin: Mutex::new(irq_pin),
        }
    }

    /// Creates a driver, detects the chip, initializes it and applies `config`.
    pub async fn try_new(
        i2c_dev: D,
        irq_pin: Option<IRQ>,
        delay: DELAY,
        platform: Option<P>,
        config: Config,
    ) -> Result<Self, Error<I2cErr, PinErr>> {
        let sensor = Self::new(i2c_dev, irq_pin, delay, platform, config);
        sensor.detect().await?;
        sensor.initialize().await?;
        sensor.apply_config().await?;
        Ok(sensor)
    }

    /// Reads the part id and checks that a NOA3301 is present.
    ///
    /// Returns the chip revision.
    pub async fn detect(&self) -> Result<u8, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        if inner.state.lifecycle != Lifecycle::Uninitialized {
            return Err(Error::Lifecycle(inner.state.lifecycle));
        }

        let Some(platform) = inner.platform.as_mut() else {
            return Err(Error::Configuration);
        };
        platform.gpio_setup(true)?;
        platform.hw_config(HwConfig::INIT);
        inner.gpio_reserved = true;
        inner.state.lifecycle = Lifecycle::Detecting;

        match inner.identify().await {
            Ok(revision) => {
                inner.state.lifecycle = Lifecycle::Configured;
                info!("found NOA3301, revision {=u8}", revision);
                Ok(revision)
            }
            Err(err) => {
                inner.state.lifecycle = Lifecycle::Uninitialized;
                debug!("NOA3301 not found");
                inner.release_gpio();
                Err(err)
            }
        }
    }

    /// Performs a soft reset. All chip registers return to their defaults,
    /// both subsystems stop and the driver drops back to `Configured`.
    ///
    /// The configuration is not written again, see `initialize`.
    pub async fn reset(&self) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        inner
            .write_register(Register::Reset, registers::RESET_PULSE)
            .await?;
        inner.state.clear_parameters();
        inner.state.lifecycle = Lifecycle::Configured;
        Ok(())
    }

    /// Resets the chip, configures the interrupt pin and starts both
    /// subsystems in repeat mode.
    ///
    /// The reset clears every chip register. If `apply_config` ran before, the
    /// configuration is written again before both subsystems start, so a
    /// repeated `initialize` keeps thresholds, intervals, LED current, filter
    /// and hysteresis. The first `initialize` leaves that to `apply_config`.
    ///
    /// On failure the driver stays `Configured`. A failing sequence step is
    /// reported as `Error::Initialize`, a failing configuration write as the
    /// transport error.
    pub async fn initialize(&self) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        inner.state.lifecycle = Lifecycle::Configured;

        let repeat = Mode::Repeat as u8;
        let steps = [
            (InitStep::Reset, Register::Reset, registers::RESET_PULSE),
            (
                InitStep::InterruptConfig,
                Register::IntConfig,
                inner.config.interrupt.to_register(),
            ),
            (
                InitStep::AlsMode,
                Register::AlsControl,
                registers::ALS_MODE.merge(0, repeat),
            ),
            (
                InitStep::PsMode,
                Register::PsControl,
                registers::PS_MODE.merge(0, repeat),
            ),
        ];

        for (step, reg, value) in steps {
            if let Err(source) = inner.write_register(reg, value).await {
                warn!("initialize failed at step {}", step);
                return Err(Error::Initialize { step, source });
            }
            match step {
                InitStep::Reset => {
                    inner.state.clear_parameters();
                    if inner.config_applied {
                        debug!("restoring configuration after reset");
                        inner.write_config::<PinErr>().await?;
                    }
                }
                InitStep::InterruptConfig => {}
                InitStep::AlsMode => inner.state.als_mode = Mode::Repeat,
                InitStep::PsMode => inner.state.ps_mode = Mode::Repeat,
            }
        }

        inner.state.lifecycle = Lifecycle::Active;
        if let Some(platform) = inner.platform.as_mut() {
            platform.hw_config(HwConfig::ACTIVE);
        }
        Ok(())
    }

    /// Writes thresholds, intervals, LED current, filter and hysteresis from
    /// the configuration. Every value is validated before the first write.
    pub async fn apply_config(&self) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        inner.write_config().await
    }

    /// Sets an interrupt threshold.
    pub async fn set_threshold(
        &self,
        sensor: Sensor,
        bound: Bound,
        value: u16,
    ) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        inner
            .write_u16(Register::threshold(sensor, bound), value)
            .await?;
        Ok(())
    }

    /// Reads an interrupt threshold.
    pub async fn get_threshold(
        &self,
        sensor: Sensor,
        bound: Bound,
    ) -> Result<u16, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        Ok(inner.read_u16(Register::threshold(sensor, bound)).await?)
    }

    /// Sets the measurement interval in milliseconds.
    ///
    /// The value is truncated to the interval unit (50 ms ALS, 5 ms PS).
    pub async fn set_interval(
        &self,
        sensor: Sensor,
        interval_ms: u16,
    ) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let scale = codec::interval_scale(sensor);
        let raw = scale.encode(interval_ms)?;
        let field = Field::interval(sensor);
        inner.write_register(field.reg, field.merge(0, raw)).await?;
        *inner.state.interval_mut(sensor) = scale.decode(raw);
        Ok(())
    }

    /// Reads the measurement interval in milliseconds.
    pub async fn get_interval(&self, sensor: Sensor) -> Result<u16, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let raw = inner.read_field(Field::interval(sensor)).await?;
        let interval_ms = codec::interval_scale(sensor).decode(raw);
        *inner.state.interval_mut(sensor) = interval_ms;
        Ok(interval_ms)
    }

    /// Sets the proximity LED drive current in milliamps (5 to 160).
    pub async fn set_led_current(&self, current_ma: u16) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let raw = codec::LED_CURRENT_MA.encode(current_ma)?;
        inner
            .write_register(
                Register::PsLedCurrent,
                registers::PS_LED_CURRENT.merge(0, raw),
            )
            .await?;
        inner.state.led_current_ma = codec::LED_CURRENT_MA.decode(raw);
        Ok(())
    }

    /// Reads the proximity LED drive current in milliamps.
    pub async fn get_led_current(&self) -> Result<u16, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let raw = inner.read_field(registers::PS_LED_CURRENT).await?;
        let current_ma = codec::LED_CURRENT_MA.decode(raw);
        inner.state.led_current_ma = current_ma;
        Ok(current_ma)
    }

    /// Sets one PS filter counter (1 to 15), keeping the other one.
    pub async fn set_filter(
        &self,
        counter: FilterCounter,
        count: u8,
    ) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let count = codec::encode_filter(count)?;
        inner.write_field(Field::filter(counter), count).await?;
        *inner.state.filter_mut(counter) = count;
        Ok(())
    }

    /// Reads one PS filter counter.
    pub async fn get_filter(&self, counter: FilterCounter) -> Result<u8, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let count = inner.read_field(Field::filter(counter)).await?;
        *inner.state.filter_mut(counter) = count;
        Ok(count)
    }

    /// Configures threshold hysteresis.
    pub async fn set_hysteresis(
        &self,
        sensor: Sensor,
        hysteresis: Hysteresis,
    ) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        inner.write_hysteresis(sensor, hysteresis).await?;
        Ok(())
    }

    /// Reads the threshold hysteresis configuration from the chip.
    ///
    /// Hysteresis is not part of `ChipState`, so nothing is cached here.
    pub async fn get_hysteresis(
        &self,
        sensor: Sensor,
    ) -> Result<Hysteresis, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let (enable, trigger) = Field::hysteresis(sensor);
        let raw = inner.read_register(enable.reg).await?;
        Ok(Hysteresis {
            enabled: enable.extract(raw) != 0,
            trigger: if trigger.extract(raw) != 0 {
                HysteresisTrigger::Upper
            } else {
                HysteresisTrigger::Lower
            },
        })
    }

    /// Sets the measurement mode. `Mode::OneShot` triggers a single measurement.
    pub async fn set_mode(&self, sensor: Sensor, mode: Mode) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let field = Field::mode(sensor);
        inner
            .write_register(field.reg, field.merge(0, mode as u8))
            .await?;
        *inner.state.mode_mut(sensor) = mode;
        Ok(())
    }

    /// Reads the measurement mode.
    pub async fn get_mode(&self, sensor: Sensor) -> Result<Mode, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let mode = Mode::from_bits(inner.read_field(Field::mode(sensor)).await?);
        *inner.state.mode_mut(sensor) = mode;
        Ok(mode)
    }

    /// Stops both subsystems. `initialize` starts them again.
    pub async fn standby(&self) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        for sensor in [Sensor::Als, Sensor::Ps] {
            let field = Field::mode(sensor);
            inner
                .write_register(field.reg, field.merge(0, Mode::Standby as u8))
                .await?;
            *inner.state.mode_mut(sensor) = Mode::Standby;
        }
        inner.state.lifecycle = Lifecycle::Configured;
        if let Some(platform) = inner.platform.as_mut() {
            platform.hw_config(HwConfig::STANDBY);
        }
        Ok(())
    }

    /// Reads the latest measurement result.
    ///
    /// The cached value is only updated when both bytes were read.
    pub async fn read_measurement(&self, sensor: Sensor) -> Result<u16, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let value = inner.read_u16(Register::data(sensor)).await?;
        *inner.state.value_mut(sensor) = value;
        trace!("{} = {=u16}", sensor, value);
        Ok(value)
    }

    /// Returns the last measurement read, without bus access.
    pub async fn cached_measurement(&self, sensor: Sensor) -> Result<u16, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        Ok(*inner.state.value_mut(sensor))
    }

    /// Returns a snapshot of the cached chip state.
    pub async fn state(&self) -> ChipState {
        self.inner.lock().await.state
    }

    /// Reads and decodes the interrupt status register.
    ///
    /// Call this when the interrupt line is asserted. With `ClearMode::Manual`
    /// the latched flags are cleared before the guard is released.
    pub async fn handle_interrupt(&self) -> Result<InterruptEvents, Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        inner.ensure_detected()?;
        let status = inner.read_register(Register::Interrupt).await?;
        let events = InterruptEvents::decode(status);
        debug!("interrupt status {=u8:#x}", status);

        if inner.config.interrupt.clear_mode == ClearMode::Manual && !events.is_empty() {
            inner.write_register(Register::Interrupt, 0x00).await?;
        }
        Ok(events)
    }

    /// Waits for the interrupt pin to assert, then handles the interrupt.
    pub async fn wait_for_events(&self) -> Result<InterruptEvents, Error<I2cErr, PinErr>> {
        let polarity = {
            let inner = self.inner.lock().await;
            inner.ensure_detected()?;
            inner.config.interrupt.polarity
        };

        {
            let mut irq_pin = self.irq_pin.lock().await;
            let Some(pin) = irq_pin.as_mut() else {
                return Err(Error::Configuration);
            };
            match polarity {
                Polarity::ActiveLow => pin.wait_for_low().await,
                Polarity::ActiveHigh => pin.wait_for_high().await,
            }
            .map_err(Error::Pin)?;
        }

        self.handle_interrupt().await
    }

    /// Shuts the device down. Every later operation fails with
    /// `Error::Lifecycle(Lifecycle::Removed)`.
    pub async fn remove(&self) -> Result<(), Error<I2cErr, PinErr>> {
        let mut inner = self.inner.lock().await;
        if inner.state.lifecycle == Lifecycle::Removed {
            return Err(Error::Lifecycle(Lifecycle::Removed));
        }
        inner.state.lifecycle = Lifecycle::Removed;
        info!("NOA3301 removed");

        if let Some(platform) = inner.platform.as_mut() {
            platform.hw_config(HwConfig::SHUTDOWN);
        }
        if inner.gpio_reserved {
            inner.gpio_reserved = false;
            if let Some(platform) = inner.platform.as_mut() {
                platform.gpio_setup(false)?;
            }
        }
        Ok(())
    }

    /// Destroys the driver, returning the bus, pin, delay and platform.
    pub fn release(self) -> (D, Option<IRQ>, DELAY, Option<P>) {
        let inner = self.inner.into_inner();
        (
            inner.i2c_dev,
            self.irq_pin.into_inner(),
            inner.delay,
            inner.platform,
        )
    }
}

impl<D, DELAY, P, I2cErr> Inner<D, DELAY, P>
where
    D: i2c::I2c<Error = I2cErr>,
    DELAY: delay::DelayNs,
    P: Platform,
{
    /// Parameter and measurement access needs a detected, not removed chip.
    fn ensure_detected(&self) -> Result<(), Lifecycle> {
        match self.state.lifecycle {
            Lifecycle::Configured | Lifecycle::Active => Ok(()),
            other => Err(other),
        }
    }

    /// Reads the part id and records it in the chip state.
    async fn identify<PinErr>(&mut self) -> Result<u8, Error<I2cErr, PinErr>> {
        let part_id = self.read_register(Register::PartId).await?;
        self.state.part_id = part_id;
        self.state.revision = registers::REVISION.extract(part_id);
        if registers::PART.extract(part_id) != registers::PART_CODE {
            return Err(Error::DeviceNotFound { part_id });
        }
        Ok(self.state.revision)
    }

    fn release_gpio(&mut self) {
        if !self.gpio_reserved {
            return;
        }
        self.gpio_reserved = false;
        if let Some(platform) = self.platform.as_mut() {
            if platform.gpio_setup(false).is_err() {
                warn!("failed to release interrupt GPIO");
            }
        }
    }

    async fn write_config<PinErr>(&mut self) -> Result<(), Error<I2cErr, PinErr>> {
        let config = self.config;

        let als_interval = codec::ALS_INTERVAL_MS.encode(config.als_interval_ms)?;
        let ps_interval = codec::PS_INTERVAL_MS.encode(config.ps_interval_ms)?;
        let led_current = codec::LED_CURRENT_MA.encode(config.led_current_ma)?;
        let filter_n = codec::encode_filter(config.ps_filter.n)?;
        let filter_m = codec::encode_filter(config.ps_filter.m)?;

        for (sensor, thresholds) in [
            (Sensor::Als, config.als_thresholds),
            (Sensor::Ps, config.ps_thresholds),
        ] {
            self.write_u16(Register::threshold(sensor, Bound::Upper), thresholds.upper)
                .await?;
            self.write_u16(Register::threshold(sensor, Bound::Lower), thresholds.lower)
                .await?;
        }

        self.write_register(
            Register::AlsInterval,
            registers::ALS_INTERVAL.merge(0, als_interval),
        )
        .await?;
        self.state.als_interval_ms = codec::ALS_INTERVAL_MS.decode(als_interval);
        self.write_register(
            Register::PsInterval,
            registers::PS_INTERVAL.merge(0, ps_interval),
        )
        .await?;
        self.state.ps_interval_ms = codec::PS_INTERVAL_MS.decode(ps_interval);

        self.write_register(
            Register::PsLedCurrent,
            registers::PS_LED_CURRENT.merge(0, led_current),
        )
        .await?;
        self.state.led_current_ma = codec::LED_CURRENT_MA.decode(led_current);

        let filter = registers::PS_FILTER_N.merge(0, filter_n);
        let filter = registers::PS_FILTER_M.merge(filter, filter_m);
        self.write_register(Register::PsFilterConfig, filter).await?;
        self.state.ps_filter = config.ps_filter;

        self.write_hysteresis(Sensor::Als, config.als_hysteresis)
            .await?;
        self.write_hysteresis(Sensor::Ps, config.ps_hysteresis)
            .await?;
        self.config_applied = true;
        Ok(())
    }

    async fn write_hysteresis(
        &mut self,
        sensor: Sensor,
        hysteresis: Hysteresis,
    ) -> Result<(), TransportError<I2cErr>> {
        let (enable, trigger) = Field::hysteresis(sensor);
        let raw = self.read_register(enable.reg).await?;
        let raw = enable.merge(raw, hysteresis.enabled as u8);
        let raw = trigger.merge(
            raw,
            (hysteresis.trigger == HysteresisTrigger::Upper) as u8,
        );
        self.write_register(enable.reg, raw).await
    }

    /// Reads a field from a register.
    async fn read_field(&mut self, field: Field) -> Result<u8, TransportError<I2cErr>> {
        Ok(field.extract(self.read_register(field.reg).await?))
    }

    /// Updates a field, preserving the rest of the register.
    async fn write_field(&mut self, field: Field, value: u8) -> Result<(), TransportError<I2cErr>> {
        let raw = self.read_register(field.reg).await?;
        self.write_register(field.reg, field.merge(raw, value))
            .await
    }

    /// Reads a big endian value from an MSB/LSB register pair, MSB first.
    async fn read_u16(
        &mut self,
        (msb, lsb): (Register, Register),
    ) -> Result<u16, TransportError<I2cErr>> {
        let high = self.read_register(msb).await?;
        let low = self.read_register(lsb).await?;
        Ok(codec::decode_u16([high, low]))
    }

    /// Writes a big endian value to an MSB/LSB register pair, MSB first.
    async fn write_u16(
        &mut self,
        (msb, lsb): (Register, Register),
        value: u16,
    ) -> Result<(), TransportError<I2cErr>> {
        let [high, low] = codec::encode_u16(value);
        self.write_register(msb, high).await?;
        self.write_register(lsb, low).await
    }

    /// Reads a single register from the NOA3301.
    async fn read_register(&mut self, reg: Register) -> Result<u8, TransportError<I2cErr>> {
        let mut buf = [0u8];
        with_timeout(
            &mut self.delay,
            self.config.transaction_timeout_ms,
            self.i2c_dev
                .write_read(self.address, &[reg.addr()], &mut buf),
        )
        .await?;
        Ok(buf[0])
    }

    /// Writes a value to a single register.
    async fn write_register(
        &mut self,
        reg: Register,
        value: u8,
    ) -> Result<(), TransportError<I2cErr>> {
        with_timeout(
            &mut self.delay,
            self.config.transaction_timeout_ms,
            self.i2c_dev.write(self.address, &[reg.addr(), value]),
        )
        .await
    }
}

/// Races a bus transaction against the timeout.
async fn with_timeout<DELAY, F, T, E>(
    delay: &mut DELAY,
    timeout_ms: u32,
    transaction: F,
) -> Result<T, TransportError<E>>
where
    DELAY: delay::DelayNs,
    F: Future<Output = Result<T, E>>,
{
    match select(transaction, delay.delay_ms(timeout_ms)).await {
        Either::First(result) => result.map_err(TransportError::Bus),
        Either::Second(()) => Err(TransportError::Timeout),
    }
}
