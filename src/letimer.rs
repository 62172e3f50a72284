/*!
  # Low Energy Timer

  LETIMER0 is a 24-bit down counter clocked from EM23GRPACLK, so it keeps running in EM2 and
  EM3. On every underflow it reloads from `TOP` and can act on its two outputs; those
  outputs reach pins only through the PRS.

  ## Example
  ```ignore
  let config = letimer::Config::default()
      .top_value(clocks.em23grpaclk().0 / 2)
      .ufoa0(UnderflowAction::Toggle);
  let timer = Letimer::new(dp.letimer0_s, config, &clocks, &cmu);
  ```
*/

use crate::{
    clock::{ClockGate, Clocks, Cmu},
    pac::{
        self,
        letimer0_s::{
            self,
            ctrl::{Buftop, Cnttopen, Debugrun, Repmode, Ufoa0, Ufoa1},
        },
    },
};
use embedded_time::{duration::Microseconds, rate::Hertz};

/// Largest value `TOP` can hold
pub const MAX_TOP: u32 = 0x00FF_FFFF;

/// What the counter does once it has been started
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RepeatMode {
    /// Count until stopped
    Free,
    /// Count REP0 underflows, then stop
    OneShot,
    /// Count REP0 underflows, reload REP0 from REP1 if it was written, else stop
    Buffered,
    /// Count until both REP0 and REP1 reach zero
    Double,
}

impl From<RepeatMode> for Repmode {
    fn from(mode: RepeatMode) -> Self {
        match mode {
            RepeatMode::Free => Repmode::Free,
            RepeatMode::OneShot => Repmode::Oneshot,
            RepeatMode::Buffered => Repmode::Buffered,
            RepeatMode::Double => Repmode::Double,
        }
    }
}

/// Output action on counter underflow
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnderflowAction {
    /// Output is left at its idle level
    None,
    /// Output inverts
    Toggle,
    /// Output is active for one clock cycle
    Pulse,
    /// Output goes active on underflow and idle on COMP1 match
    Pwm,
}

impl From<UnderflowAction> for Ufoa0 {
    fn from(action: UnderflowAction) -> Self {
        match action {
            UnderflowAction::None => Ufoa0::None,
            UnderflowAction::Toggle => Ufoa0::Toggle,
            UnderflowAction::Pulse => Ufoa0::Pulse,
            UnderflowAction::Pwm => Ufoa0::Pwm,
        }
    }
}

impl From<UnderflowAction> for Ufoa1 {
    fn from(action: UnderflowAction) -> Self {
        match action {
            UnderflowAction::None => Ufoa1::None,
            UnderflowAction::Toggle => Ufoa1::Toggle,
            UnderflowAction::Pulse => Ufoa1::Pulse,
            UnderflowAction::Pwm => Ufoa1::Pwm,
        }
    }
}

/// LETIMER initialization record
///
/// `Config::default()` starts the timer right away, reloads from `TOP` on underflow, counts
/// freely and leaves both outputs idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Start counting once configured
    pub enable: bool,
    /// Keep counting while the core is halted by a debugger
    pub debug_run: bool,
    /// Reload from `TOP` on underflow instead of wrapping to [`MAX_TOP`]
    pub comp0_top: bool,
    /// Reload `TOP` from `TOPBUFF` when REP0 reaches zero
    pub buf_top: bool,
    /// Idle level of output 0 is high
    pub out0_pol: bool,
    /// Idle level of output 1 is high
    pub out1_pol: bool,
    pub ufoa0: UnderflowAction,
    pub ufoa1: UnderflowAction,
    pub repeat_mode: RepeatMode,
    /// Reload value, in EM23GRPACLK ticks
    pub top_value: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enable: true,
            debug_run: false,
            comp0_top: true,
            buf_top: false,
            out0_pol: false,
            out1_pol: false,
            ufoa0: UnderflowAction::None,
            ufoa1: UnderflowAction::None,
            repeat_mode: RepeatMode::Free,
            top_value: 0,
        }
    }
}

impl Config {
    pub fn top_value(mut self, top: u32) -> Self {
        self.top_value = top;
        self
    }

    pub fn ufoa0(mut self, action: UnderflowAction) -> Self {
        self.ufoa0 = action;
        self
    }

    pub fn ufoa1(mut self, action: UnderflowAction) -> Self {
        self.ufoa1 = action;
        self
    }

    pub fn repeat_mode(mut self, mode: RepeatMode) -> Self {
        self.repeat_mode = mode;
        self
    }

    pub fn enable(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }

    pub fn debug_run(mut self, debug_run: bool) -> Self {
        self.debug_run = debug_run;
        self
    }

    fn write_ctrl<'w>(&self, w: &'w mut letimer0_s::ctrl::W) -> &'w mut letimer0_s::ctrl::W {
        w.repmode()
            .variant(self.repeat_mode.into())
            .ufoa0()
            .variant(self.ufoa0.into())
            .ufoa1()
            .variant(self.ufoa1.into())
            .opol0()
            .bit(self.out0_pol)
            .opol1()
            .bit(self.out1_pol)
            .buftop()
            .variant(if self.buf_top { Buftop::Enable } else { Buftop::Disable })
            .cnttopen()
            .variant(if self.comp0_top { Cnttopen::Enable } else { Cnttopen::Disable })
            .debugrun()
            .variant(if self.debug_run { Debugrun::Enable } else { Debugrun::Disable })
    }
}

/// A configured LETIMER0
pub struct Letimer {
    rb: &'static letimer0_s::RegisterBlock,
    clock: Hertz,
}

impl Letimer {
    /// Programs LETIMER0 from `config`, starting it if `config.enable` is set.
    ///
    /// # Panics
    ///
    /// If the LETIMER0 clock gate is closed, or `config.top_value` exceeds [`MAX_TOP`].
    pub fn new(_letimer: pac::Letimer0S, config: Config, clocks: &Clocks, cmu: &Cmu) -> Self {
        Self::with_block(unsafe { &*pac::Letimer0S::ptr() }, config, clocks, cmu)
    }

    pub(crate) fn with_block(
        rb: &'static letimer0_s::RegisterBlock,
        config: Config,
        clocks: &Clocks,
        cmu: &Cmu,
    ) -> Self {
        cmu.assert_enabled(ClockGate::Letimer0);
        if config.top_value > MAX_TOP {
            panic!("unreachable LETIMER top value");
        }

        let timer = Letimer {
            rb,
            clock: clocks.em23grpaclk(),
        };

        // CTRL only accepts writes while the module is disabled
        timer.rb.en().write(|w| w.en().clear_bit());
        timer.rb.ctrl().write(|w| config.write_ctrl(w));
        timer.rb.en().write(|w| w.en().set_bit());

        timer.set_top(config.top_value);
        if config.enable {
            timer.start();
        }
        debug!(
            "LETIMER0: top {}, ufoa0 {}, clock {} Hz",
            config.top_value,
            config.ufoa0,
            timer.clock.0
        );
        timer
    }

    fn sync(&self) {
        while self.rb.syncbusy().read().bits() != 0 {}
    }

    pub fn start(&self) {
        self.sync();
        self.rb.cmd().write(|w| w.start().set_bit());
        self.sync();
    }

    pub fn stop(&self) {
        self.sync();
        self.rb.cmd().write(|w| w.stop().set_bit());
        self.sync();
    }

    pub fn is_running(&self) -> bool {
        self.rb.status().read().running().bit_is_set()
    }

    /// Current counter value in raw ticks
    pub fn counter(&self) -> u32 {
        self.rb.cnt().read().cnt().bits()
    }

    pub fn top(&self) -> u32 {
        self.rb.top().read().top().bits()
    }

    /// Changes the reload value; takes effect at the next underflow.
    ///
    /// # Panics
    ///
    /// If `top` exceeds [`MAX_TOP`].
    pub fn set_top(&self, top: u32) {
        if top > MAX_TOP {
            panic!("unreachable LETIMER top value");
        }
        self.sync();
        self.rb.top().write(|w| unsafe { w.top().bits(top) });
        self.sync();
    }

    /// Frequency the counter decrements at
    pub const fn clock(&self) -> Hertz {
        self.clock
    }

    /// Ticks between two underflows
    pub fn underflow_period_ticks(&self) -> u32 {
        if self.rb.ctrl().read().cnttopen().is_enable() {
            self.top() + 1
        } else {
            MAX_TOP + 1
        }
    }

    /// Time between two underflows, which is one half period of a toggling output
    pub fn underflow_period(&self) -> Microseconds {
        let ticks = self.underflow_period_ticks() as u64;
        Microseconds::new((ticks * 1_000_000 / self.clock.0 as u64) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{self, LfClockSource};
    use crate::mock::Device;
    use embedded_time::rate::Extensions;

    fn setup(dev: &Device, gate: bool) -> (Cmu, Clocks) {
        let mut cmu = dev.cmu();
        let clocks = clock::Config::new()
            .lfxo(32_768_u32.Hz())
            .em23grpa_clk(LfClockSource::Lfxo)
            .freeze(&mut cmu);
        if gate {
            cmu.enable(ClockGate::Letimer0);
        }
        (cmu, clocks)
    }

    fn letimer(dev: &Device, config: Config, clocks: &Clocks, cmu: &Cmu) -> Letimer {
        Letimer::with_block(dev.letimer0, config, clocks, cmu)
    }

    #[test]
    fn default_config_counts_from_top() {
        let config = Config::default();
        assert!(config.enable);
        assert!(config.comp0_top);
        assert_eq!(config.ufoa0, UnderflowAction::None);

        let dev = Device::new();
        dev.letimer0.ctrl().write(|w| config.write_ctrl(w));
        assert_eq!(dev.letimer0.ctrl().read().bits(), 1 << 9);
    }

    #[test]
    fn toggle_on_underflow_at_half_clock() {
        let dev = Device::new();
        let (cmu, clocks) = setup(&dev, true);
        let config = Config::default()
            .top_value(clocks.em23grpaclk().0 / 2)
            .ufoa0(UnderflowAction::Toggle);
        let timer = letimer(&dev, config, &clocks, &cmu);

        assert_eq!(dev.letimer0.top().read().bits(), 16_384);
        assert_eq!(dev.letimer0.ctrl().read().bits(), (1 << 9) | (1 << 2));
        assert!(dev.letimer0.ctrl().read().ufoa0().is_toggle());
        assert!(dev.letimer0.en().read().en().bit_is_set());
        assert_eq!(Device::written(dev.letimer0.cmd()), 1);
        assert_eq!(timer.clock(), Hertz(32_768_u32));
        assert_eq!(timer.underflow_period_ticks(), 16_385);
        assert_eq!(timer.underflow_period(), Microseconds(500_030_u32));
    }

    #[test]
    fn disabled_config_is_not_started() {
        let dev = Device::new();
        let (cmu, clocks) = setup(&dev, true);
        let config = Config::default()
            .enable(false)
            .debug_run(true)
            .repeat_mode(RepeatMode::OneShot)
            .ufoa1(UnderflowAction::Pulse)
            .top_value(100);
        let timer = letimer(&dev, config, &clocks, &cmu);

        assert_eq!(Device::written(dev.letimer0.cmd()), 0);
        assert_eq!(
            dev.letimer0.ctrl().read().bits(),
            (1 << 12) | (1 << 9) | (2 << 4) | 1
        );
        timer.stop();
        assert_eq!(Device::written(dev.letimer0.cmd()), 1 << 1);
    }

    #[test]
    fn output_polarity_sets_idle_level() {
        let dev = Device::new();
        let (cmu, clocks) = setup(&dev, true);
        let mut config = Config::default().top_value(10);
        config.out0_pol = true;
        config.out1_pol = true;
        config.buf_top = true;
        let _timer = letimer(&dev, config, &clocks, &cmu);
        let ctrl = dev.letimer0.ctrl().read();
        assert!(ctrl.opol0().bit_is_set());
        assert!(ctrl.opol1().bit_is_set());
        assert!(ctrl.buftop().is_enable());
    }

    #[test]
    fn free_running_without_top_wraps_at_max() {
        let dev = Device::new();
        let (cmu, clocks) = setup(&dev, true);
        let mut config = Config::default().top_value(10);
        config.comp0_top = false;
        let timer = letimer(&dev, config, &clocks, &cmu);
        assert_eq!(timer.underflow_period_ticks(), 1 << 24);
        assert_eq!(timer.underflow_period(), Microseconds(512_000_000_u32));
    }

    #[test]
    fn counter_and_status_read_back() {
        let dev = Device::new();
        let (cmu, clocks) = setup(&dev, true);
        let timer = letimer(&dev, Config::default(), &clocks, &cmu);
        dev.letimer0.cnt().write(|w| unsafe { w.bits(0xFF00_1234) });
        // STATUS is read-only to software; stand in for the counter
        unsafe { dev.letimer0.status().as_ptr().write_volatile(1) };
        assert_eq!(timer.counter(), 0x1234);
        assert!(timer.is_running());
    }

    #[test]
    #[should_panic]
    fn top_wider_than_24_bits_panics() {
        let dev = Device::new();
        let (cmu, clocks) = setup(&dev, true);
        let config = Config::default().top_value(MAX_TOP + 1);
        let _ = letimer(&dev, config, &clocks, &cmu);
    }

    #[test]
    #[should_panic]
    fn gated_letimer_panics() {
        let dev = Device::new();
        let (cmu, clocks) = setup(&dev, false);
        let _ = letimer(&dev, Config::default(), &clocks, &cmu);
    }
}
