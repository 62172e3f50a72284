//! Clock output on a pin
//!
//! Exports HFXO on expansion header 16 and blinks LED0 at 1 Hz. The blink runs entirely in
//! hardware: LETIMER0 toggles its output 0 on every underflow, PRS async channel 0 carries
//! that output to the LED pin. Once [`App::init`] returns there is nothing left for the CPU
//! to do, so [`App::process_action`] is empty.

use crate::{
    board::{self, ExpansionHeader16, Led0},
    clock::{self, ClockGate, ClockOutput, Clocks, Cmu, ExportSource, LfClockSource},
    gpio::{self, Output, PushPull},
    letimer::{self, Letimer, UnderflowAction},
    pac::{self, cmu_s, gpio_s, letimer0_s, prs_s},
    prs::{self, AsyncChannel, AsyncSignal},
};
use embedded_time::{duration::Microseconds, rate::Hertz};

/// Register blocks the application programs
pub(crate) struct Blocks {
    pub cmu: &'static cmu_s::RegisterBlock,
    pub gpio: &'static gpio_s::RegisterBlock,
    pub letimer0: &'static letimer0_s::RegisterBlock,
    pub prs: &'static prs_s::RegisterBlock,
}

impl From<pac::Peripherals> for Blocks {
    fn from(_dp: pac::Peripherals) -> Self {
        unsafe {
            Blocks {
                cmu: &*pac::CmuS::ptr(),
                gpio: &*pac::GpioS::ptr(),
                letimer0: &*pac::Letimer0S::ptr(),
                prs: &*pac::PrsS::ptr(),
            }
        }
    }
}

/// Configured application; owns everything it programmed so nothing else can reconfigure it
pub struct App {
    cmu: Cmu,
    clocks: Clocks,
    _clock_pin: ExpansionHeader16<Output<PushPull>>,
    _led: Led0<Output<PushPull>>,
    letimer: Letimer,
    _led_channel: AsyncChannel<0>,
}

impl App {
    /// Brings the peripherals to their steady state. Call once, before the main loop.
    ///
    /// # Panics
    ///
    /// Only on a configuration that cannot be honoured, which the fixed board constants rule
    /// out.
    pub fn init(dp: pac::Peripherals) -> Self {
        Self::init_blocks(Blocks::from(dp))
    }

    pub(crate) fn init_blocks(blocks: Blocks) -> Self {
        let mut cmu = Cmu::new(blocks.cmu);

        // LETIMER0 counts the 32.768 kHz crystal
        let clocks = clock::Config::new()
            .lfxo(board::LFXO_FREQ)
            .hfxo(board::HFXO_FREQ)
            .em23grpa_clk(LfClockSource::Lfxo)
            .freeze(&mut cmu);

        // Gated peripherals drop register writes
        cmu.enable(ClockGate::Gpio);
        cmu.enable(ClockGate::Letimer0);
        cmu.enable(ClockGate::Prs);

        let mut gpio = gpio::Parts::new(blocks.gpio, &cmu);

        let clock_pin = gpio.pd2.into_push_pull_output();
        cmu.export(ClockOutput::ClkOut0, ExportSource::Hfxo);
        gpio.cmu_route.clkout0.connect(&clock_pin);

        // 1 Hz blink: one output toggle per underflow, two underflows per second
        let led = gpio.pb0.into_push_pull_output();
        let config = letimer::Config::default()
            .top_value(clocks.em23grpaclk().0 / 2)
            .ufoa0(UnderflowAction::Toggle);
        let letimer = Letimer::with_block(blocks.letimer0, config, &clocks, &cmu);

        let mut led_channel = prs::Channels::new(blocks.prs, &cmu).ch0;
        led_channel.set_source(AsyncSignal::Letimer0Ch0);
        gpio.prs_route.connect(&led_channel, &led);

        debug!("init done");
        App {
            cmu,
            clocks,
            _clock_pin: clock_pin,
            _led: led,
            letimer,
            _led_channel: led_channel,
        }
    }

    /// Main loop hook. Everything runs in hardware, so this does nothing.
    pub fn process_action(&mut self) {}

    pub fn clocks(&self) -> &Clocks {
        &self.clocks
    }

    /// Frequency on expansion header 16
    pub fn clock_output_freq(&self) -> Option<Hertz> {
        self.cmu.exported_freq(ClockOutput::ClkOut0, &self.clocks)
    }

    /// Time LED0 stays in one state
    pub fn led_half_period(&self) -> Microseconds {
        self.letimer.underflow_period()
    }
}
