//! Clock Management Unit (CMU) configuration
//!
//! Clocking on the EFR32BG22 is organised in branches named after the lowest energy mode
//! they keep running in:
//!
//! - EM01GRPACLK / EM01GRPBCLK feed the high-frequency peripherals (TIMERn, USARTn, IADC)
//!   and only run in EM0 and EM1
//! - EM23GRPACLK feeds the low-energy peripherals (LETIMER0) and keeps running down to EM3
//! - EM4GRPACLK feeds the backup domain (BURTC, ETAMPDET)
//!
//! Every peripheral additionally has its own clock gate in `CLKEN0`/`CLKEN1`. A gated
//! peripheral ignores register writes, so gates are opened before the peripheral is
//! configured; the HAL constructors in this crate check for that.
//!
//! Any of the oscillators can also be exported onto the three `CLKOUTn` buses and from there
//! routed to a pin (see [`crate::gpio::ClockOutputRoute`]).

use crate::pac::{self, cmu_s};
use cmu_s::em23grpaclkctrl::Clksel;
use embedded_time::rate::Hertz;

/// Low-frequency RC oscillator, fixed at 32.768 kHz
pub const LFRCO_FREQ: Hertz = Hertz(32_768_u32);
/// Ultra low-frequency RC oscillator
pub const ULFRCO_FREQ: Hertz = Hertz(1_000_u32);
/// Fast start-up RC oscillator
pub const FSRCO_FREQ: Hertz = Hertz(20_000_000_u32);
/// HFRCODPLL frequency out of reset
pub const HFRCODPLL_RESET_FREQ: Hertz = Hertz(19_000_000_u32);

/// Oscillators that can drive the EM23GRPACLK branch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LfClockSource {
    /// Low-frequency RC oscillator (reset default)
    Lfrco,
    /// Low-frequency crystal oscillator
    Lfxo,
    /// Ultra low-frequency RC oscillator
    Ulfrco,
}

impl LfClockSource {
    const fn clksel(self) -> Clksel {
        match self {
            LfClockSource::Lfrco => Clksel::Lfrco,
            LfClockSource::Lfxo => Clksel::Lfxo,
            LfClockSource::Ulfrco => Clksel::Ulfrco,
        }
    }

    const fn from_clksel(clksel: Clksel) -> Self {
        match clksel {
            Clksel::Lfrco => LfClockSource::Lfrco,
            Clksel::Lfxo => LfClockSource::Lfxo,
            Clksel::Ulfrco => LfClockSource::Ulfrco,
        }
    }
}

/// Clocks that can be placed on a `CLKOUTn` export bus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExportSource {
    Disabled,
    /// AHB bus clock
    Hclk,
    /// SYSCLK after the export prescaler
    HfExpClk,
    Ulfrco,
    Lfrco,
    Lfxo,
    HfrcoDpll,
    /// High-frequency crystal oscillator
    Hfxo,
    Fsrco,
}

impl ExportSource {
    const fn clkoutsel(self) -> u8 {
        match self {
            ExportSource::Disabled => 0,
            ExportSource::Hclk => 1,
            ExportSource::HfExpClk => 2,
            ExportSource::Ulfrco => 3,
            ExportSource::Lfrco => 4,
            ExportSource::Lfxo => 5,
            ExportSource::HfrcoDpll => 6,
            ExportSource::Hfxo => 7,
            ExportSource::Fsrco => 8,
        }
    }

    const fn from_clkoutsel(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => ExportSource::Disabled,
            1 => ExportSource::Hclk,
            2 => ExportSource::HfExpClk,
            3 => ExportSource::Ulfrco,
            4 => ExportSource::Lfrco,
            5 => ExportSource::Lfxo,
            6 => ExportSource::HfrcoDpll,
            7 => ExportSource::Hfxo,
            8 => ExportSource::Fsrco,
            _ => return None,
        })
    }
}

/// The three clock export buses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockOutput {
    ClkOut0,
    ClkOut1,
    ClkOut2,
}

impl ClockOutput {
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => ClockOutput::ClkOut0,
            1 => ClockOutput::ClkOut1,
            2 => ClockOutput::ClkOut2,
            _ => panic!("no such clock export bus"),
        }
    }
}

/// Peripheral clock gates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockGate {
    Ldma,
    Gpcrc,
    Timer0,
    Timer1,
    Timer2,
    Timer3,
    Usart0,
    Usart1,
    Iadc0,
    Letimer0,
    Wdog0,
    I2c0,
    I2c1,
    Syscfg,
    Hfxo0,
    Lfxo,
    Euart0,
    Gpio,
    Prs,
    Burtc,
    Rtcc,
    CryptoAcc,
    Smu,
    Icache0,
    Msc,
}

impl ClockGate {
    /// `(CLKENn register index, bit)`
    const fn position(self) -> (u8, u8) {
        match self {
            ClockGate::Ldma => (0, 0),
            ClockGate::Gpcrc => (0, 3),
            ClockGate::Timer0 => (0, 4),
            ClockGate::Timer1 => (0, 5),
            ClockGate::Timer2 => (0, 6),
            ClockGate::Timer3 => (0, 7),
            ClockGate::Usart0 => (0, 8),
            ClockGate::Usart1 => (0, 9),
            ClockGate::Iadc0 => (0, 10),
            ClockGate::Letimer0 => (0, 12),
            ClockGate::Wdog0 => (0, 13),
            ClockGate::I2c0 => (0, 14),
            ClockGate::I2c1 => (0, 15),
            ClockGate::Syscfg => (0, 16),
            ClockGate::Hfxo0 => (0, 19),
            ClockGate::Lfxo => (0, 22),
            ClockGate::Euart0 => (0, 24),
            ClockGate::Gpio => (0, 26),
            ClockGate::Prs => (0, 27),
            ClockGate::Burtc => (0, 29),
            ClockGate::Rtcc => (0, 30),
            ClockGate::CryptoAcc => (1, 13),
            ClockGate::Smu => (1, 15),
            ClockGate::Icache0 => (1, 16),
            ClockGate::Msc => (1, 17),
        }
    }
}

/// Frozen clock frequencies
///
/// The existence of this value indicates that the EM23GRPACLK source has been selected and
/// will not change for the lifetime of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clocks {
    lfxo: Option<Hertz>,
    hfxo: Option<Hertz>,
    sysclk: Option<Hertz>,
    em23grpa: LfClockSource,
    em23grpaclk: Hertz,
}

impl Clocks {
    /// Frequency of the low-frequency crystal, if one is fitted
    pub const fn lfxo(&self) -> Option<Hertz> {
        self.lfxo
    }

    /// Frequency of the high-frequency crystal, if one is fitted
    pub const fn hfxo(&self) -> Option<Hertz> {
        self.hfxo
    }

    /// SYSCLK frequency, if known
    pub const fn sysclk(&self) -> Option<Hertz> {
        self.sysclk
    }

    /// Oscillator driving EM23GRPACLK
    pub const fn em23grpa_source(&self) -> LfClockSource {
        self.em23grpa
    }

    /// Frequency of EM23GRPACLK, the LETIMER0 kernel clock
    pub const fn em23grpaclk(&self) -> Hertz {
        self.em23grpaclk
    }

    /// Frequency of a clock as seen on an export bus, before the export prescaler
    ///
    /// Returns `None` for [`ExportSource::Disabled`], for HCLK, whose prescaler this crate
    /// does not track, and for crystals and SYSCLK when no frequency was configured.
    pub const fn source_freq(&self, source: ExportSource) -> Option<Hertz> {
        match source {
            ExportSource::Ulfrco => Some(ULFRCO_FREQ),
            ExportSource::Lfrco => Some(LFRCO_FREQ),
            ExportSource::Lfxo => self.lfxo,
            ExportSource::HfrcoDpll => Some(HFRCODPLL_RESET_FREQ),
            ExportSource::Hfxo => self.hfxo,
            ExportSource::Fsrco => Some(FSRCO_FREQ),
            ExportSource::HfExpClk => self.sysclk,
            ExportSource::Disabled | ExportSource::Hclk => None,
        }
    }
}

/// Clock configurator
///
/// Records the crystal frequencies fitted on the board and the source of the EM23GRPACLK
/// branch, then writes the selection with [`Config::freeze`]. Crystal frequencies are not
/// measured; they must match the board.
pub struct Config {
    lfxo: Option<Hertz>,
    hfxo: Option<Hertz>,
    sysclk: Option<Hertz>,
    em23grpa: Option<LfClockSource>,
}

impl Config {
    /// Create a configurator with nothing selected
    pub fn new() -> Self {
        Config {
            lfxo: None,
            hfxo: None,
            sysclk: None,
            em23grpa: None,
        }
    }

    /// Frequency of the low-frequency crystal on the board
    pub fn lfxo(mut self, freq: impl Into<Hertz>) -> Self {
        self.lfxo = Some(freq.into());
        self
    }

    /// Frequency of the high-frequency crystal on the board
    pub fn hfxo(mut self, freq: impl Into<Hertz>) -> Self {
        self.hfxo = Some(freq.into());
        self
    }

    /// SYSCLK frequency as left by the start-up code
    pub fn sysclk(mut self, freq: impl Into<Hertz>) -> Self {
        self.sysclk = Some(freq.into());
        self
    }

    /// Oscillator driving the EM23GRPACLK branch
    pub fn em23grpa_clk(mut self, source: LfClockSource) -> Self {
        self.em23grpa = Some(source);
        self
    }

    /// Writes the branch selection and freezes the resulting frequencies.
    ///
    /// Sources left unset keep their reset value: EM23GRPACLK runs from LFRCO. Crystals left
    /// unset count as not fitted.
    ///
    /// # Panics
    ///
    /// If EM23GRPACLK is set to run from a crystal that was not given a frequency.
    pub fn freeze(self, cmu: &mut Cmu) -> Clocks {
        let em23grpa = self.em23grpa.unwrap_or(LfClockSource::Lfrco);
        let em23grpaclk = match em23grpa {
            LfClockSource::Lfrco => LFRCO_FREQ,
            LfClockSource::Ulfrco => ULFRCO_FREQ,
            LfClockSource::Lfxo => match self.lfxo {
                Some(freq) => freq,
                None => panic!("EM23GRPACLK selects LFXO but no LFXO frequency is known"),
            },
        };

        cmu.rb
            .em23grpaclkctrl()
            .modify(|_, w| w.clksel().variant(em23grpa.clksel()));
        debug!("EM23GRPACLK source: {}", em23grpa);

        Clocks {
            lfxo: self.lfxo,
            hfxo: self.hfxo,
            sysclk: self.sysclk,
            em23grpa,
            em23grpaclk,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Constrained CMU peripheral
pub struct Cmu {
    rb: &'static cmu_s::RegisterBlock,
}

/// Extension trait that constrains the `CMU` peripheral
pub trait CmuExt {
    /// Constrains the `CMU` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Cmu;
}

impl CmuExt for pac::CmuS {
    fn constrain(self) -> Cmu {
        Cmu::new(unsafe { &*pac::CmuS::ptr() })
    }
}

impl Cmu {
    pub(crate) fn new(rb: &'static cmu_s::RegisterBlock) -> Self {
        Cmu { rb }
    }

    /// Opens the clock gate of a peripheral
    pub fn enable(&mut self, gate: ClockGate) {
        let mask = 1 << gate.position().1;
        match gate.position().0 {
            0 => self.rb.clken0().modify(|r, w| unsafe { w.bits(r.bits() | mask) }),
            _ => self.rb.clken1().modify(|r, w| unsafe { w.bits(r.bits() | mask) }),
        };
        debug!("clock gate open: {}", gate);
    }

    /// Closes the clock gate of a peripheral
    pub fn disable(&mut self, gate: ClockGate) {
        let mask = 1 << gate.position().1;
        match gate.position().0 {
            0 => self.rb.clken0().modify(|r, w| unsafe { w.bits(r.bits() & !mask) }),
            _ => self.rb.clken1().modify(|r, w| unsafe { w.bits(r.bits() & !mask) }),
        };
    }

    pub fn is_enabled(&self, gate: ClockGate) -> bool {
        let (index, bit) = gate.position();
        let bits = match index {
            0 => self.rb.clken0().read().bits(),
            _ => self.rb.clken1().read().bits(),
        };
        bits & (1 << bit) != 0
    }

    /// Current EM23GRPACLK source, read back from the hardware
    pub fn em23grpaclk_source(&self) -> Option<LfClockSource> {
        let clksel = self.rb.em23grpaclkctrl().read().clksel().variant()?;
        Some(LfClockSource::from_clksel(clksel))
    }

    /// Places `source` on an export bus. The bus still needs a pin route to leave the chip.
    pub fn export(&mut self, output: ClockOutput, source: ExportSource) {
        let sel = source.clkoutsel();
        self.rb.exportclkctrl().modify(|_, w| unsafe {
            match output {
                ClockOutput::ClkOut0 => w.clkoutsel0().bits(sel),
                ClockOutput::ClkOut1 => w.clkoutsel1().bits(sel),
                ClockOutput::ClkOut2 => w.clkoutsel2().bits(sel),
            }
        });
        debug!("{} exports {}", output, source);
    }

    /// Sets the divider SYSCLK goes through to become HFEXPCLK, `1..=32`
    ///
    /// # Panics
    ///
    /// If `divider` is outside `1..=32`.
    pub fn set_export_divider(&mut self, divider: u8) {
        if !(1..=32).contains(&divider) {
            panic!("unreachable export prescaler");
        }
        self.rb
            .exportclkctrl()
            .modify(|_, w| unsafe { w.presc().bits(divider - 1) });
    }

    /// Clock currently placed on an export bus
    pub fn exported(&self, output: ClockOutput) -> Option<ExportSource> {
        let r = self.rb.exportclkctrl().read();
        ExportSource::from_clkoutsel(match output {
            ClockOutput::ClkOut0 => r.clkoutsel0().bits(),
            ClockOutput::ClkOut1 => r.clkoutsel1().bits(),
            ClockOutput::ClkOut2 => r.clkoutsel2().bits(),
        })
    }

    /// Frequency leaving an export bus
    ///
    /// The export prescaler only sits in the HFEXPCLK path; every other source reaches the
    /// bus undivided.
    pub fn exported_freq(&self, output: ClockOutput, clocks: &Clocks) -> Option<Hertz> {
        let source = self.exported(output)?;
        let freq = clocks.source_freq(source)?;
        match source {
            ExportSource::HfExpClk => {
                let presc = self.rb.exportclkctrl().read().presc().bits() as u32;
                Some(Hertz(freq.0 / (presc + 1)))
            }
            _ => Some(freq),
        }
    }

    /// Panics unless the gate of `gate` is open
    pub(crate) fn assert_enabled(&self, gate: ClockGate) {
        if !self.is_enabled(gate) {
            panic!("peripheral clock is gated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Device;
    use embedded_time::rate::Extensions;

    #[test]
    fn freeze_selects_lfxo_for_em23grpaclk() {
        let dev = Device::new();
        let mut cmu = dev.cmu();
        let clocks = Config::new()
            .lfxo(32_768_u32.Hz())
            .em23grpa_clk(LfClockSource::Lfxo)
            .freeze(&mut cmu);

        assert!(dev.cmu.em23grpaclkctrl().read().clksel().is_lfxo());
        assert_eq!(dev.cmu.em23grpaclkctrl().read().bits(), 0x2);
        assert_eq!(cmu.em23grpaclk_source(), Some(LfClockSource::Lfxo));
        assert_eq!(clocks.em23grpaclk(), Hertz(32_768_u32));
    }

    #[test]
    fn freeze_defaults_to_lfrco() {
        let dev = Device::new();
        let clocks = Config::default().freeze(&mut dev.cmu());
        assert_eq!(clocks.em23grpa_source(), LfClockSource::Lfrco);
        assert_eq!(clocks.em23grpaclk(), LFRCO_FREQ);
        assert_eq!(dev.cmu.em23grpaclkctrl().read().bits(), 0x1);
    }

    #[test]
    fn unset_crystals_have_no_frequency() {
        let dev = Device::new();
        let clocks = Config::default().freeze(&mut dev.cmu());
        assert_eq!(clocks.hfxo(), None);
        assert_eq!(clocks.source_freq(ExportSource::Hfxo), None);
        assert_eq!(clocks.source_freq(ExportSource::Lfxo), None);
        assert_eq!(clocks.source_freq(ExportSource::HfExpClk), None);
        assert_eq!(clocks.source_freq(ExportSource::Lfrco), Some(LFRCO_FREQ));
    }

    #[test]
    #[should_panic]
    fn freeze_rejects_unknown_lfxo() {
        let dev = Device::new();
        Config::new()
            .em23grpa_clk(LfClockSource::Lfxo)
            .freeze(&mut dev.cmu());
    }

    #[test]
    fn gates_live_in_both_clken_registers() {
        let dev = Device::new();
        let mut cmu = dev.cmu();
        cmu.enable(ClockGate::Gpio);
        cmu.enable(ClockGate::Letimer0);
        cmu.enable(ClockGate::Msc);

        assert!(dev.cmu.clken0().read().gpio().bit_is_set());
        assert!(dev.cmu.clken0().read().letimer0().bit_is_set());
        assert_eq!(dev.cmu.clken0().read().bits(), (1 << 26) | (1 << 12));
        assert!(dev.cmu.clken1().read().msc().bit_is_set());
        assert_eq!(dev.cmu.clken1().read().bits(), 1 << 17);
        assert!(cmu.is_enabled(ClockGate::Letimer0));
        assert!(!cmu.is_enabled(ClockGate::Prs));

        cmu.disable(ClockGate::Gpio);
        assert!(!cmu.is_enabled(ClockGate::Gpio));
        assert_eq!(dev.cmu.clken0().read().bits(), 1 << 12);
    }

    #[test]
    fn export_writes_only_its_own_field() {
        let dev = Device::new();
        let mut cmu = dev.cmu();
        cmu.export(ClockOutput::ClkOut1, ExportSource::Lfxo);
        cmu.export(ClockOutput::ClkOut0, ExportSource::Hfxo);

        assert_eq!(dev.cmu.exportclkctrl().read().bits(), 0x0000_0507);
        assert!(dev.cmu.exportclkctrl().read().clkoutsel0().is_hfxo());
        assert_eq!(cmu.exported(ClockOutput::ClkOut0), Some(ExportSource::Hfxo));
        assert_eq!(cmu.exported(ClockOutput::ClkOut2), Some(ExportSource::Disabled));
    }

    #[test]
    fn prescaler_divides_hfexpclk_only() {
        let dev = Device::new();
        let mut cmu = dev.cmu();
        let clocks = Config::new()
            .hfxo(38_400_000_u32.Hz())
            .sysclk(76_800_000_u32.Hz())
            .freeze(&mut cmu);
        cmu.export(ClockOutput::ClkOut0, ExportSource::Hfxo);
        cmu.export(ClockOutput::ClkOut1, ExportSource::HfExpClk);
        cmu.set_export_divider(4);

        assert_eq!(dev.cmu.exportclkctrl().read().presc().bits(), 3);
        assert_eq!(
            cmu.exported_freq(ClockOutput::ClkOut0, &clocks),
            Some(Hertz(38_400_000_u32))
        );
        assert_eq!(
            cmu.exported_freq(ClockOutput::ClkOut1, &clocks),
            Some(Hertz(19_200_000_u32))
        );
        assert_eq!(cmu.exported_freq(ClockOutput::ClkOut2, &clocks), None);
    }

    #[test]
    fn hfxo_export_without_frequency_is_unknown() {
        let dev = Device::new();
        let mut cmu = dev.cmu();
        let clocks = Config::new().freeze(&mut cmu);
        cmu.export(ClockOutput::ClkOut0, ExportSource::Hfxo);
        assert_eq!(cmu.exported_freq(ClockOutput::ClkOut0, &clocks), None);
    }

    #[test]
    #[should_panic]
    fn export_divider_above_32_panics() {
        let dev = Device::new();
        dev.cmu().set_export_divider(33);
    }
}
