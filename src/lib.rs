//! # Clock output on a pin, for the EFR32BG22 Thunderboard
//!
//! Exports the high-frequency crystal on expansion header 16 and blinks LED0 at 1 Hz with
//! LETIMER0 and the PRS, without any CPU involvement once configured. The peripheral layer
//! follows the [`embedded-hal`] conventions so it can be reused for other pins and clocks.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//!
//! # Usage
//!
//! ```ignore
//! let dp = pac::Peripherals::take().unwrap();
//! let mut app = App::init(dp);
//! loop {
//!     app.process_action();
//! }
//! ```
//!
//! ## Peripheral layer
//!
//! ```ignore
//! let dp = pac::Peripherals::take().unwrap();
//! let mut cmu = dp.cmu_s.constrain();
//!
//! // Freeze the EM23GRPACLK selection and the crystal frequencies in `clocks`
//! let clocks = clock::Config::new()
//!     .lfxo(32_768u32.Hz())
//!     .em23grpa_clk(LfClockSource::Lfxo)
//!     .freeze(&mut cmu);
//!
//! cmu.enable(ClockGate::Gpio);
//! let gpio = dp.gpio_s.split(&cmu);
//! ```
//!
//! Register access goes through the `efr32mg22-pac` crate, re-exported as [`pac`]. The
//! EFR32MG22 and EFR32BG22 share the CMU, GPIO, LETIMER0 and PRS register maps.
//!
//! Building the demo for the board needs the `rt` feature; `defmt` adds a log record per
//! configuration step over RTT.

#![cfg_attr(not(test), no_std)]

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    };
}

pub mod app;
pub mod board;
pub mod clock;
pub mod gpio;
pub mod letimer;
#[cfg(test)]
mod mock;
pub mod prs;

pub use efr32mg22_pac as pac;

pub use app::App;

/// HAL crate prelude
pub mod prelude {
    pub use crate::clock::CmuExt as _efr32bg22_clkout_clock_CmuExt;
    pub use crate::gpio::GpioExt as _efr32bg22_clkout_gpio_GpioExt;
    pub use crate::prs::PrsExt as _efr32bg22_clkout_prs_PrsExt;
    pub use embedded_time::rate::Extensions;
}
