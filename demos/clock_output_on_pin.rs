// Exports HFXO (38.4 MHz) on expansion header 16 of the Thunderboard BG22 and blinks LED0
// at 1 Hz. Put a scope on header 16 to see the clock; the LED is driven by LETIMER0 through PRS
// channel 0, so the main loop has nothing to do.
//
// Build with `--features rt --target thumbv8m.main-none-eabihf`.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use efr32bg22_clkout::{pac, App};
use panic_halt as _;

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let mut app = App::init(dp);

    loop {
        app.process_action();
    }
}
