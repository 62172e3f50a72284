//! Thunderboard BG22 (BRD4184) board definitions

use crate::gpio;
use embedded_time::rate::Hertz;

/// High-frequency crystal fitted on the board
pub const HFXO_FREQ: Hertz = Hertz(38_400_000_u32);
/// Low-frequency crystal fitted on the board
pub const LFXO_FREQ: Hertz = Hertz(32_768_u32);

/// Expansion header pin 16
pub type ExpansionHeader16<MODE = gpio::Disabled> = gpio::PD2<MODE>;

/// Yellow user LED
pub type Led0<MODE = gpio::Disabled> = gpio::PB0<MODE>;
