//! Peripheral Reflex System (PRS)
//!
//! PRS channels carry signals between peripherals without CPU involvement. An asynchronous
//! channel picks one producer signal, passes it through a small logic function and can
//! drive a pin through [`crate::gpio::PrsRoute`].

use crate::{
    clock::{ClockGate, Cmu},
    pac::{self, prs_s},
};

/// Producer signals for asynchronous channels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AsyncSignal {
    /// No producer; the channel idles low
    None,
    /// LETIMER0 output 0
    Letimer0Ch0,
    /// LETIMER0 output 1
    Letimer0Ch1,
}

const SOURCESEL_NONE: u8 = 0x00;
const SOURCESEL_LETIMER0: u8 = 0x26;

impl AsyncSignal {
    /// `(SOURCESEL, SIGSEL)`
    const fn select(self) -> (u8, u8) {
        match self {
            AsyncSignal::None => (SOURCESEL_NONE, 0),
            AsyncSignal::Letimer0Ch0 => (SOURCESEL_LETIMER0, 0),
            AsyncSignal::Letimer0Ch1 => (SOURCESEL_LETIMER0, 1),
        }
    }

    const fn from_select(source: u8, signal: u8) -> Option<Self> {
        match (source, signal) {
            (SOURCESEL_NONE, _) => Some(AsyncSignal::None),
            (SOURCESEL_LETIMER0, 0) => Some(AsyncSignal::Letimer0Ch0),
            (SOURCESEL_LETIMER0, 1) => Some(AsyncSignal::Letimer0Ch1),
            _ => None,
        }
    }
}

/// Logic function applied by a channel, as a truth table over its own signal `A` and the
/// previous channel `B`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Function {
    LogicalZero = 0x0,
    NotA = 0x3,
    AXorB = 0x6,
    AAndB = 0x8,
    /// Pass the channel signal through unchanged
    A = 0xC,
    AOrB = 0xE,
    LogicalOne = 0xF,
}

/// Binds `$reg` to `ASYNC_CH{$ch}_CTRL` and evaluates `$body`
macro_rules! async_ctrl {
    ($rb:expr, $ch:expr, |$reg:ident| $body:expr) => {
        async_ctrl!(@match $rb, $ch, $reg, $body, 0 1 2 3 4 5 6 7 8 9 10 11)
    };
    (@match $rb:expr, $ch:expr, $reg:ident, $body:expr, $($n:literal)+) => { paste::paste! {
        match $ch {
            $(
                $n => { let $reg = $rb.[<async_ch $n _ctrl>](); $body }
            )+
            _ => unreachable!(),
        }
    }};
}

/// Asynchronous PRS channel `CH`
pub struct AsyncChannel<const CH: u8> {
    rb: &'static prs_s::RegisterBlock,
}

impl<const CH: u8> AsyncChannel<CH> {
    pub const fn number(&self) -> u8 {
        CH
    }

    /// Connects a producer signal to this channel and passes it through unchanged
    pub fn set_source(&mut self, signal: AsyncSignal) {
        let (source, sig) = signal.select();
        async_ctrl!(self.rb, CH, |reg| reg.modify(|_, w| unsafe {
            w.sourcesel()
                .bits(source)
                .sigsel()
                .bits(sig)
                .fnsel()
                .bits(Function::A as u8)
        }));
        debug!("PRS async channel {} source: {}", CH, signal);
    }

    /// Producer currently selected, if it is one this crate knows
    pub fn source(&self) -> Option<AsyncSignal> {
        let (source, sig) = async_ctrl!(self.rb, CH, |reg| {
            let r = reg.read();
            (r.sourcesel().bits(), r.sigsel().bits())
        });
        AsyncSignal::from_select(source, sig)
    }

    pub fn set_function(&mut self, function: Function) {
        async_ctrl!(self.rb, CH, |reg| reg
            .modify(|_, w| w.fnsel().set(function as u8)));
    }
}

macro_rules! async_channels {
    ($($CH:literal),+) => { paste::paste! {
        /// Asynchronous channels obtained from [`PrsExt::split`]
        pub struct Channels {
            $(
                pub [<ch $CH>]: AsyncChannel<$CH>,
            )+
        }

        impl Channels {
            pub(crate) fn new(rb: &'static prs_s::RegisterBlock, cmu: &Cmu) -> Self {
                cmu.assert_enabled(ClockGate::Prs);
                Channels {
                    $(
                        [<ch $CH>]: AsyncChannel { rb },
                    )+
                }
            }
        }
    }};
}

/// Extension trait to split the PRS peripheral into independent channels
pub trait PrsExt {
    /// # Panics
    ///
    /// If the PRS clock gate is closed.
    fn split(self, cmu: &Cmu) -> Channels;
}

async_channels!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11);

impl PrsExt for pac::PrsS {
    fn split(self, cmu: &Cmu) -> Channels {
        Channels::new(unsafe { &*pac::PrsS::ptr() }, cmu)
    }
}
