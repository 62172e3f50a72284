//! General Purpose Input/Output (GPIO)
//!
//! Pins are typestate handles. Port and pin number are const generic parameters, so only
//! pins bonded out on the EFR32BG22 QFN40 package can be named, and the mode is a type
//! parameter, so a pin can only be driven or routed once it is an output.
//!
//! The GPIO block also owns the route registers that connect peripheral signals to pins.
//! They are handed out by [`GpioExt::split`] as [`CmuRoute`] and [`PrsRoute`]. Each clock
//! export bus and each asynchronous PRS channel only reaches two of the four ports, and
//! routing to any other port does not compile:
//!
//! ```compile_fail
//! use efr32bg22_clkout::gpio::Parts;
//!
//! fn clock_to_led(mut gpio: Parts) {
//!     let led = gpio.pb0.into_push_pull_output();
//!     // CLKOUT0 only reaches ports C and D
//!     gpio.cmu_route.clkout0.connect(&led);
//! }
//! ```

use crate::{
    clock::{ClockGate, ClockOutput, Cmu},
    pac::{self, gpio_s},
    prs::AsyncChannel,
};
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState, StatefulOutputPin};

type Mode = gpio_s::porta_model::Mode0;

/// Extension trait to split the GPIO peripheral into independent pins and route registers
pub trait GpioExt {
    /// Splits the GPIO block into independent pins and route registers
    ///
    /// # Panics
    ///
    /// If the GPIO clock gate is closed.
    fn split(self, cmu: &Cmu) -> Parts;
}

/// GPIO port
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
}

impl Port {
    pub const fn from_index(index: u8) -> Self {
        match index {
            0 => Port::A,
            1 => Port::B,
            2 => Port::C,
            3 => Port::D,
            _ => panic!("no such GPIO port"),
        }
    }
}

/// Value of a `*ROUTE` register selecting `port`/`pin`
pub const fn route_bits(port: Port, pin: u8) -> u32 {
    (port as u32) | ((pin as u32) << 16)
}

/// Binds `$reg` to register `$name` of port `$port` and evaluates `$body`
macro_rules! port_reg {
    ($rb:expr, $port:expr, $name:ident, |$reg:ident| $body:expr) => { paste::paste! {
        match $port {
            0 => { let $reg = $rb.[<porta_ $name>](); $body }
            1 => { let $reg = $rb.[<portb_ $name>](); $body }
            2 => { let $reg = $rb.[<portc_ $name>](); $body }
            _ => { let $reg = $rb.[<portd_ $name>](); $body }
        }
    }};
}

/// Disabled pin, input and output drivers off (type state, reset default)
pub struct Disabled;

/// Floating input (type state)
pub struct Floating;
/// Pulled down input (type state)
pub struct PullDown;
/// Pulled up input (type state)
pub struct PullUp;

/// Input mode (type state)
pub struct Input<MODE> {
    _mode: PhantomData<MODE>,
}

/// Push pull output (type state)
pub struct PushPull;
/// Open drain (wired-and) output (type state)
pub struct OpenDrain;

/// Output mode (type state)
pub struct Output<MODE> {
    _mode: PhantomData<MODE>,
}

/// Pin `N` of port `P`
pub struct Pin<const P: u8, const N: u8, MODE> {
    rb: &'static gpio_s::RegisterBlock,
    _mode: PhantomData<MODE>,
}

impl<const P: u8, const N: u8, MODE> Pin<P, N, MODE> {
    const fn new(rb: &'static gpio_s::RegisterBlock) -> Self {
        Pin {
            rb,
            _mode: PhantomData,
        }
    }

    pub const fn port(&self) -> Port {
        Port::from_index(P)
    }

    pub const fn pin(&self) -> u8 {
        N
    }

    fn set_mode(&self, mode: Mode, dout: bool) {
        // DOUT first: it is the initial level of an output and the pull direction of an input
        self.write_dout(dout);
        let shift = (N % 8) * 4;
        let mask: u32 = 0xF << shift;
        let value = (mode as u32) << shift;
        if N < 8 {
            port_reg!(self.rb, P, model, |reg| reg
                .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | value) }));
        } else {
            // Only port A has more than eight pins
            self.rb
                .porta_modeh()
                .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | value) });
        }
    }

    fn write_dout(&self, high: bool) {
        let mask: u32 = 1 << N;
        if high {
            port_reg!(self.rb, P, dout, |reg| reg
                .modify(|r, w| unsafe { w.bits(r.bits() | mask) }));
        } else {
            port_reg!(self.rb, P, dout, |reg| reg
                .modify(|r, w| unsafe { w.bits(r.bits() & !mask) }));
        }
    }

    fn dout(&self) -> bool {
        let bits = port_reg!(self.rb, P, dout, |reg| reg.read().bits());
        bits & (1 << N) != 0
    }

    fn din(&self) -> bool {
        let bits = port_reg!(self.rb, P, din, |reg| reg.read().bits());
        bits & (1 << N) != 0
    }

    /// Configures the pin to operate as a push-pull output pin, driven low.
    pub fn into_push_pull_output(self) -> Pin<P, N, Output<PushPull>> {
        self.into_push_pull_output_in_state(PinState::Low)
    }

    /// Configures the pin to operate as a push-pull output pin with the given initial level.
    pub fn into_push_pull_output_in_state(self, initial: PinState) -> Pin<P, N, Output<PushPull>> {
        self.set_mode(Mode::Pushpull, initial == PinState::High);
        Pin::new(self.rb)
    }

    /// Configures the pin to operate as an open-drain output pin, released.
    pub fn into_open_drain_output(self) -> Pin<P, N, Output<OpenDrain>> {
        self.set_mode(Mode::Wiredand, true);
        Pin::new(self.rb)
    }

    /// Configures the pin to operate as a floating input pin.
    pub fn into_floating_input(self) -> Pin<P, N, Input<Floating>> {
        self.set_mode(Mode::Input, false);
        Pin::new(self.rb)
    }

    /// Configures the pin to operate as a pull-up input pin.
    pub fn into_pull_up_input(self) -> Pin<P, N, Input<PullUp>> {
        self.set_mode(Mode::Inputpull, true);
        Pin::new(self.rb)
    }

    /// Configures the pin to operate as a pull-down input pin.
    pub fn into_pull_down_input(self) -> Pin<P, N, Input<PullDown>> {
        self.set_mode(Mode::Inputpull, false);
        Pin::new(self.rb)
    }

    /// Turns the pin drivers off.
    pub fn into_disabled(self) -> Pin<P, N, Disabled> {
        self.set_mode(Mode::Disabled, false);
        Pin::new(self.rb)
    }
}

impl<const P: u8, const N: u8, MODE> ErrorType for Pin<P, N, Output<MODE>> {
    type Error = Infallible;
}

impl<const P: u8, const N: u8, MODE> OutputPin for Pin<P, N, Output<MODE>> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write_dout(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write_dout(true);
        Ok(())
    }
}

impl<const P: u8, const N: u8, MODE> StatefulOutputPin for Pin<P, N, Output<MODE>> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.dout())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.dout())
    }
}

impl<const P: u8, const N: u8, MODE> ErrorType for Pin<P, N, Input<MODE>> {
    type Error = Infallible;
}

impl<const P: u8, const N: u8, MODE> InputPin for Pin<P, N, Input<MODE>> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.din())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.din())
    }
}

impl<const P: u8, const N: u8, MODE> embedded_hal_zero::digital::v2::OutputPin
    for Pin<P, N, Output<MODE>>
{
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write_dout(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write_dout(true);
        Ok(())
    }
}

impl<const P: u8, const N: u8, MODE> embedded_hal_zero::digital::v2::StatefulOutputPin
    for Pin<P, N, Output<MODE>>
{
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.dout())
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.dout())
    }
}

impl<const P: u8, const N: u8, MODE> embedded_hal_zero::digital::v2::toggleable::Default
    for Pin<P, N, Output<MODE>>
{
}

impl<const P: u8, const N: u8, MODE> embedded_hal_zero::digital::v2::InputPin
    for Pin<P, N, Input<MODE>>
{
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.din())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.din())
    }
}

/// Output pins the `CLKOUT{OUT}` bus can drive
pub trait ClockOutputPin<const OUT: u8> {}

/// Output pins asynchronous PRS channel `CH` can drive
pub trait PrsOutputPin<const CH: u8> {}

macro_rules! route_ports {
    ($Trait:ident: $($idx:literal => [$($P:literal),+]),+ $(,)?) => {
        $($(
            impl<const N: u8, MODE> $Trait<$idx> for Pin<$P, N, Output<MODE>> {}
        )+)+
    };
}

route_ports!(ClockOutputPin:
    0 => [2, 3],
    1 => [2, 3],
    2 => [0, 1],
);

route_ports!(PrsOutputPin:
    0 => [0, 1], 1 => [0, 1], 2 => [0, 1], 3 => [0, 1], 4 => [0, 1], 5 => [0, 1],
    6 => [2, 3], 7 => [2, 3], 8 => [2, 3], 9 => [2, 3], 10 => [2, 3], 11 => [2, 3],
);

/// Route of clock export bus `CLKOUT{OUT}` (`GPIO_CMU_CLKOUTnROUTE`)
pub struct ClockOutputRoute<const OUT: u8> {
    rb: &'static gpio_s::RegisterBlock,
}

impl<const OUT: u8> ClockOutputRoute<OUT> {
    pub const fn output(&self) -> ClockOutput {
        ClockOutput::from_index(OUT)
    }

    /// Drives `pin` from the export bus
    pub fn connect<const P: u8, const N: u8, MODE>(&mut self, _pin: &Pin<P, N, Output<MODE>>)
    where
        Pin<P, N, Output<MODE>>: ClockOutputPin<OUT>,
    {
        let rb = self.rb;
        match OUT {
            0 => {
                rb.cmu_clkout0route()
                    .write(|w| unsafe { w.port().bits(P).pin().bits(N) });
                rb.cmu_routeen().modify(|_, w| w.clkout0pen().set_bit());
            }
            1 => {
                rb.cmu_clkout1route()
                    .write(|w| unsafe { w.port().bits(P).pin().bits(N) });
                rb.cmu_routeen().modify(|_, w| w.clkout1pen().set_bit());
            }
            _ => {
                rb.cmu_clkout2route()
                    .write(|w| unsafe { w.port().bits(P).pin().bits(N) });
                rb.cmu_routeen().modify(|_, w| w.clkout2pen().set_bit());
            }
        }
        debug!("{} routed to port {} pin {}", self.output(), Port::from_index(P), N);
    }

    /// Hands the pin back to its DOUT register
    pub fn disconnect(&mut self) {
        self.rb.cmu_routeen().modify(|_, w| match OUT {
            0 => w.clkout0pen().clear_bit(),
            1 => w.clkout1pen().clear_bit(),
            _ => w.clkout2pen().clear_bit(),
        });
    }

    pub fn is_connected(&self) -> bool {
        let r = self.rb.cmu_routeen().read();
        match OUT {
            0 => r.clkout0pen().bit_is_set(),
            1 => r.clkout1pen().bit_is_set(),
            _ => r.clkout2pen().bit_is_set(),
        }
    }
}

/// CMU clock export routes
pub struct CmuRoute {
    pub clkout0: ClockOutputRoute<0>,
    pub clkout1: ClockOutputRoute<1>,
    pub clkout2: ClockOutputRoute<2>,
}

/// PRS channel output routes (`GPIO_PRS0_*`)
pub struct PrsRoute {
    rb: &'static gpio_s::RegisterBlock,
}

macro_rules! prs_routes {
    ($($CH:literal),+) => { paste::paste! {
        impl PrsRoute {
            fn write_route(&self, channel: u8, port: u8, pin: u8) {
                match channel {
                    $(
                        $CH => {
                            self.rb
                                .[<prs0_asynch $CH route>]()
                                .write(|w| unsafe { w.port().bits(port).pin().bits(pin) });
                        }
                    )+
                    _ => unreachable!(),
                }
            }
        }
    }};
}

prs_routes!(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11);

impl PrsRoute {
    /// Drives `pin` from an asynchronous PRS channel
    pub fn connect<const CH: u8, const P: u8, const N: u8, MODE>(
        &mut self,
        channel: &AsyncChannel<CH>,
        _pin: &Pin<P, N, Output<MODE>>,
    ) where
        Pin<P, N, Output<MODE>>: PrsOutputPin<CH>,
    {
        self.write_route(channel.number(), P, N);
        self.rb
            .prs0_routeen()
            .modify(|r, w| unsafe { w.bits(r.bits() | (1 << CH)) });
        debug!("PRS async channel {} routed to port {} pin {}", CH, Port::from_index(P), N);
    }

    pub fn disconnect<const CH: u8>(&mut self, _channel: &AsyncChannel<CH>) {
        self.rb
            .prs0_routeen()
            .modify(|r, w| unsafe { w.bits(r.bits() & !(1 << CH)) });
    }

    pub fn is_connected<const CH: u8>(&self, _channel: &AsyncChannel<CH>) -> bool {
        self.rb.prs0_routeen().read().bits() & (1 << CH) != 0
    }
}

macro_rules! gpio_pins {
    ($($port:ident: $P:literal => [$($N:literal),+]),+ $(,)?) => { paste::paste! {
        $($(
            #[doc = "Pin P" $port $N]
            pub type [<P $port $N>]<MODE = Disabled> = Pin<$P, $N, MODE>;
        )+)+

        /// Gpio parts
        pub struct Parts {
            $($(
                pub [<p $port:lower $N>]: [<P $port $N>],
            )+)+
            pub cmu_route: CmuRoute,
            pub prs_route: PrsRoute,
        }

        impl Parts {
            pub(crate) fn new(rb: &'static gpio_s::RegisterBlock, cmu: &Cmu) -> Self {
                cmu.assert_enabled(ClockGate::Gpio);
                Parts {
                    $($(
                        [<p $port:lower $N>]: Pin::new(rb),
                    )+)+
                    cmu_route: CmuRoute {
                        clkout0: ClockOutputRoute { rb },
                        clkout1: ClockOutputRoute { rb },
                        clkout2: ClockOutputRoute { rb },
                    },
                    prs_route: PrsRoute { rb },
                }
            }
        }
    }};
}

// Pins bonded out on the QFN40 package
gpio_pins!(
    A: 0 => [0, 1, 2, 3, 4, 5, 6, 7, 8],
    B: 1 => [0, 1, 2, 3, 4],
    C: 2 => [0, 1, 2, 3, 4, 5, 6, 7],
    D: 3 => [0, 1, 2, 3],
);

impl GpioExt for pac::GpioS {
    fn split(self, cmu: &Cmu) -> Parts {
        Parts::new(unsafe { &*pac::GpioS::ptr() }, cmu)
    }
}
