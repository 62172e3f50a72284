//! Register blocks in host memory for unit tests

use crate::{
    app::Blocks,
    clock::{ClockGate, Cmu},
    gpio, pac, prs,
};
use std::boxed::Box;
use std::vec::Vec;

/// One copy of every register block the crate drives, at reset values
pub(crate) struct Device {
    pub cmu: &'static pac::cmu_s::RegisterBlock,
    pub gpio: &'static pac::gpio_s::RegisterBlock,
    pub letimer0: &'static pac::letimer0_s::RegisterBlock,
    pub prs: &'static pac::prs_s::RegisterBlock,
}

/// Every register word of a [`Device`], in address order
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub cmu: Vec<u32>,
    pub gpio: Vec<u32>,
    pub letimer0: Vec<u32>,
    pub prs: Vec<u32>,
}

impl Device {
    pub fn new() -> Self {
        let dev = unsafe {
            Device {
                cmu: leak_zeroed(),
                gpio: leak_zeroed(),
                letimer0: leak_zeroed(),
                prs: leak_zeroed(),
            }
        };
        // Registers whose reset value is not zero
        dev.cmu.em23grpaclkctrl().reset();
        dev.gpio.porta_ctrl().reset();
        dev.gpio.portb_ctrl().reset();
        dev.gpio.portc_ctrl().reset();
        dev.gpio.portd_ctrl().reset();
        dev.prs.async_ch0_ctrl().reset();
        dev.prs.async_ch1_ctrl().reset();
        dev.prs.async_ch2_ctrl().reset();
        dev.prs.async_ch3_ctrl().reset();
        dev.prs.async_ch4_ctrl().reset();
        dev.prs.async_ch5_ctrl().reset();
        dev.prs.async_ch6_ctrl().reset();
        dev.prs.async_ch7_ctrl().reset();
        dev.prs.async_ch8_ctrl().reset();
        dev.prs.async_ch9_ctrl().reset();
        dev.prs.async_ch10_ctrl().reset();
        dev.prs.async_ch11_ctrl().reset();
        dev
    }

    /// Handles onto this device; may be called repeatedly to model a re-init
    pub fn blocks(&self) -> Blocks {
        Blocks {
            cmu: self.cmu,
            gpio: self.gpio,
            letimer0: self.letimer0,
            prs: self.prs,
        }
    }

    pub fn cmu(&self) -> Cmu {
        Cmu::new(self.cmu)
    }

    /// CMU with the gates of `gates` open
    pub fn cmu_with(&self, gates: &[ClockGate]) -> Cmu {
        let mut cmu = self.cmu();
        for gate in gates {
            cmu.enable(*gate);
        }
        cmu
    }

    pub fn gpio(&self, cmu: &Cmu) -> gpio::Parts {
        gpio::Parts::new(self.gpio, cmu)
    }

    pub fn prs(&self, cmu: &Cmu) -> prs::Channels {
        prs::Channels::new(self.prs, cmu)
    }

    /// Byte offset of `reg` inside the block at `base`
    pub fn offset<B, R>(base: &B, reg: &R) -> usize {
        reg as *const R as usize - base as *const B as usize
    }

    /// Last word written to `reg`; also works on write-only registers
    pub fn written<REG>(reg: &pac::generic::Reg<REG>) -> u32
    where
        REG: pac::generic::RegisterSpec<Ux = u32>,
    {
        unsafe { reg.as_ptr().read_volatile() }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cmu: words(self.cmu),
            gpio: words(self.gpio),
            letimer0: words(self.letimer0),
            prs: words(self.prs),
        }
    }
}

/// # Safety
///
/// `T` must be a register block, for which all-zero is a valid value.
unsafe fn leak_zeroed<T>() -> &'static T {
    Box::leak(Box::new(core::mem::zeroed()))
}

fn words<T>(rb: &T) -> Vec<u32> {
    let base = rb as *const T as *const u32;
    (0..core::mem::size_of::<T>() / 4)
        .map(|i| unsafe { base.add(i).read_volatile() })
        .collect()
}
