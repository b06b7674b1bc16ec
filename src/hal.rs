// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Hardware access traits consumed by the power controller.
//!
//! Register reads and writes are infallible and side-effect only. Clock operations may fail.

#[cfg(target_arch = "arm")]
pub mod cp15;
pub mod delay;
pub mod mmio;

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Value written to the `G3D_CONFIGURATION` register of the PMU.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct G3dConfiguration: u32 {
        /// Requests all local power switches of the domain on.
        const LOCAL_PWR_CFG = 0x7;
    }
}

bitflags! {
    /// Value read from the `G3D_STATUS` register of the PMU.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct G3dStatus: u32 {
        /// Local power switch state of the domain.
        const LOCAL_PWR_STATUS = 0x7;
    }
}

impl G3dStatus {
    /// Returns whether every local power switch reports on.
    pub fn is_ready(self) -> bool {
        self.contains(Self::LOCAL_PWR_STATUS)
    }

    /// Returns whether every local power switch reports off.
    pub fn is_off(self) -> bool {
        !self.intersects(Self::LOCAL_PWR_STATUS)
    }
}

/// The PMU registers controlling the G3D power domain.
pub trait PowerRegisters {
    /// Reads the current domain status.
    fn read_status(&mut self) -> G3dStatus;

    /// Requests the domain on (`LOCAL_PWR_CFG`) or off (empty).
    fn write_configuration(&mut self, configuration: G3dConfiguration);
}

/// The clock management unit registers used by the diagnostic attributes.
pub trait CmuRegisters {
    /// Reads `CLKOUT_CMU_TOP`.
    fn read_clkout_cmu_top(&mut self) -> u32;

    /// Writes `CLKOUT_CMU_TOP`.
    fn write_clkout_cmu_top(&mut self, value: u32);

    /// Writes the PMU `DEBUG` register, which routes a CMU clock to the XCLKOUT pin.
    fn write_pmu_debug(&mut self, value: u32);

    /// Reads `CLKDIV_STAT_TOP0`.
    fn read_clkdiv_stat_top0(&mut self) -> u32;
}

/// Errors from the clock framework.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ClockError {
    /// No clock is registered under the requested name.
    #[error("clock not found")]
    NotFound,
    /// The clock framework refused the request.
    #[error("clock operation failed")]
    Failed,
}

/// A handle to a single clock.
pub trait Clock {
    /// Ungates the clock.
    fn enable(&mut self) -> Result<(), ClockError>;

    /// Gates the clock.
    fn disable(&mut self) -> Result<(), ClockError>;

    /// Sets the clock rate in Hz.
    fn set_rate(&mut self, hz: u32) -> Result<(), ClockError>;

    /// Returns the current clock rate in Hz.
    fn rate(&self) -> u32;
}

/// Looks clocks up by name.
pub trait ClockProvider {
    /// The clock handle type produced.
    type Clock: Clock;

    /// Acquires the clock called `name`.
    fn get(&mut self, name: &'static str) -> Result<Self::Clock, ClockError>;
}

/// The CPU's RAMINDEX debug interface, which reads entries out of the internal cache and TLB RAMs.
pub trait RamIndexReader {
    /// Selects the entry described by `index` and returns the four data words read back.
    ///
    /// `index` holds the RAM ID in bits 31:24, the way in bits 23:18 and the entry below that.
    fn read(&mut self, index: u32) -> [u32; 4];
}

/// Geometry and location of one registered framebuffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FramebufferInfo {
    /// Visible width in pixels.
    pub xres: u32,
    /// Visible height in pixels.
    pub yres: u32,
    /// Physical start address of the framebuffer memory.
    pub base: usize,
}

/// The framebuffers registered with the display subsystem.
pub trait Framebuffers {
    /// Returns how many framebuffers are registered.
    fn count(&self) -> usize;

    /// Returns the framebuffer registered at `index`, if any.
    fn get(&self, index: usize) -> Option<FramebufferInfo>;
}

/// A busy-wait delay source.
pub trait Delay {
    /// Spins for at least `us` microseconds without sleeping.
    fn delay_us(&mut self, us: u32);
}

/// Bounds a busy-poll on a status register.
///
/// The register is checked once, then re-checked after each of up to `retries` delays of
/// `interval_us` microseconds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollConfig {
    /// Number of delays before giving up.
    pub retries: u32,
    /// Length of each delay in microseconds.
    pub interval_us: u32,
}

impl PollConfig {
    /// Returns the longest time the poll can spin for, in microseconds.
    pub const fn max_wait_us(&self) -> u64 {
        self.retries as u64 * self.interval_us as u64
    }

    /// Polls `done` until it returns true or the retry budget is used up.
    ///
    /// Returns whether `done` returned true.
    pub fn wait(&self, delay: &mut impl Delay, mut done: impl FnMut() -> bool) -> bool {
        let mut retries = self.retries;
        while !done() {
            if retries == 0 {
                return false;
            }
            retries -= 1;
            delay.delay_us(self.interval_us);
        }
        true
    }
}
