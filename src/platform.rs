// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

pub mod exynos5;

use crate::{
    governor::DvfsGovernor,
    hal::{Clock, CmuRegisters, Delay, Framebuffers, PollConfig, PowerRegisters, RamIndexReader},
};
#[cfg(all(not(test), not(any(target_arch = "aarch64", target_arch = "arm"))))]
use percore::ExceptionFree;
#[cfg(all(not(test), any(target_arch = "aarch64", target_arch = "arm")))]
pub use percore::exception_free;
#[cfg(test)]
pub use test::exception_free;

/// The hooks and tunables provided by each SoC integration.
pub trait G3dPlatform {
    /// PMU registers for the G3D power domain.
    type Registers: PowerRegisters;

    /// CMU registers used by the clock diagnostics.
    type Cmu: CmuRegisters;

    /// Clock handle type for the gate and source clocks.
    type Clock: Clock;

    /// Busy-wait delay used while polling.
    type Delay: Delay + Clone;

    /// The external DVFS governor.
    type Governor: DvfsGovernor;

    /// The registered framebuffers, listed by the `fbdev` attribute.
    type Framebuffers: Framebuffers;

    /// Access to the CPU's internal cache and TLB RAMs, dumped by the `dtlb` attribute.
    type RamIndex: RamIndexReader;

    /// Name of the optional gate clock.
    const GATE_CLOCK: &'static str = "g3d";

    /// Name of the source clock feeding the G3D block.
    const SOURCE_CLOCK: &'static str = "aclk_400_g3d";

    /// Source clock rate programmed when a device is attached.
    const DEFAULT_CLOCK_HZ: u32 = 533_000_000;

    /// Budget for the power-up performed while attaching a device: 1 ms.
    const INIT_POLL: PollConfig = PollConfig {
        retries: 10,
        interval_us: 100,
    };

    /// Budget for power transitions after attach: 10 ms.
    const TRANSITION_POLL: PollConfig = PollConfig {
        retries: 1000,
        interval_us: 10,
    };

    /// Budget for waiting on the CMU clock divider after a frequency change.
    const CLOCK_STABLE_POLL: PollConfig = PollConfig {
        retries: 1000,
        interval_us: 1,
    };
}

/// Runs the given function and returns the result.
///
/// This stands in for `percore::exception_free` on architectures percore cannot mask exceptions
/// on, so that the crate can be built into user-space simulations on the host. Arm targets always
/// use the real one.
#[cfg(all(not(test), not(any(target_arch = "aarch64", target_arch = "arm"))))]
pub fn exception_free<T>(f: impl FnOnce(ExceptionFree) -> T) -> T {
    // SAFETY: On these architectures the crate only runs as an ordinary user-space process, so
    // there are no hardware exception handlers which could re-enter a lock held by the caller.
    let token = unsafe { ExceptionFree::new() };
    f(token)
}
