// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

use super::G3dPlatform;
use crate::{
    device::PlatformResources,
    governor::DvfsGovernor,
    hal::{
        Clock, Framebuffers, RamIndexReader,
        delay::SpinDelay,
        mmio::{Exynos5Cmu, Exynos5Pmu, G3dPmuRegisters},
    },
};
use core::{marker::PhantomData, ptr::NonNull};
use safe_mmio::{
    UniqueMmioPointer,
    fields::{ReadPure, ReadWrite},
};

const CMU_BASE: usize = 0x1001_0000;
const PMU_BASE: usize = 0x1004_0000;

const G3D_CONFIGURATION: usize = PMU_BASE + 0x4060;
const PMU_DEBUG: usize = PMU_BASE + 0x0a00;
const CLKDIV_STAT_TOP0: usize = CMU_BASE + 0x1_0610;
const CLKOUT_CMU_TOP: usize = CMU_BASE + 0x1_0a00;

/// Busy-wait loop iterations per microsecond for a Cortex-A15 at 1.7 GHz.
pub const SPIN_LOOPS_PER_US: u32 = 1700;

const fn mmio<T>(address: usize) -> NonNull<T> {
    match NonNull::new(address as *mut T) {
        Some(pointer) => pointer,
        None => panic!("MMIO address must not be null"),
    }
}

/// Exynos5250 with the clock framework, DVFS governor and framebuffer list supplied by the caller.
///
/// On the Cortex-A15 cores of the Exynos5250 the RAM reader is `hal::cp15::Cp15RamIndex`.
pub struct Exynos5<C, G, F, R> {
    _phantom: PhantomData<(C, G, F, R)>,
}

impl<C: Clock, G: DvfsGovernor, F: Framebuffers, R: RamIndexReader> G3dPlatform
    for Exynos5<C, G, F, R>
{
    type Registers = Exynos5Pmu<'static>;
    type Cmu = Exynos5Cmu<'static>;
    type Clock = C;
    type Delay = SpinDelay;
    type Governor = G;
    type Framebuffers = F;
    type RamIndex = R;
}

/// Returns the Exynos5250 G3D registers, ready to be attached with the given host services.
///
/// # Safety
///
/// The PMU and CMU must be mapped as device memory at their physical addresses, and nothing else
/// may access the G3D PMU registers, `PMU_DEBUG`, `CLKDIV_STAT_TOP0` or `CLKOUT_CMU_TOP` while the
/// returned resources exist. This must be called at most once.
pub unsafe fn resources<C: Clock, G: DvfsGovernor, F: Framebuffers, R: RamIndexReader>(
    governor: G,
    framebuffers: F,
    ram_index: R,
) -> PlatformResources<Exynos5<C, G, F, R>> {
    // SAFETY: The caller guarantees that these registers are mapped and that we have exclusive
    // access to them.
    let (registers, clkout_cmu_top, clkdiv_stat_top0, pmu_debug) = unsafe {
        (
            UniqueMmioPointer::<G3dPmuRegisters>::new(mmio(G3D_CONFIGURATION)),
            UniqueMmioPointer::<ReadWrite<u32>>::new(mmio(CLKOUT_CMU_TOP)),
            UniqueMmioPointer::<ReadPure<u32>>::new(mmio(CLKDIV_STAT_TOP0)),
            UniqueMmioPointer::<ReadWrite<u32>>::new(mmio(PMU_DEBUG)),
        )
    };
    PlatformResources {
        registers: Exynos5Pmu::new(registers),
        cmu: Exynos5Cmu::new(clkout_cmu_top, clkdiv_stat_top0, pmu_debug),
        delay: SpinDelay::new(SPIN_LOOPS_PER_US),
        governor,
        framebuffers,
        ram_index,
    }
}
