// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Memory-mapped implementations of the register traits for Exynos5 SoCs.

use super::{CmuRegisters, G3dConfiguration, G3dStatus, PowerRegisters};
use safe_mmio::{
    UniqueMmioPointer, field,
    fields::{ReadPure, ReadWrite},
};
use zerocopy::{FromBytes, KnownLayout};

/// The G3D block of the PMU, starting at `G3D_CONFIGURATION`.
#[derive(FromBytes, KnownLayout)]
#[repr(C)]
pub struct G3dPmuRegisters {
    /// `G3D_CONFIGURATION`
    pub configuration: ReadWrite<u32>,
    /// `G3D_STATUS`
    pub status: ReadPure<u32>,
    /// `G3D_OPTION`
    pub option: ReadWrite<u32>,
}

const _: () = assert!(size_of::<G3dPmuRegisters>() == 0xc);

/// Driver for the G3D power domain registers of the Exynos5 PMU.
pub struct Exynos5Pmu<'a> {
    registers: UniqueMmioPointer<'a, G3dPmuRegisters>,
}

impl<'a> Exynos5Pmu<'a> {
    /// Creates a driver for the given register block.
    pub fn new(registers: UniqueMmioPointer<'a, G3dPmuRegisters>) -> Self {
        Self { registers }
    }
}

impl PowerRegisters for Exynos5Pmu<'_> {
    fn read_status(&mut self) -> G3dStatus {
        G3dStatus::from_bits_retain(field!(self.registers, status).read())
    }

    fn write_configuration(&mut self, configuration: G3dConfiguration) {
        field!(self.registers, configuration).write(configuration.bits());
    }
}

/// Driver for the CMU_TOP registers and PMU `DEBUG` register used for G3D clock diagnostics.
pub struct Exynos5Cmu<'a> {
    clkout_cmu_top: UniqueMmioPointer<'a, ReadWrite<u32>>,
    clkdiv_stat_top0: UniqueMmioPointer<'a, ReadPure<u32>>,
    pmu_debug: UniqueMmioPointer<'a, ReadWrite<u32>>,
}

impl<'a> Exynos5Cmu<'a> {
    /// Creates a driver for the given registers.
    pub fn new(
        clkout_cmu_top: UniqueMmioPointer<'a, ReadWrite<u32>>,
        clkdiv_stat_top0: UniqueMmioPointer<'a, ReadPure<u32>>,
        pmu_debug: UniqueMmioPointer<'a, ReadWrite<u32>>,
    ) -> Self {
        Self {
            clkout_cmu_top,
            clkdiv_stat_top0,
            pmu_debug,
        }
    }
}

impl CmuRegisters for Exynos5Cmu<'_> {
    fn read_clkout_cmu_top(&mut self) -> u32 {
        self.clkout_cmu_top.read()
    }

    fn write_clkout_cmu_top(&mut self, value: u32) {
        self.clkout_cmu_top.write(value);
    }

    fn write_pmu_debug(&mut self, value: u32) {
        self.pmu_debug.write(value);
    }

    fn read_clkdiv_stat_top0(&mut self) -> u32 {
        self.clkdiv_stat_top0.read()
    }
}
