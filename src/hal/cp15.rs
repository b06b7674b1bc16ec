// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Cortex-A15 RAMINDEX access through the implementation defined CP15 registers.

use super::RamIndexReader;
use core::arch::asm;

/// Reads the internal RAMs of the Cortex-A15 this code is running on.
///
/// Must only be used at PL1 or above, on a Cortex-A15.
#[derive(Debug)]
pub struct Cp15RamIndex {
    _private: (),
}

impl Cp15RamIndex {
    /// Returns a reader for the current core.
    ///
    /// # Safety
    ///
    /// The caller must be running at PL1 or above on a Cortex-A15, and nothing else may use the
    /// RAMINDEX and DL1DATA registers while the reader exists.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RamIndexReader for Cp15RamIndex {
    fn read(&mut self, index: u32) -> [u32; 4] {
        let mut data = [0; 4];
        // SAFETY: `new` requires a Cortex-A15 at PL1 with exclusive use of RAMINDEX. Writing
        // RAMINDEX only latches the selected entry into DL1DATA0-3, which are then read back.
        unsafe {
            asm!(
                "mcr p15, 0, {index}, c15, c4, 0",
                "dsb",
                "isb",
                "mrc p15, 0, {d0}, c15, c1, 0",
                "mrc p15, 0, {d1}, c15, c1, 1",
                "mrc p15, 0, {d2}, c15, c1, 2",
                "mrc p15, 0, {d3}, c15, c1, 3",
                index = in(reg) index,
                d0 = out(reg) data[0],
                d1 = out(reg) data[1],
                d2 = out(reg) data[2],
                d3 = out(reg) data[3],
                options(nostack),
            );
        }
        data
    }
}
