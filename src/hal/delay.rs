// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

use super::Delay;
use core::hint::spin_loop;

/// A calibrated busy-wait loop.
///
/// This never sleeps, so it is usable with interrupts masked.
#[derive(Clone, Copy, Debug)]
pub struct SpinDelay {
    loops_per_us: u32,
}

impl SpinDelay {
    /// Creates a delay which spins `loops_per_us` times per microsecond.
    pub const fn new(loops_per_us: u32) -> Self {
        Self { loops_per_us }
    }
}

impl Delay for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        for _ in 0..u64::from(us) * u64::from(self.loops_per_us) {
            spin_loop();
        }
    }
}
