// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! The pair of clocks feeding the G3D block.

use crate::{
    error::Error,
    hal::{Clock, ClockError, ClockProvider},
    platform::G3dPlatform,
};
use log::error;

/// The optional gate clock and the required source clock of the G3D block.
///
/// Gating is done on the gate clock when the platform provides one, otherwise on the source clock.
/// The source clock always carries the frequency.
#[derive(Debug)]
pub struct G3dClocks<C> {
    gate: Option<C>,
    source: C,
}

impl<C: Clock> G3dClocks<C> {
    /// Acquires and enables the clocks named by `P`, programming the source clock to
    /// `P::DEFAULT_CLOCK_HZ`.
    ///
    /// A missing gate clock is logged and tolerated. A missing source clock, or a failure to set
    /// its rate, fails with `ClockUnavailable` after gating anything this call enabled.
    pub fn acquire<P: G3dPlatform<Clock = C>>(
        provider: &mut impl ClockProvider<Clock = C>,
    ) -> Result<Self, Error> {
        let gate = match provider.get(P::GATE_CLOCK) {
            Ok(mut gate) => {
                if let Err(e) = gate.enable() {
                    error!("failed to enable clock {}: {e}", P::GATE_CLOCK);
                }
                Some(gate)
            }
            Err(e) => {
                error!("failed to get clock {}: {e}", P::GATE_CLOCK);
                None
            }
        };

        let mut clocks = match provider.get(P::SOURCE_CLOCK) {
            Ok(source) => Self { gate, source },
            Err(e) => {
                error!("failed to get clock {}: {e}", P::SOURCE_CLOCK);
                if let Some(mut gate) = gate {
                    let _ = gate.disable();
                }
                return Err(Error::ClockUnavailable);
            }
        };

        if let Err(e) = clocks.source.set_rate(P::DEFAULT_CLOCK_HZ) {
            error!(
                "failed to set clock {} to {} Hz: {e}",
                P::SOURCE_CLOCK,
                P::DEFAULT_CLOCK_HZ
            );
            if let Some(gate) = &mut clocks.gate {
                let _ = gate.disable();
            }
            return Err(Error::ClockUnavailable);
        }
        if let Err(e) = clocks.source.enable() {
            error!("failed to enable clock {}: {e}", P::SOURCE_CLOCK);
        }

        Ok(clocks)
    }

    /// Returns whether a separate gate clock was acquired.
    pub fn has_gate(&self) -> bool {
        self.gate.is_some()
    }

    /// Ungates the G3D clock.
    pub fn enable(&mut self) -> Result<(), ClockError> {
        self.gating_clock().enable()
    }

    /// Gates the G3D clock.
    pub fn disable(&mut self) -> Result<(), ClockError> {
        self.gating_clock().disable()
    }

    /// Sets the source clock rate in Hz.
    pub fn set_rate(&mut self, hz: u32) -> Result<(), ClockError> {
        self.source.set_rate(hz)
    }

    /// Returns the source clock rate in Hz.
    pub fn rate(&self) -> u32 {
        self.source.rate()
    }

    /// Drops the enable taken on the source clock by [`acquire`](Self::acquire), when gating was
    /// done on a separate gate clock.
    pub fn release_source(&mut self) -> Result<(), ClockError> {
        if self.gate.is_some() {
            self.source.disable()
        } else {
            Ok(())
        }
    }

    fn gating_clock(&mut self) -> &mut C {
        self.gate.as_mut().unwrap_or(&mut self.source)
    }
}
