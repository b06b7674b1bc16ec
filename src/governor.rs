// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Interface to the DVFS governor which picks the G3D operating point.

use crate::{diagnostics::Page, error::Error};
use core::fmt::{self, Display, Formatter};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A G3D operating point, indexed the way the governor indexes its table.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, Ord, PartialEq, PartialOrd, TryFromPrimitive)]
#[repr(u8)]
pub enum DvfsLevel {
    /// 100 MHz.
    Mhz100 = 0,
    /// 160 MHz.
    Mhz160 = 1,
    /// 266 MHz.
    Mhz266 = 2,
    /// 350 MHz.
    Mhz350 = 3,
    /// 400 MHz.
    Mhz400 = 4,
    /// 450 MHz.
    Mhz450 = 5,
    /// 533 MHz.
    Mhz533 = 6,
    /// 612 MHz.
    Mhz612 = 7,
    /// 667 MHz.
    Mhz667 = 8,
    /// 720 MHz.
    Mhz720 = 9,
}

impl DvfsLevel {
    /// All levels, slowest first.
    pub const ALL: [Self; 10] = [
        Self::Mhz100,
        Self::Mhz160,
        Self::Mhz266,
        Self::Mhz350,
        Self::Mhz400,
        Self::Mhz450,
        Self::Mhz533,
        Self::Mhz612,
        Self::Mhz667,
        Self::Mhz720,
    ];

    /// The slowest level.
    pub const MIN: Self = Self::Mhz100;

    /// The fastest level.
    pub const MAX: Self = Self::Mhz720;

    /// The fastest level which may be used as a boost target.
    pub const MAX_BOOST: Self = Self::Mhz533;

    /// Returns the G3D clock frequency of this level in MHz.
    pub const fn mhz(self) -> u32 {
        match self {
            Self::Mhz100 => 100,
            Self::Mhz160 => 160,
            Self::Mhz266 => 266,
            Self::Mhz350 => 350,
            Self::Mhz400 => 400,
            Self::Mhz450 => 450,
            Self::Mhz533 => 533,
            Self::Mhz612 => 612,
            Self::Mhz667 => 667,
            Self::Mhz720 => 720,
        }
    }

    /// Returns the frequency in MHz as decimal text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mhz100 => "100",
            Self::Mhz160 => "160",
            Self::Mhz266 => "266",
            Self::Mhz350 => "350",
            Self::Mhz400 => "400",
            Self::Mhz450 => "450",
            Self::Mhz533 => "533",
            Self::Mhz612 => "612",
            Self::Mhz667 => "667",
            Self::Mhz720 => "720",
        }
    }

    /// Returns the G3D clock frequency of this level in Hz.
    pub const fn hz(self) -> u32 {
        self.mhz() * 1_000_000
    }

    /// Returns the level running at exactly `mhz`, if any.
    pub fn from_mhz(mhz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.mhz() == mhz)
    }

    /// Returns the level whose [`label`](Self::label) is exactly `label`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.label() == label)
    }
}

impl Display for DvfsLevel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The DVFS governor driving the G3D clock.
///
/// The governor owns utilisation sampling, the level tables and the voltage regulator. It changes
/// the clock through [`PowerDomainController::set_clock_rate`], which refuses while the clock is
/// gated.
///
/// [`PowerDomainController::set_clock_rate`]: crate::power::PowerDomainController::set_clock_rate
pub trait DvfsGovernor {
    /// Returns whether the governor is adjusting the level.
    fn is_enabled(&self) -> bool;

    /// Starts or stops the governor.
    fn set_enabled(&mut self, enabled: bool);

    /// Returns the last sampled GPU utilisation, 0 to 255.
    fn utilisation(&self) -> u32;

    /// Moves to the given level, within the current locks.
    fn set_level(&mut self, level: DvfsLevel);

    /// Returns the level the governor may not go above, if locked.
    fn upper_lock(&self) -> Option<DvfsLevel>;

    /// Sets or clears the upper lock.
    fn set_upper_lock(&mut self, level: Option<DvfsLevel>);

    /// Returns the level the governor may not go below, if locked.
    fn under_lock(&self) -> Option<DvfsLevel>;

    /// Sets or clears the under lock.
    fn set_under_lock(&mut self, level: Option<DvfsLevel>);

    /// Returns how long a boost lasts, in microseconds.
    fn boost_duration_us(&self) -> u32;

    /// Sets how long a boost lasts, in microseconds.
    fn set_boost_duration_us(&mut self, duration_us: u32);

    /// Returns the level used while boosting.
    fn boost_level(&self) -> DvfsLevel;

    /// Sets the level used while boosting.
    fn set_boost_level(&mut self, level: DvfsLevel);

    /// Returns the G3D supply voltage in microvolts.
    fn voltage_uv(&self) -> u32;

    /// Writes the adaptive supply voltage table shown by the `asv` attribute.
    fn show_asv_table(&self, page: &mut Page);

    /// Replaces entries of the adaptive supply voltage table from text stored to `asv`.
    fn store_asv_table(&mut self, input: &str) -> Result<(), Error>;

    /// Writes how long the governor has spent at each level, for the `time_in_state` attribute.
    fn show_time_in_state(&self, page: &mut Page);

    /// Handles text stored to `time_in_state`, typically to reset the counters.
    fn store_time_in_state(&mut self, input: &str) -> Result<(), Error>;
}
