// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Text attributes for inspecting and tuning a G3D device at runtime.
//!
//! Each attribute is shown as a [`Page`] of text ending in a newline, and stored from a line of
//! text with an optional trailing newline. A successful store returns the number of bytes
//! consumed, which is always the whole input. Reads are snapshots and are not ordered against
//! concurrent power transitions.

mod dtlb;
mod page;

pub(crate) use dtlb::RamDump;
pub use dtlb::RamId;
pub use page::{PAGE_SIZE, Page};

use crate::{
    device::{CmuAccess, PlatformContext},
    error::Error,
    governor::{DvfsGovernor, DvfsLevel},
    hal::{CmuRegisters, Framebuffers},
    platform::G3dPlatform,
};
use core::num::IntErrorKind;
use log::{debug, error, warn};

/// `CLKOUT_CMU_TOP` source field.
const CLKOUT_SOURCE_MASK: u32 = 0x1f;
/// `CLKOUT_CMU_TOP` source selecting ACLK_400, the G3D clock.
const CLKOUT_SOURCE_ACLK_400: u32 = 0xb;
/// ACLK_400 selected, divided by 9 + 1, output enabled.
const CLKOUT_CMU_TOP_G3D: u32 = 0x1_000b | 9 << 8;
/// PMU `DEBUG` value routing `CLKOUT_CMU_TOP` to the XCLKOUT pin.
const PMU_DEBUG_CLKOUT_CMU_TOP: u32 = 7 << 8;
/// `CLKDIV_STAT_TOP0` bit set while the ACLK_400 divider is changing.
const CLKDIV_STAT_ACLK_400_BUSY: u32 = 1 << 24;

/// Boost durations at or above this many milliseconds are ignored.
const BOOST_DURATION_LIMIT_MS: u32 = 3000;

/// A diagnostic attribute of a G3D device.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attribute {
    /// G3D clock frequency. Storing a frequency in MHz moves the governor to that level.
    Clock,
    /// Size and address of each registered framebuffer. Read only.
    Fbdev,
    /// Dumps the selected internal CPU RAM to the log. Storing a [`RamId`] name selects the RAM.
    Dtlb,
    /// Supply voltage and raw power domain status. Read only.
    Vol,
    /// Whether the XCLKOUT debug pin carries the G3D clock. Storing `3d` routes it there.
    Clkout,
    /// Whether the governor is running, and the GPU utilisation. Stores `on` or `off`.
    Dvfs,
    /// Highest level the governor may pick.
    DvfsUpperLock,
    /// Lowest level the governor may pick.
    DvfsUnderLock,
    /// The governor's adaptive supply voltage table.
    Asv,
    /// Time the governor has spent at each level.
    TimeInState,
    /// Length of a boost in milliseconds.
    DvfsBoostTimeDuration,
    /// Frequency used while boosting, in MHz.
    DvfsGpuBoostFreq,
}

impl Attribute {
    /// All attributes, in the order they are created.
    pub const ALL: [Self; 12] = [
        Self::Clock,
        Self::Fbdev,
        Self::Dtlb,
        Self::Vol,
        Self::Clkout,
        Self::Dvfs,
        Self::DvfsUpperLock,
        Self::DvfsUnderLock,
        Self::Asv,
        Self::TimeInState,
        Self::DvfsBoostTimeDuration,
        Self::DvfsGpuBoostFreq,
    ];

    /// Returns the file name of the attribute.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Fbdev => "fbdev",
            Self::Dtlb => "dtlb",
            Self::Vol => "vol",
            Self::Clkout => "clkout",
            Self::Dvfs => "dvfs",
            Self::DvfsUpperLock => "dvfs_upper_lock",
            Self::DvfsUnderLock => "dvfs_under_lock",
            Self::Asv => "asv",
            Self::TimeInState => "time_in_state",
            Self::DvfsBoostTimeDuration => "dvfs_boost_time_duration",
            Self::DvfsGpuBoostFreq => "dvfs_gpu_boost_freq",
        }
    }

    /// Looks an attribute up by file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attribute| attribute.name() == name)
    }

    /// Returns whether the attribute accepts stores.
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Fbdev | Self::Vol)
    }
}

/// Strips the single trailing newline a shell `echo` leaves on stored values.
fn trim_newline(input: &str) -> &str {
    input.strip_suffix('\n').unwrap_or(input)
}

/// Parses a decimal `u32`, with an optional leading `+` and trailing newline.
fn parse_u32(input: &str) -> Result<u32, Error> {
    trim_newline(input)
        .parse()
        .map_err(|e: core::num::ParseIntError| match e.kind() {
            IntErrorKind::PosOverflow => Error::OutOfRange,
            _ => Error::InvalidArgument,
        })
}

impl<P: G3dPlatform> PlatformContext<P> {
    /// Renders the given attribute.
    pub fn show(&self, attribute: Attribute) -> Page {
        let mut page = Page::new();
        match attribute {
            Attribute::Clock => self.show_clock(&mut page),
            Attribute::Fbdev => self.show_fbdev(&mut page),
            Attribute::Dtlb => self.show_dtlb(&mut page),
            Attribute::Vol => self.show_vol(&mut page),
            Attribute::Clkout => self.show_clkout(&mut page),
            Attribute::Dvfs => self.show_dvfs(&mut page),
            Attribute::DvfsUpperLock => self.show_upper_lock(&mut page),
            Attribute::DvfsUnderLock => self.show_under_lock(&mut page),
            Attribute::Asv => self.with_governor(|governor| governor.show_asv_table(&mut page)),
            Attribute::TimeInState => {
                self.with_governor(|governor| governor.show_time_in_state(&mut page))
            }
            Attribute::DvfsBoostTimeDuration => self.show_boost_time_duration(&mut page),
            Attribute::DvfsGpuBoostFreq => self.show_gpu_boost_freq(&mut page),
        }
        page.finish()
    }

    /// Applies `input` to the given attribute, returning how many bytes were consumed.
    pub fn store(&self, attribute: Attribute, input: &str) -> Result<usize, Error> {
        match attribute {
            Attribute::Clock => self.store_clock(input)?,
            Attribute::Dtlb => self.store_dtlb(input),
            Attribute::Fbdev | Attribute::Vol => {
                warn!("{} is read only", attribute.name());
                return Err(Error::InvalidArgument);
            }
            Attribute::Clkout => self.store_clkout(input),
            Attribute::Dvfs => self.store_dvfs(input),
            Attribute::DvfsUpperLock => self.store_upper_lock(input)?,
            Attribute::DvfsUnderLock => self.store_under_lock(input)?,
            Attribute::Asv => self.with_governor(|governor| governor.store_asv_table(input))?,
            Attribute::TimeInState => {
                self.with_governor(|governor| governor.store_time_in_state(input))?
            }
            Attribute::DvfsBoostTimeDuration => self.store_boost_time_duration(input)?,
            Attribute::DvfsGpuBoostFreq => self.store_gpu_boost_freq(input)?,
        }
        Ok(input.len())
    }

    fn show_clock(&self, page: &mut Page) {
        write!(
            page,
            "Current sclk_g3d[G3D_BLK] = {}Mhz",
            self.power.clock_rate() / 1_000_000
        );
        write!(
            page,
            "\nPossible settings : 720, 667, 612, 533, 450, 400, 350, 266, 160, 100Mhz"
        );
    }

    fn store_clock(&self, input: &str) -> Result<(), Error> {
        let Some(level) = DvfsLevel::from_label(trim_newline(input)) else {
            error!("set_clock: invalid value {:?}", trim_newline(input));
            return Err(Error::InvalidValue);
        };
        self.with_governor(|governor| governor.set_level(level));

        let stable = self.with_cmu(|CmuAccess { registers, delay }| {
            P::CLOCK_STABLE_POLL.wait(delay, || {
                registers.read_clkdiv_stat_top0() & CLKDIV_STAT_ACLK_400_BUSY == 0
            })
        });
        if stable {
            Ok(())
        } else {
            warn!("G3D clock divider still busy after switching to {level} MHz");
            Err(Error::HardwareTimeout)
        }
    }

    fn show_fbdev(&self, page: &mut Page) {
        for index in 0..self.framebuffers.count() {
            if let Some(fb) = self.framebuffers.get(index) {
                write!(
                    page,
                    "fb[{index}] xres={}, yres={}, addr=0x{:x}\n",
                    fb.xres, fb.yres, fb.base
                );
            }
        }
    }

    fn show_dtlb(&self, page: &mut Page) {
        self.with_ram_dump(RamDump::dump);
        write!(page, "Succeeded...\n");
    }

    fn store_dtlb(&self, input: &str) {
        match RamId::from_name(trim_newline(input)) {
            Some(ram) => self.with_ram_dump(|ram_dump| ram_dump.selected = ram),
            None => {
                debug!("invalid dtlb value, available options are:");
                for ram in RamId::ALL {
                    debug!("  {}", ram.name());
                }
            }
        }
    }

    fn show_vol(&self, page: &mut Page) {
        let voltage = self.with_governor(|governor| governor.voltage_uv());
        write!(
            page,
            "Current operating voltage for mali t6xx = {}, 0x{:x}",
            voltage,
            self.power.status().bits()
        );
    }

    fn show_clkout(&self, page: &mut Page) {
        let value = self.with_cmu(|cmu| cmu.registers.read_clkout_cmu_top());
        if value & CLKOUT_SOURCE_MASK == CLKOUT_SOURCE_ACLK_400 {
            write!(
                page,
                "Current CLKOUT is g3d divided by 10, CLKOUT_CMU_TOP=0x{value:x}"
            );
        } else {
            write!(page, "Current CLKOUT is not g3d, CLKOUT_CMU_TOP=0x{value:x}");
        }
    }

    fn store_clkout(&self, input: &str) {
        if trim_newline(input) == "3d" {
            self.with_cmu(|cmu| {
                cmu.registers.write_clkout_cmu_top(CLKOUT_CMU_TOP_G3D);
                cmu.registers.write_pmu_debug(PMU_DEBUG_CLKOUT_CMU_TOP);
            });
        } else {
            debug!("invalid clkout value, only 3d is accepted");
        }
    }

    fn show_dvfs(&self, page: &mut Page) {
        self.with_governor(|governor| {
            if governor.is_enabled() {
                write!(
                    page,
                    "G3D DVFS is on\nutilisation:{}",
                    governor.utilisation()
                );
            } else {
                write!(page, "G3D DVFS is off");
            }
        });
    }

    fn store_dvfs(&self, input: &str) {
        match trim_newline(input) {
            "off" => self.with_governor(|governor| governor.set_enabled(false)),
            "on" => self.with_governor(|governor| governor.set_enabled(true)),
            _ => debug!("invalid dvfs value, only on and off are accepted"),
        }
    }

    fn show_upper_lock(&self, page: &mut Page) {
        match self.with_governor(|governor| governor.upper_lock()) {
            Some(level) => write!(page, "Current Upper Lock Level = {}Mhz", level.mhz()),
            None => write!(page, "Unset the Upper Lock Level"),
        }
        write!(
            page,
            "\nPossible settings : 667, 612, 533, 450, 400, 266, 160, 100, If you want to unlock : 720 or off"
        );
    }

    fn store_upper_lock(&self, input: &str) -> Result<(), Error> {
        let lock = match trim_newline(input) {
            "off" => None,
            value => match DvfsLevel::from_label(value) {
                Some(DvfsLevel::MAX) => None,
                Some(level) => Some(level),
                None => {
                    error!("dvfs_upper_lock: invalid value {value:?}");
                    return Err(Error::InvalidValue);
                }
            },
        };
        self.with_governor(|governor| governor.set_upper_lock(lock));
        Ok(())
    }

    fn show_under_lock(&self, page: &mut Page) {
        match self.with_governor(|governor| governor.under_lock()) {
            Some(level) => write!(page, "Current Under Lock Level = {}Mhz", level.mhz()),
            None => write!(page, "Unset the Under Lock Level"),
        }
        write!(
            page,
            "\nPossible settings : 720, 667, 612, 533, 450, 400, 266, 160, If you want to unlock : 100 or off"
        );
    }

    fn store_under_lock(&self, input: &str) -> Result<(), Error> {
        let lock = match trim_newline(input) {
            "off" => None,
            value => match DvfsLevel::from_label(value) {
                Some(DvfsLevel::MIN) => None,
                Some(level) => Some(level),
                None => {
                    error!("dvfs_under_lock: invalid value {value:?}");
                    return Err(Error::InvalidValue);
                }
            },
        };
        self.with_governor(|governor| governor.set_under_lock(lock));
        Ok(())
    }

    fn show_boost_time_duration(&self, page: &mut Page) {
        write!(
            page,
            "Current gpu boost duration is {}msecs",
            self.with_governor(|governor| governor.boost_duration_us()) / 1000
        );
    }

    fn store_boost_time_duration(&self, input: &str) -> Result<(), Error> {
        let duration_ms = parse_u32(input)?;
        if duration_ms < BOOST_DURATION_LIMIT_MS {
            self.with_governor(|governor| governor.set_boost_duration_us(duration_ms * 1000));
        }
        Ok(())
    }

    fn show_gpu_boost_freq(&self, page: &mut Page) {
        write!(
            page,
            "Current gpu boost freq is {} Mhz",
            self.with_governor(|governor| governor.boost_level()).mhz()
        );
    }

    fn store_gpu_boost_freq(&self, input: &str) -> Result<(), Error> {
        let mhz = parse_u32(input)?;
        match DvfsLevel::from_mhz(mhz) {
            Some(level) if level <= DvfsLevel::MAX_BOOST => {
                self.with_governor(|governor| governor.set_boost_level(level));
                Ok(())
            }
            _ => {
                error!("set_boost_clock: invalid value {mhz}");
                Err(Error::InvalidValue)
            }
        }
    }
}
