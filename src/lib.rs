// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Power domain and clock sequencing for the G3D (Mali-T6xx) block of Exynos5 SoCs.
//!
//! The [`power::PowerDomainController`] brings the G3D power domain and its clock up and down in a
//! strict nested order (clock outside, power inside) behind a single interrupt-safe lock. Devices
//! are attached and detached through [`device::DeviceTable`], which also hands out the per-device
//! governor hooks and diagnostic attributes.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod governor;
pub mod hal;
pub mod logger;
pub mod platform;
pub mod power;

pub use crate::{
    device::{DeviceId, DeviceTable, PlatformContext, PlatformResources},
    diagnostics::{Attribute, Page, RamId},
    error::{Error, Transition},
    governor::{DvfsGovernor, DvfsLevel},
    platform::G3dPlatform,
    power::{PowerControl, PowerDomainController, PowerSnapshot, PowerState},
};
