// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Error types shared by the power controller, the device lifecycle and the diagnostic attributes.

use core::fmt::{self, Display, Formatter};
use thiserror::Error;

const EPERM: i32 = 1;
const ENOENT: i32 = 2;
const ENOMEM: i32 = 12;
const ENODEV: i32 = 19;
const EINVAL: i32 = 22;
const ERANGE: i32 = 34;
const ETIMEDOUT: i32 = 110;

/// A power domain transition that polls the status register.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Requesting the domain on and waiting for it to report ready.
    PowerOn,
    /// Requesting the domain off and waiting for it to report not ready.
    PowerOff,
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::PowerOn => f.write_str("turn on"),
            Self::PowerOff => f.write_str("turn off"),
        }
    }
}

/// Errors returned by this crate.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// The device handle does not refer to an initialised device.
    #[error("no such G3D device")]
    InvalidDevice,
    /// A clock could not be acquired or configured.
    #[error("G3D clock unavailable")]
    ClockUnavailable,
    /// No free device slot was left.
    #[error("out of memory for G3D platform context")]
    OutOfMemory,
    /// The clock rate was changed while the clock was gated.
    #[error("G3D clock is not enabled")]
    ClockNotEnabled,
    /// An attribute was written with a value outside its accepted set.
    #[error("invalid value")]
    InvalidValue,
    /// An attribute was written with text that does not parse.
    #[error("invalid argument")]
    InvalidArgument,
    /// An attribute was written with a number that does not fit.
    #[error("value out of range")]
    OutOfRange,
    /// A non-critical register wait ran out of retries.
    #[error("timed out waiting for hardware")]
    HardwareTimeout,
    /// The power domain did not settle. The caller must not keep using the GPU.
    #[error("failed to {0} g3d power")]
    Fatal(Transition),
}

impl Error {
    /// Returns whether the error leaves the hardware in an unknown state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Returns the negative status code reported to driver lifecycle callers.
    pub fn errno(&self) -> i32 {
        -match self {
            Self::InvalidDevice => ENODEV,
            Self::ClockUnavailable | Self::ClockNotEnabled => EPERM,
            Self::OutOfMemory => ENOMEM,
            Self::InvalidValue => ENOENT,
            Self::InvalidArgument => EINVAL,
            Self::OutOfRange => ERANGE,
            Self::HardwareTimeout | Self::Fatal(_) => ETIMEDOUT,
        }
    }
}

impl From<Error> for i32 {
    fn from(error: Error) -> Self {
        error.errno()
    }
}
