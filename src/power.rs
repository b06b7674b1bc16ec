// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Sequencing of the G3D power domain and its clock.
//!
//! Enabling always ungates the clock before requesting power, and disabling always removes power
//! before gating the clock. All transitions, and every access to the registers and clocks, happen
//! under one spin lock taken with exceptions masked, so the lock may be used from contexts where
//! sleeping is not allowed. Status polling spins with the lock held.

use crate::{
    clock::G3dClocks,
    error::{Error, Transition},
    hal::{Delay, G3dConfiguration, G3dStatus, PollConfig, PowerRegisters},
    platform::{G3dPlatform, exception_free},
};
use core::fmt::{self, Debug, Formatter};
use log::{debug, error};
use percore::ExceptionLock;
use spin::mutex::SpinMutex;

/// Requested direction for [`PowerDomainController::control`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerControl {
    /// Power the domain down, then gate its clock.
    Off,
    /// Ungate the clock, then power the domain up.
    On,
}

/// Combined power and clock state of the domain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PowerState {
    /// Domain off, clock gated.
    Off,
    /// Clock running, domain off.
    ClockOnly,
    /// Domain on, clock running.
    On,
    /// Domain on with its clock gated by [`PowerDomainController::clock_off`].
    ClockGated,
}

impl PowerState {
    fn from_flags(domain_enabled: bool, clock_enabled: bool) -> Self {
        match (domain_enabled, clock_enabled) {
            (false, false) => Self::Off,
            (false, true) => Self::ClockOnly,
            (true, true) => Self::On,
            (true, false) => Self::ClockGated,
        }
    }
}

/// A copy of the controller flags taken under the lock.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PowerSnapshot {
    /// The domain is powered.
    pub domain_enabled: bool,
    /// The gating clock is enabled.
    pub clock_enabled: bool,
}

impl PowerSnapshot {
    /// Returns the combined state these flags describe.
    pub fn state(self) -> PowerState {
        PowerState::from_flags(self.domain_enabled, self.clock_enabled)
    }
}

/// Per-device state, only reachable with the controller lock held.
struct PowerDomainState<P: G3dPlatform> {
    /// The status register last read back ready and no disable has completed since.
    domain_enabled: bool,
    /// The gating clock is enabled.
    clock_enabled: bool,
    registers: P::Registers,
    clocks: G3dClocks<P::Clock>,
    delay: P::Delay,
}

impl<P: G3dPlatform> PowerDomainState<P> {
    fn enable_domain(&mut self, poll: PollConfig) -> Result<(), Error> {
        if self.domain_enabled {
            return Ok(());
        }

        self.clock_on();
        power_on(&mut self.registers, &mut self.delay, poll)?;
        self.domain_enabled = true;
        debug!("G3D power domain on");
        Ok(())
    }

    fn disable_domain(&mut self, poll: PollConfig) -> Result<(), Error> {
        if !self.domain_enabled {
            return Ok(());
        }

        power_off(&mut self.registers, &mut self.delay, poll)?;
        self.clock_off();
        self.domain_enabled = false;
        debug!("G3D power domain off");
        Ok(())
    }

    fn clock_on(&mut self) {
        if self.clock_enabled {
            return;
        }

        // TODO: Decide whether powering the domain without a confirmed clock should be fatal.
        if let Err(e) = self.clocks.enable() {
            error!("failed to enable G3D clock, continuing: {e}");
        }
        self.clock_enabled = true;
    }

    fn clock_off(&mut self) {
        if !self.clock_enabled {
            return;
        }

        if let Err(e) = self.clocks.disable() {
            error!("failed to disable G3D clock: {e}");
        }
        self.clock_enabled = false;
    }
}

/// Requests the domain on and spins until the status register reports every switch on.
fn power_on(
    registers: &mut impl PowerRegisters,
    delay: &mut impl Delay,
    poll: PollConfig,
) -> Result<(), Error> {
    registers.write_configuration(G3dConfiguration::LOCAL_PWR_CFG);
    if poll.wait(delay, || registers.read_status().is_ready()) {
        Ok(())
    } else {
        error!(
            "failed to turn on g3d via g3d_configuration after {} us",
            poll.max_wait_us()
        );
        Err(Error::Fatal(Transition::PowerOn))
    }
}

/// Requests the domain off and spins until the status register reports every switch off.
fn power_off(
    registers: &mut impl PowerRegisters,
    delay: &mut impl Delay,
    poll: PollConfig,
) -> Result<(), Error> {
    registers.write_configuration(G3dConfiguration::empty());
    if poll.wait(delay, || registers.read_status().is_off()) {
        Ok(())
    } else {
        error!(
            "failed to turn off g3d via g3d_configuration after {} us",
            poll.max_wait_us()
        );
        Err(Error::Fatal(Transition::PowerOff))
    }
}

/// Serialises power and clock transitions of one G3D power domain.
///
/// A returned [`Error::Fatal`] means the domain did not settle. Nothing is rolled back: the clock
/// stays enabled and the domain flag keeps its previous value. The caller is expected to stop
/// using the GPU.
pub struct PowerDomainController<P: G3dPlatform> {
    state: ExceptionLock<SpinMutex<PowerDomainState<P>>>,
}

impl<P: G3dPlatform> PowerDomainController<P> {
    /// Creates a controller for a domain that is off, owning the given hardware.
    ///
    /// `clock_enabled` says whether the gating clock was left enabled by whoever acquired
    /// `clocks`.
    pub fn new(
        registers: P::Registers,
        clocks: G3dClocks<P::Clock>,
        delay: P::Delay,
        clock_enabled: bool,
    ) -> Self {
        Self {
            state: ExceptionLock::new(SpinMutex::new(PowerDomainState {
                domain_enabled: false,
                clock_enabled,
                registers,
                clocks,
                delay,
            })),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PowerDomainState<P>) -> T) -> T {
        exception_free(|token| f(&mut self.state.borrow(token).lock()))
    }

    /// Ungates the clock and powers the domain up. Does nothing if the domain is already on.
    pub fn enable_domain(&self) -> Result<(), Error> {
        self.with_state(|state| state.enable_domain(P::TRANSITION_POLL))
    }

    /// Like [`enable_domain`](Self::enable_domain), with an explicit polling budget.
    pub fn enable_domain_with(&self, poll: PollConfig) -> Result<(), Error> {
        self.with_state(|state| state.enable_domain(poll))
    }

    /// Powers the domain down and gates the clock. Does nothing if the domain is already off.
    pub fn disable_domain(&self) -> Result<(), Error> {
        self.with_state(|state| state.disable_domain(P::TRANSITION_POLL))
    }

    /// Enables or disables the domain.
    pub fn control(&self, control: PowerControl) -> Result<(), Error> {
        match control {
            PowerControl::On => self.enable_domain(),
            PowerControl::Off => self.disable_domain(),
        }
    }

    /// Ungates the clock without touching the power domain.
    pub fn clock_on(&self) -> Result<(), Error> {
        self.with_state(PowerDomainState::clock_on);
        Ok(())
    }

    /// Gates the clock without touching the power domain.
    pub fn clock_off(&self) -> Result<(), Error> {
        self.with_state(PowerDomainState::clock_off);
        Ok(())
    }

    /// Copies the flags. The result may be stale by the time the caller looks at it.
    pub fn snapshot(&self) -> PowerSnapshot {
        self.with_state(|state| PowerSnapshot {
            domain_enabled: state.domain_enabled,
            clock_enabled: state.clock_enabled,
        })
    }

    /// Returns the combined power and clock state.
    pub fn state(&self) -> PowerState {
        self.snapshot().state()
    }

    /// Reads the raw status register.
    pub fn status(&self) -> G3dStatus {
        self.with_state(|state| state.registers.read_status())
    }

    /// Returns whether the status register currently reports the domain fully on.
    pub fn is_power_on(&self) -> bool {
        self.status().is_ready()
    }

    /// Sets the source clock rate. Fails with `ClockNotEnabled` while the clock is gated.
    ///
    /// The rate is not validated.
    pub fn set_clock_rate(&self, hz: u32) -> Result<(), Error> {
        self.with_state(|state| {
            if !state.clock_enabled {
                return Err(Error::ClockNotEnabled);
            }
            state.clocks.set_rate(hz).map_err(|e| {
                error!("failed to set G3D clock to {hz} Hz: {e}");
                Error::ClockUnavailable
            })
        })
    }

    /// Returns the source clock rate in Hz.
    pub fn clock_rate(&self) -> u32 {
        self.with_state(|state| state.clocks.rate())
    }

    /// Disables the domain and drops the clock enables taken at attach time.
    pub(crate) fn shut_down(&self) -> Result<(), Error> {
        self.with_state(|state| {
            state.disable_domain(P::TRANSITION_POLL)?;
            if let Err(e) = state.clocks.release_source() {
                error!("failed to disable G3D source clock: {e}");
            }
            Ok(())
        })
    }
}

impl<P: G3dPlatform> Debug for PowerDomainController<P> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        exception_free(|token| match self.state.borrow(token).try_lock() {
            Some(state) => f
                .debug_struct("PowerDomainController")
                .field("domain_enabled", &state.domain_enabled)
                .field("clock_enabled", &state.clock_enabled)
                .finish(),
            None => f.write_str("PowerDomainController { <locked> }"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::test::{
        Event, FakeClock, FakeClockProvider, FakeDelay, FakeRegisters, Recorder,
        ShortPollPlatform, TestPlatform,
    };
    use std::{sync::Arc, thread};

    fn controller_with<
        P: G3dPlatform<Registers = FakeRegisters, Clock = FakeClock, Delay = FakeDelay>,
    >(
        recorder: &Recorder,
        registers: FakeRegisters,
        provider: FakeClockProvider,
    ) -> PowerDomainController<P> {
        let mut provider = provider;
        let clocks = G3dClocks::acquire::<P>(&mut provider).unwrap();
        let controller =
            PowerDomainController::new(registers, clocks, FakeDelay::new(recorder), true);
        recorder.clear();
        controller
    }

    fn controller(recorder: &Recorder) -> PowerDomainController<TestPlatform> {
        controller_with(
            recorder,
            FakeRegisters::new(recorder),
            FakeClockProvider::new(recorder),
        )
    }

    /// A controller whose clock starts gated, so that enabling exercises clock-on.
    fn gated_controller(recorder: &Recorder) -> PowerDomainController<TestPlatform> {
        let controller = controller(recorder);
        controller.clock_off().unwrap();
        recorder.clear();
        controller
    }

    #[test]
    fn enable_ungates_clock_before_power_on() {
        let recorder = Recorder::default();
        let controller = gated_controller(&recorder);
        assert_eq!(controller.state(), PowerState::Off);

        controller.enable_domain().unwrap();
        assert_eq!(controller.state(), PowerState::On);
        assert_eq!(
            recorder.events(),
            [
                Event::ClockEnable("g3d"),
                Event::ConfigWrite(0x7),
                Event::StatusRead,
            ]
        );
    }

    #[test]
    fn disable_powers_off_before_gating_clock() {
        let recorder = Recorder::default();
        let controller = gated_controller(&recorder);
        controller.enable_domain().unwrap();
        recorder.clear();

        controller.disable_domain().unwrap();
        assert_eq!(controller.state(), PowerState::Off);
        assert_eq!(
            recorder.events(),
            [
                Event::ConfigWrite(0x0),
                Event::StatusRead,
                Event::ClockDisable("g3d"),
            ]
        );
    }

    #[test]
    fn enable_when_on_touches_nothing() {
        let recorder = Recorder::default();
        let controller = controller(&recorder);
        controller.enable_domain().unwrap();
        recorder.clear();

        controller.enable_domain().unwrap();
        controller.control(PowerControl::On).unwrap();
        assert!(recorder.events().is_empty());
        assert_eq!(controller.state(), PowerState::On);
    }

    #[test]
    fn disable_when_off_touches_nothing() {
        let recorder = Recorder::default();
        let controller = gated_controller(&recorder);

        controller.disable_domain().unwrap();
        controller.control(PowerControl::Off).unwrap();
        assert!(recorder.events().is_empty());
        assert_eq!(controller.state(), PowerState::Off);
    }

    #[test]
    fn enable_with_running_clock_skips_clock_on() {
        let recorder = Recorder::default();
        let controller = controller(&recorder);
        assert_eq!(controller.state(), PowerState::ClockOnly);

        controller.enable_domain().unwrap();
        assert_eq!(
            recorder.events(),
            [Event::ConfigWrite(0x7), Event::StatusRead]
        );
    }

    #[test]
    fn standalone_clock_primitives() {
        let recorder = Recorder::default();
        let controller = controller(&recorder);
        controller.enable_domain().unwrap();
        recorder.clear();

        controller.clock_off().unwrap();
        controller.clock_off().unwrap();
        assert_eq!(controller.state(), PowerState::ClockGated);
        controller.clock_on().unwrap();
        controller.clock_on().unwrap();
        assert_eq!(controller.state(), PowerState::On);
        assert_eq!(
            recorder.events(),
            [Event::ClockDisable("g3d"), Event::ClockEnable("g3d")]
        );
    }

    #[test]
    fn clock_gated_domain_is_still_enabled() {
        let recorder = Recorder::default();
        let controller = controller(&recorder);
        controller.enable_domain().unwrap();
        controller.clock_off().unwrap();
        recorder.clear();

        // Already on, so the clock is not ungated.
        controller.enable_domain().unwrap();
        assert!(recorder.events().is_empty());

        // The clock is already gated, so only power is removed.
        controller.disable_domain().unwrap();
        assert_eq!(
            recorder.events(),
            [Event::ConfigWrite(0x0), Event::StatusRead]
        );
        assert_eq!(controller.state(), PowerState::Off);
    }

    #[test]
    fn clock_falls_back_to_source() {
        let recorder = Recorder::default();
        let controller: PowerDomainController<TestPlatform> = controller_with(
            &recorder,
            FakeRegisters::new(&recorder),
            FakeClockProvider::new(&recorder).without("g3d"),
        );
        controller.clock_off().unwrap();
        controller.enable_domain().unwrap();
        assert_eq!(
            recorder.events(),
            [
                Event::ClockDisable("aclk_400_g3d"),
                Event::ClockEnable("aclk_400_g3d"),
                Event::ConfigWrite(0x7),
                Event::StatusRead,
            ]
        );
    }

    #[test]
    fn clock_enable_failure_still_powers_on() {
        let recorder = Recorder::default();
        let controller: PowerDomainController<TestPlatform> = controller_with(
            &recorder,
            FakeRegisters::new(&recorder),
            FakeClockProvider::new(&recorder).failing_enable("g3d"),
        );
        controller.clock_off().unwrap();
        recorder.clear();

        controller.enable_domain().unwrap();
        assert_eq!(controller.state(), PowerState::On);
        assert_eq!(
            recorder.events(),
            [Event::ConfigWrite(0x7), Event::StatusRead]
        );
    }

    #[test]
    fn polls_until_ready() {
        let recorder = Recorder::default();
        let controller: PowerDomainController<TestPlatform> = controller_with(
            &recorder,
            FakeRegisters::new(&recorder).settling_after(2),
            FakeClockProvider::new(&recorder),
        );

        controller.enable_domain().unwrap();
        assert_eq!(
            recorder.events(),
            [
                Event::ConfigWrite(0x7),
                Event::StatusRead,
                Event::Delay(10),
                Event::StatusRead,
                Event::Delay(10),
                Event::StatusRead,
            ]
        );
    }

    #[test]
    fn power_on_timeout_is_fatal_after_exact_budget() {
        let recorder = Recorder::default();
        let controller: PowerDomainController<TestPlatform> = controller_with(
            &recorder,
            FakeRegisters::new(&recorder).stuck(),
            FakeClockProvider::new(&recorder),
        );

        assert_eq!(
            controller.enable_domain(),
            Err(Error::Fatal(Transition::PowerOn))
        );
        assert_eq!(recorder.count(Event::Delay(10)), 1000);
        assert_eq!(recorder.count(Event::StatusRead), 1001);
        assert_eq!(recorder.count(Event::ConfigWrite(0x7)), 1);
        // Nothing is unwound.
        assert_eq!(controller.state(), PowerState::ClockOnly);
    }

    #[test]
    fn init_budget_is_honoured() {
        let recorder = Recorder::default();
        let controller: PowerDomainController<TestPlatform> = controller_with(
            &recorder,
            FakeRegisters::new(&recorder).stuck(),
            FakeClockProvider::new(&recorder),
        );

        assert_eq!(
            controller.enable_domain_with(TestPlatform::INIT_POLL),
            Err(Error::Fatal(Transition::PowerOn))
        );
        assert_eq!(recorder.count(Event::Delay(100)), 10);
        assert_eq!(recorder.count(Event::StatusRead), 11);
    }

    #[test]
    fn power_off_timeout_is_fatal_after_exact_budget() {
        let recorder = Recorder::default();
        let controller: PowerDomainController<ShortPollPlatform> = controller_with(
            &recorder,
            FakeRegisters::new(&recorder),
            FakeClockProvider::new(&recorder),
        );
        controller.enable_domain().unwrap();
        controller.with_state(|state| state.registers.set_stuck(true));
        recorder.clear();

        assert_eq!(
            controller.disable_domain(),
            Err(Error::Fatal(Transition::PowerOff))
        );
        assert_eq!(
            recorder.events(),
            [
                Event::ConfigWrite(0x0),
                Event::StatusRead,
                Event::Delay(7),
                Event::StatusRead,
                Event::Delay(7),
                Event::StatusRead,
                Event::Delay(7),
                Event::StatusRead,
            ]
        );
        // The clock is left running and the domain still counts as on.
        assert_eq!(controller.state(), PowerState::On);
    }

    #[test]
    fn set_clock_rate_requires_running_clock() {
        let recorder = Recorder::default();
        let controller = controller(&recorder);

        controller.set_clock_rate(350_000_000).unwrap();
        assert_eq!(controller.clock_rate(), 350_000_000);

        controller.clock_off().unwrap();
        assert_eq!(
            controller.set_clock_rate(100_000_000),
            Err(Error::ClockNotEnabled)
        );
        assert_eq!(controller.clock_rate(), 350_000_000);
    }

    #[test]
    fn is_power_on_reads_status() {
        let recorder = Recorder::default();
        let controller = controller(&recorder);
        assert!(!controller.is_power_on());
        controller.enable_domain().unwrap();
        assert!(controller.is_power_on());
        assert_eq!(controller.status(), G3dStatus::LOCAL_PWR_STATUS);
    }

    #[test]
    fn debug_shows_flags() {
        let recorder = Recorder::default();
        let controller = controller(&recorder);
        assert_eq!(
            format!("{controller:?}"),
            "PowerDomainController { domain_enabled: false, clock_enabled: true }"
        );
    }

    #[test]
    fn concurrent_transitions_do_not_interleave() {
        let recorder = Recorder::default();
        let controller: Arc<PowerDomainController<TestPlatform>> = Arc::new(controller_with(
            &recorder,
            FakeRegisters::new(&recorder).settling_after(3),
            FakeClockProvider::new(&recorder),
        ));
        controller.clock_off().unwrap();
        recorder.clear();

        let threads: Vec<_> = (0..4)
            .map(|thread_index| {
                let controller = controller.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        match (thread_index + i) % 4 {
                            0 => controller.enable_domain().unwrap(),
                            1 => controller.disable_domain().unwrap(),
                            2 => controller.clock_on().unwrap(),
                            _ => controller.clock_off().unwrap(),
                        }
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        // Replay the log: each transition must appear as one uninterrupted group.
        let events = recorder.events();
        let mut domain_on = false;
        let mut clock_on = false;
        let mut i = 0;
        while i < events.len() {
            match events[i] {
                Event::ClockEnable(_) => {
                    assert!(!clock_on);
                    clock_on = true;
                    i += 1;
                }
                Event::ClockDisable(_) => {
                    assert!(clock_on);
                    clock_on = false;
                    i += 1;
                }
                Event::ConfigWrite(value) => {
                    let turning_on = value == 0x7;
                    assert_ne!(turning_on, domain_on);
                    if turning_on {
                        // Power on is only requested with the clock running.
                        assert!(clock_on);
                    }
                    i += 1;
                    // Exactly three not-ready reads, then the settled read.
                    for _ in 0..3 {
                        assert_eq!(events[i], Event::StatusRead);
                        assert_eq!(events[i + 1], Event::Delay(10));
                        i += 2;
                    }
                    assert_eq!(events[i], Event::StatusRead);
                    i += 1;
                    domain_on = turning_on;
                    if !turning_on && clock_on {
                        // Disabling gates the clock right after power off.
                        assert!(matches!(events[i], Event::ClockDisable(_)));
                    }
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(
            controller.snapshot(),
            PowerSnapshot {
                domain_enabled: domain_on,
                clock_enabled: clock_on,
            }
        );
    }
}
