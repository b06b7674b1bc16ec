// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! Attaching and detaching G3D devices.

use crate::{
    clock::G3dClocks,
    diagnostics::{RamDump, RamId},
    error::Error,
    hal::ClockProvider,
    platform::{G3dPlatform, exception_free},
    power::{PowerControl, PowerDomainController},
};
use core::array;
use log::{error, info};
use percore::ExceptionLock;
use spin::mutex::SpinMutex;

/// The hardware handed over when a device is attached.
pub struct PlatformResources<P: G3dPlatform> {
    /// PMU registers of the G3D power domain.
    pub registers: P::Registers,
    /// CMU registers used by the clock diagnostics.
    pub cmu: P::Cmu,
    /// Delay used for status polling.
    pub delay: P::Delay,
    /// The DVFS governor for this device.
    pub governor: P::Governor,
    /// The registered framebuffers.
    pub framebuffers: P::Framebuffers,
    /// Access to the CPU's internal RAMs.
    pub ram_index: P::RamIndex,
}

/// CMU registers together with the delay used to poll them.
pub(crate) struct CmuAccess<P: G3dPlatform> {
    pub(crate) registers: P::Cmu,
    pub(crate) delay: P::Delay,
}

/// Everything owned by one attached device.
pub struct PlatformContext<P: G3dPlatform> {
    pub(crate) power: PowerDomainController<P>,
    cmu: ExceptionLock<SpinMutex<CmuAccess<P>>>,
    governor: ExceptionLock<SpinMutex<P::Governor>>,
    ram_dump: ExceptionLock<SpinMutex<RamDump<P::RamIndex>>>,
    pub(crate) framebuffers: P::Framebuffers,
}

impl<P: G3dPlatform> PlatformContext<P> {
    /// Returns the power controller of this device.
    pub fn power(&self) -> &PowerDomainController<P> {
        &self.power
    }

    /// Calls `f` with the governor of this device locked.
    pub fn with_governor<T>(&self, f: impl FnOnce(&mut P::Governor) -> T) -> T {
        exception_free(|token| f(&mut self.governor.borrow(token).lock()))
    }

    /// Returns the internal RAM the `dtlb` attribute dumps.
    pub fn selected_ram(&self) -> RamId {
        self.with_ram_dump(|ram_dump| ram_dump.selected)
    }

    pub(crate) fn with_cmu<T>(&self, f: impl FnOnce(&mut CmuAccess<P>) -> T) -> T {
        exception_free(|token| f(&mut self.cmu.borrow(token).lock()))
    }

    pub(crate) fn with_ram_dump<T>(&self, f: impl FnOnce(&mut RamDump<P::RamIndex>) -> T) -> T {
        exception_free(|token| f(&mut self.ram_dump.borrow(token).lock()))
    }
}

/// Identifies an attached device.
///
/// An ID stops being valid once its device is terminated, even if the slot is reused.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceId {
    index: usize,
    generation: u32,
}

impl DeviceId {
    /// Returns the slot index of the device.
    pub fn index(self) -> usize {
        self.index
    }
}

struct Slot<P: G3dPlatform> {
    generation: u32,
    context: Option<PlatformContext<P>>,
}

/// A fixed-capacity table of attached devices.
pub struct DeviceTable<P: G3dPlatform, const N: usize> {
    slots: [Slot<P>; N],
}

impl<P: G3dPlatform, const N: usize> DeviceTable<P, N> {
    /// Creates a table with no devices attached.
    pub fn new() -> Self {
        Self {
            slots: array::from_fn(|_| Slot {
                generation: 0,
                context: None,
            }),
        }
    }

    /// Attaches a device.
    ///
    /// Acquires and enables the clocks, programs the default rate, then powers the domain up with
    /// the init polling budget.
    pub fn init(
        &mut self,
        resources: PlatformResources<P>,
        clocks: &mut impl ClockProvider<Clock = P::Clock>,
    ) -> Result<DeviceId, Error> {
        let Some(index) = self.slots.iter().position(|slot| slot.context.is_none()) else {
            error!("no free slot for G3D device, {N} already attached");
            return Err(Error::OutOfMemory);
        };

        let clocks = G3dClocks::acquire::<P>(clocks)?;
        let PlatformResources {
            registers,
            cmu,
            delay,
            governor,
            framebuffers,
            ram_index,
        } = resources;
        let context = PlatformContext {
            power: PowerDomainController::new(registers, clocks, delay.clone(), true),
            cmu: ExceptionLock::new(SpinMutex::new(CmuAccess {
                registers: cmu,
                delay,
            })),
            governor: ExceptionLock::new(SpinMutex::new(governor)),
            ram_dump: ExceptionLock::new(SpinMutex::new(RamDump::new(ram_index))),
            framebuffers,
        };
        context.power.enable_domain_with(P::INIT_POLL)?;

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.context = Some(context);
        info!("G3D device {index} attached");
        Ok(DeviceId {
            index,
            generation: slot.generation,
        })
    }

    /// Powers the device down, releases its clocks and frees its slot.
    ///
    /// Terminating a device twice fails with `InvalidDevice`.
    pub fn term(&mut self, id: DeviceId) -> Result<(), Error> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .ok_or(Error::InvalidDevice)?;
        let context = slot.context.as_ref().ok_or(Error::InvalidDevice)?;
        context.power.shut_down()?;
        slot.context = None;
        info!("G3D device {} detached", id.index);
        Ok(())
    }

    /// Returns the context of an attached device.
    pub fn get(&self, id: DeviceId) -> Result<&PlatformContext<P>, Error> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.context.as_ref())
            .ok_or(Error::InvalidDevice)
    }

    /// Returns the power controller of an attached device.
    pub fn controller(&self, id: DeviceId) -> Result<&PowerDomainController<P>, Error> {
        Ok(&self.get(id)?.power)
    }

    /// Enables the power domain of the given device.
    pub fn enable_domain(&self, id: DeviceId) -> Result<(), Error> {
        self.controller(id)?.enable_domain()
    }

    /// Disables the power domain of the given device.
    pub fn disable_domain(&self, id: DeviceId) -> Result<(), Error> {
        self.controller(id)?.disable_domain()
    }

    /// Enables or disables the power domain of the given device.
    pub fn control(&self, id: DeviceId, control: PowerControl) -> Result<(), Error> {
        self.controller(id)?.control(control)
    }

    /// Ungates the clock of the given device.
    pub fn clock_on(&self, id: DeviceId) -> Result<(), Error> {
        self.controller(id)?.clock_on()
    }

    /// Gates the clock of the given device.
    pub fn clock_off(&self, id: DeviceId) -> Result<(), Error> {
        self.controller(id)?.clock_off()
    }

    /// Returns the number of attached devices.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.context.is_some())
            .count()
    }

    /// Returns whether no device is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: G3dPlatform, const N: usize> Default for DeviceTable<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Transition,
        platform::test::{
            Event, FakeClockProvider, FakeCmu, FakeDelay, FakeFramebuffers, FakeGovernor,
            FakeRamIndex, FakeRegisters, Recorder, TestPlatform,
        },
        power::PowerState,
    };

    fn resources(recorder: &Recorder, registers: FakeRegisters) -> PlatformResources<TestPlatform> {
        PlatformResources {
            registers,
            cmu: FakeCmu::new(recorder),
            delay: FakeDelay::new(recorder),
            governor: FakeGovernor::default(),
            framebuffers: FakeFramebuffers::default(),
            ram_index: FakeRamIndex::new(recorder),
        }
    }

    fn attach(
        table: &mut DeviceTable<TestPlatform, 2>,
        recorder: &Recorder,
    ) -> Result<DeviceId, Error> {
        table.init(
            resources(recorder, FakeRegisters::new(recorder)),
            &mut FakeClockProvider::new(recorder),
        )
    }

    #[test]
    fn init_powers_domain_on() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let id = attach(&mut table, &recorder).unwrap();

        let controller = table.controller(id).unwrap();
        assert_eq!(controller.state(), PowerState::On);
        assert!(controller.snapshot().domain_enabled);
        assert_eq!(controller.clock_rate(), 533_000_000);
        assert_eq!(
            recorder.events(),
            [
                Event::ClockEnable("g3d"),
                Event::SetRate("aclk_400_g3d", 533_000_000),
                Event::ClockEnable("aclk_400_g3d"),
                Event::ConfigWrite(0x7),
                Event::StatusRead,
            ]
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn second_enable_writes_nothing() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let id = attach(&mut table, &recorder).unwrap();
        recorder.clear();

        table.enable_domain(id).unwrap();
        table.enable_domain(id).unwrap();
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn disable_then_term() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let id = attach(&mut table, &recorder).unwrap();
        recorder.clear();

        table.disable_domain(id).unwrap();
        assert_eq!(
            recorder.events(),
            [
                Event::ConfigWrite(0x0),
                Event::StatusRead,
                Event::ClockDisable("g3d"),
            ]
        );
        recorder.clear();

        table.term(id).unwrap();
        assert_eq!(recorder.events(), [Event::ClockDisable("aclk_400_g3d")]);
        assert!(table.is_empty());

        assert_eq!(table.term(id), Err(Error::InvalidDevice));
        assert_eq!(table.enable_domain(id), Err(Error::InvalidDevice));
        assert!(matches!(table.get(id), Err(Error::InvalidDevice)));
    }

    #[test]
    fn term_disables_domain() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let id = attach(&mut table, &recorder).unwrap();
        recorder.clear();

        table.term(id).unwrap();
        assert_eq!(
            recorder.events(),
            [
                Event::ConfigWrite(0x0),
                Event::StatusRead,
                Event::ClockDisable("g3d"),
                Event::ClockDisable("aclk_400_g3d"),
            ]
        );
    }

    #[test]
    fn term_without_gate_clock_releases_source_once() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::<TestPlatform, 2>::new();
        let id = table
            .init(
                resources(&recorder, FakeRegisters::new(&recorder)),
                &mut FakeClockProvider::new(&recorder).without("g3d"),
            )
            .unwrap();
        recorder.clear();

        table.term(id).unwrap();
        assert_eq!(
            recorder.events(),
            [
                Event::ConfigWrite(0x0),
                Event::StatusRead,
                Event::ClockDisable("aclk_400_g3d"),
            ]
        );
    }

    #[test]
    fn full_table_is_out_of_memory() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let first = attach(&mut table, &recorder).unwrap();
        let second = attach(&mut table, &recorder).unwrap();
        assert_ne!(first, second);
        recorder.clear();

        assert_eq!(attach(&mut table, &recorder), Err(Error::OutOfMemory));
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn missing_source_clock_frees_slot() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::<TestPlatform, 1>::new();
        assert_eq!(
            table.init(
                resources(&recorder, FakeRegisters::new(&recorder)),
                &mut FakeClockProvider::new(&recorder).without("aclk_400_g3d"),
            ),
            Err(Error::ClockUnavailable)
        );
        assert!(table.is_empty());

        let id = table
            .init(
                resources(&recorder, FakeRegisters::new(&recorder)),
                &mut FakeClockProvider::new(&recorder),
            )
            .unwrap();
        assert_eq!(id.index(), 0);
    }

    #[test]
    fn init_timeout_uses_init_budget() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::<TestPlatform, 1>::new();
        assert_eq!(
            table.init(
                resources(&recorder, FakeRegisters::new(&recorder).stuck()),
                &mut FakeClockProvider::new(&recorder),
            ),
            Err(Error::Fatal(Transition::PowerOn))
        );
        assert_eq!(recorder.count(Event::StatusRead), 11);
        assert_eq!(recorder.count(Event::Delay(100)), 10);
        assert!(table.is_empty());
    }

    #[test]
    fn stale_id_is_rejected_after_slot_reuse() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let old = attach(&mut table, &recorder).unwrap();
        table.term(old).unwrap();
        let new = attach(&mut table, &recorder).unwrap();

        assert_eq!(old.index(), new.index());
        assert_eq!(table.clock_off(old), Err(Error::InvalidDevice));
        table.clock_off(new).unwrap();
        assert_eq!(
            table.controller(new).unwrap().state(),
            PowerState::ClockGated
        );
    }

    #[test]
    fn control_by_id() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let id = attach(&mut table, &recorder).unwrap();

        table.control(id, PowerControl::Off).unwrap();
        assert_eq!(table.controller(id).unwrap().state(), PowerState::Off);
        table.clock_on(id).unwrap();
        assert_eq!(table.controller(id).unwrap().state(), PowerState::ClockOnly);
        table.control(id, PowerControl::On).unwrap();
        assert_eq!(table.controller(id).unwrap().state(), PowerState::On);
    }

    #[test]
    fn governor_is_per_device() {
        let recorder = Recorder::default();
        let mut table = DeviceTable::new();
        let first = attach(&mut table, &recorder).unwrap();
        let second = attach(&mut table, &recorder).unwrap();

        table
            .get(first)
            .unwrap()
            .with_governor(|governor| governor.enabled = false);
        assert!(!table.get(first).unwrap().with_governor(|g| g.enabled));
        assert!(table.get(second).unwrap().with_governor(|g| g.enabled));
    }
}
