// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

use crate::hal::RamIndexReader;
use log::debug;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Entries in each L1 TLB.
const L1_TLB_ENTRIES: u32 = 32;
/// Ways in the L2 TLB.
const L2_TLB_WAYS: u32 = 4;
/// Entries in each way of the L2 TLB.
const L2_TLB_ENTRIES: u32 = 512;

/// A Cortex-A15 internal RAM, numbered by its RAMINDEX RAM ID.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum RamId {
    /// L1 instruction cache tag RAM.
    L1ITag = 0x00,
    /// L1 instruction cache data RAM.
    L1IData = 0x01,
    /// Branch target buffer.
    L1IBtb = 0x02,
    /// Global history buffer.
    L1IGhb = 0x03,
    /// L1 instruction TLB.
    L1ITlb = 0x04,
    /// Indirect branch predictor.
    L1IIndirectPredictor = 0x05,
    /// L1 data cache tag RAM.
    L1DTag = 0x08,
    /// L1 data cache data RAM.
    L1DData = 0x09,
    /// L1 data TLB used by loads.
    L1DLoadTlb = 0x0a,
    /// L1 data TLB used by stores.
    L1DStoreTlb = 0x0b,
    /// L2 cache tag RAM.
    L2Tag = 0x10,
    /// L2 cache data RAM.
    L2Data = 0x11,
    /// L2 snoop tag RAM.
    L2SnoopTag = 0x12,
    /// L2 data ECC RAM.
    L2DataEcc = 0x13,
    /// L2 dirty RAM.
    L2Dirty = 0x14,
    /// Unified L2 TLB.
    L2Tlb = 0x18,
}

impl RamId {
    /// All RAMs, in RAM ID order.
    pub const ALL: [Self; 16] = [
        Self::L1ITag,
        Self::L1IData,
        Self::L1IBtb,
        Self::L1IGhb,
        Self::L1ITlb,
        Self::L1IIndirectPredictor,
        Self::L1DTag,
        Self::L1DData,
        Self::L1DLoadTlb,
        Self::L1DStoreTlb,
        Self::L2Tag,
        Self::L2Data,
        Self::L2SnoopTag,
        Self::L2DataEcc,
        Self::L2Dirty,
        Self::L2Tlb,
    ];

    /// Returns the name stored to `dtlb` to select this RAM.
    pub const fn name(self) -> &'static str {
        match self {
            Self::L1ITag => "L1_I_tag_RAM",
            Self::L1IData => "L1_I_data_RAM",
            Self::L1IBtb => "L1_I_BTB_RAM",
            Self::L1IGhb => "L1_I_GHB_RAM",
            Self::L1ITlb => "L1_I_TLB_RAM",
            Self::L1IIndirectPredictor => "L1_I_indirect_predictor_RAM",
            Self::L1DTag => "L1_D_tag_RAM",
            Self::L1DData => "L1_D_data_RAM",
            Self::L1DLoadTlb => "L1_D_load_TLB_array",
            Self::L1DStoreTlb => "L1_D_store_TLB_array",
            Self::L2Tag => "L2_tag_RAM",
            Self::L2Data => "L2_data_RAM",
            Self::L2SnoopTag => "L2_snoop_tag_RAM",
            Self::L2DataEcc => "L2_data_ECC_RAM",
            Self::L2Dirty => "L2_dirty_RAM",
            Self::L2Tlb => "L2_TLB_RAM",
        }
    }

    /// Looks a RAM up by the name stored to `dtlb`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ram| ram.name() == name)
    }

    /// RAMINDEX value selecting `entry` of `way` in this RAM.
    fn index(self, way: u32, entry: u32) -> u32 {
        (u32::from(u8::from(self)) << 24) + (way << 18) + entry
    }
}

/// The RAM selected for dumping, and the interface to read it through.
pub(crate) struct RamDump<R> {
    pub(crate) selected: RamId,
    pub(crate) reader: R,
}

impl<R: RamIndexReader> RamDump<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            selected: RamId::L1DLoadTlb,
            reader,
        }
    }

    /// Logs the contents of the selected RAM, if it is one of the TLBs.
    pub(crate) fn dump(&mut self) {
        let ram = self.selected;
        match ram {
            RamId::L1ITlb => {
                debug!("L1-I TLB RAM");
                for entry in 0..L1_TLB_ENTRIES {
                    let [d0, d1, d2, _] = self.reader.read(ram.index(0, entry));
                    debug!(
                        "entries[{entry}], DL1Data0={d0:08x}, DL1Data1={:08x} DL1Data2={d2:08x}",
                        d1 & 0xffff
                    );
                }
            }
            RamId::L1DLoadTlb | RamId::L1DStoreTlb => {
                if ram == RamId::L1DLoadTlb {
                    debug!("L1-D load TLB array");
                } else {
                    debug!("L1-D store TLB array");
                }
                for entry in 0..L1_TLB_ENTRIES {
                    let [d0, d1, d2, d3] = self.reader.read(ram.index(0, entry));
                    debug!(
                        "entries[{entry}], DL1Data0={d0:08x}, DL1Data1={d1:08x}, DL1Data2={d2:08x}, DL1Data3={:08x}",
                        d3 & 0x3f
                    );
                }
            }
            RamId::L2Tlb => {
                debug!("L2 TLB array");
                for way in 0..L2_TLB_WAYS {
                    for entry in 0..L2_TLB_ENTRIES {
                        let [d0, d1, d2, d3] = self.reader.read(ram.index(way, entry));
                        debug!(
                            "ways[{way}]:entries[{entry}], DL1Data0={d0:08x}, DL1Data1={d1:08x}, DL1Data2={d2:08x}, DL1Data3={d3:08x}"
                        );
                    }
                }
            }
            _ => debug!("dumping {} is not implemented", ram.name()),
        }
    }
}
