//! Geometry Prober (spec §4.E). Produces a per-bank owned
//! [`ResolvedGeometry`] from a [`crate::part::PartDescriptor`] plus the
//! probed device ID, flash size, and option bits — the original driver's
//! in-place mutation of its shared `part_info` table is replaced with a
//! copy-and-adjust step (spec §9, "Global mutable state"), so no two banks
//! can alias the same descriptor's resolved fields.

use crate::access::read_reg;
use crate::config::BankConfig;
use crate::error::Error;
use crate::part::{self, PartDescriptor};
use crate::registers::{RegOffset, FLASH_BANK_BASE, IDCODE_ADDR, OPTR_DBANK, OPTR_DUALBANK};
use crate::target::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Erased {
    Unknown,
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    pub offset: u32,
    pub size: u32,
    pub is_erased: Erased,
    /// Conservatively `true` until `protect_check` runs (spec §3 invariants).
    pub is_protected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGeometry {
    pub part: &'static PartDescriptor,
    pub raw_id_code: u32,
    pub page_size: u32,
    pub first_bank_sectors: u32,
    pub hole_sectors: u32,
    pub base_address: u32,
    pub size_bytes: u32,
    pub sectors: Vec<Sector>,
}

impl ResolvedGeometry {
    pub fn num_sectors(&self) -> usize {
        self.sectors.len()
    }

    /// Maps a logical sector index to `(bank-selector asserted, controller
    /// sector number)` per spec §3's invariant on dual-bank holes.
    pub fn controller_sector(&self, index: u32) -> (bool, u32) {
        if index < self.first_bank_sectors {
            (false, index)
        } else {
            (true, index + self.hole_sectors)
        }
    }
}

/// Runs the full probe algorithm (spec §4.E steps 1-6).
pub fn probe(
    target: &mut dyn Target,
    flash_ctrl_base: u32,
    config: &BankConfig,
) -> Result<ResolvedGeometry, Error> {
    let raw_id_code = target.read_u32(IDCODE_ADDR)?;
    let part = part::lookup(raw_id_code).ok_or_else(|| {
        log::error!("device id 0x{raw_id_code:08x} not in part registry");
        Error::UnsupportedPart
    })?;

    let mut flash_kb = read_fsize_kb(target, part).unwrap_or_else(|| {
        log::warn!(
            "could not determine flash size for {}; assuming max {} KiB",
            part.name,
            part.max_flash_kb
        );
        part.max_flash_kb
    });
    if flash_kb == 0 || flash_kb > part.max_flash_kb {
        log::warn!(
            "probed flash size {flash_kb} KiB out of range for {}; assuming max {} KiB",
            part.name,
            part.max_flash_kb
        );
        flash_kb = part.max_flash_kb;
    }

    let mut page_size = part.page_size;
    let mut first_bank_sectors = part.first_bank_sectors;
    let mut hole_sectors = part.hole_sectors;

    if part.id == 0x470 {
        let optr = read_reg(target, flash_ctrl_base, RegOffset::OPTR)?;
        if optr & OPTR_DBANK == 0 {
            page_size = 8192;
            // Single-bank mode: every sector maps to bank 1.
            first_bank_sectors = u32::MAX;
            hole_sectors = 0;
        }
    } else if part.has_dual_bank {
        let optr = read_reg(target, flash_ctrl_base, RegOffset::OPTR)?;
        if optr & OPTR_DUALBANK != 0 && flash_kb < part.max_flash_kb {
            let populated_sectors_total = (flash_kb * 1024) / page_size;
            let max_sectors_total = (part.max_flash_kb * 1024) / page_size;
            first_bank_sectors = populated_sectors_total / 2;
            hole_sectors = max_sectors_total / 2 - first_bank_sectors;
        }
    }

    let flash_bytes = if config.user_override_size_bytes != 0 {
        config.user_override_size_bytes
    } else {
        flash_kb * 1024
    };

    let num_sectors = flash_bytes / page_size;
    let mut sectors = Vec::with_capacity(num_sectors as usize);
    for i in 0..num_sectors {
        sectors.push(Sector {
            offset: i * page_size,
            size: page_size,
            is_erased: Erased::Unknown,
            is_protected: true,
        });
    }

    Ok(ResolvedGeometry {
        part,
        raw_id_code,
        page_size,
        first_bank_sectors,
        hole_sectors,
        base_address: FLASH_BANK_BASE,
        size_bytes: flash_bytes,
        sectors,
    })
}

fn read_fsize_kb(target: &mut dyn Target, part: &PartDescriptor) -> Option<u32> {
    target.read_u16(part.fsize_base).ok().map(|v| v as u32)
}
