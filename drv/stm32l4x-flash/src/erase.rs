//! Sector Eraser (spec §4.F): per-sector erase with correct bank-selector
//! and sector-number encoding, plus mass-erase.

use crate::access::{read_reg, wait_until_not_busy, write_reg};
use crate::error::Error;
use crate::geometry::{Erased, ResolvedGeometry};
use crate::registers::{cr_snb, RegOffset, CR_BKER, CR_LOCK, CR_MER1, CR_MER2, CR_PER, CR_START};
use crate::target::{Target, TargetState};
use crate::unlock::unlock_cr;

fn require_halted(target: &mut dyn Target) -> Result<(), Error> {
    if target.target_state()? != TargetState::Halted {
        return Err(Error::NotHalted);
    }
    Ok(())
}

/// Erases sectors `first..=last` (inclusive). On a failed poll, returns
/// immediately without restoring `LOCK` — the target is left unlocked so the
/// failure is visible, per the resolved Open Question in DESIGN.md.
pub fn erase(
    target: &mut dyn Target,
    base: u32,
    geometry: &mut ResolvedGeometry,
    first: u32,
    last: u32,
    timeout_ms: u32,
) -> Result<(), Error> {
    require_halted(target)?;
    unlock_cr(target, base)?;

    for i in first..=last {
        let (bker, snb) = geometry.controller_sector(i);
        let mut cr = CR_PER | cr_snb(snb) | CR_START;
        if bker {
            cr |= CR_BKER;
        }
        write_reg(target, base, RegOffset::CR, cr)?;
        wait_until_not_busy(target, base, timeout_ms)?;
        if let Some(sector) = geometry.sectors.get_mut(i as usize) {
            sector.is_erased = Erased::Yes;
        }
    }

    write_reg(target, base, RegOffset::CR, CR_LOCK)
}

/// Mass-erases a bank. Asserts `MER2` in addition to `MER1` only when the
/// bank is dual-bank (spec §4.F).
pub fn mass_erase(
    target: &mut dyn Target,
    base: u32,
    has_dual_bank: bool,
    timeout_ms: u32,
) -> Result<(), Error> {
    require_halted(target)?;
    unlock_cr(target, base)?;
    wait_until_not_busy(target, base, timeout_ms)?;

    let mut bits = CR_MER1;
    if has_dual_bank {
        bits |= CR_MER2;
    }
    let cr = read_reg(target, base, RegOffset::CR)?;
    write_reg(target, base, RegOffset::CR, cr | bits)?;
    let cr = read_reg(target, base, RegOffset::CR)?;
    write_reg(target, base, RegOffset::CR, cr | bits | CR_START)?;
    wait_until_not_busy(target, base, timeout_ms)?;
    write_reg(target, base, RegOffset::CR, CR_LOCK)
}
