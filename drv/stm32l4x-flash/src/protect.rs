//! Protection Planner (spec §4.H): translates a sparse protected-sector
//! range into the ≤2-zones-per-bank WRP encoding, and the inverse
//! `protect_check` membership test.

use crate::error::Error;
use crate::geometry::ResolvedGeometry;
use crate::options::{read_options, write_options, OptionBytes};
use crate::registers::WRP_EMPTY;
use crate::target::{Target, TargetState};

fn require_halted(target: &mut dyn Target) -> Result<(), Error> {
    if target.target_state()? != TargetState::Halted {
        return Err(Error::NotHalted);
    }
    Ok(())
}

/// Sets or clears protection over `[first, last]` and writes the resulting
/// WRP encoding. Overwrites whatever zones previously occupied the
/// affected bank(s) rather than merging with them — a known limitation
/// recorded as a resolved Open Question in DESIGN.md.
pub fn protect(
    target: &mut dyn Target,
    base: u32,
    geometry: &mut ResolvedGeometry,
    set: bool,
    first: u32,
    last: u32,
    timeout_ms: u32,
) -> Result<(), Error> {
    require_halted(target)?;

    let mut options = read_options(target, base, geometry.part.has_dual_bank)?;

    for sector in geometry
        .sectors
        .iter_mut()
        .take(last as usize + 1)
        .skip(first as usize)
    {
        sector.is_protected = set;
    }

    plan_zones(&mut options, geometry.first_bank_sectors, set, first, last);
    write_options(target, base, geometry.part.has_dual_bank, &options, timeout_ms)
}

/// Pure zone-encoding step, split out from [`protect`] so it can be tested
/// (and property-tested) without a `Target`.
fn plan_zones(options: &mut OptionBytes, first_bank_sectors: u32, set: bool, first: u32, last: u32) {
    let f = first_bank_sectors;
    let zone = if set { (first as u8, last as u8) } else { WRP_EMPTY };

    if last < f {
        options.wpr1a = zone;
        options.wpr1b = WRP_EMPTY;
    } else if first >= f {
        let zone = if set {
            ((first - f) as u8, (last - f) as u8)
        } else {
            WRP_EMPTY
        };
        options.wpr2a = zone;
        options.wpr2b = WRP_EMPTY;
    } else {
        options.wpr1a = if set { (first as u8, (f - 1) as u8) } else { WRP_EMPTY };
        options.wpr1b = WRP_EMPTY;
        options.wpr2a = if set { (0, (last - f) as u8) } else { WRP_EMPTY };
        options.wpr2b = WRP_EMPTY;
    }
}

/// Refreshes `sectors[i].is_protected` for every sector from the bank's
/// current WRP encoding (spec §4.H, `protect_check`).
pub fn protect_check(
    target: &mut dyn Target,
    base: u32,
    geometry: &mut ResolvedGeometry,
) -> Result<(), Error> {
    let options = read_options(target, base, geometry.part.has_dual_bank)?;
    let f = geometry.first_bank_sectors;

    for (i, sector) in geometry.sectors.iter_mut().enumerate() {
        let i = i as u32;
        let (j, a, b) = if i < f {
            (i, options.wpr1a, options.wpr1b)
        } else {
            (i - f, options.wpr2a, options.wpr2b)
        };
        sector.is_protected = in_zone(a, j) || in_zone(b, j);
    }
    Ok(())
}

fn in_zone((start, end): (u8, u8), j: u32) -> bool {
    if start > end {
        return false;
    }
    let j = j as u8;
    j >= start && j <= end
}
