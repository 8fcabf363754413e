//! Controller Access Layer (spec §4.B): named-register read/write plus
//! status polling with a deadline, not a loop-iteration countdown (spec §9,
//! "Timeouts") — sleep granularity never inflates the wall-clock budget.

use crate::error::Error;
use crate::registers::{RegOffset, SR_BSY, SR_ERROR_MASK, SR_WRPERR};
use crate::target::Target;

pub fn read_reg(target: &mut dyn Target, base: u32, reg: RegOffset) -> Result<u32, Error> {
    target.read_u32(reg.addr(base))
}

pub fn write_reg(
    target: &mut dyn Target,
    base: u32,
    reg: RegOffset,
    value: u32,
) -> Result<(), Error> {
    target.write_u32(reg.addr(base), value)
}

/// Polls `SR` until `BSY` clears or `timeout_ms` elapses, then inspects and
/// clears the latched error bits.
///
/// The caller must have already issued the operation-starting `CR` write
/// before calling this (spec §4.B, "Ordering").
pub fn wait_until_not_busy(
    target: &mut dyn Target,
    base: u32,
    timeout_ms: u32,
) -> Result<(), Error> {
    let deadline = target.now_ms() + timeout_ms as u64;
    loop {
        let sr = read_reg(target, base, RegOffset::SR)?;
        if sr & SR_BSY == 0 {
            return check_and_clear_errors(target, base, sr);
        }
        if target.now_ms() >= deadline {
            log::warn!("timed out waiting for BSY to clear on bank at 0x{base:08x}");
            return Err(Error::Timeout);
        }
        target.poll_delay();
    }
}

fn check_and_clear_errors(target: &mut dyn Target, base: u32, sr: u32) -> Result<(), Error> {
    let latched = sr & SR_ERROR_MASK;
    if latched == 0 {
        return Ok(());
    }
    // Write-one-to-clear, regardless of which branch we report.
    write_reg(target, base, RegOffset::SR, latched)?;
    if latched & SR_WRPERR != 0 {
        log::debug!("WRPERR latched in SR (0x{latched:08x}), clearing");
        Err(Error::WriteProtected)
    } else {
        log::debug!("controller error latched in SR (0x{latched:08x}), clearing");
        Err(Error::ControllerError(latched))
    }
}
