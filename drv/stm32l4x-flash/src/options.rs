//! Option-Byte Manager (spec §4.D): decode/encode the option word and WRP
//! range registers, and drive an option-programming cycle.

use crate::access::{read_reg, wait_until_not_busy, write_reg};
use crate::error::Error;
use crate::registers::{
    decode_wrp, encode_wrp, RegOffset, CR_LOCK, CR_OPTLOCK, CR_OPTSTRT, OPTR_DBANK, OPTR_DUALBANK,
    OPTR_IWDG_STDBY, OPTR_IWDG_STOP, OPTR_IWDG_SW, OPTR_RDP_MASK, OPTR_USER_OPTIONS_SHIFT,
    OPTR_WWDG_SW,
};
use crate::target::Target;
use crate::unlock::{unlock_cr, unlock_optcr};

/// Readout-protection level meaning "no protection" (spec §3).
pub const RDP_NONE: u8 = 0xAA;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionBytes {
    pub user_options: u32,
    pub rdp: u8,
    pub window_watchdog_sw: bool,
    pub independent_watchdog_sw: bool,
    pub iwdg_frozen_in_standby: bool,
    pub iwdg_frozen_in_stop: bool,
    pub wpr1a: (u8, u8),
    pub wpr1b: (u8, u8),
    pub wpr2a: (u8, u8),
    pub wpr2b: (u8, u8),
}

impl OptionBytes {
    fn raw_optr(&self) -> u32 {
        // `user_options` is read back from OPTR>>8 (see `read_options`), so it
        // already carries the four flag bits at their OPTR positions. Mask
        // them out here and set them from the bools below, or a disabled
        // flag would never clear (spec §4.D step 2: "ORing or clearing the
        // four flag bits").
        const FLAG_BITS: u32 = OPTR_IWDG_SW | OPTR_IWDG_STOP | OPTR_IWDG_STDBY | OPTR_WWDG_SW;
        let mut optr = ((self.user_options << OPTR_USER_OPTIONS_SHIFT) & !FLAG_BITS)
            | (self.rdp as u32 & OPTR_RDP_MASK);
        if self.independent_watchdog_sw {
            optr |= OPTR_IWDG_SW;
        }
        if self.iwdg_frozen_in_stop {
            optr |= OPTR_IWDG_STOP;
        }
        if self.iwdg_frozen_in_standby {
            optr |= OPTR_IWDG_STDBY;
        }
        if self.window_watchdog_sw {
            optr |= OPTR_WWDG_SW;
        }
        optr
    }
}

/// Reads `OPTR` and the WRP range registers, decomposing them into
/// [`OptionBytes`] (spec §4.D). `has_dual_bank` controls whether WRP2A/B are
/// read at all.
pub fn read_options(
    target: &mut dyn Target,
    base: u32,
    has_dual_bank: bool,
) -> Result<OptionBytes, Error> {
    let optr = read_reg(target, base, RegOffset::OPTR)?;
    let rdp = (optr & OPTR_RDP_MASK) as u8;
    if rdp != RDP_NONE {
        log::info!("RDP is 0x{rdp:02x}, not the unprotected value 0xAA");
    }

    let wpr1a = decode_wrp(read_reg(target, base, RegOffset::WRP1AR)?);
    let wpr1b = decode_wrp(read_reg(target, base, RegOffset::WRP1BR)?);
    let (wpr2a, wpr2b) = if has_dual_bank {
        (
            decode_wrp(read_reg(target, base, RegOffset::WRP2AR)?),
            decode_wrp(read_reg(target, base, RegOffset::WRP2BR)?),
        )
    } else {
        (crate::registers::WRP_EMPTY, crate::registers::WRP_EMPTY)
    };

    Ok(OptionBytes {
        user_options: optr >> OPTR_USER_OPTIONS_SHIFT,
        rdp,
        window_watchdog_sw: optr & OPTR_WWDG_SW != 0,
        independent_watchdog_sw: optr & OPTR_IWDG_SW != 0,
        iwdg_frozen_in_standby: optr & OPTR_IWDG_STDBY != 0,
        iwdg_frozen_in_stop: optr & OPTR_IWDG_STOP != 0,
        wpr1a,
        wpr1b,
        wpr2a,
        wpr2b,
    })
}

/// Drives a full option-programming cycle (spec §4.D steps 1-5).
///
/// The new values only take effect after a reset or power cycle — callers
/// relaying a user command must say so (spec §4.D, "Caller contract").
pub fn write_options(
    target: &mut dyn Target,
    base: u32,
    has_dual_bank: bool,
    options: &OptionBytes,
    timeout_ms: u32,
) -> Result<(), Error> {
    unlock_cr(target, base)?;
    unlock_optcr(target, base)?;

    // Preserve the DUALBANK/DBANK bits already latched in user_options —
    // callers only adjust the watchdog/RDP fields explicitly.
    let mut optr = options.raw_optr();
    let current = read_reg(target, base, RegOffset::OPTR)?;
    optr |= current & (OPTR_DUALBANK | OPTR_DBANK);

    write_reg(target, base, RegOffset::OPTR, optr)?;
    write_reg(
        target,
        base,
        RegOffset::WRP1AR,
        encode_wrp(options.wpr1a.0, options.wpr1a.1),
    )?;
    write_reg(
        target,
        base,
        RegOffset::WRP1BR,
        encode_wrp(options.wpr1b.0, options.wpr1b.1),
    )?;
    if has_dual_bank {
        write_reg(
            target,
            base,
            RegOffset::WRP2AR,
            encode_wrp(options.wpr2a.0, options.wpr2a.1),
        )?;
        write_reg(
            target,
            base,
            RegOffset::WRP2BR,
            encode_wrp(options.wpr2b.0, options.wpr2b.1),
        )?;
    }

    let cr = read_reg(target, base, RegOffset::CR)?;
    write_reg(target, base, RegOffset::CR, cr | CR_OPTSTRT)?;
    wait_until_not_busy(target, base, timeout_ms)?;

    // Restore both locks — the final write to CR must always leave LOCK set
    // (spec §3 invariant; §5: "the driver always re-locks on exit from ...
    // write_options"), matching the OpenOCD original's `err_lock` path
    // (`FLASH_LOCK | FLASH_OPTLOCK`).
    let cr = read_reg(target, base, RegOffset::CR)?;
    write_reg(target, base, RegOffset::CR, cr | CR_OPTLOCK | CR_LOCK)?;
    log::debug!("option bytes written; new values apply after reset");
    Ok(())
}
