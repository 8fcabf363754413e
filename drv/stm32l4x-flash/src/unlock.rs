//! Unlock Engine (spec §4.C): two-key sequences that drop the main-register
//! lock and the option-register lock. Both are idempotent.

use crate::access::{read_reg, write_reg};
use crate::error::Error;
use crate::registers::{RegOffset, CR_LOCK, CR_OPTLOCK, KEY1, KEY2, OPTKEY1, OPTKEY2};
use crate::target::Target;

pub fn unlock_cr(target: &mut dyn Target, base: u32) -> Result<(), Error> {
    let cr = read_reg(target, base, RegOffset::CR)?;
    if cr & CR_LOCK == 0 {
        return Ok(());
    }
    write_reg(target, base, RegOffset::KEYR, KEY1)?;
    write_reg(target, base, RegOffset::KEYR, KEY2)?;
    let cr = read_reg(target, base, RegOffset::CR)?;
    if cr & CR_LOCK != 0 {
        log::warn!("CR.LOCK did not clear after key sequence on bank 0x{base:08x}");
        return Err(Error::UnlockFailed);
    }
    Ok(())
}

pub fn unlock_optcr(target: &mut dyn Target, base: u32) -> Result<(), Error> {
    let cr = read_reg(target, base, RegOffset::CR)?;
    if cr & CR_OPTLOCK == 0 {
        return Ok(());
    }
    write_reg(target, base, RegOffset::OPTKEYR, OPTKEY1)?;
    write_reg(target, base, RegOffset::OPTKEYR, OPTKEY2)?;
    let cr = read_reg(target, base, RegOffset::CR)?;
    if cr & CR_OPTLOCK != 0 {
        log::warn!("CR.OPTLOCK did not clear after key sequence on bank 0x{base:08x}");
        return Err(Error::UnlockFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTarget;

    #[test]
    fn unlock_cr_noop_when_already_unlocked() {
        let mut t = MockTarget::new();
        t.set_reg(0x1000, RegOffset::CR, 0);
        unlock_cr(&mut t, 0x1000).unwrap();
        // No keys should have been written.
        assert_eq!(t.get_reg(0x1000, RegOffset::KEYR), 0);
    }

    #[test]
    fn unlock_cr_writes_both_keys_and_clears_lock() {
        let mut t = MockTarget::new();
        t.set_reg(0x1000, RegOffset::CR, CR_LOCK);
        unlock_cr(&mut t, 0x1000).unwrap();
        assert_eq!(t.get_reg(0x1000, RegOffset::KEYR), KEY2);
        assert_eq!(t.get_reg(0x1000, RegOffset::CR) & CR_LOCK, 0);
    }

    #[test]
    fn unlock_cr_fails_if_lock_persists() {
        let mut t = MockTarget::new();
        t.set_reg(0x1000, RegOffset::CR, CR_LOCK);
        assert_eq!(unlock_cr(&mut t, 0x1000), Err(Error::UnlockFailed));
        assert_eq!(t.get_reg(0x1000, RegOffset::KEYR), KEY2);
    }

    #[test]
    fn unlock_optcr_idempotent() {
        let mut t = MockTarget::new();
        t.set_reg(0x1000, RegOffset::CR, 0);
        unlock_optcr(&mut t, 0x1000).unwrap();
        unlock_optcr(&mut t, 0x1000).unwrap();
    }

    #[test]
    fn unlock_optcr_writes_both_keys_and_clears_optlock() {
        let mut t = MockTarget::new();
        t.set_reg(0x1000, RegOffset::CR, CR_OPTLOCK);
        unlock_optcr(&mut t, 0x1000).unwrap();
        assert_eq!(t.get_reg(0x1000, RegOffset::OPTKEYR), OPTKEY2);
        assert_eq!(t.get_reg(0x1000, RegOffset::CR) & CR_OPTLOCK, 0);
    }

    #[test]
    fn unlock_optcr_fails_if_optlock_persists() {
        let mut t = MockTarget::new();
        t.set_reg(0x1000, RegOffset::CR, CR_OPTLOCK);
        assert_eq!(unlock_optcr(&mut t, 0x1000), Err(Error::UnlockFailed));
        assert_eq!(t.get_reg(0x1000, RegOffset::OPTKEYR), OPTKEY2);
    }
}
