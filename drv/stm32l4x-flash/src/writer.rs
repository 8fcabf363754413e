//! Streaming Writer (spec §4.G): allocates RAM scratch and a code area on
//! the target, uploads the 64-bit word-programming stub, runs the host-side
//! producer against it, and interprets the stub's error word.

use crate::access::write_reg;
use crate::error::Error;
use crate::registers::{RegOffset, CR_LOCK, SR_ERROR_MASK, SR_WRPERR};
use crate::stub::{StubParams, STUB_CODE, STUB_WORKING_AREA_SIZE};
use crate::target::{FlashAsyncOutcome, FlashAsyncParams, Target, TargetState};
use crate::unlock::unlock_cr;

const INITIAL_RING_SIZE: u32 = 16 * 1024;
/// "a minimum of 256 B+1" (spec §4.G step 3).
const MIN_RING_SIZE: u32 = 257;

/// Public entry point (spec §4.G, "Public write"). `buffer` must contain at
/// least `count` bytes, plus `7` bytes of trailing padding room if `count`
/// is not a multiple of 8 (see the padding note below).
pub fn write(
    target: &mut dyn Target,
    base: u32,
    bank_base_address: u32,
    buffer: &[u8],
    offset: u32,
    count: u32,
) -> Result<(), Error> {
    if target.target_state()? != TargetState::Halted {
        return Err(Error::NotHalted);
    }
    if offset % 8 != 0 {
        return Err(Error::Alignment);
    }

    // Round a non-multiple-of-8 `count` up, padding the extra bytes with
    // 0xFF rather than reading past the caller's buffer (spec §9, resolved
    // Open Question on write-chunk padding: the original driver read past
    // the end of the caller's slice, which is unsound — we pad explicitly
    // instead and document the choice here and in DESIGN.md).
    let padded;
    let (data, word_count) = if count % 8 == 0 {
        (&buffer[..count as usize], count / 8)
    } else {
        log::warn!("write count {count} is not a multiple of 8; padding with 0xFF");
        let rounded = count.div_ceil(8) * 8;
        let mut owned = buffer[..count as usize].to_vec();
        owned.resize(rounded as usize, 0xFF);
        padded = owned;
        (&padded[..], rounded / 8)
    };

    unlock_cr(target, base)?;
    let result = write_block(
        target,
        base,
        bank_base_address + offset,
        data,
        word_count,
    );
    // Always restore LOCK when possible, success or failure (spec §4.G,
    // §5 "the driver always re-locks on exit from ... write").
    let _ = write_reg(target, base, RegOffset::CR, CR_LOCK);
    result
}

fn write_block(
    target: &mut dyn Target,
    controller_base: u32,
    target_flash_word_addr: u32,
    payload: &[u8],
    word_count: u32,
) -> Result<(), Error> {
    let stub_area = target
        .alloc_working_area(STUB_WORKING_AREA_SIZE)
        .map_err(|_| Error::NoWorkingArea)?;
    let result = write_block_with_stub(
        target,
        controller_base,
        target_flash_word_addr,
        payload,
        word_count,
        stub_area.address,
    );
    let _ = target.free_working_area(stub_area);
    result
}

fn write_block_with_stub(
    target: &mut dyn Target,
    controller_base: u32,
    target_flash_word_addr: u32,
    payload: &[u8],
    word_count: u32,
    stub_entry: u32,
) -> Result<(), Error> {
    target.write_buffer(stub_entry, STUB_CODE)?;

    let ring = alloc_ring(target).ok_or(Error::NoWorkingArea)?;

    let params = StubParams {
        ring_start: ring.address,
        ring_end: ring.address + ring.size,
        target_flash_word_addr,
        word_count,
        controller_base,
    };
    let reg_params = params.to_reg_params();

    let outcome = target.run_flash_async(FlashAsyncParams {
        entry: stub_entry,
        exit_breakpoint: stub_entry,
        ring_start: ring.address,
        ring_size: ring.size,
        block_bytes: 8,
        reg_params: &reg_params,
        payload,
    });

    let result = match outcome {
        Ok(FlashAsyncOutcome::Done) => Ok(()),
        Ok(FlashAsyncOutcome::FlashOpFailed) => {
            interpret_stub_failure(target, controller_base, ring.address)
        }
        Err(e) => Err(e),
    };

    let _ = target.free_working_area(ring);
    result
}

/// Reads the stub's error word back from the `r0` slot, masks it against
/// the controller's error bits, and reports `WriteProtected` if `WRPERR`
/// was among them (spec §4.G step 6).
fn interpret_stub_failure(
    target: &mut dyn Target,
    controller_base: u32,
    r0_slot_addr: u32,
) -> Result<(), Error> {
    let error_word = target.read_u32(r0_slot_addr)?;
    let latched = error_word & SR_ERROR_MASK;
    if latched != 0 {
        write_reg(target, controller_base, RegOffset::SR, latched)?;
    }
    if latched & SR_WRPERR != 0 {
        Err(Error::WriteProtected)
    } else {
        Err(Error::ControllerError(latched))
    }
}

fn alloc_ring(target: &mut dyn Target) -> Option<crate::target::WorkingArea> {
    let mut size = INITIAL_RING_SIZE;
    loop {
        if let Some(area) = target.alloc_working_area_try(size) {
            return Some(area);
        }
        if size == MIN_RING_SIZE {
            return None;
        }
        size = (size / 2).max(MIN_RING_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockTarget;

    #[test]
    fn write_requires_halted_target() {
        let mut t = MockTarget::new();
        t.state = TargetState::Running;
        assert_eq!(
            write(&mut t, 0x4002_2000, 0x0800_0000, &[0xAB; 16], 0x1000, 16),
            Err(Error::NotHalted)
        );
    }

    #[test]
    fn write_rejects_misaligned_offset() {
        let mut t = MockTarget::new();
        assert_eq!(
            write(&mut t, 0x4002_2000, 0x0800_0000, &[0xAB; 16], 1, 16),
            Err(Error::Alignment)
        );
    }

    #[test]
    fn write_16_bytes_succeeds_and_relocks() {
        let mut t = MockTarget::new();
        write(&mut t, 0x4002_2000, 0x0800_0000, &[0xAB; 16], 0x1000, 16).unwrap();
        assert_eq!(t.get_reg(0x4002_2000, RegOffset::CR), CR_LOCK);
        assert_eq!(t.flash_async_calls.len(), 1);
    }

    #[test]
    fn write_pads_count_not_multiple_of_8() {
        let mut t = MockTarget::new();
        // Provide 8 bytes of buffer even though count=7, as required.
        write(&mut t, 0x4002_2000, 0x0800_0000, &[0xAB; 8], 0, 7).unwrap();
        assert_eq!(t.flash_async_calls.len(), 1);
    }

    #[test]
    fn write_restores_lock_on_failure() {
        let mut t = MockTarget::new();
        t.working_area_fail_sizes = vec![
            crate::stub::STUB_WORKING_AREA_SIZE,
        ];
        let result = write(&mut t, 0x4002_2000, 0x0800_0000, &[0xAB; 16], 0, 16);
        assert_eq!(result, Err(Error::NoWorkingArea));
        assert_eq!(t.get_reg(0x4002_2000, RegOffset::CR), CR_LOCK);
    }

    #[test]
    fn write_protected_scenario_reports_wrp_error_and_clears_sr() {
        let mut t = MockTarget::new();
        t.flash_async_result = Ok(FlashAsyncOutcome::FlashOpFailed);
        // MockTarget's bump allocator is deterministic: the stub claims the
        // first 80 bytes at 0x2000_0000, so the ring (and therefore the r0
        // slot at its start) lands at 0x2000_0050.
        let r0_slot = 0x2000_0000 + STUB_WORKING_AREA_SIZE;
        t.write_u32_test(r0_slot, SR_WRPERR);
        t.set_reg(0x4002_2000, RegOffset::SR, SR_WRPERR);
        let result = write(&mut t, 0x4002_2000, 0x0800_0000, &[0xAB; 16], 0, 16);
        assert_eq!(result, Err(Error::WriteProtected));
        assert_eq!(t.get_reg(0x4002_2000, RegOffset::SR) & SR_WRPERR, 0);
    }

    #[test]
    fn ring_allocation_halves_down_to_minimum() {
        let mut t = MockTarget::new();
        t.working_area_fail_sizes = vec![16384, 8192, 4096, 2048, 1024, 512];
        let area = alloc_ring(&mut t).expect("should fall back to the 257-byte minimum");
        assert_eq!(area.size, MIN_RING_SIZE);
    }

    #[test]
    fn ring_allocation_fails_below_minimum() {
        let mut t = MockTarget::new();
        t.working_area_fail_sizes =
            vec![16384, 8192, 4096, 2048, 1024, 512, MIN_RING_SIZE];
        assert!(alloc_ring(&mut t).is_none());
    }
}
