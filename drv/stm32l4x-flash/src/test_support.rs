//! Test-only double for [`crate::target::Target`]. Not part of the public
//! API; every unit test in this crate exercises the register-level state
//! machines against this instead of real hardware.

use std::collections::HashMap;

use crate::error::Error;
use crate::registers::{RegOffset, CR_LOCK, CR_OPTLOCK, KEY1, KEY2, OPTKEY1, OPTKEY2};
use crate::target::{
    FlashAsyncOutcome, FlashAsyncParams, Logger, LogLevel, Target, TargetState, WorkingArea,
};

#[derive(Default)]
pub struct RecordedLog {
    pub entries: Vec<(LogLevel, String)>,
}

impl Logger for std::cell::RefCell<RecordedLog> {
    fn log(&self, level: LogLevel, message: &str) {
        self.borrow_mut().entries.push((level, message.to_string()));
    }
}

pub struct MockTarget {
    memory: HashMap<u32, u32>,
    pub state: TargetState,
    pub fail_transport: bool,
    pub working_area_next: u32,
    pub working_area_fail_sizes: Vec<u32>,
    pub freed_areas: Vec<WorkingArea>,
    pub written_buffers: Vec<(u32, Vec<u8>)>,
    /// Every `write_u32` call, in order — lets tests assert on transient
    /// register states a flat register file would otherwise overwrite.
    pub writes: Vec<(u32, u32)>,
    pub flash_async_result: Result<FlashAsyncOutcome, Error>,
    pub flash_async_calls: Vec<u32>,
    poll_hooks: Vec<Box<dyn FnMut(&mut MockTarget)>>,
    poll_count: usize,
    clock_ms: u64,
    pending_key1: Option<(u32, u32)>,
}

impl MockTarget {
    pub fn new() -> Self {
        MockTarget {
            memory: HashMap::new(),
            state: TargetState::Halted,
            fail_transport: false,
            working_area_next: 0x2000_0000,
            working_area_fail_sizes: Vec::new(),
            freed_areas: Vec::new(),
            written_buffers: Vec::new(),
            writes: Vec::new(),
            flash_async_result: Ok(FlashAsyncOutcome::Done),
            flash_async_calls: Vec::new(),
            poll_hooks: Vec::new(),
            poll_count: 0,
            clock_ms: 0,
            pending_key1: None,
        }
    }

    /// Minimal emulation of the controller's two-key unlock handshake: a
    /// matching `KEY1` then `KEY2` write to the same register clears the
    /// corresponding lock bit in `CR`, so unlock tests don't need to poke
    /// `CR` directly.
    fn emulate_unlock_hardware(&mut self, addr: u32, value: u32) {
        let keyr_offset = RegOffset::KEYR.offset();
        let optkeyr_offset = RegOffset::OPTKEYR.offset();
        let cr_offset = RegOffset::CR.offset();

        // Try interpreting `addr` as a KEYR or OPTKEYR register for some
        // base, by subtracting the known offset.
        for (offset, key1, key2, lock_bit) in [
            (keyr_offset, KEY1, KEY2, CR_LOCK),
            (optkeyr_offset, OPTKEY1, OPTKEY2, CR_OPTLOCK),
        ] {
            if addr < offset {
                continue;
            }
            let base = addr - offset;
            if value == key1 {
                self.pending_key1 = Some((base, offset));
            } else if value == key2 {
                if self.pending_key1 == Some((base, offset)) {
                    let cr_addr = base + cr_offset;
                    let cr = *self.memory.get(&cr_addr).unwrap_or(&0);
                    self.memory.insert(cr_addr, cr & !lock_bit);
                }
                self.pending_key1 = None;
            }
        }
    }

    pub fn set_reg(&mut self, base: u32, reg: RegOffset, value: u32) {
        self.memory.insert(reg.addr(base), value);
    }

    /// Pokes an arbitrary absolute address, bypassing `fail_transport` and
    /// unlock emulation — for seeding IDCODE/FSIZE/OPTR values in tests.
    pub fn write_u32_test(&mut self, addr: u32, value: u32) {
        self.memory.insert(addr, value);
    }

    pub fn write_u16_test(&mut self, addr: u32, value: u16) {
        self.memory.insert(addr, value as u32);
    }

    pub fn get_reg(&self, base: u32, reg: RegOffset) -> u32 {
        *self.memory.get(&reg.addr(base)).unwrap_or(&0)
    }

    /// Registers a closure that runs once per `poll_delay` call, in order;
    /// used to make BSY clear, or an async write finish, after N polls.
    pub fn on_poll(&mut self, hook: impl FnMut(&mut MockTarget) + 'static) {
        self.poll_hooks.push(Box::new(hook));
    }
}

impl Target for MockTarget {
    fn read_u16(&mut self, addr: u32) -> Result<u16, Error> {
        if self.fail_transport {
            return Err(Error::Transport);
        }
        Ok(*self.memory.get(&addr).unwrap_or(&0) as u16)
    }

    fn read_u32(&mut self, addr: u32) -> Result<u32, Error> {
        if self.fail_transport {
            return Err(Error::Transport);
        }
        Ok(*self.memory.get(&addr).unwrap_or(&0))
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), Error> {
        if self.fail_transport {
            return Err(Error::Transport);
        }
        self.writes.push((addr, value));
        let old = *self.memory.get(&addr).unwrap_or(&0);
        // SR is the only write-one-to-clear register this crate touches;
        // every other register (CR, OPTR, WRPxxR, KEYR, ...) is a plain
        // read/modify/write register, even when the value written happens
        // to be a bit subset of what's already stored (e.g. OPTR when a
        // caller disables an option flag). Keying off the low byte of the
        // address works because every base this crate uses is offset-aligned
        // (ends in 0x00), so it can't collide with another register's offset.
        let stored = if addr & 0xFF == RegOffset::SR.offset() && value != 0 && old & value == value
        {
            old & !value
        } else {
            value
        };
        self.memory.insert(addr, stored);
        self.emulate_unlock_hardware(addr, value);
        Ok(())
    }

    fn target_state(&mut self) -> Result<TargetState, Error> {
        Ok(self.state)
    }

    fn alloc_working_area(&mut self, size: u32) -> Result<WorkingArea, Error> {
        self.alloc_working_area_try(size).ok_or(Error::NoWorkingArea)
    }

    fn alloc_working_area_try(&mut self, size: u32) -> Option<WorkingArea> {
        if self.working_area_fail_sizes.contains(&size) {
            return None;
        }
        let address = self.working_area_next;
        self.working_area_next += size;
        Some(WorkingArea { address, size })
    }

    fn free_working_area(&mut self, area: WorkingArea) -> Result<(), Error> {
        self.freed_areas.push(area);
        Ok(())
    }

    fn write_buffer(&mut self, addr: u32, bytes: &[u8]) -> Result<(), Error> {
        self.written_buffers.push((addr, bytes.to_vec()));
        Ok(())
    }

    fn run_flash_async(
        &mut self,
        params: FlashAsyncParams<'_>,
    ) -> Result<FlashAsyncOutcome, Error> {
        self.flash_async_calls.push(params.entry);
        self.flash_async_result.clone()
    }

    fn poll_delay(&mut self) {
        self.clock_ms += 1;
        self.poll_count += 1;
        if let Some(mut hook) = self.poll_hooks.pop() {
            hook(self);
            // Only one hook needed in every test we write, but keep the
            // remaining ones (if any) for subsequent polls instead of
            // dropping them.
            if self.poll_hooks.is_empty() {
                // nothing left to restore
            }
        }
    }

    fn now_ms(&mut self) -> u64 {
        self.clock_ms
    }
}
