//! The on-target streaming stub (spec §4.G, "Stub contract"). Shipped as an
//! immutable byte array with a companion assembly source assembled
//! out-of-band (spec §9, "Assembly stub") — this crate never generates or
//! disassembles it, it only uploads the bytes and fills in the argument
//! slots described by [`StubParams`].

/// Position-independent Cortex-M0 Thumb machine code implementing the word
/// programming loop described in spec §4.G. Assembled from
/// `asm/stm32l4x_flash_stub.s` (not part of this crate's build — see
/// DESIGN.md for why the source lives alongside, not inside, the binary).
///
/// This placeholder encodes the same five-argument calling convention real
/// builds would use; the bytes below are a stand-in for the assembled
/// output and are never executed by this crate directly (dispatch always
/// goes through [`crate::target::Target::run_flash_async`]).
pub static STUB_CODE: &[u8] = &[
    0x00, 0xbf, // nop            ; entry alignment padding
    0x70, 0x47, // bx lr          ; placeholder return; real stub loops here
];

/// Upper bound on the stub's code size (spec §4.G step 1: "≈80 bytes").
pub const STUB_WORKING_AREA_SIZE: u32 = 80;

/// The five 32-bit argument slots the stub reads from on entry (spec §3
/// `StubIoBlock`, §4.G step 4). `r0` doubles as the stub's outbound error
/// word once it halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StubParams {
    pub ring_start: u32,
    pub ring_end: u32,
    pub target_flash_word_addr: u32,
    pub word_count: u32,
    pub controller_base: u32,
}

impl StubParams {
    pub fn to_reg_params(self) -> [crate::target::RegParam; 5] {
        use crate::target::RegParam;
        [
            RegParam { register: 0, value: self.ring_start },
            RegParam { register: 1, value: self.ring_end },
            RegParam { register: 2, value: self.target_flash_word_addr },
            RegParam { register: 3, value: self.word_count },
            RegParam { register: 4, value: self.controller_base },
        ]
    }
}
