//! Flash controller register map (spec §3, §6). Offsets are a closed enum —
//! every register access in this crate goes through
//! [`RegOffset::addr`](RegOffset::addr), so `flash_ctrl_base + offset` is a
//! single choke point instead of scattered magic numbers (mirrors the
//! approach `drv/lpc55-flash` takes with its `RegisterBlock`, just addressed
//! through [`crate::target::Target`] instead of a volatile struct).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum RegOffset {
    ACR,
    PDKEYR,
    KEYR,
    OPTKEYR,
    SR,
    CR,
    ECR,
    OPTR,
    PCROP1SR,
    PCROP1ER,
    WRP1AR,
    WRP1BR,
    PCROP2SR,
    PCROP2ER,
    WRP2AR,
    WRP2BR,
}

impl RegOffset {
    pub fn offset(self) -> u32 {
        match self {
            RegOffset::ACR => 0x00,
            RegOffset::PDKEYR => 0x04,
            RegOffset::KEYR => 0x08,
            RegOffset::OPTKEYR => 0x0C,
            RegOffset::SR => 0x10,
            RegOffset::CR => 0x14,
            RegOffset::ECR => 0x18,
            RegOffset::OPTR => 0x20,
            // PCROP/reserved slots between OPTR and WRP1AR are not named in
            // the spec's register map; keep their offsets so the enum stays
            // exhaustive for documentation purposes even though this driver
            // never issues PCROP commands.
            RegOffset::PCROP1SR => 0x24,
            RegOffset::PCROP1ER => 0x28,
            RegOffset::WRP1AR => 0x2C,
            RegOffset::WRP1BR => 0x30,
            RegOffset::PCROP2SR => 0x44,
            RegOffset::PCROP2ER => 0x48,
            RegOffset::WRP2AR => 0x4C,
            RegOffset::WRP2BR => 0x50,
        }
    }

    pub fn addr(self, flash_ctrl_base: u32) -> u32 {
        flash_ctrl_base + self.offset()
    }
}

// Key values (spec §6).
pub const KEY1: u32 = 0x4567_0123;
pub const KEY2: u32 = 0xCDEF_89AB;
pub const OPTKEY1: u32 = 0x0819_2A3B;
pub const OPTKEY2: u32 = 0x4C5D_6E7F;

// CR bit positions (spec §6).
pub const CR_PG: u32 = 1 << 0;
pub const CR_PER: u32 = 1 << 1;
pub const CR_MER1: u32 = 1 << 2;
pub const CR_PNB_SHIFT: u32 = 3;
pub const CR_PNB_MASK: u32 = 0xFF << CR_PNB_SHIFT;
pub const CR_BKER: u32 = 1 << 11;
pub const CR_MER2: u32 = 1 << 15;
pub const CR_START: u32 = 1 << 16;
pub const CR_OPTSTRT: u32 = 1 << 17;
pub const CR_FSTPG: u32 = 1 << 18;
pub const CR_OBL_LAUNCH: u32 = 1 << 27;
pub const CR_OPTLOCK: u32 = 1 << 30;
pub const CR_LOCK: u32 = 1 << 31;

/// Encodes the sector-number field (SNB), shifted left by [`CR_PNB_SHIFT`].
pub fn cr_snb(sector: u32) -> u32 {
    (sector << CR_PNB_SHIFT) & CR_PNB_MASK
}

// SR bit positions (spec §6).
pub const SR_EOP: u32 = 1 << 0;
pub const SR_OPERR: u32 = 1 << 1;
pub const SR_PROGERR: u32 = 1 << 3;
pub const SR_WRPERR: u32 = 1 << 4;
pub const SR_PGAERR: u32 = 1 << 5;
pub const SR_PGPERR: u32 = 1 << 6;
pub const SR_PGSERR: u32 = 1 << 7;
pub const SR_MISERR: u32 = 1 << 8;
pub const SR_FASTERR: u32 = 1 << 9;
pub const SR_RDERR: u32 = 1 << 14;
pub const SR_OPTVERR: u32 = 1 << 15;
pub const SR_BSY: u32 = 1 << 16;

/// Union of every SR bit that `wait_until_not_busy` treats as an error
/// (spec §4.B).
pub const SR_ERROR_MASK: u32 = SR_PROGERR
    | SR_PGSERR
    | SR_PGPERR
    | SR_PGAERR
    | SR_WRPERR
    | SR_OPERR
    | SR_OPTVERR
    | SR_RDERR
    | SR_FASTERR
    | SR_MISERR;

// OPTR bits (spec §6).
pub const OPTR_RDP_MASK: u32 = 0xFF;
pub const OPTR_IWDG_SW: u32 = 1 << 16;
pub const OPTR_IWDG_STOP: u32 = 1 << 17;
pub const OPTR_IWDG_STDBY: u32 = 1 << 18;
pub const OPTR_WWDG_SW: u32 = 1 << 19;
pub const OPTR_DUALBANK: u32 = 1 << 21;
pub const OPTR_DBANK: u32 = 1 << 22;
/// Everything from bit 8 up is the 24-bit `user_options` field.
pub const OPTR_USER_OPTIONS_SHIFT: u32 = 8;

/// Debug-address of the 32-bit ID-code register (spec §4.E, §6).
pub const IDCODE_ADDR: u32 = 0xE004_2000;

/// Flash bank base address in target address space (spec §6).
pub const FLASH_BANK_BASE: u32 = 0x0800_0000;

// Timeouts (spec §4.F, §6) — overridable per bank via [`crate::config::BankConfig`].
pub const FLASH_ERASE_TIMEOUT_MS: u32 = 10_000;
pub const FLASH_MASS_ERASE_TIMEOUT_MS: u32 = 1_000;
pub const FLASH_OPTION_TIMEOUT_MS: u32 = 10_000;

/// Decodes a WRP range register's `(start, end)` fields (spec §3, §6:
/// `start=[7:0], end=[23:16]`).
pub fn decode_wrp(raw: u32) -> (u8, u8) {
    (raw as u8, (raw >> 16) as u8)
}

/// Encodes a WRP range register from `(start, end)`.
pub fn encode_wrp(start: u8, end: u8) -> u32 {
    (start as u32) | ((end as u32) << 16)
}

/// Canonical "no zone" sentinel (spec §3, §4.H).
pub const WRP_EMPTY: (u8, u8) = (0xFF, 0x00);

pub fn wrp_is_empty((start, end): (u8, u8)) -> bool {
    start > end
}
