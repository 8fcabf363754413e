//! Configuration seam (spec SPEC_FULL.md §4.K). Config loading itself is out
//! of scope; this struct is just where the host framework's config layer
//! writes the handful of values this crate needs at construction time.

use crate::registers::{
    FLASH_ERASE_TIMEOUT_MS, FLASH_MASS_ERASE_TIMEOUT_MS, FLASH_OPTION_TIMEOUT_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankConfig {
    /// Non-zero overrides the autodetected flash size (spec §4.E step 4).
    pub user_override_size_bytes: u32,
    pub erase_timeout_ms: u32,
    pub mass_erase_timeout_ms: u32,
    pub option_timeout_ms: u32,
}

impl Default for BankConfig {
    fn default() -> Self {
        BankConfig {
            user_override_size_bytes: 0,
            erase_timeout_ms: FLASH_ERASE_TIMEOUT_MS,
            mass_erase_timeout_ms: FLASH_MASS_ERASE_TIMEOUT_MS,
            option_timeout_ms: FLASH_OPTION_TIMEOUT_MS,
        }
    }
}
