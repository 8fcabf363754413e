//! STM32L4 flash bank driver, consumed by a host debugging/programming
//! framework over a debug-transport [`target::Target`] abstraction. See
//! `SPEC_FULL.md` for the full component breakdown; `DESIGN.md` for the
//! grounding ledger and resolved open questions.

mod access;
mod bank;
mod config;
mod erase;
mod error;
mod geometry;
mod options;
mod part;
mod protect;
mod registers;
mod stub;
#[cfg(test)]
mod test_support;
mod target;
mod unlock;
mod writer;

pub mod driver;

pub use bank::BankState;
pub use config::BankConfig;
pub use driver::Stm32l4xFlashDriver;
pub use error::{ControllerErrorBits, Error};
pub use geometry::{Erased, ResolvedGeometry, Sector};
pub use options::{OptionBytes, RDP_NONE};
pub use part::{lookup as lookup_part, PartDescriptor, PART_TABLE};
pub use registers::{FLASH_BANK_BASE, IDCODE_ADDR};
pub use target::{
    FlashAsyncOutcome, FlashAsyncParams, LogLevel, Logger, RegParam, Target, TargetState,
    WorkingArea,
};
