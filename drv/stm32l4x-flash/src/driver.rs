//! Public Driver Facade (spec §4.I): the fixed operation set the host
//! framework dispatches into. Every command validates target-halted and
//! converts [`Error`] to the host's integer protocol only here, at the
//! boundary — every inner component keeps propagating the sum type.

use crate::bank::BankState;
use crate::config::BankConfig;
use crate::error::Error;
use crate::erase;
use crate::geometry::Erased;
use crate::options::{self, OptionBytes, RDP_NONE};
use crate::protect;
use crate::target::{Target, TargetState};
use crate::writer;

fn require_halted(target: &mut dyn Target) -> Result<(), Error> {
    if target.target_state()? != TargetState::Halted {
        return Err(Error::NotHalted);
    }
    Ok(())
}

/// Owns one [`BankState`] per configured flash bank, dispatching the
/// command surface described in spec §6 ("Command surface").
pub struct Stm32l4xFlashDriver {
    banks: Vec<BankState>,
}

impl Stm32l4xFlashDriver {
    pub fn new(flash_ctrl_bases: &[u32], config: BankConfig) -> Self {
        Stm32l4xFlashDriver {
            banks: flash_ctrl_bases
                .iter()
                .map(|&base| BankState::new(base, config))
                .collect(),
        }
    }

    fn bank_mut(&mut self, bank: usize) -> Result<&mut BankState, Error> {
        self.banks.get_mut(bank).ok_or(Error::SyntaxError)
    }

    pub fn probe(&mut self, target: &mut dyn Target, bank: usize) -> Result<(), Error> {
        require_halted(target)?;
        self.bank_mut(bank)?.probe(target)
    }

    pub fn auto_probe(&mut self, target: &mut dyn Target, bank: usize) -> Result<(), Error> {
        require_halted(target)?;
        self.bank_mut(bank)?.auto_probe(target)
    }

    pub fn info(&mut self, target: &mut dyn Target, bank: usize) -> Result<String, Error> {
        require_halted(target)?;
        self.bank_mut(bank)?.auto_probe(target)?;
        self.bank_mut(bank)?.info()
    }

    pub fn erase(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        first: u32,
        last: u32,
    ) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let timeout_ms = b.config.erase_timeout_ms;
        let base = b.flash_ctrl_base;
        let geometry = b.geometry_mut()?;
        erase::erase(target, base, geometry, first, last, timeout_ms)
    }

    pub fn mass_erase(&mut self, target: &mut dyn Target, bank: usize) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let timeout_ms = b.config.mass_erase_timeout_ms;
        let base = b.flash_ctrl_base;
        let has_dual_bank = b.geometry()?.part.has_dual_bank;
        erase::mass_erase(target, base, has_dual_bank, timeout_ms)
    }

    pub fn write(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        buffer: &[u8],
        offset: u32,
        count: u32,
    ) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let base = b.flash_ctrl_base;
        let bank_base_address = b.geometry()?.base_address;
        writer::write(target, base, bank_base_address, buffer, offset, count)
    }

    /// Default byte-reader (spec §4.I: "delegated to default byte-reader").
    /// Requires a 4-byte-aligned length; arbitrary-width reads are the host
    /// framework's concern, not this driver's.
    pub fn read(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        address: u32,
        out: &mut [u8],
    ) -> Result<(), Error> {
        require_halted(target)?;
        self.bank_mut(bank)?.auto_probe(target)?;
        if out.len() % 4 != 0 {
            return Err(Error::Alignment);
        }
        for (i, chunk) in out.chunks_mut(4).enumerate() {
            let word = target.read_u32(address + (i as u32) * 4)?;
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Ok(())
    }

    /// Default blank-checker (spec §4.I: "delegated to default blank-check"):
    /// reads each sector back and marks it erased iff every word is
    /// `0xFFFFFFFF`.
    pub fn erase_check(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        first: u32,
        last: u32,
    ) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let base_address = b.geometry()?.base_address;
        let geometry = b.geometry_mut()?;
        for i in first..=last {
            let sector = geometry
                .sectors
                .get(i as usize)
                .ok_or(Error::SyntaxError)?
                .clone();
            let mut blank = true;
            let mut addr = base_address + sector.offset;
            let end = addr + sector.size;
            while addr < end {
                if target.read_u32(addr)? != 0xFFFF_FFFF {
                    blank = false;
                    break;
                }
                addr += 4;
            }
            geometry.sectors[i as usize].is_erased =
                if blank { Erased::Yes } else { Erased::No };
        }
        Ok(())
    }

    pub fn protect(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        set: bool,
        first: u32,
        last: u32,
    ) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let timeout_ms = b.config.option_timeout_ms;
        let base = b.flash_ctrl_base;
        let geometry = b.geometry_mut()?;
        protect::protect(target, base, geometry, set, first, last, timeout_ms)
    }

    pub fn protect_check(&mut self, target: &mut dyn Target, bank: usize) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let base = b.flash_ctrl_base;
        let geometry = b.geometry_mut()?;
        protect::protect_check(target, base, geometry)
    }

    /// Sets `rdp=0` — any nonzero value other than `0xAA` raises Level 1 on
    /// this family (spec §9 Open Question, resolved in DESIGN.md: Level 1
    /// only, never the irreversible Level 2 value `0xCC`).
    pub fn lock(&mut self, target: &mut dyn Target, bank: usize) -> Result<(), Error> {
        self.set_rdp(target, bank, 0x00)
    }

    /// Sets `rdp=0xAA`, clearing readout protection (and any latent WRP
    /// zones left at their prior values, since this only touches RDP).
    pub fn unlock(&mut self, target: &mut dyn Target, bank: usize) -> Result<(), Error> {
        self.set_rdp(target, bank, RDP_NONE)
    }

    fn set_rdp(&mut self, target: &mut dyn Target, bank: usize, rdp: u8) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let timeout_ms = b.config.option_timeout_ms;
        let base = b.flash_ctrl_base;
        let has_dual_bank = b.geometry()?.part.has_dual_bank;
        let mut opts = options::read_options(target, base, has_dual_bank)?;
        opts.rdp = rdp;
        options::write_options(target, base, has_dual_bank, &opts, timeout_ms)
    }

    pub fn window_watchdog_soft_selection(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        enable: bool,
    ) -> Result<(), Error> {
        self.toggle_option(target, bank, enable, |o, v| o.window_watchdog_sw = v)
    }

    pub fn independent_watchdog_soft_selection(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        enable: bool,
    ) -> Result<(), Error> {
        self.toggle_option(target, bank, enable, |o, v| o.independent_watchdog_sw = v)
    }

    pub fn independent_watchdog_standby(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        enable: bool,
    ) -> Result<(), Error> {
        self.toggle_option(target, bank, enable, |o, v| o.iwdg_frozen_in_standby = v)
    }

    pub fn independent_watchdog_stop(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        enable: bool,
    ) -> Result<(), Error> {
        self.toggle_option(target, bank, enable, |o, v| o.iwdg_frozen_in_stop = v)
    }

    fn toggle_option(
        &mut self,
        target: &mut dyn Target,
        bank: usize,
        enable: bool,
        set: impl FnOnce(&mut OptionBytes, bool),
    ) -> Result<(), Error> {
        require_halted(target)?;
        let b = self.bank_mut(bank)?;
        b.auto_probe(target)?;
        let timeout_ms = b.config.option_timeout_ms;
        let base = b.flash_ctrl_base;
        let has_dual_bank = b.geometry()?.part.has_dual_bank;
        let mut opts = options::read_options(target, base, has_dual_bank)?;
        set(&mut opts, enable);
        options::write_options(target, base, has_dual_bank, &opts, timeout_ms)
    }
}
