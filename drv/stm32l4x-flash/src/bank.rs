//! Per-bank state (spec §3 `BankState`): owns the resolved geometry once
//! probed. Mirrors the original driver's per-bank record, but the
//! `PartDescriptor`/geometry fields only exist after a successful probe —
//! there is no "partially initialized" mutable shared table to alias into
//! (spec §9, "Global mutable state").

use crate::config::BankConfig;
use crate::error::Error;
use crate::geometry::{self, ResolvedGeometry};
use crate::target::Target;

pub struct BankState {
    pub flash_ctrl_base: u32,
    pub config: BankConfig,
    geometry: Option<ResolvedGeometry>,
}

impl BankState {
    pub fn new(flash_ctrl_base: u32, config: BankConfig) -> Self {
        BankState {
            flash_ctrl_base,
            config,
            geometry: None,
        }
    }

    pub fn is_probed(&self) -> bool {
        self.geometry.is_some()
    }

    /// Runs the full probe unconditionally, replacing any previously
    /// resolved geometry.
    pub fn probe(&mut self, target: &mut dyn Target) -> Result<(), Error> {
        self.geometry = Some(geometry::probe(target, self.flash_ctrl_base, &self.config)?);
        Ok(())
    }

    /// No-op if already probed (spec §4.E, `auto_probe`).
    pub fn auto_probe(&mut self, target: &mut dyn Target) -> Result<(), Error> {
        if self.is_probed() {
            return Ok(());
        }
        self.probe(target)
    }

    pub fn geometry(&self) -> Result<&ResolvedGeometry, Error> {
        self.geometry.as_ref().ok_or(Error::UnsupportedPart)
    }

    pub fn geometry_mut(&mut self) -> Result<&mut ResolvedGeometry, Error> {
        self.geometry.as_mut().ok_or(Error::UnsupportedPart)
    }

    /// Human string for the `info` command (spec §4.I, §7): part name and
    /// revision decoded from the top 16 bits of the raw ID-code, with a
    /// best-effort fallback even when the revision is unrecognized.
    pub fn info(&self) -> Result<String, Error> {
        let geometry = self.geometry()?;
        let rev = (geometry.raw_id_code >> 16) as u16;
        Ok(format!(
            "{} - Rev: {}",
            geometry.part.name,
            geometry.part.revision_name(rev)
        ))
    }
}
