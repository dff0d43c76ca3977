//! Modules: named collections of computations plus an optional schedule.

use snafu::ensure;

use crate::computation::{Computation, ComputationId};
use crate::error::{Result, UnknownComputationSnafu};
use crate::schedule::Schedule;

/// A whole program: one entry computation, any number of auxiliary bodies
/// (fusion regions among them), and optionally a fixed execution schedule.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    computations: Vec<Computation>,
    entry: Option<ComputationId>,
    schedule: Option<Schedule>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), computations: Vec::new(), entry: None, schedule: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_computation(&mut self, computation: Computation) -> ComputationId {
        let id = ComputationId(self.computations.len() as u32);
        self.computations.push(computation);
        id
    }

    /// Add a computation and make it the module entry.
    pub fn add_entry_computation(&mut self, computation: Computation) -> ComputationId {
        let id = self.add_computation(computation);
        self.entry = Some(id);
        id
    }

    pub fn entry(&self) -> Option<ComputationId> {
        self.entry
    }

    pub fn entry_computation(&self) -> Option<&Computation> {
        self.entry.map(|id| self.computation(id))
    }

    pub fn get_computation(&self, id: ComputationId) -> Option<&Computation> {
        self.computations.get(id.index())
    }

    /// Resolve a handle that is known to be valid.
    pub fn computation(&self, id: ComputationId) -> &Computation {
        self.get_computation(id).expect("computation id not valid for this module")
    }

    pub fn computation_mut(&mut self, id: ComputationId) -> &mut Computation {
        self.computations.get_mut(id.index()).expect("computation id not valid for this module")
    }

    pub fn computations(&self) -> impl Iterator<Item = (ComputationId, &Computation)> {
        self.computations.iter().enumerate().map(|(index, c)| (ComputationId(index as u32), c))
    }

    /// Ids of the computations graph passes may touch. Fusion bodies are
    /// opaque and excluded.
    pub fn non_fusion_computation_ids(&self) -> Vec<ComputationId> {
        self.computations().filter(|(_, c)| !c.is_fusion()).map(|(id, _)| id).collect()
    }

    // ========================================================================
    // SCHEDULE
    // ========================================================================

    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn schedule_mut(&mut self) -> Option<&mut Schedule> {
        self.schedule.as_mut()
    }

    /// Attach a schedule after validating it against this module.
    pub fn set_schedule(&mut self, schedule: Schedule) -> Result<()> {
        schedule.validate(self)?;
        self.schedule = Some(schedule);
        Ok(())
    }

    pub fn clear_schedule(&mut self) {
        self.schedule = None;
    }

    /// Check that a fusion call references a computation of this module.
    pub fn check_computation(&self, id: ComputationId) -> Result<()> {
        ensure!(self.get_computation(id).is_some(), UnknownComputationSnafu { id });
        Ok(())
    }
}
