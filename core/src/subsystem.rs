//! Subsystem trait.
//!
//! RULE: Every daily component implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, once per cell, every tick.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    clock::DayInfo,
    error::SimResult,
    event::SimEvent,
    forcing::Forcing,
    state::CellState,
    subcategory::SubcategoryLayout,
};

/// Everything a subsystem may read besides the cell it is updating.
pub struct DayContext<'a> {
    pub day:     DayInfo,
    pub layout:  &'a SubcategoryLayout,
    /// The external soil/crop model and supply feeds.
    pub forcing: &'a mut dyn Forcing,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per cell per tick by the engine.
    ///
    /// - `ctx`:  the day being simulated, the layout and the forcing
    /// - `cell`: exclusive access to this cell's state for the step
    ///
    /// Returns the events this update produced.
    fn update(
        &mut self,
        ctx: &mut DayContext<'_>,
        cell: &mut CellState,
    ) -> SimResult<Vec<SimEvent>>;
}
