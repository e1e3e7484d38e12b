//! Ownership subsystem: irrigated and rainfed area per subcategory.
//!
//! Derived fields only. Farm counts are read, never written; the
//! investment subsystem is the single writer.
//!
//! Execution: every tick, first in the cell's pass, so rationing sees
//! the ownership left by the previous year's investment.

use crate::{
    distribution::safe_div,
    error::SimResult,
    event::SimEvent,
    state::{CellState, SubcategoryArea},
    subcategory::SubcategoryLayout,
    subsystem::{DayContext, SimSubsystem},
};

#[derive(Debug, Default)]
pub struct OwnershipTracker;

impl OwnershipTracker {
    pub fn new() -> Self {
        Self
    }

    /// Recompute areas and per-category ownership rates from farm counts.
    pub fn refresh(cell: &mut CellState, layout: &SubcategoryLayout) {
        for (i, sub) in layout.iter() {
            let farms = cell.farm_count[i].max(0.0);
            let area = farms * cell.categories[sub.category].farm_area.max(0.0);
            let with_irrigation = if sub.has_irrigation() { area } else { 0.0 };
            cell.area[i] = SubcategoryArea {
                with_irrigation,
                without_irrigation: area - with_irrigation,
            };
        }

        for category in 0..layout.category_count() {
            let range = layout.category_range(category);
            let farms: f64 = cell.farm_count[range.clone()].iter().sum();
            let wells: f64 = range
                .map(|i| layout.get(i).wells as f64 * cell.farm_count[i])
                .sum();
            cell.tubewell_ownership_rate[category] = safe_div(wells, farms);
        }
    }
}

impl SimSubsystem for OwnershipTracker {
    fn name(&self) -> &'static str { "ownership" }

    fn update(
        &mut self,
        ctx: &mut DayContext<'_>,
        cell: &mut CellState,
    ) -> SimResult<Vec<SimEvent>> {
        Self::refresh(cell, ctx.layout);
        Ok(vec![])
    }
}
