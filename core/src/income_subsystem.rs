//! Income subsystem: what the crop model says the farms earned.
//!
//! Execution: every tick, after irrigation (income depends on the
//! rationed depth).
//! Resets the annual tallies on the first day of the agricultural year.

use crate::{
    error::{SimError, SimResult},
    event::SimEvent,
    state::{CellState, CropIncomeAccount},
    subsystem::{DayContext, SimSubsystem},
};

#[derive(Debug, Default)]
pub struct IncomeTracker;

impl IncomeTracker {
    pub fn new() -> Self {
        Self
    }

    /// Wage income of the farm household. Not modeled yet.
    fn labour_income(&self) -> f64 {
        0.0
    }
}

impl SimSubsystem for IncomeTracker {
    fn name(&self) -> &'static str { "income" }

    fn update(
        &mut self,
        ctx: &mut DayContext<'_>,
        cell: &mut CellState,
    ) -> SimResult<Vec<SimEvent>> {
        if ctx.day.is_first_day_of_year {
            cell.income.fill(CropIncomeAccount::default());
            cell.annual_income.fill(0.0);
        }

        let income = ctx.forcing.crop_income(&ctx.day, ctx.layout, cell);
        let expected = ctx.layout.len() * cell.crop_count;
        if income.len() != expected {
            return Err(SimError::ShapeMismatch {
                what: "crop income",
                expected,
                actual: income.len(),
            });
        }

        let n_crop = cell.crop_count;
        for s in 0..ctx.layout.len() {
            let mut farm_income = self.labour_income();
            for i in s * n_crop..(s + 1) * n_crop {
                let crop = income[i];
                cell.income[i].annual_crop_income += crop.income;
                cell.income[i].potential_annual_crop_income += crop.potential_income;
                farm_income += crop.income;
            }
            cell.daily.farm_income[s] = farm_income;
            cell.annual_income[s] += farm_income;
        }

        Ok(vec![])
    }
}
