//! Investment subsystem: yearly tubewell installation.
//!
//! This subsystem:
//!   1. Averages each subcategory's unmet demand over its shortage days
//!   2. Computes the per-farm return on a new well (ROI signal)
//!   3. Estimates the share of farms whose savings cover a new well,
//!      from a log-normal savings distribution around the mean
//!   4. Moves installing farms one well bracket up, same canal branch
//!   5. Debits the installation cost from the source subcategory
//!
//! Execution: last day of the agricultural year only, after the
//! accounting subsystem has settled the year.
//! Depends on: irrigation (unmet demand), income (annual incomes),
//!             accounting (savings).

use crate::{
    config::{AffordabilityCalibration, InvestmentConfig, RoiGate, TubewellConfig},
    distribution::{lognormal_survival, safe_div},
    error::SimResult,
    event::SimEvent,
    ownership_subsystem::OwnershipTracker,
    state::CellState,
    subcategory::SubcategoryLayout,
    subsystem::{DayContext, SimSubsystem},
    types::SubcategoryIndex,
};
use serde::{Deserialize, Serialize};

/// One subcategory's assessment for the year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvestmentDecision {
    pub subcategory: SubcategoryIndex,
    /// Σ over crops of mean unmet demand per shortage day, m³.
    pub mean_unmet_demand: f64,
    /// Per-farm income gain from full irrigation, net of a well's annual cost.
    pub return_on_investment: f64,
    pub positive_benefit: bool,
    pub mean_savings_per_farm: f64,
    pub affordability_probability: f64,
    pub installation_cost: f64,
    pub farms_installing: f64,
}

/// Share of farms able to pay `cost` when savings per farm are
/// log-normal with mean `mean_savings`.
///
/// σ comes from the calibration; μ is set so the distribution's mean
/// equals `mean_savings`.
pub fn affordability_probability(
    mean_savings: f64,
    cost: f64,
    calibration: &AffordabilityCalibration,
) -> f64 {
    if !(mean_savings > 0.0) {
        return 0.0;
    }
    if cost <= 0.0 {
        return 1.0;
    }
    let sigma = (calibration.shape_intercept + calibration.shape_slope * mean_savings.ln_1p())
        .max(calibration.min_shape);
    let mu = mean_savings.ln() - sigma * sigma / 2.0;
    lognormal_survival(cost, mu, sigma)
}

pub struct InvestmentEngine {
    tubewell: TubewellConfig,
    config:   InvestmentConfig,
}

impl InvestmentEngine {
    pub fn new(tubewell: TubewellConfig, config: InvestmentConfig) -> Self {
        Self { tubewell, config }
    }

    /// Assess every subcategory of a cell. Reads state only.
    pub fn assess(&self, cell: &CellState, layout: &SubcategoryLayout) -> Vec<InvestmentDecision> {
        let installation_cost = self.tubewell.total_installation_cost();
        let annual_cost = self.tubewell.annual_ownership_cost();
        let n_crop = cell.crop_count;

        layout
            .iter()
            .map(|(s, _)| {
                let farms = cell.farm_count[s].max(0.0);
                let crops = s * n_crop..(s + 1) * n_crop;

                let mean_unmet_demand: f64 = cell.water[crops.clone()]
                    .iter()
                    .map(|w| safe_div(w.cumulative_unmet_demand, w.unmet_demand_days as f64))
                    .sum();

                let forgone_income: f64 = cell.income[crops]
                    .iter()
                    .map(|i| i.potential_annual_crop_income - i.annual_crop_income)
                    .sum();
                let return_on_investment = safe_div(forgone_income, farms) - annual_cost;
                let positive_benefit = return_on_investment > 0.0;

                let savings = cell.cash[s].savings_account.max(0.0);
                let mean_savings_per_farm = safe_div(savings, farms);
                let affordability = affordability_probability(
                    mean_savings_per_farm,
                    installation_cost,
                    &self.config.affordability,
                );

                let gated = match self.config.roi_gate {
                    RoiGate::HardPrecondition if !positive_benefit => 0.0,
                    _ => affordability,
                };
                let mut farms_installing = (farms * gated).floor();

                // Capacity limits: the farms that exist, the well
                // ceiling, and the savings that pay for the wells.
                farms_installing = farms_installing.min(farms.floor());
                if layout.next_bracket(s).is_none() {
                    farms_installing = 0.0;
                }
                if installation_cost > 0.0 {
                    let affordable = (savings / installation_cost).floor();
                    if farms_installing > affordable {
                        log::warn!(
                            "cell={} subcategory={s}: clipping {farms_installing} installs to {affordable} by savings",
                            cell.cell_id
                        );
                        farms_installing = affordable;
                    }
                }

                InvestmentDecision {
                    subcategory: s,
                    mean_unmet_demand,
                    return_on_investment,
                    positive_benefit,
                    mean_savings_per_farm,
                    affordability_probability: affordability,
                    installation_cost,
                    farms_installing: farms_installing.max(0.0),
                }
            })
            .collect()
    }

    /// Move installing farms up one bracket and pay for their wells.
    ///
    /// All moves are gathered into a delta array first, so a
    /// subcategory that both receives and sends farms is read before
    /// it is written.
    pub fn apply(
        &self,
        cell: &mut CellState,
        layout: &SubcategoryLayout,
        decisions: &[InvestmentDecision],
    ) -> Vec<(SubcategoryIndex, f64)> {
        let mut delta = vec![0.0; layout.len()];
        let mut moves = Vec::new();

        for decision in decisions {
            let source = decision.subcategory;
            let migrating = decision.farms_installing;
            if migrating <= 0.0 {
                continue;
            }
            let Some(target) = layout.next_bracket(source) else {
                continue;
            };
            delta[target] += migrating;
            delta[source] -= migrating;

            let cost = migrating * decision.installation_cost;
            let account = &mut cell.cash[source];
            account.savings_account = (account.savings_account - cost).max(0.0);
            moves.push((source, migrating));
        }

        for (count, change) in cell.farm_count.iter_mut().zip(&delta) {
            *count = (*count + change).max(0.0);
        }
        OwnershipTracker::refresh(cell, layout);
        moves
    }
}

impl SimSubsystem for InvestmentEngine {
    fn name(&self) -> &'static str { "investment" }

    fn update(
        &mut self,
        ctx: &mut DayContext<'_>,
        cell: &mut CellState,
    ) -> SimResult<Vec<SimEvent>> {
        if !ctx.day.is_last_day_of_year {
            return Ok(vec![]);
        }

        let decisions = self.assess(cell, ctx.layout);
        for d in decisions.iter().filter(|d| d.farms_installing > 0.0 || d.positive_benefit) {
            log::debug!(
                "tick={} cell={} subcategory={} roi={:.0} afford={:.3} installing={}",
                ctx.day.tick,
                cell.cell_id,
                d.subcategory,
                d.return_on_investment,
                d.affordability_probability,
                d.farms_installing
            );
        }

        let moves = self.apply(cell, ctx.layout, &decisions);
        let installed: f64 = moves.iter().map(|(_, farms)| farms).sum();
        if installed > 0.0 {
            log::info!(
                "tick={} cell={} investment: {installed} farms installed a tubewell",
                ctx.day.tick,
                cell.cell_id
            );
        }

        let events = moves
            .into_iter()
            .map(|(source, farms)| {
                let sub = ctx.layout.get(source);
                SimEvent::TubewellsInstalled {
                    tick: ctx.day.tick,
                    cell: cell.cell_id,
                    category: sub.category,
                    from_wells: sub.wells,
                    has_canal: sub.has_canal,
                    farms,
                    cost: farms * self.tubewell.total_installation_cost(),
                }
            })
            .collect();

        Ok(events)
    }
}
