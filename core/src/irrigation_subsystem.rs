//! Irrigation subsystem: rations canal and groundwater against demand.
//!
//! This subsystem:
//!   1. Resets the unmet-demand tallies on the first day of the year
//!   2. Converts requested depth to volume and sums it per subcategory
//!   3. Splits the cell's canal feed over canal-access subcategories by
//!      demand, then serves the rest from groundwater up to the pumps'
//!      daily capacity
//!   4. Shares the realized volume back out over crops by demand share
//!   5. Records unmet demand and returns the clipped depth
//!   6. Prices the diesel used for pumping
//!
//! Execution: every tick, after ownership.
//! Depends on: ownership (areas), forcing (demand, supply).

use crate::{
    config::{PumpingCostConfig, TubewellConfig},
    distribution::safe_div,
    error::{SimError, SimResult},
    event::SimEvent,
    forcing::CropDemand,
    state::{CellState, CropWaterAccount},
    subcategory::{Subcategory, SubcategoryLayout},
    subsystem::{DayContext, SimSubsystem},
};

/// Litres per hour per horsepower in the pump discharge curve.
const DISCHARGE_COEFFICIENT: f64 = 129_574.1;
/// Drawdown term numerator in the pump discharge curve.
const DRAWDOWN_COEFFICIENT: f64 = 255.599_8;

/// Maximum daily groundwater a single well can lift, m³.
///
/// `hours·129574.1·hp / (zgw + 255.5998·hours² / (zgw²·4⁴))` litres.
/// The drawdown term is dropped when the water table depth is not
/// positive, and the whole expression is 0 when its divisor is.
pub fn max_groundwater_supply(operating_hours: f64, horsepower: f64, groundwater_depth: f64) -> f64 {
    let dividend = operating_hours * DISCHARGE_COEFFICIENT * horsepower;
    let drawdown = if groundwater_depth > 0.0 {
        safe_div(
            DRAWDOWN_COEFFICIENT * operating_hours.powi(2),
            groundwater_depth.powi(2) * 4f64.powi(4),
        )
    } else {
        0.0
    };
    let divisor = groundwater_depth + drawdown;
    if divisor <= 0.0 {
        return 0.0;
    }
    (safe_div(dividend, divisor) / 1000.0).max(0.0)
}

/// Diesel cost of lifting `volume` m³ from `groundwater_depth` m.
pub fn diesel_pump_cost(
    params: &PumpingCostConfig,
    groundwater_depth: f64,
    volume: f64,
    diesel_price: f64,
) -> f64 {
    let unit_fuel = (params.fuel_slope * groundwater_depth + params.fuel_intercept)
        * params.fuel_efficiency
        / params.energy_divisor;
    (unit_fuel * volume * diesel_price * params.cost_share).max(0.0)
}

/// Electric pumping is not priced yet.
pub fn electric_pump_cost() -> f64 {
    0.0
}

/// Requested volume per crop, m³. Depth (mm) × area, only where the
/// crop has area.
pub fn crop_demand_volumes(demand: &[CropDemand]) -> Vec<f64> {
    demand
        .iter()
        .map(|d| {
            if d.crop_area > 0.0 {
                d.requested_depth.max(0.0) / 1000.0 * d.crop_area
            } else {
                0.0
            }
        })
        .collect()
}

/// Split the cell's canal feed over its canal-access subcategories in
/// proportion to their demand.
///
/// Each allotment is capped at the subcategory's demand, so the cell
/// never delivers more than the feed. Subcategories without canal
/// access get nothing.
pub fn canal_allotments(
    layout: &SubcategoryLayout,
    subcategory_demand: &[f64],
    canal_volume: f64,
) -> Vec<f64> {
    let feed = canal_volume.max(0.0);
    let canal_demand: f64 = layout
        .iter()
        .filter(|(_, sub)| sub.has_canal)
        .map(|(s, _)| subcategory_demand[s].max(0.0))
        .sum();

    layout
        .iter()
        .map(|(s, sub)| {
            if !sub.has_canal {
                return 0.0;
            }
            let demand = subcategory_demand[s].max(0.0);
            (feed * safe_div(demand, canal_demand)).min(demand)
        })
        .collect()
}

/// Result of rationing one subcategory for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct RationOutcome {
    pub canal_volume:       f64,
    pub groundwater_volume: f64,
    /// Realized volume per crop, m³.
    pub crop_volume:        Vec<f64>,
    /// Unmet volume per crop, m³.
    pub crop_unmet:         Vec<f64>,
    /// Rationed depth per crop, mm. Never above the request.
    pub realized_depth:     Vec<f64>,
}

impl RationOutcome {
    pub fn total_volume(&self) -> f64 {
        self.canal_volume + self.groundwater_volume
    }
}

pub struct IrrigationRationer {
    tubewell: TubewellConfig,
    pumping_cost: PumpingCostConfig,
}

impl IrrigationRationer {
    pub fn new(tubewell: TubewellConfig, pumping_cost: PumpingCostConfig) -> Self {
        Self { tubewell, pumping_cost }
    }

    /// Ration one subcategory.
    ///
    /// `wells` is the total number of wells across the subcategory's
    /// farms and `canal_allotment` its share of the cell's canal feed,
    /// both matching demand that covers all of its crop area.
    pub fn ration(
        &self,
        subcategory: Subcategory,
        wells: f64,
        demand: &[CropDemand],
        canal_allotment: f64,
        groundwater_depth: f64,
    ) -> RationOutcome {
        let crop_demand = crop_demand_volumes(demand);
        let total_demand: f64 = crop_demand.iter().sum();

        let canal_supply = if subcategory.has_canal { canal_allotment.max(0.0) } else { 0.0 };
        let canal_volume = canal_supply.min(total_demand);

        let groundwater_demand = (total_demand - canal_volume).max(0.0);
        let capacity = max_groundwater_supply(
            self.tubewell.operating_hours,
            self.tubewell.pump_horsepower,
            groundwater_depth,
        ) * wells.max(0.0);
        let groundwater_volume = groundwater_demand.min(capacity);

        let realized = canal_volume + groundwater_volume;
        let mut crop_volume = Vec::with_capacity(demand.len());
        let mut crop_unmet = Vec::with_capacity(demand.len());
        let mut realized_depth = Vec::with_capacity(demand.len());
        for (d, &volume_demand) in demand.iter().zip(&crop_demand) {
            let share = safe_div(volume_demand, total_demand);
            let volume = realized * share;
            crop_volume.push(volume);
            crop_unmet.push((volume_demand - volume).max(0.0));
            let supplied_depth = if d.crop_area > 0.0 {
                safe_div(volume, d.crop_area) * 1000.0
            } else {
                0.0
            };
            realized_depth.push(d.requested_depth.max(0.0).min(supplied_depth));
        }

        RationOutcome {
            canal_volume,
            groundwater_volume,
            crop_volume,
            crop_unmet,
            realized_depth,
        }
    }

    pub fn pumping_cost(&self, groundwater_depth: f64, volume: f64, diesel_price: f64) -> f64 {
        diesel_pump_cost(&self.pumping_cost, groundwater_depth, volume, diesel_price)
            + electric_pump_cost()
    }
}

/// Zero the unmet-demand history of a cell. Returns the volume cleared.
pub fn reset_water_accounts(accounts: &mut [CropWaterAccount]) -> f64 {
    let cleared = accounts.iter().map(|a| a.cumulative_unmet_demand).sum();
    accounts.fill(CropWaterAccount::default());
    cleared
}

impl SimSubsystem for IrrigationRationer {
    fn name(&self) -> &'static str { "irrigation" }

    fn update(
        &mut self,
        ctx: &mut DayContext<'_>,
        cell: &mut CellState,
    ) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        let tick = ctx.day.tick;

        if ctx.day.is_first_day_of_year {
            let cleared = reset_water_accounts(&mut cell.water);
            events.push(SimEvent::WaterAccountsReset {
                tick,
                cell: cell.cell_id,
                cumulative_unmet_demand: cleared,
            });
        }

        let supply = ctx.forcing.water_supply(&ctx.day, cell);
        let demand = ctx.forcing.irrigation_demand(&ctx.day, ctx.layout, cell);
        let expected = ctx.layout.len() * cell.crop_count;
        if demand.len() != expected {
            return Err(SimError::ShapeMismatch {
                what: "irrigation demand",
                expected,
                actual: demand.len(),
            });
        }

        let n_crop = cell.crop_count;
        let subcategory_demand: Vec<f64> = (0..ctx.layout.len())
            .map(|s| crop_demand_volumes(&demand[s * n_crop..(s + 1) * n_crop]).iter().sum())
            .collect();
        let allotments = canal_allotments(ctx.layout, &subcategory_demand, supply.canal_volume);

        let mut unmet_total = 0.0;
        for (s, sub) in ctx.layout.iter() {
            let crops = s * n_crop..(s + 1) * n_crop;
            let wells = sub.wells as f64 * cell.farm_count[s];
            let outcome = self.ration(
                sub,
                wells,
                &demand[crops.clone()],
                allotments[s],
                supply.groundwater_depth,
            );

            for (k, i) in crops.enumerate() {
                cell.daily.requested_depth[i] = demand[i].requested_depth.max(0.0);
                cell.daily.realized_depth[i] = outcome.realized_depth[k];
                let unmet = outcome.crop_unmet[k];
                if unmet > 0.0 {
                    cell.water[i].cumulative_unmet_demand += unmet;
                    cell.water[i].unmet_demand_days += 1;
                    unmet_total += unmet;
                }
            }

            cell.daily.canal_volume[s] = outcome.canal_volume;
            cell.daily.groundwater_volume[s] = outcome.groundwater_volume;
            cell.daily.pumping_cost[s] = self.pumping_cost(
                supply.groundwater_depth,
                outcome.groundwater_volume,
                supply.diesel_price,
            );
        }

        log::debug!(
            "tick={tick} cell={} irrigation: canal={:.1}/{:.1} gw={:.1} unmet={:.1} m3",
            cell.cell_id,
            cell.daily.canal_volume.iter().sum::<f64>(),
            supply.canal_volume,
            cell.daily.groundwater_volume.iter().sum::<f64>(),
            unmet_total
        );

        Ok(events)
    }
}
