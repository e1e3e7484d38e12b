//! External drivers of the core: the crop model and the supply feeds.
//!
//! The soil-water balance, crop phenology and the canal / groundwater
//! feeds live outside this crate. `Forcing` is the seam: the core asks
//! it for demand and supply, hands back the rationed depth, and asks
//! again for the income that depth produced.
//!
//! `SyntheticForcing` is a deterministic stand-in used by the runner
//! and the tests. It is not a crop model; it only produces plausible
//! seasonal numbers from the run's RngBank.

use crate::{
    clock::DayInfo,
    rng::{RngBank, StreamSlot},
    state::CellState,
    subcategory::SubcategoryLayout,
};
use serde::{Deserialize, Serialize};

/// Per-cell supply conditions for one day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct WaterSupply {
    /// Canal volume delivered to the whole cell, m³. Shared over its
    /// canal-access subcategories by demand.
    pub canal_volume:      f64,
    /// Depth to the water table, m.
    pub groundwater_depth: f64,
    /// Rs per litre.
    pub diesel_price:      f64,
}

/// Crop-model demand for one (subcategory, crop).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CropDemand {
    /// mm.
    pub requested_depth: f64,
    /// Total area of the crop across the subcategory's farms, m².
    pub crop_area:       f64,
}

/// Crop-model income for one (subcategory, crop).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CropIncome {
    /// Income actually earned today, Rs.
    pub income:           f64,
    /// Income the crop would have earned under full irrigation, Rs.
    pub potential_income: f64,
}

pub trait Forcing {
    fn water_supply(&mut self, day: &DayInfo, cell: &CellState) -> WaterSupply;

    /// One entry per (subcategory, crop), subcategory-major.
    fn irrigation_demand(
        &mut self,
        day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropDemand>;

    /// One entry per (subcategory, crop). `cell.daily.realized_depth`
    /// holds today's rationed depth when this is called.
    fn crop_income(
        &mut self,
        day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropIncome>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticForcingParams {
    /// Mean daily canal volume per cell, m³.
    pub canal_volume: f64,
    /// Probability the canal runs on a given day.
    pub canal_reliability: f64,
    /// Mean depth to groundwater, m.
    pub groundwater_depth: f64,
    /// Seasonal swing of the water table, m.
    pub groundwater_amplitude: f64,
    pub diesel_price: f64,
    /// Peak irrigation requirement, mm/day.
    pub peak_demand_depth: f64,
    /// Length of each crop's growing season, days.
    pub season_length: u32,
    /// Rs per kg.
    pub crop_price: f64,
    /// kg per ha per growing day under full irrigation.
    pub potential_daily_yield: f64,
    /// Yield fraction reached with no irrigation at all.
    pub rainfed_yield_fraction: f64,
}

impl Default for SyntheticForcingParams {
    fn default() -> Self {
        Self {
            canal_volume: 2_000.0,
            canal_reliability: 0.7,
            groundwater_depth: 15.0,
            groundwater_amplitude: 3.0,
            diesel_price: 60.0,
            peak_demand_depth: 6.0,
            season_length: 120,
            crop_price: 20.0,
            potential_daily_yield: 35.0,
            rainfed_yield_fraction: 0.4,
        }
    }
}

/// Seasonal, seed-driven forcing. Crop `k` of `n` is sown `k·365/n`
/// days after the agricultural year's start day.
pub struct SyntheticForcing {
    params: SyntheticForcingParams,
    bank: RngBank,
    season_start: u32,
    crop_count: usize,
}

impl SyntheticForcing {
    pub fn new(
        params: SyntheticForcingParams,
        seed: u64,
        agricultural_year_start: u32,
        crop_count: usize,
    ) -> Self {
        Self {
            params,
            bank: RngBank::new(seed),
            season_start: agricultural_year_start,
            crop_count: crop_count.max(1),
        }
    }

    fn days_since_sowing(&self, crop: usize, day_of_year: u32) -> u32 {
        let offset = (crop as u32 * 365) / self.crop_count as u32;
        let sowing = (self.season_start.saturating_sub(1) + offset) % 365;
        (day_of_year.clamp(1, 365) + 365 - 1 - sowing) % 365
    }

    fn in_season(&self, crop: usize, day_of_year: u32) -> bool {
        self.days_since_sowing(crop, day_of_year) < self.params.season_length
    }

    /// Share of the day's requirement at this stage, peaking mid-season.
    fn stage_factor(&self, crop: usize, day_of_year: u32) -> f64 {
        let since_sowing = self.days_since_sowing(crop, day_of_year);
        let phase = since_sowing as f64 / self.params.season_length.max(1) as f64;
        (std::f64::consts::PI * phase).sin().max(0.0)
    }

    fn cropped_area(&self, cell: &CellState, subcategory: usize) -> f64 {
        let area = cell.area[subcategory];
        (area.with_irrigation + area.without_irrigation) / self.crop_count as f64
    }
}

impl Forcing for SyntheticForcing {
    fn water_supply(&mut self, day: &DayInfo, cell: &CellState) -> WaterSupply {
        let mut canal_rng = self.bank.for_stream_at(StreamSlot::CanalSupply, day.tick, cell.cell_id);
        let canal_volume = if canal_rng.chance(self.params.canal_reliability) {
            self.params.canal_volume * canal_rng.uniform(0.5, 1.5)
        } else {
            0.0
        };

        let mut gw_rng = self.bank.for_stream_at(StreamSlot::Groundwater, day.tick, cell.cell_id);
        let season = 2.0 * std::f64::consts::PI * day.day_of_year as f64 / 365.0;
        let groundwater_depth = (self.params.groundwater_depth
            + self.params.groundwater_amplitude * season.sin()
            + gw_rng.uniform(-0.5, 0.5))
        .max(0.5);

        WaterSupply {
            canal_volume,
            groundwater_depth,
            diesel_price: self.params.diesel_price,
        }
    }

    fn irrigation_demand(
        &mut self,
        day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropDemand> {
        let mut rng = self.bank.for_stream_at(StreamSlot::CropDemand, day.tick, cell.cell_id);
        let mut demand = Vec::with_capacity(layout.len() * cell.crop_count);
        for (s, _) in layout.iter() {
            let crop_area = self.cropped_area(cell, s);
            for crop in 0..cell.crop_count {
                let requested_depth = if self.in_season(crop, day.day_of_year) {
                    self.params.peak_demand_depth
                        * self.stage_factor(crop, day.day_of_year)
                        * rng.uniform(0.6, 1.4)
                } else {
                    0.0
                };
                demand.push(CropDemand { requested_depth, crop_area });
            }
        }
        demand
    }

    fn crop_income(
        &mut self,
        day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropIncome> {
        let mut rng = self.bank.for_stream_at(StreamSlot::CropYield, day.tick, cell.cell_id);
        let mut income = Vec::with_capacity(layout.len() * cell.crop_count);
        for (s, _) in layout.iter() {
            let hectares = self.cropped_area(cell, s) / 10_000.0;
            for crop in 0..cell.crop_count {
                if !self.in_season(crop, day.day_of_year) {
                    income.push(CropIncome::default());
                    continue;
                }
                let i = cell.crop_index(s, crop);
                let requested = cell.daily.requested_depth[i];
                let satisfaction = if requested > 0.0 {
                    (cell.daily.realized_depth[i] / requested).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                let rainfed = self.params.rainfed_yield_fraction;
                let potential_income = hectares
                    * self.params.potential_daily_yield
                    * self.params.crop_price
                    * rng.uniform(0.9, 1.1);
                income.push(CropIncome {
                    income: potential_income * (rainfed + (1.0 - rainfed) * satisfaction),
                    potential_income,
                });
            }
        }
        income
    }
}
