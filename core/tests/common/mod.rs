//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use tubewell_core::{
    clock::DayInfo,
    config::SimConfig,
    engine::SimEngine,
    forcing::{CropDemand, CropIncome, Forcing, WaterSupply},
    state::{CategorySetup, CellSetup, CellState},
    subcategory::SubcategoryLayout,
};

/// Forcing with the same supply, demand and per-farm income every day.
#[derive(Debug, Clone)]
pub struct ConstantForcing {
    pub supply: WaterSupply,
    /// mm per day for every crop.
    pub requested_depth: f64,
    /// Rs per farm per crop per day.
    pub income_per_farm: f64,
    /// Rs per farm per crop per day under full irrigation.
    pub potential_per_farm: f64,
}

impl ConstantForcing {
    /// Nothing to irrigate with: no canal, no groundwater.
    pub fn dry() -> Self {
        Self {
            supply: WaterSupply {
                canal_volume: 0.0,
                groundwater_depth: 0.0,
                diesel_price: 60.0,
            },
            requested_depth: 5.0,
            income_per_farm: 100.0,
            potential_per_farm: 300.0,
        }
    }
}

impl Forcing for ConstantForcing {
    fn water_supply(&mut self, _day: &DayInfo, _cell: &CellState) -> WaterSupply {
        self.supply
    }

    fn irrigation_demand(
        &mut self,
        _day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropDemand> {
        let mut demand = Vec::new();
        for (s, _) in layout.iter() {
            let area = cell.area[s];
            let crop_area = (area.with_irrigation + area.without_irrigation) / cell.crop_count as f64;
            for _ in 0..cell.crop_count {
                demand.push(CropDemand {
                    requested_depth: self.requested_depth,
                    crop_area,
                });
            }
        }
        demand
    }

    fn crop_income(
        &mut self,
        _day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropIncome> {
        let mut income = Vec::new();
        for (s, _) in layout.iter() {
            for _ in 0..cell.crop_count {
                income.push(CropIncome {
                    income: self.income_per_farm * cell.farm_count[s],
                    potential_income: self.potential_per_farm * cell.farm_count[s],
                });
            }
        }
        income
    }
}

pub fn category(farm_area: f64, farms: f64, canal: f64, rate: f64) -> CategorySetup {
    CategorySetup {
        farm_area,
        category_area: farm_area * farms,
        canal_access_fraction: canal,
        tubewell_ownership_rate: rate,
    }
}

/// One cell with 60 small and 20 large farms.
pub fn one_cell() -> Vec<CellSetup> {
    vec![CellSetup {
        categories: vec![
            category(10_000.0, 60.0, 0.5, 0.4),
            category(40_000.0, 20.0, 0.5, 1.0),
        ],
    }]
}

/// Route `log` output through the test harness; `RUST_LOG=debug` to see it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn build_one_cell(run_id: &str, config: SimConfig) -> SimEngine {
    init_logging();
    SimEngine::build(run_id.into(), 7, config, &one_cell()).unwrap()
}
