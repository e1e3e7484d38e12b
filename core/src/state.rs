//! Explicit per-cell simulation state.
//!
//! RULE: A cell's state is only ever touched through `&mut CellState`
//! handed out by the engine for one step. Cells never read each
//! other, so the cell loop can be sharded without locks.

use crate::{
    config::SimConfig,
    distribution::safe_div,
    error::{SimError, SimResult},
    subcategory::{SubcategoryBuilder, SubcategoryLayout},
    types::{CategoryId, CellId, SubcategoryIndex},
};
use serde::{Deserialize, Serialize};

/// Static description of one farm category in one cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySetup {
    /// Mean area of one farm (m²). Zero where the category has no farms.
    pub farm_area: f64,
    /// Total area farmed by the category (m²).
    pub category_area: f64,
    /// Fraction of farms with canal access, in [0, 1].
    pub canal_access_fraction: f64,
    /// Poisson rate of wells per farm.
    pub tubewell_ownership_rate: f64,
}

impl CategorySetup {
    /// Fractional number of farms, `category_area / farm_area`.
    pub fn farm_count(&self) -> f64 {
        safe_div(self.category_area, self.farm_area)
    }

    /// Integer number of farms the category must always hold.
    pub fn farm_total(&self) -> u64 {
        self.farm_count().round().max(0.0) as u64
    }
}

/// Static input for one grid cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellSetup {
    pub categories: Vec<CategorySetup>,
}

impl CellSetup {
    fn validate(&self, cell: CellId, category_count: usize) -> SimResult<()> {
        if self.categories.len() != category_count {
            return Err(SimError::InvalidCell {
                cell,
                reason: format!(
                    "{} categories supplied, configuration defines {category_count}",
                    self.categories.len()
                ),
            });
        }
        for (c, setup) in self.categories.iter().enumerate() {
            let numbers = [
                setup.farm_area,
                setup.category_area,
                setup.canal_access_fraction,
                setup.tubewell_ownership_rate,
            ];
            if numbers.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(SimError::InvalidCell {
                    cell,
                    reason: format!("category {c} has a negative or non-finite parameter"),
                });
            }
            if setup.canal_access_fraction > 1.0 {
                return Err(SimError::InvalidCell {
                    cell,
                    reason: format!(
                        "category {c} canal access fraction {} exceeds 1",
                        setup.canal_access_fraction
                    ),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SubcategoryArea {
    pub with_irrigation:    f64,
    pub without_irrigation: f64,
}

/// Unmet irrigation demand history for one (subcategory, crop).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CropWaterAccount {
    /// m³ since the start of the agricultural year.
    pub cumulative_unmet_demand: f64,
    pub unmet_demand_days: u32,
}

/// Income history for one (subcategory, crop) in the current year.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CropIncomeAccount {
    pub annual_crop_income:           f64,
    pub potential_annual_crop_income: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CashAccount {
    pub current_account: f64,
    pub savings_account: f64,
}

/// Per-day values exchanged with the crop model. Overwritten every tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyExchange {
    /// Requested depth per (subcategory, crop), mm.
    pub requested_depth: Vec<f64>,
    /// Rationed depth per (subcategory, crop), mm. Returned to the crop model.
    pub realized_depth:  Vec<f64>,
    /// Canal volume delivered per subcategory, m³.
    pub canal_volume:    Vec<f64>,
    /// Groundwater volume pumped per subcategory, m³.
    pub groundwater_volume: Vec<f64>,
    /// Pumping cost per subcategory, Rs.
    pub pumping_cost:    Vec<f64>,
    /// Farm income per subcategory, Rs.
    pub farm_income:     Vec<f64>,
}

impl DailyExchange {
    fn new(subcategories: usize, crops: usize) -> Self {
        Self {
            requested_depth:    vec![0.0; subcategories * crops],
            realized_depth:     vec![0.0; subcategories * crops],
            canal_volume:       vec![0.0; subcategories],
            groundwater_volume: vec![0.0; subcategories],
            pumping_cost:       vec![0.0; subcategories],
            farm_income:        vec![0.0; subcategories],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellState {
    pub cell_id:    CellId,
    pub crop_count: usize,
    pub categories: Vec<CategorySetup>,
    /// Authoritative farm counts, one per subcategory.
    pub farm_count: Vec<f64>,
    pub area:       Vec<SubcategoryArea>,
    /// Wells per farm, one per category. Follows migrations.
    pub tubewell_ownership_rate: Vec<f64>,
    /// One per (subcategory, crop).
    pub water:  Vec<CropWaterAccount>,
    /// One per (subcategory, crop).
    pub income: Vec<CropIncomeAccount>,
    /// Farm income since the start of the agricultural year, per subcategory.
    pub annual_income: Vec<f64>,
    pub cash:   Vec<CashAccount>,
    pub daily:  DailyExchange,
}

impl CellState {
    /// Build a cell's initial state: subcategory farm counts and
    /// seeded accounts.
    pub fn initialize(
        cell_id: CellId,
        setup: &CellSetup,
        layout: &SubcategoryLayout,
        config: &SimConfig,
    ) -> SimResult<Self> {
        setup.validate(cell_id, layout.category_count())?;

        let n_sub = layout.len();
        let n_crop = config.crop_count();
        let farm_count = SubcategoryBuilder::new(layout).build(&setup.categories);

        let acc = &config.accounting;
        let cash = farm_count
            .iter()
            .map(|&farms| CashAccount {
                current_account: acc.initial_current_per_farm * farms,
                savings_account: acc.initial_savings_per_farm * farms,
            })
            .collect();

        let mut cell = Self {
            cell_id,
            crop_count: n_crop,
            categories: setup.categories.clone(),
            farm_count,
            area: vec![SubcategoryArea::default(); n_sub],
            tubewell_ownership_rate: setup
                .categories
                .iter()
                .map(|c| c.tubewell_ownership_rate)
                .collect(),
            water: vec![CropWaterAccount::default(); n_sub * n_crop],
            income: vec![CropIncomeAccount::default(); n_sub * n_crop],
            annual_income: vec![0.0; n_sub],
            cash,
            daily: DailyExchange::new(n_sub, n_crop),
        };
        crate::ownership_subsystem::OwnershipTracker::refresh(&mut cell, layout);

        log::debug!(
            "cell={cell_id} initialized: {} farms in {} subcategories",
            cell.farm_count.iter().sum::<f64>(),
            n_sub
        );
        Ok(cell)
    }

    /// Check a restored cell against the run's layout before it is stepped.
    ///
    /// Every per-subcategory and per-crop vector must have the layout's
    /// length, counts and savings must be finite and non-negative, and
    /// current balances finite.
    pub fn check_shape(&self, layout: &SubcategoryLayout) -> SimResult<()> {
        let n_sub = layout.len();
        let n_pair = n_sub * self.crop_count;
        let lengths = [
            ("categories", self.categories.len(), layout.category_count()),
            ("tubewell_ownership_rate", self.tubewell_ownership_rate.len(), layout.category_count()),
            ("farm_count", self.farm_count.len(), n_sub),
            ("area", self.area.len(), n_sub),
            ("cash", self.cash.len(), n_sub),
            ("annual_income", self.annual_income.len(), n_sub),
            ("water", self.water.len(), n_pair),
            ("income", self.income.len(), n_pair),
            ("daily.requested_depth", self.daily.requested_depth.len(), n_pair),
            ("daily.realized_depth", self.daily.realized_depth.len(), n_pair),
            ("daily.canal_volume", self.daily.canal_volume.len(), n_sub),
            ("daily.groundwater_volume", self.daily.groundwater_volume.len(), n_sub),
            ("daily.pumping_cost", self.daily.pumping_cost.len(), n_sub),
            ("daily.farm_income", self.daily.farm_income.len(), n_sub),
        ];
        for (field, actual, expected) in lengths {
            if actual != expected {
                return Err(SimError::InvalidCell {
                    cell: self.cell_id,
                    reason: format!("{field} holds {actual} values, layout needs {expected}"),
                });
            }
        }

        if let Some(s) = self.farm_count.iter().position(|n| !n.is_finite() || *n < 0.0) {
            return Err(SimError::InvalidCell {
                cell: self.cell_id,
                reason: format!("subcategory {s} has farm count {}", self.farm_count[s]),
            });
        }
        for (s, account) in self.cash.iter().enumerate() {
            if !account.savings_account.is_finite()
                || account.savings_account < 0.0
                || !account.current_account.is_finite()
            {
                return Err(SimError::InvalidCell {
                    cell: self.cell_id,
                    reason: format!(
                        "subcategory {s} has balances current={} savings={}",
                        account.current_account, account.savings_account
                    ),
                });
            }
        }
        Ok(())
    }

    /// Flat index of a (subcategory, crop) pair.
    pub fn crop_index(&self, subcategory: SubcategoryIndex, crop: usize) -> usize {
        subcategory * self.crop_count + crop
    }

    pub fn category_total(&self, layout: &SubcategoryLayout, category: CategoryId) -> f64 {
        self.farm_count[layout.category_range(category)].iter().sum()
    }

    pub fn total_savings(&self) -> f64 {
        self.cash.iter().map(|a| a.savings_account).sum()
    }

    pub fn total_tubewells(&self, layout: &SubcategoryLayout) -> f64 {
        layout
            .iter()
            .map(|(i, sub)| sub.wells as f64 * self.farm_count[i])
            .sum()
    }
}
