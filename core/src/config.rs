use crate::error::{SimError, SimResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Farm structure ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryConfig {
    pub label: String,
    /// Highest well count a farm of this category can reach.
    pub max_tubewells: u32,
}

// ── Calendar ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarConfig {
    /// Date simulated on tick 1.
    pub start_date: NaiveDate,
    /// Day of year (non-leap numbering) on which the agricultural year begins.
    pub start_of_agricultural_year: u32,
}

// ── Tubewells ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TubewellConfig {
    /// Daily pump operating hours.
    pub operating_hours: f64,
    pub pump_horsepower: f64,
    /// Rs per well.
    pub installation_cost: f64,
    /// Rs per pump.
    pub pump_cost: f64,
    /// Rs per well per year.
    pub maintenance_cost: f64,
    /// Years.
    pub tubewell_lifespan: f64,
    /// Years.
    pub pump_lifespan: f64,
}

impl TubewellConfig {
    /// Up-front cost of one new well with its pump.
    pub fn total_installation_cost(&self) -> f64 {
        self.installation_cost + self.pump_cost
    }

    /// Annualized cost of owning one well.
    pub fn annual_ownership_cost(&self) -> f64 {
        self.installation_cost / self.tubewell_lifespan
            + self.pump_cost / self.pump_lifespan
            + self.maintenance_cost
    }
}

/// Diesel pumping cost coefficients:
/// `((fuel_slope·zgw + fuel_intercept)·fuel_efficiency/energy_divisor)
///  · volume · diesel_price · cost_share`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpingCostConfig {
    pub fuel_slope: f64,
    pub fuel_intercept: f64,
    pub fuel_efficiency: f64,
    pub energy_divisor: f64,
    pub cost_share: f64,
}

// ── Accounts ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountingConfig {
    /// Share of the year-end current balance that reaches savings;
    /// the rest stands for costs the model does not represent.
    pub savings_rate: f64,
    pub initial_current_per_farm: f64,
    pub initial_savings_per_farm: f64,
}

// ── Investment ─────────────────────────────────────────────────────

/// How the return-on-investment signal acts on the affordability model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoiGate {
    /// No farm installs where the return on investment is not positive.
    #[default]
    HardPrecondition,
    /// ROI is computed and reported but does not change installations.
    Advisory,
}

/// Shape of the savings distribution used for affordability:
/// `σ = max(min_shape, shape_intercept + shape_slope·ln(1 + mean_savings))`.
///
/// Uncalibrated placeholder values; override per study area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffordabilityCalibration {
    pub shape_intercept: f64,
    pub shape_slope: f64,
    pub min_shape: f64,
}

impl Default for AffordabilityCalibration {
    fn default() -> Self {
        Self {
            shape_intercept: 1.2,
            shape_slope: -0.05,
            min_shape: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InvestmentConfig {
    #[serde(default)]
    pub roi_gate: RoiGate,
    #[serde(default)]
    pub affordability: AffordabilityCalibration,
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    pub categories: Vec<CategoryConfig>,
    pub crops: Vec<String>,
    pub calendar: CalendarConfig,
    pub tubewell: TubewellConfig,
    pub pumping_cost: PumpingCostConfig,
    pub accounting: AccountingConfig,
    #[serde(default)]
    pub investment: InvestmentConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryConfig { label: "marginal".into(), max_tubewells: 1 },
                CategoryConfig { label: "small".into(), max_tubewells: 2 },
                CategoryConfig { label: "medium".into(), max_tubewells: 3 },
            ],
            crops: vec!["rice".into(), "wheat".into()],
            calendar: CalendarConfig {
                start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN),
                start_of_agricultural_year: 152, // 1 June
            },
            tubewell: TubewellConfig {
                operating_hours: 12.0,
                pump_horsepower: 7.5,
                installation_cost: 10_000.0,
                pump_cost: 10_000.0,
                maintenance_cost: 10_000.0,
                tubewell_lifespan: 20.0,
                pump_lifespan: 20.0,
            },
            pumping_cost: PumpingCostConfig {
                fuel_slope: 0.1133,
                fuel_intercept: 0.7949,
                fuel_efficiency: 1.0,
                energy_divisor: 102.87,
                cost_share: 0.4,
            },
            accounting: AccountingConfig {
                savings_rate: 1.0,
                initial_current_per_farm: 5_000.0,
                initial_savings_per_farm: 5_000.0,
            },
            investment: InvestmentConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    /// One crop, two categories, the agricultural year starting 1 January.
    pub fn default_test() -> Self {
        let mut config = Self::default();
        config.categories = vec![
            CategoryConfig { label: "small".into(), max_tubewells: 2 },
            CategoryConfig { label: "large".into(), max_tubewells: 3 },
        ];
        config.crops = vec!["wheat".into()];
        config.calendar.start_of_agricultural_year = 1;
        config
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn crop_count(&self) -> usize {
        self.crops.len()
    }

    pub fn max_tubewells(&self) -> Vec<u32> {
        self.categories.iter().map(|c| c.max_tubewells).collect()
    }

    /// Reject configurations the simulation cannot run with.
    /// This is the only fatal error class, and it fires before tick 1.
    pub fn validate(&self) -> SimResult<()> {
        if self.categories.is_empty() {
            return Err(SimError::config("categories", "at least one farm category is required"));
        }
        if self.crops.is_empty() {
            return Err(SimError::config("crops", "at least one crop is required"));
        }

        let doy = self.calendar.start_of_agricultural_year;
        if !(1..=365).contains(&doy) {
            return Err(SimError::config(
                "calendar.start_of_agricultural_year",
                format!("{doy} is not a day of year in 1..=365"),
            ));
        }

        let tw = &self.tubewell;
        require_positive("tubewell.operating_hours", tw.operating_hours)?;
        require_positive("tubewell.pump_horsepower", tw.pump_horsepower)?;
        require_positive("tubewell.tubewell_lifespan", tw.tubewell_lifespan)?;
        require_positive("tubewell.pump_lifespan", tw.pump_lifespan)?;
        require_non_negative("tubewell.installation_cost", tw.installation_cost)?;
        require_non_negative("tubewell.pump_cost", tw.pump_cost)?;
        require_non_negative("tubewell.maintenance_cost", tw.maintenance_cost)?;

        let pc = &self.pumping_cost;
        require_positive("pumping_cost.energy_divisor", pc.energy_divisor)?;
        require_non_negative("pumping_cost.fuel_efficiency", pc.fuel_efficiency)?;
        require_non_negative("pumping_cost.cost_share", pc.cost_share)?;

        let acc = &self.accounting;
        if !(0.0..=1.0).contains(&acc.savings_rate) {
            return Err(SimError::config(
                "accounting.savings_rate",
                format!("{} is outside [0, 1]", acc.savings_rate),
            ));
        }
        require_non_negative("accounting.initial_current_per_farm", acc.initial_current_per_farm)?;
        require_non_negative("accounting.initial_savings_per_farm", acc.initial_savings_per_farm)?;

        let aff = &self.investment.affordability;
        require_positive("investment.affordability.min_shape", aff.min_shape)?;
        if !aff.shape_intercept.is_finite() || !aff.shape_slope.is_finite() {
            return Err(SimError::config(
                "investment.affordability",
                "shape coefficients must be finite",
            ));
        }

        Ok(())
    }
}

fn require_positive(field: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::config(field, format!("{value} must be positive")))
    }
}

fn require_non_negative(field: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::config(field, format!("{value} must be non-negative")))
    }
}
