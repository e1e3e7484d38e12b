//! The event log: notable state transitions of a run.
//!
//! RULE: Events describe what happened; they never carry state that
//! a later subsystem needs. Data flows through `CellState`.

use crate::types::{CategoryId, CellId, RunId, Tick};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
        cells: usize,
        farms: f64,
    },

    // ── Calendar events ────────────────────────────
    AgriculturalYearStarted {
        tick: Tick,
        date: NaiveDate,
    },

    // ── Irrigation events ──────────────────────────
    WaterAccountsReset {
        tick: Tick,
        cell: CellId,
        cumulative_unmet_demand: f64,
    },

    // ── Accounting events ──────────────────────────
    AccountsSettled {
        tick: Tick,
        cell: CellId,
        swept_to_savings: f64,
        advance_credit: f64,
        total_savings: f64,
    },

    // ── Investment events ──────────────────────────
    TubewellsInstalled {
        tick: Tick,
        cell: CellId,
        category: CategoryId,
        from_wells: u32,
        has_canal: bool,
        farms: f64,
        cost: f64,
    },
}

impl SimEvent {
    /// Stable string name of the variant, for logs and tooling.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::TickStarted { .. }             => "tick_started",
            SimEvent::TickCompleted { .. }           => "tick_completed",
            SimEvent::RunInitialized { .. }          => "run_initialized",
            SimEvent::AgriculturalYearStarted { .. } => "agricultural_year_started",
            SimEvent::WaterAccountsReset { .. }      => "water_accounts_reset",
            SimEvent::AccountsSettled { .. }         => "accounts_settled",
            SimEvent::TubewellsInstalled { .. }      => "tubewells_installed",
        }
    }
}
