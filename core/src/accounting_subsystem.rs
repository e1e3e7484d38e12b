//! Accounting subsystem: farm cash accounts per subcategory.
//!
//! Two phases per year:
//!   - every day, the day's farm income goes into the current account
//!   - on the last day of the agricultural year, positive current
//!     balances are swept into savings (scaled by the savings rate),
//!     zeroed, and every account is credited in advance with the
//!     income of the year just ended
//!
//! Execution: every tick, after income and before investment.

use crate::{
    config::AccountingConfig,
    error::SimResult,
    event::SimEvent,
    state::{CashAccount, CellState},
    subsystem::{DayContext, SimSubsystem},
};

/// Totals moved by one year-end settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Settlement {
    pub swept_to_savings: f64,
    pub advance_credit:   f64,
}

pub struct AccountLedger {
    config: AccountingConfig,
}

impl AccountLedger {
    pub fn new(config: AccountingConfig) -> Self {
        Self { config }
    }

    pub fn credit_daily(accounts: &mut [CashAccount], income: &[f64]) {
        for (account, &amount) in accounts.iter_mut().zip(income) {
            account.current_account += amount;
        }
    }

    /// Year-end settlement. `coming_income` is credited to every
    /// account after the sweep.
    pub fn settle(
        accounts: &mut [CashAccount],
        coming_income: &[f64],
        savings_rate: f64,
    ) -> Settlement {
        let mut settlement = Settlement::default();
        for (account, &income) in accounts.iter_mut().zip(coming_income) {
            if account.current_account > 0.0 {
                let saved = account.current_account * savings_rate;
                account.savings_account += saved;
                account.current_account = 0.0;
                settlement.swept_to_savings += saved;
            }
            account.current_account += income;
            settlement.advance_credit += income;
        }
        settlement
    }
}

impl SimSubsystem for AccountLedger {
    fn name(&self) -> &'static str { "accounting" }

    fn update(
        &mut self,
        ctx: &mut DayContext<'_>,
        cell: &mut CellState,
    ) -> SimResult<Vec<SimEvent>> {
        Self::credit_daily(&mut cell.cash, &cell.daily.farm_income);

        if !ctx.day.is_last_day_of_year {
            return Ok(vec![]);
        }

        let settlement = Self::settle(&mut cell.cash, &cell.annual_income, self.config.savings_rate);
        let total_savings = cell.total_savings();

        log::info!(
            "tick={} cell={} accounts settled: swept={:.0} advance={:.0} savings={:.0}",
            ctx.day.tick,
            cell.cell_id,
            settlement.swept_to_savings,
            settlement.advance_credit,
            total_savings
        );

        Ok(vec![SimEvent::AccountsSettled {
            tick: ctx.day.tick,
            cell: cell.cell_id,
            swept_to_savings: settlement.swept_to_savings,
            advance_credit: settlement.advance_credit,
            total_savings,
        }])
    }
}
