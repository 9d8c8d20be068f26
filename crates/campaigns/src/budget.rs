//! Budget math. The remote API expresses budgets in minor currency units;
//! this subsystem works in major units at its public boundary. The ×100
//! scaling at the remote-call edge is a strict contract, applied on every
//! create and update.

use serde::Deserialize;

use asc_core::error::{AscError, AscResult};
use asc_core::types::MinimumDailyBudget;

/// Safety factor applied on top of the platform minimum, both when flooring
/// the minimum itself and when proposing a default budget.
pub const BUDGET_SAFETY_FACTOR: f64 = 1.2;

pub fn to_minor_units(major: f64) -> i64 {
    (major * 100.0).round() as i64
}

pub fn from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// One row of the account's `minimum_budgets` table.
#[derive(Debug, Clone, Deserialize)]
pub struct MinimumBudgetRow {
    pub currency: String,
    pub min_daily_budget: f64,
}

/// Derives the floored minimum daily budget and the local/USD conversion
/// rate for the account currency. A missing local-currency row falls back
/// to the USD row (conversion 1.0); a missing USD row is a hard error since
/// the conversion base is gone.
pub fn derive_minimum(rows: &[MinimumBudgetRow], currency: &str) -> AscResult<MinimumDailyBudget> {
    let usd = rows
        .iter()
        .find(|r| r.currency == "USD")
        .ok_or_else(|| AscError::Api("minimum_budgets table has no USD row".to_string()))?;
    let local = rows.iter().find(|r| r.currency == currency).unwrap_or(usd);

    let value = (local.min_daily_budget * BUDGET_SAFETY_FACTOR / 1000.0).ceil() * 10.0;
    let conversion_rate = local.min_daily_budget / usd.min_daily_budget;

    Ok(MinimumDailyBudget {
        value,
        conversion_rate,
    })
}
