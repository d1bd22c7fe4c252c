//! Dashboard payloads and the client-side arithmetic layered on top of them.
//!
//! All aggregation happens server-side. The helpers here only project the
//! month's spending forward and classify it against the budget.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// Projection is "under budget" once it is this fraction below the budget
const UNDER_BUDGET_MARGIN: f64 = 0.2;

/// Remaining balance below this fraction of the budget counts as low
const LOW_BALANCE_FRACTION: f64 = 0.1;

/// Projections are rounded to the nearest multiple of this
const PROJECTION_ROUNDING: f64 = 100.0;

/// Number of recent transactions shown on the dashboard
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// Granularity of the income/expense timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimelineView {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl TimelineView {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineView::Daily => "daily",
            TimelineView::Weekly => "weekly",
            TimelineView::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Some(TimelineView::Daily),
            "weekly" => Some(TimelineView::Weekly),
            "monthly" => Some(TimelineView::Monthly),
            _ => None,
        }
    }
}

/// `GET /dashboard/summary`. Missing or null numbers read as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardSummary {
    #[serde(default)]
    pub monthly_budget: Option<f64>,
    #[serde(default)]
    pub expense_this_month: Option<f64>,
    #[serde(default)]
    pub remaining_balance: Option<f64>,
    #[serde(default)]
    pub category_totals: Option<BTreeMap<String, f64>>,
}

impl DashboardSummary {
    pub fn monthly_budget(&self) -> f64 {
        self.monthly_budget.unwrap_or(0.0)
    }

    pub fn expense_this_month(&self) -> f64 {
        self.expense_this_month.unwrap_or(0.0)
    }

    pub fn remaining_balance(&self) -> f64 {
        self.remaining_balance.unwrap_or(0.0)
    }

    /// Projected month-end spending as of `today`.
    pub fn projection(&self, today: NaiveDate) -> f64 {
        monthly_projection(self.expense_this_month(), today.day(), days_in_month(today))
    }

    pub fn projection_status(&self, today: NaiveDate) -> ProjectionStatus {
        ProjectionStatus::classify(self.projection(today), self.monthly_budget())
    }

    pub fn balance_status(&self) -> BalanceStatus {
        let remaining = self.remaining_balance();
        let budget = self.monthly_budget();
        if remaining < 0.0 {
            BalanceStatus::OverBudget
        } else if budget > 0.0 && remaining < budget * LOW_BALANCE_FRACTION {
            BalanceStatus::Low
        } else {
            BalanceStatus::WithinBudget
        }
    }
}

/// Everything the dashboard view loads in one go.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub timeline: serde_json::Value,
    pub rule_insights: serde_json::Value,
    pub ml_insights: serde_json::Value,
    pub recent_transactions: Vec<Transaction>,
}

/// Where the projected spend lands relative to the budget.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionStatus {
    /// No budget set; just the projected total.
    NoBudget { projected: f64 },
    WillExceed { by: f64, percent: u32 },
    WillSave { amount: f64, percent: u32 },
    WithinBudget,
}

impl ProjectionStatus {
    pub fn classify(projected: f64, budget: f64) -> Self {
        if budget <= 0.0 {
            return ProjectionStatus::NoBudget { projected };
        }
        let diff = projected - budget;
        let percent = (diff.abs() / budget * 100.0).round() as u32;
        if diff > 0.0 {
            ProjectionStatus::WillExceed { by: diff, percent }
        } else if diff < -(budget * UNDER_BUDGET_MARGIN) {
            ProjectionStatus::WillSave {
                amount: diff.abs(),
                percent,
            }
        } else {
            ProjectionStatus::WithinBudget
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStatus {
    WithinBudget,
    Low,
    OverBudget,
}

impl BalanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BalanceStatus::WithinBudget => "Within budget",
            BalanceStatus::Low => "Low balance",
            BalanceStatus::OverBudget => "Over budget",
        }
    }
}

/// Extrapolate spending to month end, rounded to the nearest 100.
/// Returns `expense` unchanged when there is nothing to extrapolate from.
pub fn monthly_projection(expense: f64, day_of_month: u32, days_in_month: u32) -> f64 {
    if expense <= 0.0 || day_of_month == 0 {
        return expense;
    }
    let daily_rate = expense / f64::from(day_of_month);
    (daily_rate * f64::from(days_in_month) / PROJECTION_ROUNDING).round() * PROJECTION_ROUNDING
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}
