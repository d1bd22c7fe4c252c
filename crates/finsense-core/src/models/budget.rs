use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::transaction::{Transaction, TransactionKind};

/// A spending limit for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Budget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
}

impl Budget {
    pub fn new(month: u32, year: i32, amount: f64) -> Self {
        Self {
            id: None,
            month,
            year,
            amount,
        }
    }

    pub fn is_for(&self, month: u32, year: i32) -> bool {
        self.month == month && self.year == year
    }

    /// Check the form rules enforced before saving.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err("Please enter a valid budget amount".to_string());
        }
        if !(1..=12).contains(&self.month) {
            return Err(format!("Invalid month: {}", self.month));
        }
        Ok(())
    }
}

/// Whole percentage of `budget` already spent, capped at 100. Zero when no
/// budget is set.
pub fn budget_usage(spent: f64, budget: f64) -> u32 {
    if budget <= 0.0 {
        return 0;
    }
    (spent / budget * 100.0).round().clamp(0.0, 100.0) as u32
}

/// How close a month's spending is to its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetUsageStatus {
    Good,
    Mid,
    Warning,
    Over,
}

impl BudgetUsageStatus {
    /// Tier for a usage percentage from [`budget_usage`].
    pub fn classify(usage: u32) -> Self {
        match usage {
            100.. => BudgetUsageStatus::Over,
            80..=99 => BudgetUsageStatus::Warning,
            50..=79 => BudgetUsageStatus::Mid,
            _ => BudgetUsageStatus::Good,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetUsageStatus::Good => "good",
            BudgetUsageStatus::Mid => "halfway",
            BudgetUsageStatus::Warning => "warning",
            BudgetUsageStatus::Over => "over",
        }
    }
}

/// Total expense per `(year, month)`. Income and undated entries are skipped.
pub fn expenses_by_month(transactions: &[Transaction]) -> BTreeMap<(i32, u32), f64> {
    let mut totals = BTreeMap::new();
    for txn in transactions.iter().filter(|t| t.kind == TransactionKind::Expense) {
        if let Some(key) = txn.year_month() {
            *totals.entry(key).or_insert(0.0) += txn.amount;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(kind: TransactionKind, amount: f64, date: &str) -> Transaction {
        Transaction {
            id: None,
            kind,
            amount,
            category: "Other".to_string(),
            date: date.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_budget_validate() {
        assert!(Budget::new(3, 2025, 1500.0).validate().is_ok());
        assert!(Budget::new(3, 2025, 0.0).validate().is_err());
        assert!(Budget::new(0, 2025, 10.0).validate().is_err());
        assert!(Budget::new(13, 2025, 10.0).validate().is_err());
    }

    #[test]
    fn test_budget_usage_rounds_and_caps() {
        assert_eq!(budget_usage(500.0, 2000.0), 25);
        assert_eq!(budget_usage(333.3, 1000.0), 33);
        assert_eq!(budget_usage(335.0, 1000.0), 34);
        assert_eq!(budget_usage(2500.0, 2000.0), 100);
        assert_eq!(budget_usage(500.0, 0.0), 0);
        assert_eq!(budget_usage(0.0, 1000.0), 0);
    }

    #[test]
    fn test_budget_usage_status_thresholds() {
        assert_eq!(BudgetUsageStatus::classify(0), BudgetUsageStatus::Good);
        assert_eq!(BudgetUsageStatus::classify(49), BudgetUsageStatus::Good);
        assert_eq!(BudgetUsageStatus::classify(50), BudgetUsageStatus::Mid);
        assert_eq!(BudgetUsageStatus::classify(79), BudgetUsageStatus::Mid);
        assert_eq!(BudgetUsageStatus::classify(80), BudgetUsageStatus::Warning);
        assert_eq!(BudgetUsageStatus::classify(99), BudgetUsageStatus::Warning);
        assert_eq!(BudgetUsageStatus::classify(100), BudgetUsageStatus::Over);

        // 99.6% rounds up into the top tier
        let usage = budget_usage(996.0, 1000.0);
        assert_eq!(BudgetUsageStatus::classify(usage), BudgetUsageStatus::Over);
    }

    #[test]
    fn test_expenses_by_month() {
        let transactions = vec![
            txn(TransactionKind::Expense, 100.0, "2025-03-01"),
            txn(TransactionKind::Expense, 50.5, "2025-03-28"),
            txn(TransactionKind::Expense, 20.0, "2025-04-02"),
            txn(TransactionKind::Income, 999.0, "2025-03-05"),
            txn(TransactionKind::Expense, 7.0, "bad-date"),
        ];
        let totals = expenses_by_month(&transactions);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&(2025, 3)], 150.5);
        assert_eq!(totals[&(2025, 4)], 20.0);
    }

    #[test]
    fn test_budget_omits_missing_id() {
        let value = serde_json::to_value(Budget::new(3, 2025, 1500.0)).unwrap();
        assert_eq!(value, serde_json::json!({"month": 3, "year": 2025, "amount": 1500.0}));
    }
}
