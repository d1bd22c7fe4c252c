use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Travel",
    "Shopping",
    "Bills",
    "Entertainment",
    "Health",
    "Education",
    "Other",
];

pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Allowance",
    "Business",
    "Investment",
    "Other",
];

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
}

impl TransactionKind {
    /// Value used in the `type` field and query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            TransactionKind::Income => INCOME_CATEGORIES,
            TransactionKind::Expense => EXPENSE_CATEGORIES,
        }
    }
}

/// An income or expense entry. `id` is absent until the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    /// Calendar date as `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    /// A new, unsaved transaction.
    pub fn new(kind: TransactionKind, amount: f64, category: &str, date: NaiveDate) -> Self {
        Self {
            id: None,
            kind,
            amount,
            category: category.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// `(year, month)` from the leading `YYYY-MM` of the date, if well formed.
    pub fn year_month(&self) -> Option<(i32, u32)> {
        let mut parts = self.date.split('-');
        let year = parts.next()?.trim().parse().ok()?;
        let month: u32 = parts.next()?.trim().parse().ok()?;
        (1..=12).contains(&month).then_some((year, month))
    }

    /// Check the form rules enforced before saving.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err("Please enter a valid amount".to_string());
        }
        if self.category.is_empty() {
            return Err("Please select a category".to_string());
        }
        if !self.kind.categories().contains(&self.category.as_str()) {
            return Err(format!(
                "Category {} is not valid for {} transactions",
                self.category,
                self.kind.as_str()
            ));
        }
        if self.date.trim().is_empty() {
            return Err("Please select a date".to_string());
        }
        if NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").is_err() {
            return Err(format!("Invalid date: {}", self.date));
        }
        Ok(())
    }
}
