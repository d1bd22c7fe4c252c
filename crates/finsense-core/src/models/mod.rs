//! Data models for FinSense API payloads.
//!
//! This module contains the structures exchanged with the backend:
//!
//! - `Profile`: account information for the logged-in user
//! - `Budget`: a monthly spending limit
//! - `Transaction`, `TransactionKind`: income and expense entries
//! - `DashboardSummary`, `Dashboard`, `TimelineView`: derived summaries
//!
//! Field names follow the backend's snake_case JSON keys.

pub mod budget;
pub mod dashboard;
pub mod profile;
pub mod transaction;

pub use budget::{budget_usage, expenses_by_month, Budget, BudgetUsageStatus};
pub use dashboard::{
    monthly_projection, BalanceStatus, Dashboard, DashboardSummary, ProjectionStatus, TimelineView,
    RECENT_TRANSACTION_COUNT,
};
pub use profile::{password_strength, PasswordStrength, Profile, MIN_PASSWORD_LENGTH};
pub use transaction::{Transaction, TransactionKind, EXPENSE_CATEGORIES, INCOME_CATEGORIES};
