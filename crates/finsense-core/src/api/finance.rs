//! Typed FinSense endpoints on top of the gateway.
//!
//! Unlike the raw gateway, these helpers interpret the response: a non-2xx
//! status becomes `ApiError::Status` carrying the backend's `detail` text.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{
    Budget, Dashboard, DashboardSummary, Profile, TimelineView, Transaction, TransactionKind,
    MIN_PASSWORD_LENGTH, RECENT_TRANSACTION_COUNT,
};

use super::client::ApiClient;
use super::transport::ApiResponse;
use super::ApiError;

#[derive(Serialize)]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Deserialize)]
struct CurrentBudgetResponse {
    amount: Option<f64>,
}

/// FinSense endpoints. Clone is cheap - it only wraps an `ApiClient`.
#[derive(Clone)]
pub struct FinanceApi {
    client: ApiClient,
}

impl FinanceApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Turn a non-2xx response into an error.
    fn check_response(response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status(), &response.text()))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(path).await?;
        Self::check_response(response)?.json()
    }

    // ===== Session =====

    /// Forget the local session. No request is made.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.session().clear_session()?;
        info!("Logged out");
        Ok(())
    }

    // ===== Profile =====

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.get_json("/profile").await
    }

    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<(), ApiError> {
        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(ApiError::Validation("Please fill all fields".to_string()));
        }
        if new != confirm {
            return Err(ApiError::Validation("New passwords do not match".to_string()));
        }
        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let body = ChangePasswordRequest {
            current_password: current,
            new_password: new,
        };
        let response = self.client.post_json("/auth/change-password", &body).await?;
        Self::check_response(response)?;
        info!("Password updated");
        Ok(())
    }

    /// Delete the account and all its data, then drop the local session.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        let response = self.client.delete("/profile").await?;
        Self::check_response(response)?;
        self.client.session().clear_session()?;
        info!("Account deleted");
        Ok(())
    }

    // ===== Budgets =====

    /// Amount budgeted for the current month. A 404 or a body without an
    /// amount means no budget has been set.
    pub async fn current_budget(&self) -> Result<Option<f64>, ApiError> {
        let response = self.client.get("/budget/current").await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let current: CurrentBudgetResponse = Self::check_response(response)?.json()?;
        Ok(current.amount)
    }

    /// Budget history. A body that is not a list reads as no history.
    pub async fn budgets(&self) -> Result<Vec<Budget>, ApiError> {
        let value: serde_json::Value = self.get_json("/budgets").await?;
        if !value.is_array() {
            debug!("Budget history is not a list, treating as empty");
            return Ok(Vec::new());
        }
        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse budgets: {}", e)))
    }

    /// The saved budget for `month`/`year`, if the history has one.
    pub async fn budget_for(&self, month: u32, year: i32) -> Result<Option<Budget>, ApiError> {
        let history = self.budgets().await?;
        Ok(history.into_iter().find(|b| b.is_for(month, year)))
    }

    pub async fn save_budget(&self, month: u32, year: i32, amount: f64) -> Result<Budget, ApiError> {
        let budget = Budget::new(month, year, amount);
        budget.validate().map_err(ApiError::Validation)?;

        let response = self.client.post_json("/budget", &budget).await?;
        let saved = Self::check_response(response)?.json()?;
        info!(month, year, "Budget saved");
        Ok(saved)
    }

    // ===== Transactions =====

    pub async fn transactions(&self, kind: Option<TransactionKind>) -> Result<Vec<Transaction>, ApiError> {
        let path = match kind {
            Some(kind) => format!("/transactions?type={}", kind.as_str()),
            None => "/transactions".to_string(),
        };
        self.get_json(&path).await
    }

    /// Create the transaction, or update it in place when it already has an id.
    pub async fn save_transaction(&self, transaction: &Transaction) -> Result<(), ApiError> {
        transaction.validate().map_err(ApiError::Validation)?;

        let mut payload = transaction.clone();
        payload.description = payload.description.trim().to_string();
        payload.id = None;

        let response = match transaction.id {
            Some(id) => self.client.put_json(&format!("/transactions/{}", id), &payload).await?,
            None => self.client.post_json("/transactions", &payload).await?,
        };
        Self::check_response(response)?;
        debug!(id = ?transaction.id, "Transaction saved");
        Ok(())
    }

    // ===== Dashboard =====

    /// Load every dashboard panel concurrently. The first failure aborts the
    /// whole load; results of the other requests are discarded.
    pub async fn dashboard(&self, view: TimelineView) -> Result<Dashboard, ApiError> {
        let timeline_path = format!("/dashboard/timeline?view={}", view.as_str());

        let (summary, timeline, rule_insights, ml_insights, transactions) = futures::try_join!(
            self.get_json::<DashboardSummary>("/dashboard/summary"),
            self.get_json::<serde_json::Value>(&timeline_path),
            self.get_json::<serde_json::Value>("/dashboard/rule-insights"),
            self.get_json::<serde_json::Value>("/dashboard/ml-insights"),
            self.get_json::<Vec<Transaction>>("/transactions"),
        )?;

        let mut recent_transactions = transactions;
        recent_transactions.truncate(RECENT_TRANSACTION_COUNT);

        Ok(Dashboard {
            summary,
            timeline,
            rule_insights,
            ml_insights,
            recent_transactions,
        })
    }
}
