//! Command handlers.
//!
//! Each handler stands in for one page of the web front end. Protected
//! handlers ask the route guard first and bail out with `NoSession` when it
//! would redirect to the login view.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use finsense_core::api::Method;
use finsense_core::models::{
    budget_usage, expenses_by_month, password_strength, BudgetUsageStatus, ProjectionStatus,
    TimelineView, Transaction, TransactionKind,
};
use finsense_core::utils::{format_amount, format_date, truncate_string};
use finsense_core::{
    ApiClient, ApiError, Config, FinanceApi, Guarded, RequestOptions, Route, RouteGuard, SessionStore,
};
use tracing::{debug, warn};

/// Column width for transaction descriptions
const DESCRIPTION_WIDTH: usize = 30;

pub struct App {
    session: Arc<dyn SessionStore>,
    guard: RouteGuard,
    api: FinanceApi,
}

impl App {
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let mut config = Config::load()?;
        config.apply_env_override(base_url);

        let session = config.session_store()?;
        let guard = config.route_guard(session.clone());
        let client = ApiClient::from_config(&config, session.clone())
            .context("Failed to create API client")?;
        debug!(base_url = %client.base_url(), backend = ?config.session_backend, "Client ready");

        Ok(Self {
            session,
            guard,
            api: FinanceApi::new(client),
        })
    }

    pub async fn dispatch(&self, command: crate::Command) -> Result<()> {
        use crate::{BudgetAction, Command};

        match command {
            Command::Login { token, name } => self.login(&token, name.as_deref()),
            Command::Logout => self.logout(),
            Command::Whoami => {
                self.whoami();
                Ok(())
            }
            Command::Profile => self.profile().await,
            Command::ChangePassword => self.change_password().await,
            Command::DeleteAccount { yes } => self.delete_account(yes).await,
            Command::Budget { action: BudgetAction::Show } => self.show_budget().await,
            Command::Budget {
                action: BudgetAction::Set { amount, month, year, yes },
            } => self.set_budget(amount, month, year, yes).await,
            Command::Transactions { kind } => self.transactions(kind.as_deref()).await,
            Command::AddTransaction {
                kind,
                amount,
                category,
                date,
                description,
                id,
            } => {
                let kind = parse_kind(&kind)?;
                let date = match date {
                    Some(date) => date,
                    None => today().format("%Y-%m-%d").to_string(),
                };
                let transaction = Transaction {
                    id,
                    kind,
                    amount,
                    category,
                    date,
                    description,
                };
                self.save_transaction(&transaction).await
            }
            Command::Dashboard { view } => {
                let view = TimelineView::parse(&view)
                    .with_context(|| format!("Unknown timeline view: {}", view))?;
                self.dashboard(view).await
            }
            Command::Request { method, path, body } => self.raw_request(&method, &path, body).await,
            Command::Route { path } => {
                self.route(&path);
                Ok(())
            }
        }
    }

    /// Fail with `NoSession` when the guard would send `route` to the login view.
    fn require(&self, route: Route) -> Result<()> {
        match self.guard.guard(route) {
            Guarded::Render(_) => Ok(()),
            Guarded::Redirect { .. } => Err(ApiError::NoSession.into()),
        }
    }

    // ===== Session =====

    fn login(&self, token: &str, name: Option<&str>) -> Result<()> {
        if token.trim().is_empty() {
            bail!("Token must not be empty");
        }
        self.session
            .set_session(token.trim(), name)
            .context("Failed to store session")?;
        println!("Logged in as {}", self.session.display_label());
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        self.api.logout()?;
        println!("Logged out");
        Ok(())
    }

    fn whoami(&self) {
        if self.session.is_authenticated() {
            let initial = self.session.initial().unwrap_or('?');
            println!("[{}] {}", initial, self.session.display_label());
        } else {
            println!("Not logged in");
        }
    }

    fn route(&self, path: &str) {
        match self.guard.navigate(path) {
            Guarded::Render(route) => println!("{} -> render {:?}", path, route),
            Guarded::Redirect { to, .. } => println!("{} -> redirect to {}", path, to),
        }
    }

    // ===== Profile =====

    async fn profile(&self) -> Result<()> {
        self.require(Route::Profile)?;
        let profile = self.api.profile().await?;
        println!("Name:        {}", profile.name.as_deref().unwrap_or("—"));
        println!("Email:       {}", profile.email.as_deref().unwrap_or("—"));
        println!("Date Joined: {}", format_date(profile.created_at.as_deref()));
        Ok(())
    }

    async fn change_password(&self) -> Result<()> {
        self.require(Route::Profile)?;
        let current = rpassword::prompt_password("Current password: ")?;
        let new = rpassword::prompt_password("New password: ")?;
        if let Some(strength) = password_strength(&new) {
            println!("Strength: {}", strength.label());
        }
        let confirm = rpassword::prompt_password("Confirm new password: ")?;

        self.api.change_password(&current, &new, &confirm).await?;
        println!("Password updated successfully");
        Ok(())
    }

    async fn delete_account(&self, confirmed: bool) -> Result<()> {
        self.require(Route::Profile)?;
        if !confirmed
            && !confirm("This will permanently delete your account and all financial data. Are you sure?")?
        {
            println!("Cancelled");
            return Ok(());
        }
        self.api.delete_account().await?;
        println!("Account deleted");
        Ok(())
    }

    // ===== Budget =====

    async fn show_budget(&self) -> Result<()> {
        self.require(Route::Budget)?;
        let today = today();

        let (current, history, expenses) = tokio::join!(
            self.api.current_budget(),
            self.api.budgets(),
            self.api.transactions(Some(TransactionKind::Expense)),
        );
        // A 401 in any of them has already ended the session
        for result in [current.as_ref().err(), history.as_ref().err(), expenses.as_ref().err()] {
            if let Some(ApiError::Unauthorized) = result {
                return Err(ApiError::Unauthorized.into());
            }
        }

        let spent_by_month = expenses_by_month(&or_notice(expenses, "expenses"));
        let current_loaded = current.is_ok();
        match or_notice(current, "current budget") {
            Some(amount) => {
                let spent = spent_by_month
                    .get(&(today.year(), today.month()))
                    .copied()
                    .unwrap_or(0.0);
                println!(
                    "{}: {} budget, {} spent ({})",
                    today.format("%B %Y"),
                    format_amount(amount),
                    format_amount(spent),
                    usage_cell(spent, amount)
                );
            }
            None if current_loaded => println!("{}: no budget set", today.format("%B %Y")),
            None => {}
        }

        let history = or_notice(history, "budget history");
        if !history.is_empty() {
            println!();
            println!("History:");
        }
        for budget in history {
            let spent = spent_by_month
                .get(&(budget.year, budget.month))
                .copied()
                .unwrap_or(0.0);
            let label = NaiveDate::from_ymd_opt(budget.year, budget.month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_else(|| format!("{}-{:02}", budget.year, budget.month));
            println!(
                "  {:<16} {:>12} {:>12}  {}",
                label,
                format_amount(budget.amount),
                format_amount(spent),
                usage_cell(spent, budget.amount)
            );
        }
        Ok(())
    }

    async fn set_budget(
        &self,
        amount: f64,
        month: Option<u32>,
        year: Option<i32>,
        confirmed: bool,
    ) -> Result<()> {
        self.require(Route::Budget)?;
        let today = today();
        let month = month.unwrap_or(today.month());
        let year = year.unwrap_or(today.year());

        if !confirmed {
            if let Some(existing) = self.api.budget_for(month, year).await? {
                let prompt = format!(
                    "A budget of {} is already set for {}/{}. Replace it?",
                    format_amount(existing.amount),
                    month,
                    year
                );
                if !confirm(&prompt)? {
                    println!("Cancelled");
                    return Ok(());
                }
            }
        }

        let saved = self.api.save_budget(month, year, amount).await?;
        println!("Budget saved: {} for {}/{}", format_amount(saved.amount), saved.month, saved.year);
        Ok(())
    }

    // ===== Transactions =====

    async fn transactions(&self, kind: Option<&str>) -> Result<()> {
        self.require(Route::Transactions)?;
        let kind = kind.map(parse_kind).transpose()?;
        let transactions = self.api.transactions(kind).await?;
        if transactions.is_empty() {
            println!("No transactions");
        }
        for txn in &transactions {
            print_transaction(txn);
        }
        Ok(())
    }

    async fn save_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.require(Route::AddTransaction)?;
        self.api.save_transaction(transaction).await?;
        match transaction.id {
            Some(id) => println!("Transaction {} updated", id),
            None => println!("Transaction added"),
        }
        Ok(())
    }

    // ===== Dashboard =====

    async fn dashboard(&self, view: TimelineView) -> Result<()> {
        self.require(Route::Dashboard)?;
        let dashboard = self.api.dashboard(view).await?;
        let summary = &dashboard.summary;
        let today = today();

        println!("Monthly budget:     {}", format_amount(summary.monthly_budget()));
        println!("Spent this month:   {}", format_amount(summary.expense_this_month()));
        println!(
            "Remaining balance:  {} ({})",
            format_amount(summary.remaining_balance()),
            summary.balance_status().label()
        );

        let projection = match summary.projection_status(today) {
            ProjectionStatus::NoBudget { projected } => {
                format!("{} (projected monthly total)", format_amount(projected))
            }
            ProjectionStatus::WillExceed { by, percent } => {
                format!("Will exceed by {} ({}% over budget)", format_amount(by), percent)
            }
            ProjectionStatus::WillSave { amount, percent } => {
                format!("Will save {} ({}% under budget)", format_amount(amount), percent)
            }
            ProjectionStatus::WithinBudget => "Within budget".to_string(),
        };
        println!("Projection:         {}", projection);

        if let Some(categories) = &summary.category_totals {
            println!();
            println!("By category:");
            for (category, total) in categories {
                println!("  {:<16} {:>12}", category, format_amount(*total));
            }
        }

        println!();
        println!("Timeline ({}):", view.as_str());
        println!("{}", serde_json::to_string_pretty(&dashboard.timeline)?);
        println!("Rule insights:");
        println!("{}", serde_json::to_string_pretty(&dashboard.rule_insights)?);
        println!("Model insights:");
        println!("{}", serde_json::to_string_pretty(&dashboard.ml_insights)?);

        println!();
        println!("Recent transactions:");
        for txn in &dashboard.recent_transactions {
            print_transaction(txn);
        }
        Ok(())
    }

    // ===== Raw gateway access =====

    async fn raw_request(&self, method: &str, path: &str, body: Option<String>) -> Result<()> {
        let method = method
            .to_uppercase()
            .parse::<Method>()
            .with_context(|| format!("Invalid HTTP method: {}", method))?;
        let mut options = RequestOptions::new().method(method);
        if let Some(body) = body {
            options = options.body(body);
        }

        let response = self.api.client().request(path, options).await?;
        println!("{}", response.status());
        println!("{}", response.text());
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_kind(kind: &str) -> Result<TransactionKind> {
    TransactionKind::parse(kind).with_context(|| format!("Unknown transaction type: {}", kind))
}

fn print_transaction(txn: &Transaction) {
    let sign = match txn.kind {
        TransactionKind::Income => "+",
        TransactionKind::Expense => "-",
    };
    println!(
        "  {:>6} {:<10} {}{:>11} {:<14} {}",
        txn.id.map(|id| id.to_string()).unwrap_or_default(),
        txn.date,
        sign,
        format_amount(txn.amount),
        txn.category,
        truncate_string(&txn.description, DESCRIPTION_WIDTH)
    );
}

/// Unwrap a panel's result, or print a notice and fall back to the empty value.
fn or_notice<T: Default>(result: Result<T, ApiError>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Failed to load {}", what);
            eprintln!("Could not load {}: {}", what, e);
            T::default()
        }
    }
}

/// "42% good" style usage column.
fn usage_cell(spent: f64, budget: f64) -> String {
    let usage = budget_usage(spent, budget);
    format!("{}% {}", usage, BudgetUsageStatus::classify(usage).label())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
