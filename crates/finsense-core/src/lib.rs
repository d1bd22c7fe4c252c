//! Client core for the FinSense personal finance dashboard.
//!
//! The backend owns all business logic. This crate holds what the front end
//! needs to talk to it safely: a session store, an authenticated request
//! gateway that logs the user out on a 401, a route guard for protected
//! views, and typed wrappers for the finance endpoints.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResponse, FinanceApi, RequestOptions};
pub use auth::{Guarded, Route, RouteGuard, SessionStore};
pub use config::Config;
