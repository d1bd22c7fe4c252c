//! REST API access for the FinSense backend.
//!
//! - `ApiClient`: the authenticated request gateway every call goes through
//! - `Transport`: the HTTP seam underneath it (`ReqwestTransport` in production)
//! - `FinanceApi`: typed endpoints for profile, budgets, transactions, dashboard
//!
//! The API uses bearer token authentication. A 401 from any endpoint ends
//! the local session.

pub mod client;
pub mod error;
pub mod finance;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, RequestOptions};
pub use error::ApiError;
pub use finance::FinanceApi;
pub use transport::{ApiResponse, OutboundRequest, ReqwestTransport, Transport};

pub use reqwest::{Method, StatusCode};
