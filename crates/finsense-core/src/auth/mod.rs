//! Authentication module for session handling and route guarding.
//!
//! This module provides:
//! - `SessionStore`: get/set/clear contract for the bearer token and display name
//! - `MemorySessionStore`, `FileSessionStore`, `KeyringSessionStore`: its backends
//! - `RouteGuard`: redirects navigation to protected views when logged out
//!
//! No expiry is tracked client-side. A session ends on explicit logout or
//! when the API answers 401.

pub mod credentials;
pub mod guard;
pub mod session;

pub use credentials::KeyringSessionStore;
pub use guard::{Guarded, Route, RouteGuard, DEFAULT_LOGIN_PATH};
pub use session::{FileSessionStore, MemorySessionStore, SessionData, SessionError, SessionStore};
