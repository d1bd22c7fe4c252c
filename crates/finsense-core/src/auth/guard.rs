//! Route guarding for protected views.
//!
//! The guard only looks at the session store. It never touches the network
//! and never caches a decision, so a session cleared by a 401 elsewhere is
//! noticed on the next guarded navigation.

use std::sync::Arc;

use tracing::debug;

use super::session::SessionStore;

/// Public entry point unauthenticated navigation is sent to.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Outcome of a guarded navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<V> {
    /// A session exists; show the requested view unchanged.
    Render(V),
    /// No session; go to `to`, replacing the current history entry.
    Redirect { to: String, replace: bool },
}

impl<V> Guarded<V> {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Guarded::Redirect { .. })
    }

    pub fn into_view(self) -> Option<V> {
        match self {
            Guarded::Render(view) => Some(view),
            Guarded::Redirect { .. } => None,
        }
    }
}

/// Views of the dashboard front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Dashboard,
    Transactions,
    AddTransaction,
    Profile,
    Budget,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Landing,
        Route::Login,
        Route::Dashboard,
        Route::Transactions,
        Route::AddTransaction,
        Route::Profile,
        Route::Budget,
    ];

    /// Resolve a navigation path. Query strings and fragments are ignored and
    /// unknown paths fall back to the landing view.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(Route::Landing)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Transactions => "/transactions",
            Route::AddTransaction => "/add",
            Route::Profile => "/profile",
            Route::Budget => "/budget",
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Landing | Route::Login)
    }
}

/// Gate for protected views, backed by the shared session store.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<dyn SessionStore>,
    login_path: String,
}

impl RouteGuard {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self {
            session,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    /// Redirect to a different public entry path.
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Render `view` if a session exists, otherwise redirect to the login path.
    pub fn guard<V>(&self, view: V) -> Guarded<V> {
        if self.is_authenticated() {
            Guarded::Render(view)
        } else {
            debug!(to = %self.login_path, "No session, redirecting");
            Guarded::Redirect {
                to: self.login_path.clone(),
                replace: true,
            }
        }
    }

    /// Resolve `path` and guard it if the resolved route is protected.
    pub fn navigate(&self, path: &str) -> Guarded<Route> {
        let route = Route::from_path(path);
        if route.is_protected() {
            self.guard(route)
        } else {
            Guarded::Render(route)
        }
    }
}
