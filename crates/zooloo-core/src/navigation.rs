//! Top-level routing derived from the session state.

use crate::auth::SessionState;

/// Top-level destination of the navigation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Startup check still running; show only a loading indicator.
    Splash,
    Login,
    /// Authenticated area (tab bar + drawer).
    Home,
}

impl Route {
    pub fn for_state(state: &SessionState) -> Self {
        match state {
            SessionState::Unknown => Route::Splash,
            SessionState::Unauthenticated => Route::Login,
            SessionState::Authenticated { .. } => Route::Home,
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Home)
    }
}
