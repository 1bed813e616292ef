//! Application state shared across handlers.

use crate::auth::AuthState;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authentication state.
    pub auth: AuthState,
}

impl AppState {
    /// Create new application state.
    pub fn new(auth: AuthState) -> Self {
        Self { auth }
    }
}
