//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TokenAuthenticator;
use crate::users::UserStore;

/// State shared by every request handler.
///
/// Nothing in here is mutated by request handling except through the user
/// store's own locking.
#[derive(Clone)]
pub struct AppState {
    /// Issues and verifies session tokens. Read-only after startup.
    pub authenticator: Arc<TokenAuthenticator>,
    /// User accounts.
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    #[must_use]
    pub fn new(authenticator: TokenAuthenticator, users: Arc<dyn UserStore>) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            users,
        }
    }
}

impl FromRef<AppState> for Arc<TokenAuthenticator> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.authenticator)
    }
}
