//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{Request, header::AUTHORIZATION},
};

use crate::auth::{JwtConfig, OptionalAuth, RequiredAuth, TokenAuthenticator, Unauthorized};
use crate::routes::{self, ApiError, LoginUser, RegisterUser, UserEnvelope, UserResponse};
use crate::state::AppState;
use crate::users::{AuthJson, InMemoryUserStore};

pub const SECRET: &[u8] = b"e2e-test-secret";

/// Fresh state with an empty user store.
pub fn new_state() -> AppState {
    new_state_with_secret(SECRET)
}

pub fn new_state_with_secret(secret: &[u8]) -> AppState {
    #[allow(clippy::expect_used)]
    let config = JwtConfig::new_hs256(secret.to_vec()).expect("non-empty secret");
    AppState::new(
        TokenAuthenticator::new(config),
        Arc::new(InMemoryUserStore::new()),
    )
}

/// `Authorization` header value for `token`.
pub fn token_header(token: &str) -> String {
    format!("Token {token}")
}

/// Run the required-mode extractor against a request carrying `header`.
pub async fn required_auth(
    state: &AppState,
    header: Option<&str>,
) -> Result<RequiredAuth, Unauthorized> {
    let mut parts = request_parts(header);
    RequiredAuth::from_request_parts(&mut parts, state).await
}

/// Run the optional-mode extractor against a request carrying `header`.
pub async fn optional_auth(
    state: &AppState,
    header: Option<&str>,
) -> Result<OptionalAuth, Unauthorized> {
    let mut parts = request_parts(header);
    OptionalAuth::from_request_parts(&mut parts, state).await
}

fn request_parts(header: Option<&str>) -> axum::http::request::Parts {
    let mut builder = Request::builder().uri("/api/user");
    if let Some(value) = header {
        builder = builder.header(AUTHORIZATION, value);
    }
    #[allow(clippy::expect_used)]
    let request = builder.body(()).expect("valid request");
    request.into_parts().0
}

pub async fn register(
    state: &AppState,
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<UserResponse, ApiError> {
    let body = UserEnvelope {
        user: RegisterUser {
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        },
    };
    routes::register(State(state.clone()), Json(body)).await
}

pub async fn login(
    state: &AppState,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<UserResponse, ApiError> {
    let body = UserEnvelope {
        user: LoginUser {
            email: email.map(str::to_string),
            password: password.map(str::to_string),
        },
    };
    routes::login(State(state.clone()), Json(body)).await
}

/// Register the canonical test user and return its account representation.
pub async fn register_jake(state: &AppState) -> AuthJson {
    #[allow(clippy::expect_used)]
    let response = register(state, Some("jake"), Some("jake@jake.jake"), Some("jakejake"))
        .await
        .expect("registration succeeds");
    response.0.user
}

/// Unwrap a validation failure into `(field, message)` lookups.
pub fn validation_errors(result: Result<UserResponse, ApiError>) -> crate::users::FieldErrors {
    match result {
        Err(ApiError::Validation(errors)) => errors,
        Err(other) => panic!("expected validation error, got {other:?}"),
        Ok(response) => panic!("expected validation error, got {:?}", response.0.user),
    }
}
