//! Account routes.
//!
//! | route                     | auth     |
//! |---------------------------|----------|
//! | `POST /api/users`         | none     |
//! | `POST /api/users/login`   | none     |
//! | `GET /api/user`           | required |
//! | `PUT /api/user`           | required |
//!
//! Every response that identifies a user carries a freshly issued token.
//! Password hashing runs on the blocking pool.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::auth::{
    Claims, Credential, CredentialError, JwtError, LoginError, LoginStrategy, RequiredAuth,
    Unauthorized,
};
use crate::state::AppState;
use crate::users::{
    AuthJson, BLANK, FieldErrors, INVALID, TAKEN, User, UserId, UserStoreError, validate_email,
    validate_username,
};

/// Request and response bodies wrap the user in a `user` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope<T> {
    pub user: T,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginUser {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Fields absent from the request are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub password: Option<String>,
}

pub type UserResponse = Json<UserEnvelope<AuthJson>>;

/// Errors returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// One or more fields failed validation (422).
    Validation(FieldErrors),
    /// Authentication failed (401).
    Unauthorized,
    /// Anything else (500). The message is logged, never sent.
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "validation failed: {errors:?}"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "errors": errors })),
            )
                .into_response(),
            Self::Unauthorized => Unauthorized.into_response(),
            Self::Internal(message) => {
                tracing::error!("request failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "errors": { "server": "internal error" } })),
                )
                    .into_response()
            }
        }
    }
}

impl From<Unauthorized> for ApiError {
    fn from(_: Unauthorized) -> Self {
        Self::Unauthorized
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {e}"))
    }
}

impl From<UserStoreError> for ApiError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::Taken(field) => Self::Validation(FieldErrors::single(field, TAKEN)),
            UserStoreError::NotFound => Self::Unauthorized,
            UserStoreError::LockPoisoned | UserStoreError::Corrupt(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::InvalidCredentials => {
                Self::Validation(FieldErrors::single("email or password", INVALID))
            }
            LoginError::Store(e) => e.into(),
        }
    }
}

/// Build the account router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", post(register))
        .route("/api/users/login", post(login))
        .route("/api/user", get(current_user).put(update_user))
        .with_state(state)
}

/// `POST /api/users`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<UserEnvelope<RegisterUser>>,
) -> Result<UserResponse, ApiError> {
    let RegisterUser {
        username,
        email,
        password,
    } = body.user;
    let username = username.unwrap_or_default().to_lowercase();
    let email = email.unwrap_or_default().to_lowercase();
    let password = password.unwrap_or_default();

    let mut errors = FieldErrors::default();
    if let Err(message) = validate_username(&username) {
        errors.insert("username", message);
    }
    if let Err(message) = validate_email(&email) {
        errors.insert("email", message);
    }
    if password.is_empty() {
        errors.insert("password", BLANK);
    }
    errors.into_result().map_err(ApiError::Validation)?;

    let credential =
        tokio::task::spawn_blocking(move || Credential::set_password(&password)).await??;
    let user = User::new(&username, &email, credential);
    state.users.insert(user.clone())?;

    tracing::info!(user_id = %user.id, username = %user.username, "registered user");
    respond(&state, &user)
}

/// `POST /api/users/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<UserEnvelope<LoginUser>>,
) -> Result<UserResponse, ApiError> {
    let LoginUser { email, password } = body.user;
    let email = email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::Validation(FieldErrors::single("email", BLANK)))?;
    let password = password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ApiError::Validation(FieldErrors::single("password", BLANK)))?;

    let users = Arc::clone(&state.users);
    let strategy = LoginStrategy::LocalCredential { email, password };
    let user = tokio::task::spawn_blocking(move || strategy.authenticate(users.as_ref()))
        .await?
        .inspect_err(|e| tracing::debug!("login rejected: {e}"))?;

    tracing::info!(user_id = %user.id, "user logged in");
    respond(&state, &user)
}

/// `GET /api/user`
pub async fn current_user(
    State(state): State<AppState>,
    RequiredAuth(claims): RequiredAuth,
) -> Result<UserResponse, ApiError> {
    let user = load_user(&state, &claims)?;
    respond(&state, &user)
}

/// `PUT /api/user`
pub async fn update_user(
    State(state): State<AppState>,
    RequiredAuth(claims): RequiredAuth,
    Json(body): Json<UserEnvelope<UpdateUser>>,
) -> Result<UserResponse, ApiError> {
    let mut user = load_user(&state, &claims)?;
    let UpdateUser {
        username,
        email,
        bio,
        image,
        password,
    } = body.user;

    if let Some(username) = username {
        user.username = username.to_lowercase();
    }
    if let Some(email) = email {
        user.email = email.to_lowercase();
    }
    if bio.is_some() {
        user.bio = bio;
    }
    if image.is_some() {
        user.image = image;
    }

    let mut errors = match user.validate() {
        Ok(()) => FieldErrors::default(),
        Err(errors) => errors,
    };
    if password.as_deref() == Some("") {
        errors.insert("password", BLANK);
    }
    errors.into_result().map_err(ApiError::Validation)?;

    if let Some(password) = password {
        user = tokio::task::spawn_blocking(move || {
            user.set_password(&password).map(|()| user)
        })
        .await??;
    }

    state.users.update(user.clone())?;

    tracing::info!(user_id = %user.id, "updated user");
    respond(&state, &user)
}

/// Fetch the user named by verified claims.
///
/// A token for a user that no longer exists is treated as unauthorized.
fn load_user(state: &AppState, claims: &Claims) -> Result<User, ApiError> {
    let id = UserId::parse(&claims.id).ok_or(ApiError::Unauthorized)?;
    state
        .users
        .find_by_id(&id)?
        .ok_or(ApiError::Unauthorized)
}

/// Issue a fresh token for `user` and wrap it in the account representation.
fn respond(state: &AppState, user: &User) -> Result<UserResponse, ApiError> {
    let token = state
        .authenticator
        .issue_token(&user.id.to_string(), &user.username)?;
    Ok(Json(UserEnvelope {
        user: user.to_auth_json(token),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_422() {
        let response = ApiError::Validation(FieldErrors::single("email", BLANK)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_unauthorized_is_401() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_internal_is_500() {
        let response = ApiError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_errors_map_to_api_errors() {
        match ApiError::from(UserStoreError::Taken("username")) {
            ApiError::Validation(errors) => assert_eq!(errors.get("username"), Some(TAKEN)),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(matches!(
            ApiError::from(UserStoreError::NotFound),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from(UserStoreError::LockPoisoned),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            ApiError::from(UserStoreError::Corrupt("bad hex".to_string())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_login_error_maps_to_single_message() {
        match ApiError::from(LoginError::InvalidCredentials) {
            ApiError::Validation(errors) => {
                assert_eq!(errors.get("email or password"), Some(INVALID));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
