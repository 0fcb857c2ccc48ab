//! End-to-end tests for `GET /api/user` and the enforcement modes.

use axum::extract::State;

use crate::auth::{RequiredAuth, Unauthorized};
use crate::e2e_tests::helpers::{
    new_state, new_state_with_secret, optional_auth, register_jake, required_auth, token_header,
};
use crate::routes::{self, ApiError};
use crate::users::UserId;

#[tokio::test]
async fn test_current_user_with_valid_token() {
    let state = new_state();
    let registered = register_jake(&state).await;

    let auth = required_auth(&state, Some(&token_header(&registered.token)))
        .await
        .expect("token accepted");
    let response = routes::current_user(State(state.clone()), auth)
        .await
        .expect("user found");

    assert_eq!(response.0.user.username, "jake");
    assert_eq!(response.0.user.email, "jake@jake.jake");
    assert!(!response.0.user.token.is_empty());
}

#[tokio::test]
async fn test_missing_header_rejected_only_when_required() {
    let state = new_state();

    assert_eq!(required_auth(&state, None).await.err(), Some(Unauthorized));

    let optional = optional_auth(&state, None).await.expect("anonymous allowed");
    assert!(optional.0.is_none());
}

#[tokio::test]
async fn test_expired_token_rejected_in_both_modes() {
    let state = new_state();
    let registered = register_jake(&state).await;
    let claims = required_auth(&state, Some(&token_header(&registered.token)))
        .await
        .expect("token accepted")
        .0;
    let expired = state
        .authenticator
        .issue_token_at(&claims.id, &claims.username, 1_000)
        .expect("signed");
    let header = token_header(&expired);

    assert_eq!(required_auth(&state, Some(&header)).await.err(), Some(Unauthorized));
    assert_eq!(optional_auth(&state, Some(&header)).await.err(), Some(Unauthorized));
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let state = new_state();
    let other = new_state_with_secret(b"someone-else");
    let foreign = register_jake(&other).await;
    let header = token_header(&foreign.token);

    assert_eq!(required_auth(&state, Some(&header)).await.err(), Some(Unauthorized));
    assert_eq!(optional_auth(&state, Some(&header)).await.err(), Some(Unauthorized));
}

#[tokio::test]
async fn test_wrong_scheme_is_anonymous_in_optional_mode() {
    let state = new_state();
    let registered = register_jake(&state).await;
    let header = format!("Bearer {}", registered.token);

    let optional = optional_auth(&state, Some(&header)).await.expect("anonymous allowed");
    assert!(optional.0.is_none());
    assert_eq!(required_auth(&state, Some(&header)).await.err(), Some(Unauthorized));
}

#[tokio::test]
async fn test_valid_token_for_unknown_user() {
    let state = new_state();
    let ghost = UserId([7; 12]).to_string();
    let token = state.authenticator.issue_token(&ghost, "ghost").expect("signed");

    let auth = required_auth(&state, Some(&token_header(&token)))
        .await
        .expect("token itself is valid");
    let result = routes::current_user(State(state.clone()), auth).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_valid_token_with_unparseable_id() {
    let state = new_state();
    let token = state.authenticator.issue_token("not-an-id", "ghost").expect("signed");

    let RequiredAuth(claims) = required_auth(&state, Some(&token_header(&token)))
        .await
        .expect("token itself is valid");
    let result = routes::current_user(State(state.clone()), RequiredAuth(claims)).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}
