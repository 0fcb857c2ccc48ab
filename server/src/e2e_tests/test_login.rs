//! End-to-end tests for `POST /api/users/login`.

use crate::auth::TokenState;
use crate::e2e_tests::helpers::{login, new_state, register_jake, token_header, validation_errors};
use crate::users::{BLANK, INVALID};

#[tokio::test]
async fn test_login_returns_fresh_token() {
    let state = new_state();
    let registered = register_jake(&state).await;

    let response = login(&state, Some("jake@jake.jake"), Some("jakejake"))
        .await
        .expect("login succeeds");
    let user = response.0.user;

    assert_eq!(user.username, registered.username);
    assert_eq!(user.email, registered.email);

    let TokenState::Valid(claims) = state.authenticator.inspect(Some(&token_header(&user.token)))
    else {
        panic!("login token should verify");
    };
    let TokenState::Valid(registered_claims) =
        state.authenticator.inspect(Some(&token_header(&registered.token)))
    else {
        panic!("registration token should verify");
    };
    assert_eq!(claims.id, registered_claims.id);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let state = new_state();
    register_jake(&state).await;

    assert!(login(&state, Some("JAKE@Jake.jake"), Some("jakejake")).await.is_ok());
}

#[tokio::test]
async fn test_login_missing_email_reported_first() {
    let state = new_state();

    let errors = validation_errors(login(&state, None, None).await);

    assert_eq!(errors.get("email"), Some(BLANK));
    assert_eq!(errors.get("password"), None);
}

#[tokio::test]
async fn test_login_missing_password() {
    let state = new_state();

    let errors = validation_errors(login(&state, Some("jake@jake.jake"), Some("")).await);

    assert_eq!(errors.get("password"), Some(BLANK));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let state = new_state();
    register_jake(&state).await;

    let errors = validation_errors(login(&state, Some("jake@jake.jake"), Some("wrong")).await);

    assert_eq!(errors.get("email or password"), Some(INVALID));
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let state = new_state();
    register_jake(&state).await;

    let unknown = validation_errors(login(&state, Some("anna@jake.jake"), Some("jakejake")).await);
    let wrong = validation_errors(login(&state, Some("jake@jake.jake"), Some("nope")).await);

    assert_eq!(unknown, wrong);
}
