//! End-to-end tests for `POST /api/users`.

use crate::auth::{AuthMode, TokenState};
use crate::e2e_tests::helpers::{new_state, register, register_jake, token_header, validation_errors};
use crate::users::{BLANK, INVALID, REQUIRED, TAKEN};

#[tokio::test]
async fn test_register_returns_auth_json() {
    let state = new_state();

    let user = register_jake(&state).await;

    assert_eq!(user.username, "jake");
    assert_eq!(user.email, "jake@jake.jake");
    assert!(user.bio.is_none());
    assert!(user.image.is_none());
    assert!(!user.token.is_empty());
}

#[tokio::test]
async fn test_register_token_identifies_new_user() {
    let state = new_state();
    let user = register_jake(&state).await;

    let TokenState::Valid(claims) = state.authenticator.inspect(Some(&token_header(&user.token)))
    else {
        panic!("registration token should verify");
    };
    assert_eq!(claims.username, "jake");
    assert_eq!(claims.id.len(), 24);
    assert!(
        state
            .authenticator
            .authorize(Some(&token_header(&user.token)), AuthMode::Required)
            .is_ok()
    );
}

#[tokio::test]
async fn test_register_lowercases_username_and_email() {
    let state = new_state();

    let response = register(&state, Some("Jake"), Some("Jake@Jake.JAKE"), Some("jakejake"))
        .await
        .expect("registration succeeds");

    assert_eq!(response.0.user.username, "jake");
    assert_eq!(response.0.user.email, "jake@jake.jake");
}

#[tokio::test]
async fn test_register_blank_fields() {
    let state = new_state();

    let errors = validation_errors(register(&state, None, None, None).await);

    assert_eq!(errors.get("username"), Some(REQUIRED));
    assert_eq!(errors.get("email"), Some(REQUIRED));
    assert_eq!(errors.get("password"), Some(BLANK));
}

#[tokio::test]
async fn test_register_empty_username_and_email() {
    let state = new_state();

    let errors = validation_errors(register(&state, Some(""), Some(""), Some("pw")).await);

    assert_eq!(errors.get("username"), Some("cannot be blank"));
    assert_eq!(errors.get("email"), Some("cannot be blank"));
    assert_eq!(errors.get("password"), None);
}

#[tokio::test]
async fn test_register_invalid_fields() {
    let state = new_state();

    let errors = validation_errors(
        register(&state, Some("jake doe"), Some("not-an-email"), Some("pw")).await,
    );

    assert_eq!(errors.get("username"), Some(INVALID));
    assert_eq!(errors.get("email"), Some(INVALID));
    assert_eq!(errors.get("password"), None);
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let state = new_state();
    register_jake(&state).await;

    let errors = validation_errors(
        register(&state, Some("JAKE"), Some("other@jake.jake"), Some("pw")).await,
    );

    assert_eq!(errors.get("username"), Some(TAKEN));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let state = new_state();
    register_jake(&state).await;

    let errors = validation_errors(
        register(&state, Some("anna"), Some("JAKE@jake.jake"), Some("pw")).await,
    );

    assert_eq!(errors.get("email"), Some(TAKEN));
}
