//! End-to-end tests for `PUT /api/user`.

use axum::{Json, extract::State};

use crate::auth::RequiredAuth;
use crate::e2e_tests::helpers::{
    login, new_state, register, register_jake, required_auth, token_header, validation_errors,
};
use crate::routes::{self, ApiError, UpdateUser, UserEnvelope, UserResponse};
use crate::state::AppState;
use crate::users::{BLANK, INVALID, REQUIRED, TAKEN};

async fn update(state: &AppState, token: &str, user: UpdateUser) -> Result<UserResponse, ApiError> {
    let auth: RequiredAuth = required_auth(state, Some(&token_header(token)))
        .await
        .expect("token accepted");
    routes::update_user(State(state.clone()), auth, Json(UserEnvelope { user })).await
}

#[tokio::test]
async fn test_update_bio_and_image_only() {
    let state = new_state();
    let jake = register_jake(&state).await;

    let response = update(
        &state,
        &jake.token,
        UpdateUser {
            bio: Some("I like to skateboard".to_string()),
            image: Some("https://i.stack.imgur.com/xHWG8.jpg".to_string()),
            ..UpdateUser::default()
        },
    )
    .await
    .expect("update succeeds");
    let user = response.0.user;

    assert_eq!(user.username, "jake");
    assert_eq!(user.email, "jake@jake.jake");
    assert_eq!(user.bio.as_deref(), Some("I like to skateboard"));
    assert_eq!(
        user.image.as_deref(),
        Some("https://i.stack.imgur.com/xHWG8.jpg")
    );
}

#[tokio::test]
async fn test_update_password_replaces_credential() {
    let state = new_state();
    let jake = register_jake(&state).await;

    let response = update(
        &state,
        &jake.token,
        UpdateUser {
            password: Some("new-password".to_string()),
            ..UpdateUser::default()
        },
    )
    .await
    .expect("update succeeds");
    let user = response.0.user;

    assert_eq!(user.username, "jake");
    assert!(!user.token.is_empty());
    assert!(login(&state, Some("jake@jake.jake"), Some("new-password")).await.is_ok());
    assert!(login(&state, Some("jake@jake.jake"), Some("jakejake")).await.is_err());
}

#[tokio::test]
async fn test_update_username_keeps_old_token_usable() {
    let state = new_state();
    let jake = register_jake(&state).await;

    let response = update(
        &state,
        &jake.token,
        UpdateUser {
            username: Some("Jacob".to_string()),
            ..UpdateUser::default()
        },
    )
    .await
    .expect("update succeeds");
    assert_eq!(response.0.user.username, "jacob");

    let RequiredAuth(claims) = required_auth(&state, Some(&token_header(&jake.token)))
        .await
        .expect("old token still valid");
    let current = routes::current_user(State(state.clone()), RequiredAuth(claims))
        .await
        .expect("user found by id");
    assert_eq!(current.0.user.username, "jacob");
}

#[tokio::test]
async fn test_update_rejects_taken_username() {
    let state = new_state();
    register_jake(&state).await;
    let anna = register(&state, Some("anna"), Some("anna@jake.jake"), Some("annaanna"))
        .await
        .expect("registration succeeds")
        .0
        .user;

    let errors = validation_errors(
        update(
            &state,
            &anna.token,
            UpdateUser {
                username: Some("jake".to_string()),
                ..UpdateUser::default()
            },
        )
        .await,
    );

    assert_eq!(errors.get("username"), Some(TAKEN));
}

#[tokio::test]
async fn test_update_rejects_invalid_email() {
    let state = new_state();
    let jake = register_jake(&state).await;

    let errors = validation_errors(
        update(
            &state,
            &jake.token,
            UpdateUser {
                email: Some("nope".to_string()),
                ..UpdateUser::default()
            },
        )
        .await,
    );

    assert_eq!(errors.get("email"), Some(INVALID));
}

#[tokio::test]
async fn test_update_rejects_blank_password() {
    let state = new_state();
    let jake = register_jake(&state).await;

    let errors = validation_errors(
        update(
            &state,
            &jake.token,
            UpdateUser {
                password: Some(String::new()),
                ..UpdateUser::default()
            },
        )
        .await,
    );

    assert_eq!(errors.get("password"), Some(BLANK));
    assert!(login(&state, Some("jake@jake.jake"), Some("jakejake")).await.is_ok());
}

#[tokio::test]
async fn test_update_rejects_emptied_email() {
    let state = new_state();
    let jake = register_jake(&state).await;

    let errors = validation_errors(
        update(
            &state,
            &jake.token,
            UpdateUser {
                email: Some(String::new()),
                ..UpdateUser::default()
            },
        )
        .await,
    );

    assert_eq!(errors.get("email"), Some(REQUIRED));
}
