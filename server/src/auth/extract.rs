//! Axum extractors for the two enforcement modes.
//!
//! Authorization runs while the handler's arguments are extracted, so a
//! rejected request never reaches handler code. The decoded claims are handed
//! to the handler as an ordinary argument.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use super::authenticator::{AuthContext, AuthMode, TokenAuthenticator, Unauthorized};
use super::jwt::Claims;

/// Claims of a request on a route that requires authentication.
#[derive(Debug, Clone)]
pub struct RequiredAuth(pub Claims);

/// Claims of a request on a route where authentication is optional.
///
/// `None` means no token was presented. An invalid token is rejected, never
/// mapped to `None`.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Claims>);

/// Reads the `Authorization` header. Non-UTF-8 values count as absent.
fn authorization_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

impl<S> FromRequestParts<S> for RequiredAuth
where
    Arc<TokenAuthenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<TokenAuthenticator>::from_ref(state);
        match authenticator.authorize(authorization_header(parts), AuthMode::Required)? {
            AuthContext::Authenticated(claims) => Ok(Self(claims)),
            AuthContext::Anonymous => Err(Unauthorized),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<TokenAuthenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<TokenAuthenticator>::from_ref(state);
        let context = authenticator.authorize(authorization_header(parts), AuthMode::Optional)?;
        Ok(Self(context.into_claims()))
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "errors": { "authorization": "is missing or invalid" }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    use crate::auth::JwtConfig;

    fn authenticator(secret: &[u8]) -> Arc<TokenAuthenticator> {
        Arc::new(TokenAuthenticator::new(
            JwtConfig::new_hs256(secret.to_vec()).expect("non-empty secret"),
        ))
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/user");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (parts, ()) = builder.body(()).expect("valid request").into_parts();
        parts
    }

    #[tokio::test]
    async fn test_required_accepts_valid_token() {
        let state = authenticator(b"secret");
        let token = state.issue_token("5f1a", "jake").expect("signed");
        let mut parts = parts_with(Some(&format!("Token {token}")));

        let RequiredAuth(claims) = RequiredAuth::from_request_parts(&mut parts, &state)
            .await
            .expect("authorized");

        assert_eq!(claims.id, "5f1a");
        assert_eq!(claims.username, "jake");
    }

    #[tokio::test]
    async fn test_required_rejects_missing_header() {
        let state = authenticator(b"secret");
        let mut parts = parts_with(None);

        let result = RequiredAuth::from_request_parts(&mut parts, &state).await;

        assert_eq!(result.err(), Some(Unauthorized));
    }

    #[tokio::test]
    async fn test_optional_allows_missing_header() {
        let state = authenticator(b"secret");
        let mut parts = parts_with(None);

        let OptionalAuth(claims) = OptionalAuth::from_request_parts(&mut parts, &state)
            .await
            .expect("anonymous allowed");

        assert!(claims.is_none());
    }

    #[tokio::test]
    async fn test_optional_rejects_invalid_token() {
        let state = authenticator(b"secret");
        let mut parts = parts_with(Some("Token abc.def.ghi"));

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;

        assert_eq!(result.err(), Some(Unauthorized));
    }

    #[tokio::test]
    async fn test_optional_rejects_expired_token() {
        let state = authenticator(b"secret");
        let token = state.issue_token_at("5f1a", "jake", 1_000).expect("signed");
        let mut parts = parts_with(Some(&format!("Token {token}")));

        let result = OptionalAuth::from_request_parts(&mut parts, &state).await;

        assert_eq!(result.err(), Some(Unauthorized));
    }

    #[tokio::test]
    async fn test_optional_treats_wrong_scheme_as_anonymous() {
        let state = authenticator(b"secret");
        let mut parts = parts_with(Some("Bearer abc.def.ghi"));

        let OptionalAuth(claims) = OptionalAuth::from_request_parts(&mut parts, &state)
            .await
            .expect("anonymous allowed");

        assert!(claims.is_none());
    }

    #[tokio::test]
    async fn test_optional_attaches_claims_for_valid_token() {
        let state = authenticator(b"secret");
        let token = state.issue_token("5f1a", "jake").expect("signed");
        let mut parts = parts_with(Some(&format!("Token {token}")));

        let OptionalAuth(claims) = OptionalAuth::from_request_parts(&mut parts, &state)
            .await
            .expect("authorized");

        assert_eq!(claims.map(|c| c.id), Some("5f1a".to_string()));
    }

    #[tokio::test]
    async fn test_non_utf8_header_counts_as_absent() {
        let state = authenticator(b"secret");
        let mut parts = parts_with(None);
        parts.headers.insert(
            AUTHORIZATION,
            axum::http::HeaderValue::from_bytes(b"Token \xff\xfe").expect("opaque bytes"),
        );

        let optional = OptionalAuth::from_request_parts(&mut parts, &state)
            .await
            .expect("anonymous allowed");
        assert!(optional.0.is_none());

        let required = RequiredAuth::from_request_parts(&mut parts, &state).await;
        assert_eq!(required.err(), Some(Unauthorized));
    }

    #[test]
    fn test_rejection_is_401() {
        let response = Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
