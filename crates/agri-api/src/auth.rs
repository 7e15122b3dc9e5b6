//! # Authentication & Authorization
//!
//! Static bearer-token scheme. The `Authorization` header carries either
//!
//! - `Bearer {role}:{user_id}:{secret}` with role `farmer` or `admin`, or
//! - `Bearer {secret}`, which acts as the bootstrap administrator.
//!
//! The secret is compared in constant time. When no token is configured,
//! every request acts as the bootstrap administrator.
//!
//! The middleware only establishes a [`CallerIdentity`]. Handlers resolve it
//! to a stored account with the [`ActingUser`] extractor, which rejects
//! unknown and deactivated accounts.

use agri_core::{User, UserId, UserRole};
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::ErrorResponse;
use crate::state::{AppState, BOOTSTRAP_ADMIN_ID};

/// Identity established by the auth middleware, before account lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub role: UserRole,
    pub user_id: UserId,
}

impl CallerIdentity {
    pub fn bootstrap_admin() -> Self {
        Self {
            role: UserRole::Admin,
            user_id: BOOTSTRAP_ADMIN_ID,
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// The active account a request acts as.
#[derive(Debug, Clone)]
pub struct ActingUser(pub User);

impl ActingUser {
    pub fn id(&self) -> UserId {
        self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }

    /// Whether this user may see a record owned by `owner`.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin() || self.0.id == owner
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for ActingUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = CallerIdentity::from_request_parts(parts, state).await?;
        let user = state
            .users
            .get(caller.user_id.as_uuid())
            .ok_or_else(|| AppError::Unauthorized("unknown user".into()))?;

        if !user.is_active() {
            tracing::warn!(user_id = %user.id, "request from inactive account rejected");
            return Err(AppError::AccountInactive);
        }
        if user.role != caller.role {
            tracing::warn!(user_id = %user.id, token_role = %caller.role, "token role does not match account");
            return Err(AppError::Unauthorized("token role does not match account".into()));
        }
        Ok(Self(user))
    }
}

/// Reject callers below `minimum`.
pub fn require_role(user: &ActingUser, minimum: UserRole) -> Result<(), AppError> {
    if user.0.role >= minimum {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum, user.0.role
        )))
    }
}

/// Token settings handed to the middleware via an `Extension` layer.
/// Custom `Debug` redacts the token.
#[derive(Clone)]
pub struct AuthConfig {
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token into a caller identity.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let parts: Vec<&str> = provided.splitn(3, ':').collect();

    match parts.as_slice() {
        [secret] => {
            if constant_time_token_eq(secret, expected_secret) {
                Ok(CallerIdentity::bootstrap_admin())
            } else {
                Err("invalid bearer token".into())
            }
        }
        [role_str, user_str, secret] => {
            if !constant_time_token_eq(secret, expected_secret) {
                return Err("invalid bearer token".into());
            }

            let role = match *role_str {
                "admin" => UserRole::Admin,
                "farmer" => UserRole::Farmer,
                other => return Err(format!("unknown role: {other}")),
            };

            let user_id = match (role, user_str.is_empty()) {
                (UserRole::Admin, true) => BOOTSTRAP_ADMIN_ID,
                (UserRole::Farmer, true) => return Err("farmer token requires a user id".into()),
                (_, false) => user_str
                    .parse::<Uuid>()
                    .map(UserId::from_uuid)
                    .map_err(|e| format!("invalid user_id: {e}"))?,
            };

            Ok(CallerIdentity { role, user_id })
        }
        _ => Err("invalid token format: expected {role}:{user_id}:{secret} or {secret}".into()),
    }
}

pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected_token = request.extensions().get::<AuthConfig>().cloned();

    match expected_token {
        Some(AuthConfig {
            token: Some(ref expected),
        }) => {
            let auth_header = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match auth_header {
                Some(header_value) if header_value.starts_with("Bearer ") => {
                    let provided = &header_value[7..];
                    match parse_bearer_token(provided, expected) {
                        Ok(identity) => {
                            request.extensions_mut().insert(identity);
                            next.run(request).await
                        }
                        Err(msg) => {
                            tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                            unauthorized_response(&msg)
                        }
                    }
                }
                Some(_) => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    unauthorized_response("authorization header must use Bearer scheme")
                }
                None => {
                    tracing::warn!("authentication failed: missing authorization header");
                    unauthorized_response("missing authorization header")
                }
            }
        }
        _ => {
            request
                .extensions_mut()
                .insert(CallerIdentity::bootstrap_admin());
            next.run(request).await
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    ErrorResponse::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_app(token: Option<String>) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|caller: CallerIdentity| async move { caller.role.to_string() }),
            )
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig { token }))
    }

    async fn call(app: Router, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn legacy_secret_is_bootstrap_admin() {
        let id = parse_bearer_token("s3cret", "s3cret").unwrap();
        assert_eq!(id, CallerIdentity::bootstrap_admin());
        assert!(parse_bearer_token("wrong", "s3cret").is_err());
    }

    #[test]
    fn scoped_tokens_parse() {
        let user = Uuid::new_v4();
        let id = parse_bearer_token(&format!("farmer:{user}:s3cret"), "s3cret").unwrap();
        assert_eq!(id.role, UserRole::Farmer);
        assert_eq!(id.user_id, UserId::from_uuid(user));

        let admin = parse_bearer_token("admin::s3cret", "s3cret").unwrap();
        assert_eq!(admin.user_id, BOOTSTRAP_ADMIN_ID);
    }

    #[test]
    fn scoped_token_errors() {
        assert!(parse_bearer_token("farmer::s3cret", "s3cret").is_err());
        assert!(parse_bearer_token("farmer:not-a-uuid:s3cret", "s3cret").is_err());
        assert!(parse_bearer_token(&format!("owner:{}:s3cret", Uuid::new_v4()), "s3cret").is_err());
        assert!(parse_bearer_token(&format!("admin:{}:wrong", Uuid::new_v4()), "s3cret").is_err());
        assert!(parse_bearer_token("a:b", "s3cret").is_err());
    }

    #[test]
    fn secret_with_colons_is_kept_whole() {
        let user = Uuid::new_v4();
        let id = parse_bearer_token(&format!("farmer:{user}:a:b:c"), "a:b:c").unwrap();
        assert_eq!(id.role, UserRole::Farmer);
    }

    #[tokio::test]
    async fn disabled_auth_acts_as_admin() {
        let (status, body) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ADMIN");
    }

    #[tokio::test]
    async fn missing_or_wrong_header_is_401() {
        let app = test_app(Some("s3cret".into()));
        assert_eq!(call(app.clone(), None).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(
            call(app.clone(), Some("Basic s3cret")).await.0,
            StatusCode::UNAUTHORIZED
        );
        let (status, body) = call(app, Some("Bearer nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"code\":\"UNAUTHORIZED\""));
    }

    #[tokio::test]
    async fn farmer_token_passes() {
        let app = test_app(Some("s3cret".into()));
        let header = format!("Bearer farmer:{}:s3cret", Uuid::new_v4());
        let (status, body) = call(app, Some(&header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "FARMER");
    }

    #[test]
    fn auth_config_debug_redacts() {
        let debug = format!("{:?}", AuthConfig { token: Some("hunter2".into()) });
        assert!(!debug.contains("hunter2"));
    }
}
