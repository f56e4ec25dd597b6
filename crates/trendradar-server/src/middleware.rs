use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Header carrying the shared secret on job-trigger requests.
pub const TRIGGER_SECRET_HEADER: &str = "x-trigger-secret";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Shared-secret auth for the external job-trigger routes.
#[derive(Debug, Clone)]
pub struct TriggerAuth {
    secret: Option<Arc<String>>,
    pub enabled: bool,
}

impl TriggerAuth {
    /// Builds trigger auth from the configured secret.
    ///
    /// In development a missing secret disables the check for local
    /// iteration. In any other environment a missing secret fails startup:
    /// the trigger routes mutate data and must never ship unguarded.
    pub fn from_config(secret: Option<String>, is_development: bool) -> anyhow::Result<Self> {
        match secret {
            Some(s) if !s.trim().is_empty() => Ok(Self {
                secret: Some(Arc::new(s)),
                enabled: true,
            }),
            _ if is_development => {
                tracing::warn!(
                    "TRENDRADAR_TRIGGER_SECRET not set; job-trigger auth disabled in development"
                );
                Ok(Self {
                    secret: None,
                    enabled: false,
                })
            }
            _ => anyhow::bail!(
                "TRENDRADAR_TRIGGER_SECRET is required outside development; \
                 job-trigger routes cannot run unguarded"
            ),
        }
    }

    /// Constant-time comparison so the check leaks nothing about the secret
    /// through response timing.
    fn allows(&self, presented: &str) -> bool {
        self.secret.as_ref().is_some_and(|secret| {
            secret.as_bytes().ct_eq(presented.as_bytes()).into()
        })
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the shared trigger secret when enabled.
pub async fn require_trigger_secret(
    State(auth): State<TriggerAuth>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(TRIGGER_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid trigger secret",
                },
            }),
        )
            .into_response(),
    }
}
