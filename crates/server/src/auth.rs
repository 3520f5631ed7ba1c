//! Request tracing and caller authorization.

use crate::error::{ApiError, ApiResult};
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lfsgate_core::config::AuthConfig;
use lfsgate_identity::{IdentityError, IdentityProvider, Principal};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Header carrying the trace ID in both directions.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// The value is sanitized: truncated to MAX_TRACE_ID_LEN characters and non-printable characters removed.
    pub fn from_client(value: &str) -> Self {
        // Limit by character count, not byte count, to stay on UTF-8 boundaries
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.trim().is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Middleware that assigns a trace ID, runs the request inside a span
/// carrying it and echoes it back in the response.
pub async fn trace_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    let mut response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    if let Ok(value) = HeaderValue::from_str(&trace_id_str) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// Extract the caller's token from the Authorization header.
///
/// Accepts `Bearer <token>` and `Basic base64(user:token)`; git-lfs sends the
/// latter when the remote is configured with `access = basic`. Scheme names
/// are case-insensitive (RFC 7235). The Basic username is ignored.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, credentials) = value.split_once(' ')?;
    let credentials = credentials.trim();

    let token = if scheme.eq_ignore_ascii_case("bearer") {
        credentials.to_string()
    } else if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD.decode(credentials).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (_user, password) = decoded.split_once(':')?;
        password.to_string()
    } else {
        return None;
    };

    (!token.is_empty()).then_some(token)
}

/// A caller that is both authenticated and allowed to use the requested org.
#[derive(Clone, Debug)]
pub struct AuthorizedPrincipal {
    pub principal: Principal,
    /// The org the caller was authorized for, as given in the URL.
    pub org: String,
}

/// Verifies tokens and applies the org allowlist.
///
/// The allowlist is read-only and injected at construction so each test can
/// build its own.
pub struct Authorizer {
    identity: Arc<dyn IdentityProvider>,
    allowed_orgs: HashSet<String>,
}

impl Authorizer {
    /// Create an authorizer from the auth policy. Org names are compared
    /// case-insensitively.
    pub fn new(identity: Arc<dyn IdentityProvider>, policy: &AuthConfig) -> Self {
        Self {
            identity,
            allowed_orgs: policy.allowed_org_set(),
        }
    }

    /// Check whether an org is on the allowlist.
    pub fn is_allowed(&self, org: &str) -> bool {
        self.allowed_orgs.contains(&org.to_ascii_lowercase())
    }

    /// Authorize a caller for `org`.
    ///
    /// A missing or unverifiable token is `Unauthenticated`; callers cannot
    /// tell the two apart. The allowlist is consulted only once the identity
    /// is established, so unauthenticated callers learn nothing about it.
    pub async fn authorize(&self, token: Option<&str>, org: &str) -> ApiResult<AuthorizedPrincipal> {
        let provider = self.identity.provider_name();
        let Some(token) = token else {
            return Err(ApiError::Unauthenticated);
        };

        let principal = match self.identity.verify(token).await {
            Ok(principal) => principal,
            Err(err) => {
                let reason = match &err {
                    IdentityError::Invalid => "invalid",
                    IdentityError::Unavailable(_) => "unavailable",
                    IdentityError::Config(_) => "config",
                };
                crate::metrics::record_identity_failure(provider, reason);
                if let IdentityError::Unavailable(msg) = &err {
                    tracing::warn!(provider, error = %msg, "Identity provider unavailable");
                }
                return Err(err.into());
            }
        };

        if !self.is_allowed(org) {
            tracing::info!(
                subject = %principal.subject,
                org = %org,
                "Org not in allowlist"
            );
            return Err(ApiError::Forbidden(format!(
                "organization {org:?} is not served by this server"
            )));
        }

        Ok(AuthorizedPrincipal {
            principal,
            org: org.to_string(),
        })
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("provider", &self.identity.provider_name())
            .field("allowed_orgs", &self.allowed_orgs)
            .finish()
    }
}
