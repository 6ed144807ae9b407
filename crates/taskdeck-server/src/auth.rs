use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::routes::AppState;

/// Placeholder principal carried by deny decisions. The leading `<` cannot
/// appear in a JWT subject claim issued by the trusted authority, so it
/// never collides with a real subject.
pub const DENIED_SUBJECT: &str = "<denied>";

/// The single action scope this service authorizes.
pub const INVOKE_ACTION: &str = "invoke";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("invalid token")]
    InvalidToken,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Validates bearer credentials against the pinned signing key.
///
/// The key is injected configuration loaded at process start; no discovery
/// endpoint is consulted at request time. Exactly one algorithm is allowed,
/// so an attacker-chosen `alg` header fails verification.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_rsa_pem(pem: &[u8]) -> anyhow::Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem)?;
        let validation = Validation::new(Algorithm::RS256);
        Ok(Self { key, validation })
    }

    /// Verify the raw `Authorization` header value and return the decoded
    /// claims. Callers consume only `sub`.
    pub fn verify(&self, header_value: Option<&str>) -> Result<Claims, AuthError> {
        let header_value = header_value.ok_or(AuthError::MalformedHeader)?;
        let (scheme, token) = header_value
            .split_once(' ')
            .ok_or(AuthError::MalformedHeader)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MalformedHeader);
        }
        let token = token.trim();
        if token.is_empty() || token.contains(' ') {
            return Err(AuthError::MalformedHeader);
        }

        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                AuthError::InvalidToken
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

/// Per-request access decision. Constructed at the boundary, consumed by the
/// routing layer, never persisted.
#[derive(Debug, Clone)]
pub struct AuthDecision {
    pub subject: String,
    pub effect: Effect,
    pub action: &'static str,
}

impl AuthDecision {
    fn allow(subject: String) -> Self {
        Self {
            subject,
            effect: Effect::Allow,
            action: INVOKE_ACTION,
        }
    }

    fn deny() -> Self {
        Self {
            subject: DENIED_SUBJECT.to_string(),
            effect: Effect::Deny,
            action: INVOKE_ACTION,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }
}

/// Reduce any verifier outcome to an allow/deny decision. Never errors:
/// malformed headers and failed verification both become a Deny carrying
/// the placeholder subject.
pub fn authorize(verifier: &TokenVerifier, header_value: Option<&str>) -> AuthDecision {
    match verifier.verify(header_value) {
        Ok(claims) => AuthDecision::allow(claims.sub),
        Err(e) => {
            info!(error = %e, "request denied");
            AuthDecision::deny()
        }
    }
}

/// Verified subject identifier, injected into allowed requests.
#[derive(Debug, Clone)]
pub struct Subject(pub String);

/// Axum middleware enforcing the authorization decision. A Deny maps to an
/// explicit 401 rejection; only an Allow forwards the request, with the
/// verified subject attached as an extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let decision = authorize(&state.verifier, header_value);
    if !decision.is_allowed() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    request.extensions_mut().insert(Subject(decision.subject));
    next.run(request).await
}
