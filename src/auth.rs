// 🔑 Auth passthrough helpers
//
// Authentication is owned by the hosted auth service; this crate never
// verifies signatures. The helpers here only peel the user id (`sub` claim)
// out of a bearer JWT so the AI rate limiter can key on it and the logs can
// name the caller. An unverifiable token degrades to "anonymous" rather than
// failing the request - the table API rejects bad tokens on its own.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer "))?;
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Pull the `sub` claim from a JWT payload without verifying the signature.
///
/// Returns `None` for anything that does not look like a JWT - callers fall
/// back to IP-based identification.
pub fn subject_claim(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    claims
        .get("sub")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

// ============================================================================
// TESTS
// ============================================================================
