//! Caller identity.
//!
//! Authentication itself happens upstream; this service only consumes the
//! user id the auth layer injects into each request and enforces ownership
//! with it. A request without an identity is rejected outright.

use actix_web::error::ErrorUnauthorized;
use actix_web::{Error, HttpRequest};

/// Header the upstream auth layer sets on every authenticated request.
const USER_ID_HEADER: &str = "X-User-Id";

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

/// Extract the caller identity from the request headers.
pub fn identify(req: &HttpRequest) -> Result<Identity, Error> {
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| Identity(value.to_string()))
        .ok_or_else(|| ErrorUnauthorized("Missing caller identity"))
}
