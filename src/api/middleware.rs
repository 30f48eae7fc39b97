//! Bearer-token gate for protected routes

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::ApiState;
use crate::account::AccountId;
use crate::error::ServiceError;

/// The account a validated token belongs to. Inserted into request
/// extensions by [`require_token`]; handlers take the owner from here and
/// never from the request body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser(pub AccountId);

/// Second space-separated word of the Authorization header, e.g. `Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
}

pub async fn require_token(
    State(state): State<ApiState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(req.headers()).ok_or(ServiceError::Unauthenticated)?;
    let account_id = state.sessions.validate(token).map_err(|e| {
        debug!("Rejected token on {}: {}", req.uri().path(), e);
        e
    })?;

    req.extensions_mut().insert(AuthUser(account_id));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        // Scheme is not checked, only position
        assert_eq!(bearer_token(&headers("Token abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer  abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
