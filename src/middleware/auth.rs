use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the caller's account id, set by the upstream session layer.
pub const OWNER_HEADER: &str = "x-authenticated-user";

/// Identity of the registry owner making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authenticated user".to_string()))?;

        Uuid::parse_str(value.trim())
            .map(AuthenticatedOwner)
            .map_err(|_| AppError::Unauthorized("malformed authenticated user".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<AuthenticatedOwner, AppError> {
        let (mut parts, _) = request.into_parts();
        AuthenticatedOwner::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_owner_header_is_parsed() {
        let owner = Uuid::new_v4();
        let request = Request::builder()
            .header(OWNER_HEADER, owner.to_string())
            .body(())
            .unwrap();

        assert_eq!(extract(request).await.unwrap(), AuthenticatedOwner(owner));
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_is_unauthorized() {
        let missing = Request::builder().body(()).unwrap();
        assert!(matches!(extract(missing).await, Err(AppError::Unauthorized(_))));

        let malformed = Request::builder().header(OWNER_HEADER, "nobody").body(()).unwrap();
        assert!(matches!(extract(malformed).await, Err(AppError::Unauthorized(_))));
    }
}
