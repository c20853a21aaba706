use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    Json,
};
use contracts::usecases::common::UseCaseError;

/// API-ключ вызывающего из заголовка `Authorization: Bearer <key>`
///
/// Использование в хендлерах: `async fn handler(CallerKey(key): CallerKey)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallerKey(pub String);

/// Достает ключ из заголовков; пустой ключ считается отсутствующим
pub fn bearer_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerKey
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<UseCaseError>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Ключ, проверенный middleware, лежит в extensions
        if let Some(key) = parts.extensions.get::<CallerKey>() {
            return Ok(key.clone());
        }
        bearer_key(&parts.headers).map(CallerKey).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(UseCaseError::unauthorized("API key is required")),
            )
        })
    }
}
