use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use contracts::usecases::common::UseCaseError;

use super::extractor::{bearer_key, CallerKey};
use crate::shared::marketplaces::mask_secret;
use crate::system::initialization::AppState;

/// Middleware: известный API-ключ с балансом не ниже минимального
///
/// Нет ключа или ключ неизвестен -> 401, баланс ниже порога -> 402.
pub async fn require_balance(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(key) = bearer_key(req.headers()) else {
        return reject(StatusCode::UNAUTHORIZED, UseCaseError::unauthorized("API key is required"));
    };

    let required = state.config.billing.min_required_balance;
    match state.billing.balance(&key).await {
        Ok(Some(balance)) if balance >= required => {
            req.extensions_mut().insert(CallerKey(key));
            next.run(req).await
        }
        Ok(Some(balance)) => {
            tracing::warn!(
                "Request rejected: balance {} below {} for key {}",
                balance,
                required,
                mask_secret(&key)
            );
            reject(
                StatusCode::PAYMENT_REQUIRED,
                UseCaseError::insufficient_balance(balance, required),
            )
        }
        Ok(None) => reject(
            StatusCode::UNAUTHORIZED,
            UseCaseError::unauthorized("Unknown API key"),
        ),
        Err(e) => {
            tracing::error!("Balance check failed: {}", e);
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                UseCaseError::internal("Failed to check balance"),
            )
        }
    }
}

fn reject(status: StatusCode, error: UseCaseError) -> Response {
    (status, Json(error)).into_response()
}
