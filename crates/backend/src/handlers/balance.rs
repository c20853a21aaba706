use axum::{extract::State, http::StatusCode, Json};
use contracts::system::balance::BalanceResponse;
use contracts::usecases::common::UseCaseError;

use crate::system::auth::extractor::CallerKey;
use crate::system::initialization::AppState;

/// GET /api/balance
pub async fn get_balance(
    State(state): State<AppState>,
    CallerKey(key): CallerKey,
) -> Result<Json<BalanceResponse>, (StatusCode, Json<UseCaseError>)> {
    match state.billing.balance(&key).await {
        Ok(Some(balance)) => Ok(Json(BalanceResponse { balance })),
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(UseCaseError::unauthorized("Unknown API key")),
        )),
        Err(e) => {
            tracing::error!("Failed to read balance: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UseCaseError::internal("Failed to read balance")),
            ))
        }
    }
}
