use axum::{extract::State, http::StatusCode, Json};
use tracing::Instrument;
use uuid::Uuid;
use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_publish_product_card::{request::PublishRequest, response::PublishResponse};

use crate::shared::cancel::{CancelToken, Interrupted};
use crate::system::auth::extractor::CallerKey;
use crate::system::initialization::AppState;
use crate::usecases::u508_publish_product_card::PublishError;

/// POST /api/u508/product-card/publish
///
/// Если клиент отключился, axum бросает future хендлера: `CancelHandle`
/// уничтожается и все ветки публикации получают отмену.
pub async fn publish(
    State(state): State<AppState>,
    CallerKey(caller_key): CallerKey,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishResponse>, (StatusCode, Json<UseCaseError>)> {
    let (_handle, token) = CancelToken::new();
    let token = token.with_deadline(state.config.publication.deadline());

    let span = tracing::info_span!("publication", id = %Uuid::new_v4());

    match state
        .executor
        .publish(&caller_key, request, &token)
        .instrument(span)
        .await
    {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!("Publication failed: {}", e);
            Err(error_response(e))
        }
    }
}

fn error_response(error: PublishError) -> (StatusCode, Json<UseCaseError>) {
    let (status, body) = match &error {
        PublishError::Validation(message) => {
            (StatusCode::BAD_REQUEST, UseCaseError::validation(message.clone()))
        }
        PublishError::UpstreamFatal(source) => (
            StatusCode::BAD_GATEWAY,
            UseCaseError::upstream("Content generation failed").with_details(source.to_string()),
        ),
        PublishError::Interrupted(Interrupted::DeadlineExceeded) => (
            StatusCode::GATEWAY_TIMEOUT,
            UseCaseError::timeout("Publication deadline exceeded"),
        ),
        PublishError::Interrupted(Interrupted::Cancelled) => (
            StatusCode::GATEWAY_TIMEOUT,
            UseCaseError::timeout("Publication cancelled"),
        ),
    };
    (status, Json(body))
}
