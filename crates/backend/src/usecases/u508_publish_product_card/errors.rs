use contracts::enums::marketplace_type::MarketplaceType;
use contracts::usecases::u508_publish_product_card::response::ChannelOutcome;
use serde_json::json;
use thiserror::Error;

use crate::shared::cancel::Interrupted;
use crate::shared::content_generator::ContentGeneratorError;
use crate::shared::marketplaces::MarketplaceApiError;

/// Ошибка ветки публикации в один маркетплейс
///
/// Никогда не возвращается вызывающему публикации: попадает в
/// `ChannelOutcome` и в лог.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("{marketplace} API call failed: {source}")]
    Api {
        marketplace: MarketplaceType,
        #[source]
        source: MarketplaceApiError,
    },

    #[error("{marketplace} returned error: {error_text}")]
    Rejected {
        marketplace: MarketplaceType,
        error_text: String,
    },

    #[error("{0}")]
    Validation(String),

    #[error("failed to upload image files for Ozon: {0}")]
    ImageUpload(String),

    #[error(
        "card with vendor code '{vendor_code}' not found on Wildberries after {attempts} attempts{}",
        last_error_suffix(.last_error)
    )]
    ResolutionExhausted {
        vendor_code: String,
        attempts: u32,
        last_error: Option<MarketplaceApiError>,
    },

    #[error("publication interrupted: {0}")]
    Interrupted(#[from] Interrupted),

    #[error("publication task failed: {0}")]
    TaskFailed(String),
}

fn last_error_suffix(last_error: &Option<MarketplaceApiError>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {})", e),
        None => String::new(),
    }
}

impl ChannelError {
    pub fn api(marketplace: MarketplaceType, source: MarketplaceApiError) -> Self {
        match source {
            MarketplaceApiError::Interrupted(reason) => ChannelError::Interrupted(reason),
            source => ChannelError::Api {
                marketplace,
                source,
            },
        }
    }
}

/// Ошибка публикации, которая возвращается вызывающему
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("content generation failed: {0}")]
    UpstreamFatal(#[source] ContentGeneratorError),

    #[error("publication interrupted: {0}")]
    Interrupted(Interrupted),
}

impl From<ContentGeneratorError> for PublishError {
    fn from(e: ContentGeneratorError) -> Self {
        match e {
            ContentGeneratorError::Interrupted(reason) => PublishError::Interrupted(reason),
            other => PublishError::UpstreamFatal(other),
        }
    }
}

impl From<Interrupted> for PublishError {
    fn from(reason: Interrupted) -> Self {
        PublishError::Interrupted(reason)
    }
}

/// Итог ветки: запись для ответа + ошибка для лога
#[derive(Debug, Default)]
pub struct BranchReport {
    pub outcome: ChannelOutcome,
    pub error: Option<ChannelError>,
}

impl BranchReport {
    /// Ветка не вызывалась: в ответе только подготовленный payload
    pub fn skipped(prepared_payload: String) -> Self {
        Self {
            outcome: ChannelOutcome {
                attempted: false,
                prepared_payload: Some(prepared_payload),
                raw_response: None,
                error: None,
            },
            error: None,
        }
    }

    pub fn succeeded(raw_response: String) -> Self {
        Self {
            outcome: ChannelOutcome {
                attempted: true,
                prepared_payload: None,
                raw_response: Some(raw_response),
                error: None,
            },
            error: None,
        }
    }

    pub fn failed(raw_response: String, error: ChannelError) -> Self {
        Self {
            outcome: ChannelOutcome {
                attempted: true,
                prepared_payload: None,
                raw_response: Some(raw_response),
                error: Some(error.to_string()),
            },
            error: Some(error),
        }
    }

    /// Ошибка, сохраненная в конверте `{error, errorText}`
    pub fn failed_with_payload(error: ChannelError) -> Self {
        let payload = error_payload(&error.to_string());
        Self::failed(payload, error)
    }

    /// Задача ветки упала, не вернув отчет
    ///
    /// `attempted` берется из запроса: пропущенная ветка остается пропущенной,
    /// ошибка попадает в `prepared_payload`.
    pub fn task_failed(attempted: bool, error: ChannelError) -> Self {
        if attempted {
            return Self::failed_with_payload(error);
        }
        let message = error.to_string();
        Self {
            outcome: ChannelOutcome {
                attempted: false,
                prepared_payload: Some(error_payload(&message)),
                raw_response: None,
                error: Some(message),
            },
            error: Some(error),
        }
    }

    /// Ветка попыталась и не получила ошибку
    pub fn is_clean(&self) -> bool {
        self.outcome.attempted && self.error.is_none()
    }
}

/// `{"error":true,"errorText":...}` для ответа, когда вызов не удался
pub fn error_payload(message: &str) -> String {
    json!({ "error": true, "errorText": message }).to_string()
}
