use crate::shared::cancel::Interrupted;
use contracts::enums::marketplace_type::MarketplaceType;

/// Ошибка вызова API маркетплейса
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceApiError {
    #[error("{0} credentials are missing")]
    MissingCredentials(MarketplaceType),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("{0}")]
    Transport(String),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {message}. Response: {preview}")]
    Decode { message: String, preview: String },

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl From<reqwest::Error> for MarketplaceApiError {
    fn from(e: reqwest::Error) -> Self {
        MarketplaceApiError::Transport(describe_transport_error(&e))
    }
}

/// Человекочитаемое описание сетевой ошибки reqwest
pub fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection error: {}", e)
    } else if e.is_request() {
        format!("Request error: {}", e)
    } else {
        format!("Network error: {}", e)
    }
}

/// Первые 500 символов тела ответа для логов и сообщений об ошибках
pub fn preview(body: &str) -> String {
    let preview: String = body.chars().take(500).collect();
    if preview.len() < body.len() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Ключи в логи не попадают
pub fn mask_secret(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "****"
    }
}
