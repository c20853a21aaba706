use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::types::{ContentGenerator, ContentGeneratorError, ContentRequest, GeneratedContent};
use crate::shared::cancel::CancelToken;
use crate::shared::config::ContentGeneratorConfig;
use crate::shared::marketplaces::{describe_transport_error, preview};

/// HTTP-клиент для работы с CardCraftAI
///
/// Сначала открывается сессия (`/v1/sessions`), затем по ней запускается
/// генерация (`/run`). Идентификатор сессии нужен биллингу.
pub struct CardCraftClient {
    client: reqwest::Client,
    base_url: String,
}

impl CardCraftClient {
    pub fn new(config: &ContentGeneratorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Открыть сессию генерации
    pub async fn create_session(&self) -> Result<String, ContentGeneratorError> {
        let url = format!("{}/v1/sessions", self.base_url);
        tracing::info!("Requesting CardCraftAI session from: {}", url);

        let body = self.post_json(&url, None).await?;
        let session: SessionResponse = serde_json::from_str(&body)
            .map_err(|e| ContentGeneratorError::Decode(format!("{}: {}", e, preview(&body))))?;

        if session.session_id.is_empty() {
            return Err(ContentGeneratorError::Decode(
                "session response has empty session_id".to_string(),
            ));
        }
        tracing::info!("Got CardCraftAI session: {}", session.session_id);
        Ok(session.session_id)
    }

    /// Запустить генерацию в открытой сессии
    pub async fn run(
        &self,
        session_id: &str,
        request: &ContentRequest,
    ) -> Result<GeneratedContent, ContentGeneratorError> {
        let url = format!("{}/run", self.base_url);
        let payload = RunRequest {
            session_id,
            request,
        };
        let json = serde_json::to_value(&payload)
            .map_err(|e| ContentGeneratorError::Decode(e.to_string()))?;

        let body = self.post_json(&url, Some(json)).await?;
        let mut content: GeneratedContent = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse CardCraftAI response: {}", e);
            ContentGeneratorError::Decode(format!("{}: {}", e, preview(&body)))
        })?;
        content.session_id = session_id.to_string();

        tracing::info!(
            "CardCraftAI content: title={:?}, subject_id={:?}, type_id={:?}, sub_id={:?}",
            content.title,
            content.subject_id,
            content.type_id,
            content.sub_id
        );
        Ok(content)
    }

    async fn post_json(
        &self,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, ContentGeneratorError> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            let message = describe_transport_error(&e);
            tracing::error!("CardCraftAI request failed: {}", message);
            ContentGeneratorError::Transport(message)
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ContentGeneratorError::Transport(describe_transport_error(&e)))?;
        tracing::debug!("CardCraftAI {} -> {}: {}", url, status, preview(&body));

        if status != reqwest::StatusCode::OK {
            return Err(ContentGeneratorError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentGenerator for CardCraftClient {
    async fn get_content(
        &self,
        request: &ContentRequest,
        cancel: &CancelToken,
    ) -> Result<GeneratedContent, ContentGeneratorError> {
        let session_id = cancel.run(self.create_session()).await??;
        cancel.run(self.run(&session_id, request)).await?
    }
}

// ============================================================================
// Request/Response structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    session_id: String,
}

#[derive(Debug, serde::Serialize)]
struct RunRequest<'a> {
    session_id: &'a str,
    #[serde(flatten)]
    request: &'a ContentRequest,
}
