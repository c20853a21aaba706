use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::shared::config::TokenCounterConfig;
use crate::shared::marketplaces::{describe_transport_error, preview};

/// Расход токенов по сессии генерации
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUsage {
    #[serde(default)]
    pub total_prompt_tokens: i64,
    #[serde(default)]
    pub total_completion_tokens: i64,
}

/// Источник данных о расходе токенов
#[async_trait]
pub trait TokenCounter: Send + Sync {
    async fn session_usage(&self, session_id: &str) -> anyhow::Result<SessionUsage>;
}

/// HTTP-клиент сервиса подсчета токенов
pub struct TokenCounterClient {
    client: reqwest::Client,
    base_url: String,
}

impl TokenCounterClient {
    pub fn new(config: &TokenCounterConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TokenCounter for TokenCounterClient {
    async fn session_usage(&self, session_id: &str) -> anyhow::Result<SessionUsage> {
        let url = format!("{}/v1/session/{}/status", self.base_url, session_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!(describe_transport_error(&e)))?;

        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            anyhow::bail!("unexpected status {}: {}", status.as_u16(), preview(&body));
        }

        let usage: SessionUsage = serde_json::from_str(&body)?;
        tracing::debug!(
            "Session {} usage: prompt={}, completion={}",
            session_id,
            usage.total_prompt_tokens,
            usage.total_completion_tokens
        );
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_session_usage() {
        let app = Router::new().route(
            "/v1/session/:id/status",
            get(|Path(id): Path<String>| async move {
                assert_eq!(id, "abc");
                Json(json!({"total_prompt_tokens": 120, "total_completion_tokens": 45, "status": "done"}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = TokenCounterClient::new(&TokenCounterConfig {
            url: format!("http://{}/", addr),
        })
        .unwrap();
        let usage = client.session_usage("abc").await.unwrap();
        assert_eq!(
            usage,
            SessionUsage {
                total_prompt_tokens: 120,
                total_completion_tokens: 45
            }
        );
    }
}
