use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::shared::cancel::{CancelToken, Interrupted};
use crate::shared::json::null_as_default;

/// Ошибки сервиса генерации контента
#[derive(Debug, Error)]
pub enum ContentGeneratorError {
    #[error("content generator unreachable: {0}")]
    Transport(String),

    #[error("content generator returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed content generator response: {0}")]
    Decode(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

/// Исходные данные для генерации
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentRequest {
    pub product_title: String,
    pub product_description: String,
    pub parent_id: i32,
    pub subject_id: i32,
    pub translate: bool,
    pub ozon: bool,
    pub generate_content: bool,
}

/// Контент, сгенерированный для карточки
///
/// Классификация может быть частичной: каждое звено таксономии опционально.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: BTreeMap<String, String>,
    pub parent_id: Option<i32>,
    pub parent_name: Option<String>,
    pub subject_id: Option<i32>,
    pub subject_name: Option<String>,
    pub type_id: Option<i32>,
    pub type_name: Option<String>,
    pub root_id: Option<i32>,
    pub root_name: Option<String>,
    pub sub_id: Option<i32>,
    pub sub_name: Option<String>,
    /// Сессия генерации, по ней списываются токены
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_id: String,
}

/// Генератор контента карточки
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn get_content(
        &self,
        request: &ContentRequest,
        cancel: &CancelToken,
    ) -> Result<GeneratedContent, ContentGeneratorError>;
}
