use async_trait::async_trait;
use contracts::enums::marketplace_type::MarketplaceType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::config::OzonConfig;
use crate::shared::marketplaces::{preview, MarketplaceApiError};

/// Атрибут Ozon "Название модели (для объединения в одну карточку)"
pub const ATTRIBUTE_MODEL_NAME: i64 = 9048;
/// Атрибут Ozon "Бренд"
pub const ATTRIBUTE_BRAND: i64 = 85;

/// Импорт товаров в Ozon Seller API
#[async_trait]
pub trait OzonApi: Send + Sync {
    /// POST /v3/product/import
    async fn import_listing(
        &self,
        client_id: &str,
        api_key: &str,
        request: &ProductImportRequest,
    ) -> Result<ProductImportResponse, MarketplaceApiError>;
}

/// HTTP-клиент для работы с OZON Seller API
pub struct OzonApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl OzonApiClient {
    pub fn new(config: &OzonConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OzonApi for OzonApiClient {
    async fn import_listing(
        &self,
        client_id: &str,
        api_key: &str,
        request: &ProductImportRequest,
    ) -> Result<ProductImportResponse, MarketplaceApiError> {
        if client_id.trim().is_empty() || api_key.trim().is_empty() {
            return Err(MarketplaceApiError::MissingCredentials(MarketplaceType::Ozon));
        }

        let url = format!("{}/v3/product/import", self.base_url);
        let body = serde_json::to_string(request)
            .map_err(|e| MarketplaceApiError::Encode(e.to_string()))?;
        tracing::debug!(
            "=== REQUEST ===\nPOST {}\nClient-Id: {}\nApi-Key: ****\nBody: {}",
            url,
            client_id,
            preview(&body)
        );

        let response = self
            .client
            .post(&url)
            .header("Client-Id", client_id)
            .header("Api-Key", api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("OZON import response {}: {}", status, preview(&body));

        if status != reqwest::StatusCode::OK {
            tracing::error!("OZON API request failed: {}", preview(&body));
            return Err(MarketplaceApiError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }

        serde_json::from_str::<ProductImportResponse>(&body).map_err(|e| {
            tracing::error!("Failed to parse OZON API response. Error: {}", e);
            MarketplaceApiError::Decode {
                message: e.to_string(),
                preview: preview(&body),
            }
        })
    }
}

// ============================================================================
// Request/Response structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductImportRequest {
    pub items: Vec<ProductImportItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductImportItem {
    pub attributes: Vec<ProductAttribute>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub barcode: String,
    pub description_category_id: i64,
    pub type_id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub complex_attributes: Vec<ComplexAttribute>,
    pub currency_code: String,
    pub depth: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dimension_unit: String,
    pub height: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    pub name: String,
    pub offer_id: String,
    pub price: String,
    pub vat: String,
    pub weight: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub weight_unit: String,
    pub width: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAttribute {
    pub complex_id: i64,
    pub id: i64,
    pub values: Vec<AttributeValue>,
}

impl ProductAttribute {
    pub fn text(id: i64, value: impl Into<String>) -> Self {
        Self {
            complex_id: 0,
            id,
            values: vec![AttributeValue {
                dictionary_value_id: None,
                value: value.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary_value_id: Option<i64>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexAttribute {
    pub attributes: Vec<ProductAttribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImportResponse {
    #[serde(default)]
    pub result: ProductImportResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImportResult {
    #[serde(default)]
    pub task_id: i64,
}
