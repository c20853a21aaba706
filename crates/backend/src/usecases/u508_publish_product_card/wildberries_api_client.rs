use async_trait::async_trait;
use contracts::enums::marketplace_type::MarketplaceType;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::shared::config::WildberriesConfig;
use crate::shared::file_storage::content_type_for;
use crate::shared::json::null_as_default;
use crate::shared::marketplaces::{preview, MarketplaceApiError};

/// Вызовы Wildberries Content API, нужные для публикации карточки
#[async_trait]
pub trait WildberriesApi: Send + Sync {
    /// POST /content/v2/cards/upload
    async fn submit_listing(
        &self,
        api_key: &str,
        payload: &CardUploadPayload,
    ) -> Result<WbReply, MarketplaceApiError>;

    /// POST /content/v2/get/cards/list
    async fn query_listing_page(
        &self,
        api_key: &str,
        request: &CardListRequest,
    ) -> Result<CardListResponse, MarketplaceApiError>;

    /// POST /content/v3/media/file
    async fn upload_media_file(
        &self,
        api_key: &str,
        nm_id: i64,
        photo_number: i32,
        filename: &str,
        content: &[u8],
    ) -> Result<WbReply, MarketplaceApiError>;

    /// POST /content/v3/media/save
    async fn save_media_links(
        &self,
        api_key: &str,
        payload: &SaveMediaPayload,
    ) -> Result<WbReply, MarketplaceApiError>;
}

/// HTTP-клиент для работы с Wildberries Content API
pub struct WildberriesApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl WildberriesApiClient {
    pub fn new(config: &WildberriesConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn require_key(api_key: &str) -> Result<(), MarketplaceApiError> {
        if api_key.trim().is_empty() {
            return Err(MarketplaceApiError::MissingCredentials(
                MarketplaceType::Wildberries,
            ));
        }
        Ok(())
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        api_key: &str,
        body: &T,
    ) -> Result<String, MarketplaceApiError> {
        Self::require_key(api_key)?;
        let url = format!("{}{}", self.base_url, path);
        let body =
            serde_json::to_string(body).map_err(|e| MarketplaceApiError::Encode(e.to_string()))?;
        tracing::debug!("WB POST {} body: {}", url, preview(&body));

        let response = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        Self::read_ok_body(&url, response).await
    }

    async fn read_ok_body(
        url: &str,
        response: reqwest::Response,
    ) -> Result<String, MarketplaceApiError> {
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("WB {} -> {}: {}", url, status, preview(&body));

        if status != reqwest::StatusCode::OK {
            tracing::error!("WB request {} failed with status {}", url, status);
            return Err(MarketplaceApiError::Status {
                status: status.as_u16(),
                body: preview(&body),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl WildberriesApi for WildberriesApiClient {
    async fn submit_listing(
        &self,
        api_key: &str,
        payload: &CardUploadPayload,
    ) -> Result<WbReply, MarketplaceApiError> {
        let body = self
            .post_json("/content/v2/cards/upload", api_key, payload)
            .await?;
        WbReply::parse(&body)
    }

    async fn query_listing_page(
        &self,
        api_key: &str,
        request: &CardListRequest,
    ) -> Result<CardListResponse, MarketplaceApiError> {
        let body = self
            .post_json("/content/v2/get/cards/list", api_key, request)
            .await?;
        serde_json::from_str(&body).map_err(|e| MarketplaceApiError::Decode {
            message: e.to_string(),
            preview: preview(&body),
        })
    }

    async fn upload_media_file(
        &self,
        api_key: &str,
        nm_id: i64,
        photo_number: i32,
        filename: &str,
        content: &[u8],
    ) -> Result<WbReply, MarketplaceApiError> {
        Self::require_key(api_key)?;
        let url = format!("{}/content/v3/media/file", self.base_url);
        tracing::info!(
            "Uploading media to WB: nmID={}, photo={}, file={} ({} bytes)",
            nm_id,
            photo_number,
            filename,
            content.len()
        );

        let part = reqwest::multipart::Part::bytes(content.to_vec())
            .file_name(filename.to_string())
            .mime_str(content_type_for(filename))
            .map_err(|e| MarketplaceApiError::Encode(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("uploadfile", part);

        let response = self
            .client
            .post(&url)
            .header("Authorization", api_key)
            .header("X-Nm-Id", nm_id.to_string())
            .header("X-Photo-Number", photo_number.to_string())
            .multipart(form)
            .send()
            .await?;

        let body = Self::read_ok_body(&url, response).await?;
        WbReply::parse(&body)
    }

    async fn save_media_links(
        &self,
        api_key: &str,
        payload: &SaveMediaPayload,
    ) -> Result<WbReply, MarketplaceApiError> {
        let body = self
            .post_json("/content/v3/media/save", api_key, payload)
            .await?;
        WbReply::parse(&body)
    }
}

/// Ответ WB с общим конвертом `{data, error, errorText, additionalErrors}`
///
/// Флаг `error` превращается в вариант на границе, дальше по коду
/// нетипизированный конверт не ходит.
#[derive(Debug, Clone, PartialEq)]
pub enum WbReply {
    Accepted {
        data: Option<Value>,
    },
    Rejected {
        error_text: String,
        additional_errors: Option<Value>,
    },
}

impl WbReply {
    pub fn parse(body: &str) -> Result<Self, MarketplaceApiError> {
        let envelope: WbEnvelope =
            serde_json::from_str(body).map_err(|e| MarketplaceApiError::Decode {
                message: e.to_string(),
                preview: preview(body),
            })?;
        Ok(envelope.into())
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, WbReply::Rejected { .. })
    }

    /// Конверт в исходной форме WB, для сохранения в результате
    pub fn to_json(&self) -> String {
        match self {
            WbReply::Accepted { data } => json!({
                "data": data,
                "error": false,
                "errorText": "",
                "additionalErrors": null,
            }),
            WbReply::Rejected {
                error_text,
                additional_errors,
            } => json!({
                "data": null,
                "error": true,
                "errorText": error_text,
                "additionalErrors": additional_errors,
            }),
        }
        .to_string()
    }
}

impl From<WbEnvelope> for WbReply {
    fn from(envelope: WbEnvelope) -> Self {
        if envelope.error {
            WbReply::Rejected {
                error_text: envelope.error_text,
                additional_errors: envelope.additional_errors.filter(|v| !v.is_null()),
            }
        } else {
            WbReply::Accepted {
                data: envelope.data.filter(|v| !v.is_null()),
            }
        }
    }
}

// ============================================================================
// Request/Response structures
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WbEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    error: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    error_text: String,
    #[serde(default)]
    additional_errors: Option<Value>,
}

/// Тело запроса на создание карточек
pub type CardUploadPayload = Vec<CardRequestItem>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRequestItem {
    #[serde(rename = "subjectID")]
    pub subject_id: i32,
    pub variants: Vec<CardVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVariant {
    pub vendor_code: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub brand: String,
    pub title: String,
    pub description: String,
    pub dimensions: CardDimensions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<CardSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDimensions {
    pub length: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub weight_brutto: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSize {
    pub tech_size: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub wb_size: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub price: i32,
    pub skus: Vec<String>,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Serialize)]
pub struct CardListRequest {
    pub settings: CardListSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardListSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<CardListFilter>,
    pub cursor: CardListCursor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListFilter {
    /// -1 все, 0 без фото, 1 с фото
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_photo: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListCursor {
    pub limit: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "nmID", skip_serializing_if = "Option::is_none")]
    pub nm_id: Option<i64>,
}

impl CardListRequest {
    /// Первая страница карточек без фото: новые карточки еще не имеют медиа
    pub fn cards_without_photo() -> Self {
        Self {
            settings: CardListSettings {
                filter: Some(CardListFilter {
                    with_photo: Some(0),
                }),
                cursor: CardListCursor {
                    limit: 100,
                    updated_at: None,
                    nm_id: None,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: Vec<CardDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinition {
    #[serde(rename = "nmID")]
    pub nm_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vendor_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveMediaPayload {
    #[serde(rename = "nmId")]
    pub nm_id: i64,
    pub data: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn client_for(app: Router) -> WildberriesApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        WildberriesApiClient::new(&WildberriesConfig {
            base_url: format!("http://{}", addr),
            ..WildberriesConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_reply_from_envelope() {
        let accepted = WbReply::parse(r#"{"data":null,"error":false,"errorText":""}"#).unwrap();
        assert_eq!(accepted, WbReply::Accepted { data: None });

        let rejected = WbReply::parse(
            r#"{"data":null,"error":true,"errorText":"Invalid vendor code","additionalErrors":{"v":"dup"}}"#,
        )
        .unwrap();
        assert!(rejected.is_rejected());
        let reparsed: Value = serde_json::from_str(&rejected.to_json()).unwrap();
        assert_eq!(reparsed["error"], true);
        assert_eq!(reparsed["errorText"], "Invalid vendor code");
        assert_eq!(reparsed["additionalErrors"]["v"], "dup");
    }

    #[test]
    fn test_null_fields_in_envelope_and_cards() {
        let rejected =
            WbReply::parse(r#"{"data":null,"error":true,"errorText":null,"additionalErrors":null}"#)
                .unwrap();
        assert_eq!(
            rejected,
            WbReply::Rejected {
                error_text: String::new(),
                additional_errors: None
            }
        );

        let page: CardListResponse = serde_json::from_str(
            r#"{"cards":[{"nmID":789,"vendorCode":null},{"nmID":790,"vendorCode":"V100"}],"cursor":{"total":2}}"#,
        )
        .unwrap();
        assert_eq!(page.cards[0].vendor_code, "");
        assert_eq!(page.cards[1].vendor_code, "V100");

        let empty: CardListResponse = serde_json::from_str(r#"{"cards":null}"#).unwrap();
        assert!(empty.cards.is_empty());
    }

    #[test]
    fn test_card_list_request_shape() {
        let value = serde_json::to_value(CardListRequest::cards_without_photo()).unwrap();
        assert_eq!(
            value,
            json!({"settings": {"filter": {"withPhoto": 0}, "cursor": {"limit": 100}}})
        );
    }

    #[tokio::test]
    async fn test_submit_listing_sends_key_and_decodes_rejection() {
        let app = Router::new().route(
            "/content/v2/cards/upload",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "wb-key");
                assert_eq!(body[0]["subjectID"], 105);
                Json(json!({"data": null, "error": true, "errorText": "duplicate vendorCode"}))
            }),
        );
        let client = client_for(app).await;
        let payload = vec![CardRequestItem {
            subject_id: 105,
            variants: vec![],
        }];

        let reply = client.submit_listing("wb-key", &payload).await.unwrap();
        assert_eq!(
            reply,
            WbReply::Rejected {
                error_text: "duplicate vendorCode".into(),
                additional_errors: None
            }
        );
    }

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let app = Router::new().route(
            "/content/v2/get/cards/list",
            post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let client = client_for(app).await;

        let err = client
            .query_listing_page("wb-key", &CardListRequest::cards_without_photo())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceApiError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_query_listing_page_decodes_cards() {
        let app = Router::new().route(
            "/content/v2/get/cards/list",
            post(|| async {
                Json(json!({
                    "cards": [{"nmID": 789, "vendorCode": "V100", "title": "x"}],
                    "cursor": {"total": 1}
                }))
            }),
        );
        let client = client_for(app).await;

        let page = client
            .query_listing_page("wb-key", &CardListRequest::cards_without_photo())
            .await
            .unwrap();
        assert_eq!(page.cards.len(), 1);
        assert_eq!(page.cards[0].nm_id, 789);
        assert_eq!(page.cards[0].vendor_code, "V100");
    }

    #[tokio::test]
    async fn test_upload_media_file_is_multipart_with_headers() {
        let app = Router::new().route(
            "/content/v3/media/file",
            post(|headers: HeaderMap, body: Bytes| async move {
                assert_eq!(headers["x-nm-id"], "789");
                assert_eq!(headers["x-photo-number"], "2");
                let content_type = headers["content-type"].to_str().unwrap().to_string();
                assert!(content_type.starts_with("multipart/form-data"));
                let text = String::from_utf8_lossy(&body);
                assert!(text.contains("name=\"uploadfile\""));
                assert!(text.contains("filename=\"front.jpg\""));
                Json(json!({"data": {}, "error": false, "errorText": ""}))
            }),
        );
        let client = client_for(app).await;

        let reply = client
            .upload_media_file("wb-key", 789, 2, "front.jpg", b"jpeg")
            .await
            .unwrap();
        assert!(!reply.is_rejected());
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected_locally() {
        let client = WildberriesApiClient::new(&WildberriesConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..WildberriesConfig::default()
        })
        .unwrap();
        let err = client
            .save_media_links(
                "",
                &SaveMediaPayload {
                    nm_id: 1,
                    data: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceApiError::MissingCredentials(_)));
    }
}
