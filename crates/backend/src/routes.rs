use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::shared::config::file_storage_route_segment;
use crate::system::initialization::AppState;
use crate::{handlers, system};

/// Файлы приходят в теле запроса в base64
const PUBLISH_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    let uploads_route = format!(
        "/{}",
        file_storage_route_segment(&state.config.file_storage.upload_dir)
    );

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // UseCase u508: Publish product card
        .route(
            "/api/u508/product-card/publish",
            post(handlers::u508_publish_product_card::publish)
                .layer(DefaultBodyLimit::max(PUBLISH_BODY_LIMIT))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    system::auth::middleware::require_balance,
                )),
        )
        .route("/api/balance", get(handlers::balance::get_balance))
        // Временные файлы для Ozon
        .nest_service(&uploads_route, ServeDir::new(state.file_storage.upload_dir()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_api_key_balance::{BillingError, BillingLedger};
    use crate::shared::config::parse_config;
    use crate::shared::file_storage::TemporaryFileStorage;
    use crate::usecases::u508_publish_product_card::executor::PublishExecutor;
    use crate::usecases::u508_publish_product_card::ozon_publisher::OzonPublisher;
    use crate::usecases::u508_publish_product_card::test_support::*;
    use crate::usecases::u508_publish_product_card::wb_publisher::WbPublisher;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    /// Балансы по ключам; неизвестный ключ -> None
    struct StaticLedger(HashMap<String, i64>);

    #[async_trait]
    impl BillingLedger for StaticLedger {
        async fn debit_for_session(&self, _api_key: &str, _session_id: &str) -> Result<(), BillingError> {
            Ok(())
        }

        async fn balance(&self, api_key: &str) -> Result<Option<i64>, BillingError> {
            Ok(self.0.get(api_key).copied())
        }
    }

    async fn spawn_app(dir: &std::path::Path) -> String {
        let config = parse_config(&format!(
            r#"
[database]
path = "unused.db"
[content_generator]
url = "http://127.0.0.1:1"
[token_counter]
url = "http://127.0.0.1:1"
[file_storage]
upload_dir = "{}"
"#,
            dir.join("uploads").display()
        ))
        .unwrap();

        let file_storage = Arc::new(
            TemporaryFileStorage::new(dir.join("uploads"), "http://localhost/uploads", Duration::from_secs(60))
                .unwrap(),
        );
        std::fs::write(dir.join("uploads").join("photo.jpg"), b"jpeg").unwrap();

        let billing: Arc<dyn BillingLedger> = Arc::new(StaticLedger(HashMap::from([
            ("rich".to_string(), 500),
            ("poor".to_string(), 3),
        ])));
        let executor = Arc::new(PublishExecutor::new(
            Arc::new(FakeGenerator::default()),
            billing.clone(),
            Arc::new(WbPublisher::new(Arc::new(FakeWb::finding(789, "V100")), 2, TEST_RETRY_DELAY)),
            Arc::new(OzonPublisher::new(Arc::new(FakeOzon::default()), file_storage.clone())),
        ));
        let state = AppState {
            config: Arc::new(config),
            billing,
            executor,
            file_storage,
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, configure_routes(state)).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_publish_requires_key_and_balance() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(dir.path()).await;
        let client = reqwest::Client::new();
        let url = format!("{}/api/u508/product-card/publish", base);
        let body = serde_json::to_value(full_request()).unwrap();

        let status = client.post(&url).json(&body).send().await.unwrap().status();
        assert_eq!(status, 401);

        let status = client
            .post(&url)
            .bearer_auth("stranger")
            .json(&body)
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, 401);

        let status = client
            .post(&url)
            .bearer_auth("poor")
            .json(&body)
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, 402);

        let response = client
            .post(&url)
            .bearer_auth("rich")
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let value: serde_json::Value = response.json().await.unwrap();
        assert_eq!(value["wb"]["attempted"], true);
        assert_eq!(value["content"]["subject_id"], 105);
    }

    #[tokio::test]
    async fn test_validation_error_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(dir.path()).await;
        let mut request = full_request();
        request.vendor_code = String::new();

        let response = reqwest::Client::new()
            .post(format!("{}/api/u508/product-card/publish", base))
            .bearer_auth("rich")
            .json(&request)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let value: serde_json::Value = response.json().await.unwrap();
        assert_eq!(value["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_balance_and_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_app(dir.path()).await;
        let client = reqwest::Client::new();

        let value: serde_json::Value = client
            .get(format!("{}/api/balance", base))
            .bearer_auth("poor")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(value["balance"], 3);

        let status = client
            .get(format!("{}/api/balance", base))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, 401);

        let served = client
            .get(format!("{}/uploads/photo.jpg", base))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&served[..], b"jpeg");

        let health = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");
    }
}
