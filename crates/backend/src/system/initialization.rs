use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::a001_api_key_balance::{BalanceRepository, BillingLedger, TokenBillingService};
use crate::shared::config::{self, Config};
use crate::shared::content_generator::CardCraftClient;
use crate::shared::data::db::initialize_database;
use crate::shared::file_storage::TemporaryFileStorage;
use crate::shared::token_counter::TokenCounterClient;
use crate::usecases::u508_publish_product_card::executor::PublishExecutor;
use crate::usecases::u508_publish_product_card::ozon_api_client::OzonApiClient;
use crate::usecases::u508_publish_product_card::ozon_publisher::OzonPublisher;
use crate::usecases::u508_publish_product_card::wb_publisher::WbPublisher;
use crate::usecases::u508_publish_product_card::wildberries_api_client::WildberriesApiClient;

/// Общее состояние HTTP-сервера
///
/// Собирается один раз при старте, все зависимости передаются явно.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub billing: Arc<dyn BillingLedger>,
    pub executor: Arc<PublishExecutor>,
    pub file_storage: Arc<TemporaryFileStorage>,
}

/// Подключает базу, создает клиентов внешних сервисов и публикаторы
pub async fn initialize_app_state(config: Config) -> Result<AppState> {
    let db_path = config::get_database_path(&config)?;
    let conn = initialize_database(&db_path, &config.billing)
        .await
        .context("database initialization failed")?;

    let billing: Arc<dyn BillingLedger> = Arc::new(TokenBillingService::new(
        Arc::new(TokenCounterClient::new(&config.token_counter)?),
        Arc::new(BalanceRepository::new(conn)),
    ));

    let file_storage = Arc::new(TemporaryFileStorage::new(
        &config.file_storage.upload_dir,
        &config::file_storage_public_url(&config),
        Duration::from_secs(config.file_storage.ttl_minutes * 60),
    )?);

    let wb = Arc::new(WbPublisher::new(
        Arc::new(WildberriesApiClient::new(&config.wildberries)?),
        config.wildberries.get_card_list_max_attempts,
        config.wildberries.retry_delay(),
    ));
    let ozon = Arc::new(OzonPublisher::new(
        Arc::new(OzonApiClient::new(&config.ozon)?),
        file_storage.clone(),
    ));

    let executor = Arc::new(PublishExecutor::new(
        Arc::new(CardCraftClient::new(&config.content_generator)?),
        billing.clone(),
        wb,
        ozon,
    ));

    tracing::info!(
        "Publication configured: nmID lookup {} attempts every {:?}, deadline {:?}",
        config.wildberries.get_card_list_max_attempts,
        config.wildberries.retry_delay(),
        config.publication.deadline()
    );

    Ok(AppState {
        config: Arc::new(config),
        billing,
        executor,
        file_storage,
    })
}

/// Фоновая очистка временных файлов
pub fn start_background_tasks(state: &AppState) {
    let every = Duration::from_secs(state.config.file_storage.cleanup_interval_minutes.max(1) * 60);
    state.file_storage.clone().spawn_cleanup(every);
}
