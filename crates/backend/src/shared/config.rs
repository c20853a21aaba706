use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Конфигурация приложения
///
/// Загружается один раз в `main` и передается в компоненты явно.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub content_generator: ContentGeneratorConfig,
    pub token_counter: TokenCounterConfig,
    #[serde(default)]
    pub wildberries: WildberriesConfig,
    #[serde(default)]
    pub ozon: OzonConfig,
    pub file_storage: FileStorageConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub publication: PublicationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Сервис генерации контента (CardCraftAI)
#[derive(Debug, Deserialize, Clone)]
pub struct ContentGeneratorConfig {
    pub url: String,
    #[serde(default = "default_content_timeout_secs")]
    pub timeout_secs: u64,
}

/// Сервис подсчета токенов по сессии генерации
#[derive(Debug, Deserialize, Clone)]
pub struct TokenCounterConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WildberriesConfig {
    #[serde(default = "default_wb_base_url")]
    pub base_url: String,
    /// Сколько раз искать nmID созданной карточки
    #[serde(default = "default_get_card_list_max_attempts")]
    pub get_card_list_max_attempts: u32,
    /// Пауза между попытками поиска nmID
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl WildberriesConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for WildberriesConfig {
    fn default() -> Self {
        Self {
            base_url: default_wb_base_url(),
            get_card_list_max_attempts: default_get_card_list_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OzonConfig {
    #[serde(default = "default_ozon_base_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OzonConfig {
    fn default() -> Self {
        Self {
            base_url: default_ozon_base_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Временное хранилище файлов (картинки для Ozon)
#[derive(Debug, Deserialize, Clone)]
pub struct FileStorageConfig {
    pub upload_dir: String,
    /// Публичный адрес, по которому маркетплейс заберет файл.
    /// Если пусто, используется http://localhost:<port>/uploads
    #[serde(default)]
    pub public_base_url: String,
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    #[serde(default = "default_cleanup_interval_minutes")]
    pub cleanup_interval_minutes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BillingConfig {
    /// Минимальный баланс для запуска публикации
    #[serde(default = "default_min_required_balance")]
    pub min_required_balance: i64,
    /// Стоимость токенов, записывается в token_costs если там пусто
    #[serde(default = "default_input_token_cost")]
    pub input_token_cost: i64,
    #[serde(default = "default_output_token_cost")]
    pub output_token_cost: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            min_required_balance: default_min_required_balance(),
            input_token_cost: default_input_token_cost(),
            output_token_cost: default_output_token_cost(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublicationConfig {
    /// Общий дедлайн на одну публикацию
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl PublicationConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
        }
    }
}

fn default_port() -> u16 {
    8080
}
fn default_content_timeout_secs() -> u64 {
    120
}
fn default_wb_base_url() -> String {
    "https://content-api.wildberries.ru".into()
}
fn default_ozon_base_url() -> String {
    "https://api-seller.ozon.ru".into()
}
fn default_get_card_list_max_attempts() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_http_timeout_secs() -> u64 {
    30
}
fn default_ttl_minutes() -> u64 {
    120
}
fn default_cleanup_interval_minutes() -> u64 {
    30
}
fn default_min_required_balance() -> i64 {
    10
}
fn default_input_token_cost() -> i64 {
    1
}
fn default_output_token_cost() -> i64 {
    2
}
fn default_deadline_secs() -> u64 {
    300
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 8080

[database]
path = "target/db/app.db"

[content_generator]
url = "http://localhost:8000"

[token_counter]
url = "http://localhost:8001"

[file_storage]
upload_dir = "./uploads"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.wildberries.get_card_list_max_attempts == 0 {
        anyhow::bail!("wildberries.get_card_list_max_attempts must be at least 1");
    }
    Ok(config)
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}

/// Базовый URL, по которому раздаются загруженные файлы
///
/// "./uploads" -> "/uploads", "/var/uploads" -> "/uploads", "uploads" -> "/uploads"
pub fn file_storage_public_url(config: &Config) -> String {
    let upload_dir = &config.file_storage.upload_dir;
    let url_path = format!("/{}", file_storage_route_segment(upload_dir));

    if config.file_storage.public_base_url.is_empty() {
        let url = format!("http://localhost:{}{}", config.server.port, url_path);
        tracing::warn!(
            "Using localhost base URL for file storage: {} - set file_storage.public_base_url for production",
            url
        );
        url
    } else {
        format!(
            "{}{}",
            config.file_storage.public_base_url.trim_end_matches('/'),
            url_path
        )
    }
}

/// Последний компонент каталога загрузок, под ним файлы раздаются по HTTP
pub fn file_storage_route_segment(upload_dir: &str) -> String {
    Path::new(upload_dir.trim_end_matches('/'))
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "uploads".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/app.db");
        assert_eq!(config.wildberries.get_card_list_max_attempts, 3);
        assert_eq!(config.wildberries.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.billing.min_required_balance, 10);
        assert_eq!(config.publication.deadline(), Duration::from_secs(300));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let contents = format!(
            "{}\n[wildberries]\nget_card_list_max_attempts = 0\n",
            DEFAULT_CONFIG
        );
        assert!(parse_config(&contents).is_err());
    }

    #[test]
    fn test_file_storage_public_url() {
        let mut config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(
            file_storage_public_url(&config),
            "http://localhost:8080/uploads"
        );

        config.file_storage.public_base_url = "https://cards.example.com/".into();
        config.file_storage.upload_dir = "/var/data/media".into();
        assert_eq!(
            file_storage_public_url(&config),
            "https://cards.example.com/media"
        );
    }
}
