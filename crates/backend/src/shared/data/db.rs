use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

use crate::shared::config::BillingConfig;

/// Открывает SQLite по пути из конфигурации и создает недостающие таблицы
///
/// Соединение возвращается вызывающему и дальше передается явно.
pub async fn initialize_database(
    db_file: &Path,
    billing: &BillingConfig,
) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    tracing::info!("Connecting to database: {}", db_url);

    let conn = Database::connect(&db_url).await?;
    bootstrap_schema(&conn, billing).await?;
    Ok(conn)
}

/// Минимальная схема биллинга + стоимость токенов по умолчанию
pub async fn bootstrap_schema(
    conn: &DatabaseConnection,
    billing: &BillingConfig,
) -> anyhow::Result<()> {
    let check_balances_table = r#"
        SELECT name FROM sqlite_master WHERE type='table' AND name='api_key_balances';
    "#;
    let balances_exists = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            check_balances_table.to_string(),
        ))
        .await?;

    if balances_exists.is_empty() {
        tracing::info!("Creating api_key_balances table");
        let create_balances_table_sql = r#"
            CREATE TABLE api_key_balances (
                api_key TEXT PRIMARY KEY NOT NULL,
                balance INTEGER NOT NULL DEFAULT 0
            );
        "#;
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            create_balances_table_sql.to_string(),
        ))
        .await?;
    }

    let create_token_costs_table_sql = r#"
        CREATE TABLE IF NOT EXISTS token_costs (
            token_type TEXT PRIMARY KEY NOT NULL,
            cost INTEGER NOT NULL
        );
    "#;
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        create_token_costs_table_sql.to_string(),
    ))
    .await?;

    // Существующие значения не перетираем: их могли поменять вручную
    for (token_type, cost) in [
        ("input", billing.input_token_cost),
        ("output", billing.output_token_cost),
    ] {
        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT OR IGNORE INTO token_costs (token_type, cost) VALUES (?, ?)",
            vec![token_type.into(), cost.into()],
        ))
        .await?;
    }

    Ok(())
}
