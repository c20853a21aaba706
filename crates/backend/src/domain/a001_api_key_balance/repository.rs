use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use super::service::{BalanceStorage, BillingError};

/// Баланс API-ключа (таблица `api_key_balances`)
pub mod balance {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "api_key_balances")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub api_key: String,
        pub balance: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Стоимость токена по типу: input / output (таблица `token_costs`)
pub mod token_cost {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "token_costs")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub token_type: String,
        pub cost: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

impl From<DbErr> for BillingError {
    fn from(e: DbErr) -> Self {
        BillingError::Storage(e.to_string())
    }
}

/// Хранилище балансов в SQLite
#[derive(Clone)]
pub struct BalanceRepository {
    conn: DatabaseConnection,
}

impl BalanceRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl BalanceStorage for BalanceRepository {
    async fn get_balance(&self, api_key: &str) -> Result<Option<i64>, BillingError> {
        let row = balance::Entity::find_by_id(api_key.to_string())
            .one(&self.conn)
            .await?;
        Ok(row.map(|m| m.balance))
    }

    async fn debit(&self, api_key: &str, amount: i64) -> Result<(), BillingError> {
        // Одно UPDATE: параллельные списания не теряют друг друга
        let result = balance::Entity::update_many()
            .col_expr(
                balance::Column::Balance,
                Expr::col(balance::Column::Balance).sub(amount),
            )
            .filter(balance::Column::ApiKey.eq(api_key))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(BillingError::UnknownApiKey);
        }
        Ok(())
    }

    async fn token_cost(&self, token_type: &str) -> Result<i64, BillingError> {
        token_cost::Entity::find_by_id(token_type.to_string())
            .one(&self.conn)
            .await?
            .map(|m| m.cost)
            .ok_or_else(|| BillingError::Storage(format!("token cost '{}' is not set", token_type)))
    }
}
