use serde::{Deserialize, Serialize};

/// Баланс токенов по API-ключу
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: i64,
}
