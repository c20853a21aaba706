use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::shared::token_counter::TokenCounter;

/// Ошибки биллинга
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("failed to fetch token usage: {0}")]
    Usage(String),

    #[error("balance storage error: {0}")]
    Storage(String),

    #[error("unknown API key")]
    UnknownApiKey,
}

/// Хранилище балансов и тарифов
#[async_trait]
pub trait BalanceStorage: Send + Sync {
    async fn get_balance(&self, api_key: &str) -> Result<Option<i64>, BillingError>;

    /// Атомарное списание; неизвестный ключ -> `UnknownApiKey`
    async fn debit(&self, api_key: &str, amount: i64) -> Result<(), BillingError>;

    async fn token_cost(&self, token_type: &str) -> Result<i64, BillingError>;
}

/// Биллинг, которым пользуется публикация
#[async_trait]
pub trait BillingLedger: Send + Sync {
    /// Списать стоимость токенов, потраченных в сессии генерации
    async fn debit_for_session(&self, api_key: &str, session_id: &str) -> Result<(), BillingError>;

    /// Текущий баланс; `None` для неизвестного ключа
    async fn balance(&self, api_key: &str) -> Result<Option<i64>, BillingError>;
}

/// Списание по расходу токенов: prompt * input + completion * output
pub struct TokenBillingService {
    counter: Arc<dyn TokenCounter>,
    storage: Arc<dyn BalanceStorage>,
}

impl TokenBillingService {
    pub fn new(counter: Arc<dyn TokenCounter>, storage: Arc<dyn BalanceStorage>) -> Self {
        Self { counter, storage }
    }
}

#[async_trait]
impl BillingLedger for TokenBillingService {
    async fn debit_for_session(&self, api_key: &str, session_id: &str) -> Result<(), BillingError> {
        if api_key.is_empty() || session_id.is_empty() {
            return Ok(());
        }

        let usage = self
            .counter
            .session_usage(session_id)
            .await
            .map_err(|e| BillingError::Usage(e.to_string()))?;
        let input_cost = self.storage.token_cost("input").await?;
        let output_cost = self.storage.token_cost("output").await?;

        let total = session_cost(
            usage.total_prompt_tokens,
            input_cost,
            usage.total_completion_tokens,
            output_cost,
        )
        .ok_or_else(|| {
            BillingError::Usage(format!(
                "token cost overflow (prompt={}, completion={})",
                usage.total_prompt_tokens, usage.total_completion_tokens
            ))
        })?;
        tracing::info!(
            "Debiting {} for session {} (prompt={}, completion={})",
            total,
            session_id,
            usage.total_prompt_tokens,
            usage.total_completion_tokens
        );
        self.storage.debit(api_key, total).await
    }

    async fn balance(&self, api_key: &str) -> Result<Option<i64>, BillingError> {
        self.storage.get_balance(api_key).await
    }
}

/// prompt * input + completion * output, `None` при переполнении
fn session_cost(prompt: i64, input_cost: i64, completion: i64, output_cost: i64) -> Option<i64> {
    prompt
        .checked_mul(input_cost)?
        .checked_add(completion.checked_mul(output_cost)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::token_counter::SessionUsage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedCounter {
        calls: AtomicUsize,
        usage: (i64, i64),
    }

    #[async_trait]
    impl TokenCounter for FixedCounter {
        async fn session_usage(&self, _session_id: &str) -> anyhow::Result<SessionUsage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SessionUsage {
                total_prompt_tokens: self.usage.0,
                total_completion_tokens: self.usage.1,
            })
        }
    }

    #[derive(Default)]
    struct MemoryStorage {
        debits: Mutex<Vec<(String, i64)>>,
    }

    #[async_trait]
    impl BalanceStorage for MemoryStorage {
        async fn get_balance(&self, _api_key: &str) -> Result<Option<i64>, BillingError> {
            Ok(Some(1000))
        }

        async fn debit(&self, api_key: &str, amount: i64) -> Result<(), BillingError> {
            self.debits
                .lock()
                .unwrap()
                .push((api_key.to_string(), amount));
            Ok(())
        }

        async fn token_cost(&self, token_type: &str) -> Result<i64, BillingError> {
            Ok(if token_type == "input" { 2 } else { 5 })
        }
    }

    fn service() -> (TokenBillingService, Arc<FixedCounter>, Arc<MemoryStorage>) {
        service_with_usage(100, 40)
    }

    fn service_with_usage(
        prompt: i64,
        completion: i64,
    ) -> (TokenBillingService, Arc<FixedCounter>, Arc<MemoryStorage>) {
        let counter = Arc::new(FixedCounter {
            calls: AtomicUsize::new(0),
            usage: (prompt, completion),
        });
        let storage = Arc::new(MemoryStorage::default());
        (
            TokenBillingService::new(counter.clone(), storage.clone()),
            counter,
            storage,
        )
    }

    #[tokio::test]
    async fn test_debit_uses_token_costs() {
        let (svc, _, storage) = service();
        svc.debit_for_session("key", "session").await.unwrap();

        let debits = storage.debits.lock().unwrap();
        assert_eq!(debits.as_slice(), &[("key".to_string(), 100 * 2 + 40 * 5)]);
    }

    #[tokio::test]
    async fn test_empty_key_or_session_is_noop() {
        let (svc, counter, storage) = service();
        svc.debit_for_session("", "session").await.unwrap();
        svc.debit_for_session("key", "").await.unwrap();

        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
        assert!(storage.debits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cost_overflow_is_usage_error() {
        let (svc, _, storage) = service_with_usage(i64::MAX / 2, 1);

        let err = svc.debit_for_session("key", "session").await.unwrap_err();

        assert!(matches!(err, BillingError::Usage(ref m) if m.contains("overflow")));
        assert!(storage.debits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_session_cost() {
        assert_eq!(session_cost(100, 2, 40, 5), Some(400));
        assert_eq!(session_cost(i64::MAX, 2, 0, 5), None);
        assert_eq!(session_cost(i64::MAX, 1, 1, 1), None);
    }
}
