pub mod repository;
pub mod service;

pub use repository::BalanceRepository;
pub use service::{BalanceStorage, BillingError, BillingLedger, TokenBillingService};
