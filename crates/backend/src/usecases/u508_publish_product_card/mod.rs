pub mod errors;
pub mod executor;
pub mod ozon_api_client;
pub mod ozon_publisher;
pub mod result_builder;
pub mod validation;
pub mod wb_publisher;
pub mod wildberries_api_client;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::PublishError;
pub use executor::PublishExecutor;
