pub mod usecase_result;

pub use usecase_result::{UseCaseError, UseCaseResult};
