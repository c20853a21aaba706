pub mod enums;
pub mod system;
pub mod usecases;
