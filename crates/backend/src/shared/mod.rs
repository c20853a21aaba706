pub mod cancel;
pub mod config;
pub mod content_generator;
pub mod data;
pub mod file_storage;
pub mod format;
pub mod json;
pub mod marketplaces;
pub mod token_counter;
