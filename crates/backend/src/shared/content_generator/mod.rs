pub mod card_craft_client;
pub mod types;

pub use card_craft_client::CardCraftClient;
pub use types::*;
