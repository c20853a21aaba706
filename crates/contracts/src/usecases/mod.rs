pub mod common;
pub mod u508_publish_product_card;
