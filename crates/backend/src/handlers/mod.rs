pub mod balance;
pub mod u508_publish_product_card;
