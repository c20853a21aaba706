pub mod a001_api_key_balance;
