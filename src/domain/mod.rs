pub mod account;
pub mod blood;
pub mod error;
pub mod repository;
pub mod search;
