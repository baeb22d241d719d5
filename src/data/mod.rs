pub mod account_repository;
pub mod memory;
pub mod mongo;
