pub mod auth_service;
pub mod inventory_service;
pub mod search_service;
