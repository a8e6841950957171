pub mod admin_service;
pub mod cart_store;
pub mod checkout;
pub mod confirmation;
