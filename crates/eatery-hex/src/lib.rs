//! eatery-hex: hexagonal core (cart store, checkout, admin desk) plus the inbound admin HTTP adapter

pub mod config;
pub mod errors;

pub mod application;

pub use eatery_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
