//! eatery-types: domain model and ports shared by the core and its adapters

pub mod domain;
pub mod ports;
