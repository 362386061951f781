//! `kegtrail-customers` — the customer directory model.

pub mod customer;

pub use customer::{Customer, CustomerType, PHONE_MIN_DIGITS, validate_customer};
