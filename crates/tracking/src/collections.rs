//! Store collection names.

pub const ASSETS: &str = "assets";
pub const CUSTOMERS: &str = "customers";
pub const MOVEMENTS: &str = "movements";
pub const USERS: &str = "users";
