pub mod basic_auth;
pub mod cors;
