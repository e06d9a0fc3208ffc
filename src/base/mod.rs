//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): error codes and their failure classes
//! - [`Config`](config::Config): normalized client settings
//! - [`context`]: IO error context helpers

pub mod config;
pub mod context;
pub mod neterror;
