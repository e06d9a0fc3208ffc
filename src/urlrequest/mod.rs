//! Per-send request state: redirect handling and response streaming.

pub mod redirect;
pub mod stream;
