//! # clientnet
//!
//! A blocking HTTP/1.x client engine with a pluggable transport.
//!
//! `clientnet` turns a logical request (URI, method, headers, query and form
//! parameters, file uploads) into wire requests, follows redirects, keeps a
//! cookie jar across requests and authenticates with Basic or Digest
//! credentials.
//!
//! ## Features
//!
//! - **Redirects**: bounded loop with strict and browser-style GET reset
//! - **Cookies**: RFC 6265 scoping with PSL validation and expiry sweeps
//! - **Auth**: Basic headers, Digest (RFC 2617) answered by the transport
//! - **Bodies**: urlencoded forms, multipart uploads, raw and file bodies
//! - **Streaming**: response bodies written to temp files or named paths
//! - **Transports**: BoringSSL socket transport or a scripted in-memory one
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clientnet::Client;
//!
//! # fn main() -> Result<(), clientnet::NetError> {
//! let mut client = Client::new();
//! client.set_uri("https://example.com/")?;
//! let mut response = client.send()?;
//! println!("Status: {}", response.status());
//! println!("{}", response.text()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Configuration and error definitions
//! - [`client`] - The send orchestrator and request builders
//! - [`cookies`] - Cookie parsing, scoping and the jar
//! - [`http`] - Request and response models, auth and body encoders
//! - [`socket`] - The transport trait and its implementations
//! - [`urlrequest`] - Redirect decisions and response streaming
//!
//! ## Security
//!
//! - Public Suffix List validation to prevent supercookie attacks
//! - Credentials dropped when a redirect leaves the original host
//! - Passwords zeroized on drop and redacted from debug output

pub mod base;
pub mod client;
pub mod cookies;
pub mod http;
pub mod socket;
pub mod urlrequest;

pub use base::config::{Config, OutputStream};
pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder, RequestBuilder};
