//! Transports: the byte-level exchange behind the client.
//!
//! - [`transport`]: the [`Transport`](transport::Transport) trait and request serialization
//! - [`adapter`]: blocking TCP/TLS transport
//! - [`client`]: connected plain or TLS socket
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`tls`]: TLS configuration with BoringSSL
//! - [`scripted`]: canned-response transport for tests

pub mod adapter;
pub mod client;
pub mod connectjob;
pub mod scripted;
pub mod tls;
pub mod transport;

pub use adapter::SocketTransport;
pub use scripted::ScriptedTransport;
pub use transport::{Capabilities, Transport};
