use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::socket::client::SocketType;
use crate::socket::tls::TlsConfig;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Timeouts and TLS settings for one connection attempt.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
    pub tls: TlsConfig,
}

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob, made blocking.
pub struct ConnectJob;

impl ConnectJob {
    pub fn connect(
        host: &str,
        port: u16,
        secure: bool,
        options: &ConnectOptions,
    ) -> Result<SocketType, NetError> {
        // 1. DNS Resolution
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|_| NetError::NameNotResolved)?
            .collect();
        if addrs.is_empty() {
            return Err(NetError::NameNotResolved);
        }

        // 2. TCP Connect, first address that answers
        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, options.connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = match (stream, last_err) {
            (Some(s), _) => s,
            (None, Some(e)) => return Err(e).connection_context(host, port),
            (None, None) => return Err(NetError::ConnectionFailed(format!("{}:{}", host, port))),
        };

        stream
            .set_read_timeout(Some(options.io_timeout))
            .connection_context(host, port)?;
        stream
            .set_write_timeout(Some(options.io_timeout))
            .connection_context(host, port)?;
        let _ = stream.set_nodelay(true);

        if !secure {
            return Ok(SocketType::Tcp(stream));
        }

        // 3. SSL Handshake
        let connector = options.tls.build_connector()?;
        let mut config = connector
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(TlsConfig::should_set_sni(host));
        config.set_verify_hostname(options.tls.verify_peer);

        let tls_stream = config.connect(host, stream).map_err(|e| {
            tracing::debug!(host = %host, error = %e, "TLS handshake failed");
            NetError::SslProtocolError
        })?;

        Ok(SocketType::Ssl(tls_stream))
    }
}
