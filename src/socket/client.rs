use boring::ssl::SslStream;
use std::fmt;
use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpStream;

/// A connected socket, plain or TLS.
pub enum SocketType {
    Tcp(TcpStream),
    Ssl(SslStream<TcpStream>),
}

impl fmt::Debug for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketType::Tcp(s) => f.debug_tuple("Tcp").field(&s.peer_addr().ok()).finish(),
            SocketType::Ssl(s) => f
                .debug_tuple("Ssl")
                .field(&s.get_ref().peer_addr().ok())
                .finish(),
        }
    }
}

impl SocketType {
    fn tcp(&self) -> &TcpStream {
        match self {
            SocketType::Tcp(s) => s,
            SocketType::Ssl(s) => s.get_ref(),
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, SocketType::Ssl(_))
    }

    /// Liveness check for reuse: a peer that closed or sent unsolicited
    /// data makes the socket unusable.
    pub fn is_connected_and_idle(&self) -> bool {
        let stream = self.tcp();
        if stream.peer_addr().is_err() || stream.set_nonblocking(true).is_err() {
            return false;
        }
        let mut buf = [0u8; 1];
        let idle = match stream.peek(&mut buf) {
            Ok(_) => false,
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => true,
            Err(_) => false,
        };
        stream.set_nonblocking(false).is_ok() && idle
    }

    pub fn shutdown(&mut self) {
        if let SocketType::Ssl(s) = self {
            let _ = s.shutdown();
        }
        let _ = self.tcp().shutdown(std::net::Shutdown::Both);
    }
}

impl Read for SocketType {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SocketType::Tcp(s) => s.read(buf),
            SocketType::Ssl(s) => s.read(buf),
        }
    }
}

impl Write for SocketType {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SocketType::Tcp(s) => s.write(buf),
            SocketType::Ssl(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SocketType::Tcp(s) => s.flush(),
            SocketType::Ssl(s) => s.flush(),
        }
    }
}
