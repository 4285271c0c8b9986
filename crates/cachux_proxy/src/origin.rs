use std::io;
use std::net::SocketAddr;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{timeout, Duration},
};

pub enum ReadOutcome {
    Read(usize),
    Timeout,
}

/// An open connection to an origin server.
///
/// Read and write timeouts apply to every operation for the lifetime of the
/// connection, not just the handshake. Dropping it closes the socket.
pub struct OriginConnection {
    stream: TcpStream,
    addr: SocketAddr,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl OriginConnection {
    pub(crate) fn new(
        stream: TcpStream,
        addr: SocketAddr,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            addr,
            read_timeout,
            write_timeout,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Writes all of `bytes`; a timeout surfaces as `ErrorKind::TimedOut`.
    pub async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        match timeout(self.write_timeout, self.stream.write_all(bytes)).await {
            Ok(res) => res,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("write to origin {} timed out", self.addr),
            )),
        }
    }

    /// Reads once into `buf`. `Read(0)` means the origin closed.
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        match timeout(self.read_timeout, self.stream.read(buf)).await {
            Ok(res) => Ok(ReadOutcome::Read(res?)),
            Err(_) => Ok(ReadOutcome::Timeout),
        }
    }
}
