// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The [helpers](crate::helpers) module contains [Transport] implementations
//! that make it easier to hook a [Session](crate::Session) up to something.

use anyhow::Context;
use log::info;
use rowsync_core::traits::Transport;
use std::{
    collections::VecDeque,
    io::{self, Read, Write},
    net::{SocketAddr, TcpStream},
};

/// A non-blocking TCP connection to an editor.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
}
impl TcpTransport {
    /// What a client says first. The editor answers with a greeting of its
    /// own, which the session discards as its handshake.
    pub const GREETING: &'static [u8] = b"hello, synctracker!";
    pub const DEFAULT_PORT: u16 = 1338;

    // poll_available() peeks at most this much. The session never wants more
    // than its ring can hold anyway.
    const PEEK_LEN: usize = 1024;

    pub fn connect(host: &str, port: u16) -> anyhow::Result<Self> {
        let stream = TcpStream::connect((host, port))
            .with_context(|| format!("connecting to {host}:{port}"))?;
        Self::new_with(stream)
    }

    /// Takes over an already-connected stream: sends the greeting, then
    /// switches the socket to non-blocking mode.
    pub fn new_with(mut stream: TcpStream) -> anyhow::Result<Self> {
        let peer = stream.peer_addr().context("reading peer address")?;
        stream.set_nodelay(true)?;
        stream
            .write_all(Self::GREETING)
            .context("sending greeting")?;
        stream.set_nonblocking(true)?;
        info!("connected to {peer}");
        Ok(Self { stream, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn closed(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::ConnectionAborted,
            format!("{} closed the connection", self.peer),
        )
    }
}
impl Transport for TcpTransport {
    fn poll_available(&mut self) -> io::Result<usize> {
        let mut buf = [0u8; Self::PEEK_LEN];
        match self.stream.peek(&mut buf) {
            Ok(0) => Err(self.closed()),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.stream.read(buf) {
            Ok(0) => Err(self.closed()),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.stream.write_all(bytes) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                // The send buffer is full, and write_all() doesn't say how
                // much got out. Frames are tiny, so this means the editor has
                // stopped reading.
                Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    format!("{} isn't accepting data", self.peer),
                ))
            }
            r => r,
        }
    }
}

/// A [Transport] that lives entirely in memory. Bytes pushed with
/// [MemoryTransport::push_incoming] come out of the session's reads, and
/// everything the session sends can be collected with
/// [MemoryTransport::take_outgoing]. Useful for replaying a captured stream
/// and for tests.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    incoming: VecDeque<u8>,
    outgoing: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
}
impl MemoryTransport {
    pub fn push_incoming(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes);
    }

    pub fn take_outgoing(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn pending_incoming(&self) -> usize {
        self.incoming.len()
    }

    /// While set, polling and reading fail as a broken connection would.
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// While set, every write fails.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn broken() -> io::Error {
        io::Error::new(io::ErrorKind::BrokenPipe, "memory transport set to fail")
    }
}
impl Transport for MemoryTransport {
    fn poll_available(&mut self) -> io::Result<usize> {
        if self.fail_reads {
            return Err(Self::broken());
        }
        Ok(self.incoming.len())
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(Self::broken());
        }
        let n = buf.len().min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(Self::broken());
        }
        self.outgoing.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        net::TcpListener,
        time::{Duration, Instant},
    };

    fn wait_for_bytes(transport: &mut TcpTransport, n: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let available = transport.poll_available().unwrap();
            if available >= n || Instant::now() > deadline {
                return available;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn tcp_transport_greets_and_reads_without_blocking() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = TcpTransport::connect("127.0.0.1", port).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let mut greeting = [0u8; 19];
        server.read_exact(&mut greeting).unwrap();
        assert_eq!(&greeting, TcpTransport::GREETING);

        // Nothing sent yet, so nothing to read, and no blocking.
        assert_eq!(client.poll_available().unwrap(), 0);
        let mut buf = [0u8; 8];
        assert_eq!(client.read_into(&mut buf).unwrap(), 0);

        server.write_all(&[0x04, 0x01, 0x05]).unwrap();
        assert_eq!(wait_for_bytes(&mut client, 3), 3);
        assert_eq!(client.read_into(&mut buf[..2]).unwrap(), 2);
        assert_eq!(&buf[..2], &[0x04, 0x01]);
        assert_eq!(client.poll_available().unwrap(), 1);

        client.write_all(&[0x03, 0, 0, 0, 1]).unwrap();
        let mut frame = [0u8; 5];
        server.read_exact(&mut frame).unwrap();
        assert_eq!(frame, [0x03, 0, 0, 0, 1]);
    }

    #[test]
    fn tcp_transport_reports_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut client = TcpTransport::connect("127.0.0.1", port).unwrap();
        let (server, _) = listener.accept().unwrap();
        drop(server);

        let deadline = Instant::now() + Duration::from_secs(5);
        let e = loop {
            match client.poll_available() {
                Err(e) => break e,
                Ok(_) if Instant::now() > deadline => panic!("close never noticed"),
                Ok(_) => std::thread::sleep(Duration::from_millis(1)),
            }
        };
        assert_ne!(e.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn memory_transport_round_trips() {
        let mut transport = MemoryTransport::default();
        transport.push_incoming(&[1, 2, 3]);
        assert_eq!(transport.poll_available().unwrap(), 3);
        let mut buf = [0u8; 2];
        assert_eq!(transport.read_into(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(transport.pending_incoming(), 1);

        transport.write_all(&[9]).unwrap();
        assert_eq!(transport.take_outgoing(), vec![9]);
        assert!(transport.take_outgoing().is_empty());

        transport.fail_writes(true);
        assert!(transport.write_all(&[9]).is_err());
    }
}
