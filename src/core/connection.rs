//! Connection records and the arena that owns them
//! Handles the lifecycle of accepted sockets

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use log::{debug, warn};
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};
use slab::Slab;
use uuid::Uuid;


/// Readiness token of the listening socket. It never names a `Connection`,
/// so it can never be torn down.
pub const LISTENER: Token = Token(0);

/// Protocol a connection currently speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Http,
    WebSocket,
}

/// What a read pass observed about the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Drained everything available; the peer may send more
    Open,
    /// The peer shut down its side
    PeerClosed,
    /// `inbound` reached its limit; more may be waiting on the socket
    Full,
}

/// Represents the state of a single accepted socket
pub struct Connection {
    pub id: String,
    pub addr: String,
    pub role: Role,
    pub connected_at: Instant,
    /// Bytes received but not yet consumed by a complete request or frame
    pub inbound: Vec<u8>,
    /// Bytes queued for the peer but not yet accepted by the socket
    pub outbound: Vec<u8>,
    token: Token,
    stream: TcpStream,
    interest: Interest,
    pending_teardown: bool,
    seq: u64,
}

impl Connection {
    fn new(stream: TcpStream, addr: String, token: Token, seq: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            addr,
            role: Role::Http,
            connected_at: Instant::now(),
            inbound: Vec::new(),
            outbound: Vec::new(),
            token,
            stream,
            interest: Interest::READABLE,
            pending_teardown: false,
            seq,
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn is_websocket(&self) -> bool {
        self.role == Role::WebSocket
    }

    /// Switch to WebSocket framing. Happens at most once per connection.
    pub fn upgrade(&mut self) {
        debug_assert_eq!(self.role, Role::Http, "connection upgraded twice");
        self.role = Role::WebSocket;
    }

    /// Flag the connection for removal at the end of the current pass
    pub fn mark_for_teardown(&mut self) {
        self.pending_teardown = true;
    }

    pub fn is_pending_teardown(&self) -> bool {
        self.pending_teardown
    }

    /// Read into `inbound`, `chunk` bytes at a time, until the socket would
    /// block or `inbound` holds `max_buffered` bytes.
    pub fn read_available(
        &mut self,
        chunk: &mut [u8],
        max_buffered: usize,
    ) -> io::Result<ReadStatus> {
        loop {
            let room = max_buffered.saturating_sub(self.inbound.len());
            if room == 0 {
                return Ok(ReadStatus::Full);
            }
            let want = room.min(chunk.len());

            match self.stream.read(&mut chunk[..want]) {
                Ok(0) => return Ok(ReadStatus::PeerClosed),
                Ok(n) => self.inbound.extend_from_slice(&chunk[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(ReadStatus::Open);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Write as much of `outbound` as the socket takes. Returns whether the
    /// queue is now empty.
    pub fn flush(&mut self) -> io::Result<bool> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Ask for write readiness only while output is pending
    pub fn update_interest(&mut self, registry: &Registry) -> io::Result<()> {
        let wanted = if self.outbound.is_empty() {
            Interest::READABLE
        } else {
            Interest::READABLE | Interest::WRITABLE
        };

        if wanted != self.interest {
            registry.reregister(&mut self.stream, self.token, wanted)?;
            self.interest = wanted;
        }
        Ok(())
    }

    /// Calculate the connection duration
    pub fn connection_duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Arena of live connections. Each record carries its own readiness token,
/// derived from its slot, so there is no second structure to keep in step.
pub struct ConnectionTable {
    entries: Slab<Connection>,
    next_seq: u64,
}

impl Default for ConnectionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self {
            entries: Slab::new(),
            next_seq: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Slab::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Take ownership of an accepted stream and register it for read readiness
    pub fn register(
        &mut self,
        registry: &Registry,
        mut stream: TcpStream,
        addr: String,
    ) -> io::Result<Token> {
        let entry = self.entries.vacant_entry();
        let token = Token(entry.key() + 1);

        registry.register(&mut stream, token, Interest::READABLE)?;

        entry.insert(Connection::new(stream, addr, token, self.next_seq));
        self.next_seq += 1;
        Ok(token)
    }

    pub fn get(&self, token: Token) -> Option<&Connection> {
        token.0.checked_sub(1).and_then(|key| self.entries.get(key))
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut Connection> {
        token.0.checked_sub(1).and_then(|key| self.entries.get_mut(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.entries.iter().map(|(_, conn)| conn)
    }

    /// Live tokens among `tokens`, oldest registration first, without repeats
    pub fn in_registration_order(&self, tokens: impl IntoIterator<Item = Token>) -> Vec<Token> {
        let mut live: Vec<(u64, Token)> = tokens
            .into_iter()
            .filter_map(|token| self.get(token).map(|conn| (conn.seq, token)))
            .collect();
        live.sort_unstable_by_key(|(seq, _)| *seq);
        live.dedup_by_key(|(seq, _)| *seq);
        live.into_iter().map(|(_, token)| token).collect()
    }

    /// Remove every connection flagged for teardown, closing its socket.
    /// Returns how many were removed.
    pub fn reap(&mut self, registry: &Registry) -> usize {
        let doomed: Vec<usize> = self
            .entries
            .iter()
            .filter(|(_, conn)| conn.pending_teardown)
            .map(|(key, _)| key)
            .collect();

        for key in &doomed {
            let mut conn = self.entries.remove(*key);
            if let Err(e) = registry.deregister(&mut conn.stream) {
                warn!("Failed to deregister connection {}: {}", conn.id, e);
            }
            debug!(
                "Closed connection {} ({}) after {:?}",
                conn.id,
                conn.addr,
                conn.connection_duration()
            );
        }

        doomed.len()
    }

    /// Every record's token names its own slot
    pub(crate) fn is_consistent(&self) -> bool {
        self.entries
            .iter()
            .all(|(key, conn)| conn.token == Token(key + 1))
    }
}
