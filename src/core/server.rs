//! Readiness-driven connection multiplexer
//!
//! One thread waits on a `mio::Poll` for the listener and every accepted
//! socket. Each readiness pass accepts new connections, services ready
//! connections in registration order, and only then removes the connections
//! that were flagged for teardown during the pass.

use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info, warn};
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use serde_json::Value;
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::ServerConfig;
use crate::constants::{EVENTS_CAPACITY, MAX_FRAME_HEADER_SIZE};
use crate::core::connection::{Connection, ConnectionTable, ReadStatus, Role, LISTENER};
use crate::error::{Result, RustyPollError};
use crate::handlers::websocket::process_message;
use crate::handlers::{MessageHandler, Responder, WsResponder};
use crate::http::request::find_head_end;
use crate::http::{handshake_response, HttpRequest, Response};
use crate::routing::{Handler, Router};
use crate::ws::frame::{create_close_frame, decode, Decoded};

/// Server under construction: configuration plus registered handlers
pub struct Server {
    config: ServerConfig,
    router: Router,
    message_handler: Option<Box<dyn MessageHandler>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            message_handler: None,
        }
    }

    /// Register a closure for `pattern` (`/`, `/fixed/path` or `/prefix/*`)
    pub fn route<F>(&mut self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(&HttpRequest, &mut Responder<'_>) + 'static,
    {
        self.route_handler(pattern, Box::new(handler))
    }

    /// Register an already boxed handler for `pattern`
    pub fn route_handler(&mut self, pattern: &str, handler: Handler) -> Result<()> {
        self.router.insert(pattern, handler)?;
        debug!("Registered route {}", pattern);
        Ok(())
    }

    /// Handle JSON messages arriving on upgraded connections
    pub fn on_message<F>(&mut self, handler: F)
    where
        F: Fn(&Value, &mut WsResponder<'_>) + 'static,
    {
        self.message_handler = Some(Box::new(handler));
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Resolve, bind and listen. Any failure here is a startup error.
    pub fn bind(self) -> Result<Multiplexer> {
        self.config.validate()?;

        let mut listener = bind_listener(&self.config)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        info!("Listening on {}", listener.local_addr()?);
        debug!("Routing table:\n{}", self.router.dump());

        Ok(Multiplexer {
            poll,
            events: Events::with_capacity(EVENTS_CAPACITY),
            listener,
            connections: ConnectionTable::with_capacity(EVENTS_CAPACITY),
            read_chunk: vec![0; self.config.max_buf_size],
            dispatch: Dispatch {
                router: self.router,
                message_handler: self.message_handler,
                max_message_size: self.config.max_message_size,
            },
        })
    }

    /// Bind and serve forever
    pub fn run(self) -> Result<()> {
        self.bind()?.run()
    }
}

fn bind_listener(config: &ServerConfig) -> Result<TcpListener> {
    let address = config.address();
    let addrs = address
        .to_socket_addrs()
        .map_err(|e| RustyPollError::Resolve(format!("{}: {}", address, e)))?;

    let mut last_error = None;
    for addr in addrs {
        match open_listener(addr, config.backlog) {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                debug!("Could not bind {}: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(RustyPollError::Bind(match last_error {
        Some(e) => format!("{}: {}", address, e),
        None => format!("{} resolved to no addresses", address),
    }))
}

fn open_listener(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    // avoid "address already in use" on quick restarts
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    Ok(TcpListener::from_std(socket.into()))
}

/// Everything needed to turn buffered bytes into responses
struct Dispatch {
    router: Router,
    message_handler: Option<Box<dyn MessageHandler>>,
    max_message_size: usize,
}

impl Dispatch {
    /// Most bytes a connection may hold: one maximal frame with its header
    fn buffer_limit(&self) -> usize {
        self.max_message_size.saturating_add(MAX_FRAME_HEADER_SIZE)
    }

    /// Alternate reads and dispatch until the socket would block. Fails only
    /// when a full buffer holds no complete request or frame.
    fn receive(&self, conn: &mut Connection, chunk: &mut [u8]) -> Result<ReadStatus> {
        let limit = self.buffer_limit();
        loop {
            let status = conn.read_available(chunk, limit)?;
            self.process_inbound(conn)?;

            if status != ReadStatus::Full || conn.is_pending_teardown() {
                return Ok(status);
            }
            if conn.inbound.len() >= limit {
                return Err(RustyPollError::MessageTooLarge(conn.inbound.len()));
            }
        }
    }

    /// Consume every complete request or frame buffered on `conn`
    fn process_inbound(&self, conn: &mut Connection) -> Result<()> {
        while !conn.is_pending_teardown() {
            let progressed = match conn.role {
                Role::Http => self.process_http(conn)?,
                Role::WebSocket => self.process_frame(conn)?,
            };
            if !progressed {
                break;
            }
        }
        Ok(())
    }

    fn process_http(&self, conn: &mut Connection) -> Result<bool> {
        let Some(head_len) = find_head_end(&conn.inbound) else {
            return Ok(false);
        };

        let mut request = HttpRequest::parse(&conn.inbound[..head_len])?;

        // Bodies are not used by any route; skip over them once buffered.
        let total = match head_len.checked_add(request.content_length()) {
            Some(total) if total <= self.max_message_size => total,
            _ => return Err(RustyPollError::MessageTooLarge(request.content_length())),
        };
        if conn.inbound.len() < total {
            return Ok(false);
        }
        conn.inbound.drain(..total);

        debug!("{} {} from {}", request.method, request.path, conn.id);

        if request.is_websocket_upgrade {
            conn.outbound
                .extend_from_slice(&handshake_response(&request).to_bytes());
            conn.upgrade();
            info!("Connection {} upgraded to WebSocket", conn.id);
            return Ok(true);
        }

        match self.router.find(&request.path) {
            Some(found) => {
                request.param = found.capture;
                let mut responder = Responder::new(&mut conn.outbound);
                found.handler.handle(&request, &mut responder);
                if !responder.has_responded() {
                    debug!("Handler for {} sent no response", request.path);
                }
            }
            None => {
                debug!("No route for {}", request.path);
                conn.outbound
                    .extend_from_slice(&Response::not_found().to_bytes());
            }
        }

        Ok(true)
    }

    fn process_frame(&self, conn: &mut Connection) -> Result<bool> {
        match decode(&conn.inbound, self.max_message_size)? {
            Decoded::Incomplete => Ok(false),
            Decoded::Close => {
                info!("Client {} disconnected", conn.id);
                conn.inbound.clear();
                conn.outbound.extend_from_slice(&create_close_frame());
                conn.mark_for_teardown();
                Ok(false)
            }
            Decoded::Frame { frame, consumed } => {
                conn.inbound.drain(..consumed);
                process_message(
                    &frame,
                    &conn.id,
                    self.message_handler.as_deref(),
                    &mut conn.outbound,
                );
                Ok(true)
            }
        }
    }
}

/// A bound server driving its readiness loop
pub struct Multiplexer {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    connections: ConnectionTable,
    read_chunk: Vec<u8>,
    dispatch: Dispatch,
}

impl Multiplexer {
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.connections
    }

    /// Serve until the poll itself fails
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.poll_once(None)?;
        }
    }

    /// Run a single readiness pass, waiting at most `timeout` for readiness
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<()> {
        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let mut listener_ready = false;
        let mut ready: HashMap<Token, (bool, bool)> = HashMap::new();
        for event in self.events.iter() {
            if event.token() == LISTENER {
                listener_ready = true;
                continue;
            }
            let entry = ready.entry(event.token()).or_default();
            entry.0 |= event.is_readable() || event.is_read_closed() || event.is_error();
            entry.1 |= event.is_writable();
        }

        if listener_ready {
            self.accept_connections();
        }

        for token in self.connections.in_registration_order(ready.keys().copied()) {
            let (readable, writable) = ready[&token];
            self.service(token, readable, writable);
        }

        let removed = self.connections.reap(self.poll.registry());
        if removed > 0 {
            debug!(
                "Cleanup removed {} connection(s), {} open",
                removed,
                self.connections.len()
            );
        }
        debug_assert!(self.connections.is_consistent());

        Ok(())
    }

    fn accept_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    match self
                        .connections
                        .register(self.poll.registry(), stream, addr.to_string())
                    {
                        Ok(token) => {
                            if let Some(conn) = self.connections.get(token) {
                                info!("New connection {} from {}", conn.id, addr);
                            }
                        }
                        Err(e) => warn!("Failed to register connection from {}: {}", addr, e),
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    break;
                }
            }
        }
    }

    fn service(&mut self, token: Token, readable: bool, writable: bool) {
        let Some(conn) = self.connections.get_mut(token) else {
            return;
        };
        if conn.is_pending_teardown() {
            return;
        }

        if writable {
            if let Err(e) = conn.flush() {
                warn!("Send to {} failed: {}", conn.id, e);
                conn.mark_for_teardown();
                return;
            }
        }

        if readable {
            match self.dispatch.receive(conn, &mut self.read_chunk) {
                Ok(ReadStatus::PeerClosed) if !conn.is_pending_teardown() => {
                    info!("Peer {} closed connection {}", conn.addr, conn.id);
                    conn.mark_for_teardown();
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Dropping connection {}: {}", conn.id, e);
                    conn.mark_for_teardown();
                }
            }
        }

        match conn.flush() {
            Ok(_) if conn.is_pending_teardown() => {}
            Ok(_) => {
                if let Err(e) = conn.update_interest(self.poll.registry()) {
                    warn!("Failed to update interest for {}: {}", conn.id, e);
                    conn.mark_for_teardown();
                }
            }
            Err(e) => {
                warn!("Send to {} failed: {}", conn.id, e);
                conn.mark_for_teardown();
            }
        }
    }
}
