// Shared helpers for the integration tests: an in-process server on an
// ephemeral port

use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

use rusty_poll::config::ServerConfig;
use rusty_poll::core::Server;
use rusty_poll::handlers::{Responder, WsResponder};
use rusty_poll::http::HttpRequest;

// Start a server with a few fixed routes and a JSON echo handler.
// Handlers are not `Send`, so the server is built inside its own thread.
#[allow(dead_code)]
pub fn start_server() -> SocketAddr {
    start_with_config(ServerConfig::default())
}

#[allow(dead_code)]
pub fn start_with_config(config: ServerConfig) -> SocketAddr {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut server = Server::new(config.with_host("127.0.0.1").with_port(0));

        server
            .route("/", |_: &HttpRequest, res: &mut Responder<'_>| {
                res.send_text("hello from rusty poll")
            })
            .expect("root route");
        server
            .route("/files/*", |req: &HttpRequest, res: &mut Responder<'_>| {
                let name = req.param.clone().unwrap_or_default();
                res.send_text(&format!("file:{}", name))
            })
            .expect("wildcard route");
        server
            .route("/echo", |req: &HttpRequest, res: &mut Responder<'_>| {
                let query = req.query.clone().unwrap_or_default();
                res.send_text(&format!("{} {}", req.method, query))
            })
            .expect("echo route");
        server
            .route("/silent", |_: &HttpRequest, _: &mut Responder<'_>| {})
            .expect("silent route");

        server.on_message(|message: &Value, ws: &mut WsResponder<'_>| {
            ws.send_json(&json!({ "echo": message }));
        });

        let mut multiplexer = server.bind().expect("server should bind");
        tx.send(multiplexer.local_addr().expect("local address"))
            .expect("test thread is waiting");

        if let Err(e) = multiplexer.run() {
            println!("Server loop stopped: {}", e);
        }
    });

    rx.recv_timeout(Duration::from_secs(5))
        .expect("server did not start in time")
}
