use std::path::Path;

use log::{error, info, warn};
use serde_json::{json, Value};

use rusty_poll::config::ServerConfig;
use rusty_poll::core::Server;
use rusty_poll::error::Result;
use rusty_poll::handlers::{Responder, WsResponder};
use rusty_poll::http::HttpRequest;

fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    // Load config from env
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, static_dir={}",
        config.host,
        config.port,
        config.static_dir.display()
    );

    let mut server = Server::new(config.clone());

    if let Err(e) = register_routes(&mut server, &config.static_dir) {
        error!("Failed to register routes: {}", e);
        std::process::exit(1);
    }

    // Echo every JSON message back to its sender
    server.on_message(|message: &Value, ws: &mut WsResponder<'_>| {
        ws.send_json(&json!({ "echo": message }));
    });

    // Start the server
    info!("Starting Rusty Poll server on {}", config.address());

    if let Err(e) = server.run() {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

// `/` serves the index, `/*` and `/assets/*` serve the captured file name
fn register_routes(server: &mut Server, static_dir: &Path) -> Result<()> {
    let index = static_dir.join("index.html");
    server.route("/", move |_: &HttpRequest, res: &mut Responder<'_>| {
        res.send_file(&index)
    })?;

    let root = static_dir.to_path_buf();
    server.route("/*", move |req: &HttpRequest, res: &mut Responder<'_>| {
        serve_from(&root, req, res)
    })?;

    let assets = static_dir.join("assets");
    server.route("/assets/*", move |req: &HttpRequest, res: &mut Responder<'_>| {
        serve_from(&assets, req, res)
    })?;

    Ok(())
}

fn serve_from(dir: &Path, req: &HttpRequest, res: &mut Responder<'_>) {
    match req.param.as_deref() {
        // Captured segment is a single path component, never `..`
        Some(name) if name != ".." && name != "." => res.send_file(dir.join(name)),
        _ => res.not_found(),
    }
}
