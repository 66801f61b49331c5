use log::{debug, info, warn};
use serde_json::Value;

use crate::ws::frame::{encode_text, Frame};

/// Callback invoked with every JSON message received on an upgraded connection
pub trait MessageHandler {
    fn on_message(&self, message: &Value, responder: &mut WsResponder<'_>);
}

impl<F> MessageHandler for F
where
    F: Fn(&Value, &mut WsResponder<'_>),
{
    fn on_message(&self, message: &Value, responder: &mut WsResponder<'_>) {
        self(message, responder)
    }
}

/// Queues text frames on an upgraded connection
pub struct WsResponder<'a> {
    outbound: &'a mut Vec<u8>,
}

impl<'a> WsResponder<'a> {
    pub(crate) fn new(outbound: &'a mut Vec<u8>) -> Self {
        Self { outbound }
    }

    pub fn send_text(&mut self, text: &str) {
        self.outbound.extend_from_slice(&encode_text(text.as_bytes()));
    }

    pub fn send_json(&mut self, value: &Value) {
        self.send_text(&value.to_string());
    }
}

// Interpret a data frame's payload as a JSON message and hand it on
pub(crate) fn process_message(
    frame: &Frame,
    connection_id: &str,
    handler: Option<&dyn MessageHandler>,
    outbound: &mut Vec<u8>,
) {
    let message: Value = match serde_json::from_slice(&frame.payload) {
        Ok(message) => message,
        Err(e) => {
            warn!("Dropping unparseable message from {}: {}", connection_id, e);
            return;
        }
    };

    match handler {
        Some(handler) => {
            debug!("Dispatching message from {}", connection_id);
            handler.on_message(&message, &mut WsResponder::new(outbound));
        }
        None => info!("Client {} sent data: {}", connection_id, message),
    }
}
