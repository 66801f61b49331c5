//! Request routing

pub mod trie;

pub use trie::{RouteMatch, RouteNode, RouteTrie};

use crate::handlers::Responder;
use crate::http::HttpRequest;

/// Anything that can answer an HTTP request
pub trait RouteHandler {
    fn handle(&self, request: &HttpRequest, responder: &mut Responder<'_>);
}

impl<F> RouteHandler for F
where
    F: Fn(&HttpRequest, &mut Responder<'_>),
{
    fn handle(&self, request: &HttpRequest, responder: &mut Responder<'_>) {
        self(request, responder)
    }
}

/// Handler type stored in the server's routing table
pub type Handler = Box<dyn RouteHandler>;

/// The server's routing table
pub type Router = RouteTrie<Handler>;
