//! Path-segment trie mapping route patterns to handlers.
//!
//! Patterns are `/`, a fixed path such as `/health`, or a path whose last
//! segment is the wildcard `*` (`/assets/*`). A wildcard matches exactly one
//! segment, and only when that segment is the last one of the queried path.
//! The matched text is handed back in the [`RouteMatch`]; nodes are never
//! mutated by a lookup.

use std::collections::HashMap;
use std::fmt::Write;

use crate::constants::WILDCARD_SEGMENT;
use crate::error::{Result, RustyPollError};

/// One segment of the routing trie
#[derive(Debug)]
pub struct RouteNode<H> {
    segment: String,
    children: HashMap<String, RouteNode<H>>,
    handler: Option<H>,
    wildcard: bool,
}

impl<H> RouteNode<H> {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            children: HashMap::new(),
            handler: None,
            wildcard: segment == WILDCARD_SEGMENT,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// A node is a valid route terminus iff it holds a handler
    pub fn is_terminal(&self) -> bool {
        self.handler.is_some()
    }

    fn lookup<'a, 'p>(&'a self, segments: &[&'p str]) -> Option<(&'a H, Option<&'p str>)> {
        let Some((first, rest)) = segments.split_first() else {
            return self.handler.as_ref().map(|handler| (handler, None));
        };

        // Literal children win; the wildcard is only a fallback for the
        // final segment.
        if let Some(child) = self.children.get(*first).filter(|child| !child.wildcard) {
            if let Some(found) = child.lookup(rest) {
                return Some(found);
            }
        }

        if rest.is_empty() {
            if let Some(handler) = self
                .children
                .get(WILDCARD_SEGMENT)
                .and_then(|wild| wild.handler.as_ref())
            {
                return Some((handler, Some(*first)));
            }
        }

        None
    }

    fn remove_segments(&mut self, segments: &[&str]) -> bool {
        let Some((first, rest)) = segments.split_first() else {
            return self.handler.take().is_some();
        };

        let Some(child) = self.children.get_mut(*first) else {
            return false;
        };

        let removed = child.remove_segments(rest);
        if removed && child.children.is_empty() && !child.is_terminal() {
            self.children.remove(*first);
        }
        removed
    }

    fn dump_into(&self, depth: usize, out: &mut String) {
        let marker = if self.is_terminal() { " (route)" } else { "" };
        let _ = writeln!(out, "{}{}{}", "  ".repeat(depth), self.segment, marker);

        let mut children: Vec<_> = self.children.values().collect();
        children.sort_by(|a, b| a.segment.cmp(&b.segment));
        for child in children {
            child.dump_into(depth + 1, out);
        }
    }
}

/// Result of a successful lookup
#[derive(Debug, PartialEq, Eq)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    /// Text bound by a trailing wildcard segment
    pub capture: Option<String>,
}

/// Routing table keyed by path segments
#[derive(Debug)]
pub struct RouteTrie<H> {
    root: RouteNode<H>,
}

impl<H> Default for RouteTrie<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTrie<H> {
    pub fn new() -> Self {
        Self {
            root: RouteNode::new("/"),
        }
    }

    /// Register `handler` under `path`, replacing any handler already there.
    pub fn insert(&mut self, path: &str, handler: H) -> Result<()> {
        if !path.starts_with('/') {
            return Err(RustyPollError::InvalidRoute(format!(
                "route '{}' must start with '/'",
                path
            )));
        }

        let segments = split_path(path);
        if let Some(pos) = segments.iter().position(|s| *s == WILDCARD_SEGMENT) {
            if pos + 1 != segments.len() {
                return Err(RustyPollError::InvalidRoute(format!(
                    "route '{}' has a wildcard before its last segment",
                    path
                )));
            }
        }

        let mut node = &mut self.root;
        for segment in segments {
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| RouteNode::new(segment));
        }
        node.handler = Some(handler);

        Ok(())
    }

    /// Resolve `path` to a handler plus any wildcard capture.
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_, H>> {
        let segments = split_path(path);
        self.root
            .lookup(&segments)
            .map(|(handler, capture)| RouteMatch {
                handler,
                capture: capture.map(str::to_string),
            })
    }

    /// Drop the handler registered under `path`, pruning nodes left without
    /// children or a handler. Returns whether a handler was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let segments = split_path(path);
        self.root.remove_segments(&segments)
    }

    pub fn root(&self) -> &RouteNode<H> {
        &self.root
    }

    /// Render the tree one segment per line, indented by depth
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.root.dump_into(0, &mut out);
        out
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler_of<'a>(trie: &'a RouteTrie<u32>, path: &str) -> Option<&'a u32> {
        trie.find(path).map(|m| m.handler)
    }

    #[test]
    fn test_fixed_paths_resolve_to_their_handler() {
        let mut trie = RouteTrie::new();
        trie.insert("/health", 1).unwrap();
        trie.insert("/api/v1/users", 2).unwrap();
        trie.insert("/api/v1/rooms", 3).unwrap();

        assert_eq!(handler_of(&trie, "/health"), Some(&1));
        assert_eq!(handler_of(&trie, "/api/v1/users"), Some(&2));
        assert_eq!(handler_of(&trie, "/api/v1/rooms"), Some(&3));
        assert_eq!(trie.find("/health").unwrap().capture, None);
    }

    #[test]
    fn test_wildcard_captures_last_segment() {
        let mut trie = RouteTrie::new();
        trie.insert("/assets/*", 7).unwrap();

        let found = trie.find("/assets/logo.svg").unwrap();
        assert_eq!(*found.handler, 7);
        assert_eq!(found.capture.as_deref(), Some("logo.svg"));
    }

    #[test]
    fn test_wildcard_only_matches_final_segment() {
        let mut trie = RouteTrie::new();
        trie.insert("/assets/*", 7).unwrap();

        assert!(trie.find("/assets/img/logo.svg").is_none());
        assert!(trie.find("/assets").is_none());
    }

    #[test]
    fn test_unregistered_paths_not_found() {
        let mut trie = RouteTrie::new();
        trie.insert("/api/users", 1).unwrap();

        assert!(trie.find("/api").is_none());
        assert!(trie.find("/api/users/42").is_none());
        assert!(trie.find("/api/rooms").is_none());
        assert!(trie.find("/nothing").is_none());
        assert!(trie.find("/").is_none());
    }

    #[test]
    fn test_root_survives_child_registration() {
        let mut trie = RouteTrie::new();
        trie.insert("/", 0).unwrap();
        trie.insert("/foo", 1).unwrap();

        assert_eq!(handler_of(&trie, "/"), Some(&0));
        assert_eq!(handler_of(&trie, "/foo"), Some(&1));
    }

    #[test]
    fn test_literal_preferred_over_wildcard() {
        let mut trie = RouteTrie::new();
        trie.insert("/", 0).unwrap();
        trie.insert("/*", 1).unwrap();
        trie.insert("/assets/*", 2).unwrap();
        trie.insert("/health", 3).unwrap();

        assert_eq!(handler_of(&trie, "/health"), Some(&3));
        assert_eq!(handler_of(&trie, "/index.js"), Some(&1));
        assert_eq!(trie.find("/index.js").unwrap().capture.as_deref(), Some("index.js"));
        assert_eq!(handler_of(&trie, "/assets/app.css"), Some(&2));
        // "assets" has no handler of its own, so the top-level wildcard applies
        let fallback = trie.find("/assets").unwrap();
        assert_eq!(*fallback.handler, 1);
        assert_eq!(fallback.capture.as_deref(), Some("assets"));
    }

    #[test]
    fn test_lookup_does_not_retain_capture() {
        let mut trie = RouteTrie::new();
        trie.insert("/files/*", 5).unwrap();

        let first = trie.find("/files/a.txt").unwrap();
        let second = trie.find("/files/b.txt").unwrap();
        assert_eq!(first.capture.as_deref(), Some("a.txt"));
        assert_eq!(second.capture.as_deref(), Some("b.txt"));
    }

    #[test]
    fn test_reinsert_replaces_handler() {
        let mut trie = RouteTrie::new();
        trie.insert("/x", 1).unwrap();
        trie.insert("/x", 2).unwrap();
        assert_eq!(handler_of(&trie, "/x"), Some(&2));
    }

    #[test]
    fn test_invalid_patterns_rejected() {
        let mut trie: RouteTrie<u32> = RouteTrie::new();
        assert!(trie.insert("/*/tail", 1).is_err());
        assert!(trie.insert("no-slash", 1).is_err());
    }

    #[test]
    fn test_remove_prunes_empty_branches() {
        let mut trie = RouteTrie::new();
        trie.insert("/a/b/c", 1).unwrap();
        trie.insert("/a/x", 2).unwrap();

        assert!(trie.remove("/a/b/c"));
        assert!(trie.find("/a/b/c").is_none());
        assert_eq!(handler_of(&trie, "/a/x"), Some(&2));
        // "b" had nothing else hanging off it
        assert!(!trie.root().children["a"].children.contains_key("b"));

        assert!(trie.remove("/a/x"));
        assert!(trie.root().children.is_empty());
        assert!(!trie.remove("/a/x"));
    }

    #[test]
    fn test_remove_keeps_interior_terminal() {
        let mut trie = RouteTrie::new();
        trie.insert("/a", 1).unwrap();
        trie.insert("/a/b", 2).unwrap();

        assert!(trie.remove("/a/b"));
        assert_eq!(handler_of(&trie, "/a"), Some(&1));

        trie.insert("/a/b", 2).unwrap();
        assert!(trie.remove("/a"));
        assert!(trie.find("/a").is_none());
        assert_eq!(handler_of(&trie, "/a/b"), Some(&2));
    }

    #[test]
    fn test_remove_root() {
        let mut trie = RouteTrie::new();
        trie.insert("/", 1).unwrap();
        assert!(trie.remove("/"));
        assert!(trie.find("/").is_none());
    }

    #[test]
    fn test_dump_lists_segments_by_depth() {
        let mut trie = RouteTrie::new();
        trie.insert("/", 0).unwrap();
        trie.insert("/assets/*", 1).unwrap();

        assert_eq!(trie.dump(), "/ (route)\n  assets\n    * (route)\n");
        assert!(trie.root().children["assets"].children["*"].is_wildcard());
    }
}
