//! The frozen, flattened route table.
//!
//! # Responsibilities
//! - Hold the single ordered entry sequence produced at startup
//! - Look up the first route matching a request (registration order)
//!
//! # Design Decisions
//! - Immutable after construction, shared via `Arc` without locks
//! - Explicit `None` on no match rather than a silent default route

use std::fmt;
use std::sync::Arc;

use axum::http::Method as HttpMethod;

use crate::pipeline::handler::{Chain, ErrorHandler, Handler};
use crate::routing::matcher::{Params, PathPattern};

/// The verbs a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Map an HTTP method; anything outside the fixed set is `None`.
    pub fn from_http(method: &HttpMethod) -> Option<Self> {
        [Self::Get, Self::Post, Self::Put, Self::Delete]
            .into_iter()
            .find(|m| m.as_str() == method.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A method + pattern bound to a handler chain.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub chain: Chain,
}

impl Route {
    pub fn matches(&self, method: Method, path: &str) -> Option<Params> {
        if self.method != method {
            return None;
        }
        self.pattern.matches(path)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.to_string())
            .field("chain", &self.chain)
            .finish()
    }
}

/// One position in the flattened sequence.
#[derive(Clone, Debug)]
pub enum Entry {
    /// A scoped handler: normal ones act as middleware for every method under
    /// the scope, error-capable ones are error handlers for that scope.
    Scoped { scope: PathPattern, handler: Handler },
    Route(Route),
}

impl Entry {
    /// The error handler at this entry, if it is one and covers `path`,
    /// with the params bound by its scope.
    pub fn error_handler_for(&self, path: &str) -> Option<(&Arc<dyn ErrorHandler>, Params)> {
        match self {
            Entry::Scoped {
                scope,
                handler: Handler::ErrorCapable(handler),
            } => scope.matches_prefix(path).map(|params| (handler, params)),
            _ => None,
        }
    }

    /// One-line description, e.g. `GET /hubs/:id` or `ERR /hubs`.
    pub fn describe(&self) -> String {
        match self {
            Entry::Scoped { scope, handler } if handler.is_error_capable() => {
                format!("ERR {scope}")
            }
            Entry::Scoped { scope, .. } => format!("USE {scope}"),
            Entry::Route(route) => format!("{} {}", route.method, route.pattern),
        }
    }
}

/// A route selected for a request.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// Index of the route entry in the flattened sequence.
    pub index: usize,
    pub route: &'a Route,
    pub params: Params,
}

/// Immutable flattened sequence. Cheap to clone.
#[derive(Clone)]
pub struct RouteTable {
    entries: Arc<[Entry]>,
}

impl RouteTable {
    pub(crate) fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First route, in registration order, whose method and pattern match.
    pub fn find(&self, method: &HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        let method = Method::from_http(method)?;
        self.entries
            .iter()
            .enumerate()
            .find_map(|(index, entry)| match entry {
                Entry::Route(route) => route.matches(method, path).map(|params| RouteMatch {
                    index,
                    route,
                    params,
                }),
                Entry::Scoped { .. } => None,
            })
    }

    pub fn describe(&self) -> Vec<String> {
        self.entries.iter().map(Entry::describe).collect()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.describe()).finish()
    }
}
