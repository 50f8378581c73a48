//! Startup-time route registration and mounting.
//!
//! # Responsibilities
//! - Collect routes, middleware and error handlers in declaration order
//! - Mount child routers under a prefix, splicing their entries in place
//! - Freeze the result into a [`RouteTable`]
//!
//! # Design Decisions
//! - Mounting flattens eagerly, so `build()` only validates and freezes
//! - Registration never panics; problems are collected and all reported by `build()`
//! - Prefixes are joined segment-wise, which keeps nested mounts associative

use thiserror::Error;

use crate::pipeline::handler::{Chain, ErrorHandler, Handler, NormalHandler};
use crate::routing::matcher::{PathPattern, PatternError};
use crate::routing::table::{Entry, Method, Route, RouteTable};

/// Problems found while declaring routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("route {method} {pattern} has an empty handler chain")]
    EmptyChain { method: Method, pattern: String },
}

/// Route declarations, in the order they were made.
#[derive(Default)]
pub struct Router {
    entries: Vec<Entry>,
    errors: Vec<RouteError>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, pattern: &str, chain: Chain) -> Self {
        let pattern = match PathPattern::parse(pattern) {
            Ok(p) => p,
            Err(e) => {
                self.errors.push(e.into());
                return self;
            }
        };
        if chain.is_empty() {
            self.errors.push(RouteError::EmptyChain {
                method,
                pattern: pattern.to_string(),
            });
            return self;
        }
        self.entries.push(Entry::Route(Route {
            method,
            pattern,
            chain,
        }));
        self
    }

    pub fn get(self, pattern: &str, chain: Chain) -> Self {
        self.route(Method::Get, pattern, chain)
    }

    pub fn post(self, pattern: &str, chain: Chain) -> Self {
        self.route(Method::Post, pattern, chain)
    }

    pub fn put(self, pattern: &str, chain: Chain) -> Self {
        self.route(Method::Put, pattern, chain)
    }

    pub fn delete(self, pattern: &str, chain: Chain) -> Self {
        self.route(Method::Delete, pattern, chain)
    }

    /// Run `handler` for every request under `scope`, at this position.
    pub fn middleware(self, scope: &str, handler: impl NormalHandler + 'static) -> Self {
        self.scoped(scope, Handler::normal(handler))
    }

    /// Register an error handler for failures under `scope`, at this position.
    pub fn error_handler(self, scope: &str, handler: impl ErrorHandler + 'static) -> Self {
        self.scoped(scope, Handler::error(handler))
    }

    fn scoped(mut self, scope: &str, handler: Handler) -> Self {
        match PathPattern::parse(scope) {
            Ok(scope) => self.entries.push(Entry::Scoped { scope, handler }),
            Err(e) => self.errors.push(e.into()),
        }
        self
    }

    /// Splice `child`'s entries here, with `prefix` prepended to each
    /// pattern and scope. The child's relative order is preserved.
    pub fn mount(mut self, prefix: &str, child: Router) -> Self {
        let prefix = match PathPattern::parse(prefix) {
            Ok(p) => p,
            Err(e) => {
                self.errors.push(e.into());
                return self;
            }
        };

        self.errors.extend(child.errors);
        for entry in child.entries {
            let rebased = match entry {
                Entry::Route(route) => route.pattern.prefixed(&prefix).map(|pattern| {
                    Entry::Route(Route {
                        pattern,
                        ..route
                    })
                }),
                Entry::Scoped { scope, handler } => scope
                    .prefixed(&prefix)
                    .map(|scope| Entry::Scoped { scope, handler }),
            };
            match rebased {
                Ok(entry) => self.entries.push(entry),
                Err(e) => self.errors.push(e.into()),
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the declarations. Returns every registration error at once.
    pub fn build(self) -> Result<RouteTable, Vec<RouteError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        tracing::debug!(entries = self.entries.len(), "Route table built");
        Ok(RouteTable::new(self.entries))
    }
}
