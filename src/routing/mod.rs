//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Declaration (at startup):
//!     Router::get/post/put/delete, middleware, error_handler
//!     → mount(prefix, child) splices prefixed child entries in place
//!     → build() validates and freezes
//!     → RouteTable (flattened, immutable, shared via Arc)
//!
//! Incoming Request (method, path)
//!     → table.rs (first route whose method and pattern match)
//!     → matcher.rs (segment comparison, param binding)
//!     → Return: RouteMatch { index, route, params } or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod router;
pub mod table;

pub use matcher::{Params, PathPattern, PatternError};
pub use router::{RouteError, Router};
pub use table::{Entry, Method, Route, RouteMatch, RouteTable};
