//! Request dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! Parsed request (RequestContext) + ResponseSink
//!     → dispatcher.rs (select route, walk the flattened sequence)
//!         → normal track: scoped middleware, then the route's chain
//!         → handler.rs (Next::Advance | Next::Fail(Failure))
//!     → on Fail: error_router.rs (next error handler at or after the failure point)
//!         → none left: built-in fallback (500 + failure body)
//!     → sink.rs (exactly one write, forwarded to the transport)
//! ```
//!
//! # Design Decisions
//! - Handlers are tagged Normal / ErrorCapable at registration
//! - Continuation is an explicit two-case value, never inferred
//! - Guards pass values downstream through typed attachment keys
//! - Double writes and exhausted chains are defects, logged as such

pub mod context;
pub mod dispatcher;
pub mod error_router;
pub mod failure;
pub mod handler;
pub mod sink;

pub use context::{AttachmentKey, Attachments, JsonBody, RequestContext};
pub use dispatcher::{DispatchReport, DispatchState, Dispatcher};
pub use error_router::next_error_handler;
pub use failure::{DispatchViolation, Failure};
pub use handler::{Chain, ErrorHandler, Handler, HandlerFuture, Next, NormalHandler};
pub use sink::{Reply, ResponseSink};
