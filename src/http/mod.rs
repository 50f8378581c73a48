//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, tower-http layers: request id, trace, timeout, headers)
//!     → request.rs (bounded body read, JSON object decode, query parse)
//!     → pipeline::Dispatcher (spawned; writes through a ResponseSink)
//!     → response.rs (Reply → status + JSON body)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - One axum fallback carries every request; routing lives in the route table
//! - Malformed bodies are rejected here and never reach the dispatcher
//! - The dispatch task outlives a disconnected client; its write is dropped

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestRejection, UuidRequestId, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
