//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (add the standard security headers when absent)
//! ```
//!
//! Body size limits are enforced by the transport before dispatch
//! (`security.max_body_size`).

pub mod headers;
