//! The hubs API built on the dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! routes.rs (declare chains, mount under api.mount_path)
//!     → guards.rs (RequireHub attaches the hub, RequireBody checks the body)
//!     → handlers.rs (terminal handlers calling the HubStore)
//! ```

pub mod guards;
pub mod handlers;
pub mod routes;

pub use routes::{app_router, hubs_router};

/// Attachment keys owned by the hubs API.
pub mod keys {
    use crate::pipeline::AttachmentKey;
    use crate::store::Hub;

    /// The hub resolved by [`RequireHub`](super::guards::RequireHub) from `:id`.
    pub const RESOLVED_HUB: AttachmentKey<Hub> = AttachmentKey::new("resolved-resource");
}
