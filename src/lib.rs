//! Hub pipeline library: an ordered handler-chain dispatcher with a forward
//! error track, and the hubs API built on it.

pub mod config;
pub mod http;
pub mod hubs;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod security;
pub mod store;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::Dispatcher;
