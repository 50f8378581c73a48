//! Handler variants and the continuation signal.
//!
//! Handlers are tagged at registration: a [`NormalHandler`] runs on the
//! normal track, an [`ErrorHandler`] only on the error track. A handler
//! either writes the response through the [`ResponseSink`] or returns a
//! [`Next`] telling the dispatcher where to go.
//!
//! Plain `fn` items with the right signature implement the traits directly:
//!
//! ```rust,ignore
//! fn access_log<'a>(
//!     req: &'a mut RequestContext,
//!     _res: &'a mut ResponseSink,
//! ) -> HandlerFuture<'a> {
//!     Box::pin(async move {
//!         tracing::info!(path = %req.path, "request");
//!         Next::Advance
//!     })
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::pipeline::context::RequestContext;
use crate::pipeline::failure::Failure;
use crate::pipeline::sink::ResponseSink;

/// Continuation returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Continue with the next handler on the current track.
    Advance,
    /// Switch to the error track carrying this value.
    Fail(Failure),
}

pub type HandlerFuture<'a> = BoxFuture<'a, Next>;

/// A handler on the normal track (guards, middleware, terminal handlers).
pub trait NormalHandler: Send + Sync {
    fn run<'a>(&'a self, req: &'a mut RequestContext, res: &'a mut ResponseSink)
        -> HandlerFuture<'a>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A handler on the error track. It may write, resolve with
/// [`Next::Advance`], or re-signal with [`Next::Fail`].
pub trait ErrorHandler: Send + Sync {
    fn handle<'a>(
        &'a self,
        failure: Failure,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> NormalHandler for F
where
    F: for<'a> Fn(&'a mut RequestContext, &'a mut ResponseSink) -> HandlerFuture<'a> + Send + Sync,
{
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        self(req, res)
    }
}

impl<F> ErrorHandler for F
where
    F: for<'a> Fn(Failure, &'a mut RequestContext, &'a mut ResponseSink) -> HandlerFuture<'a>
        + Send
        + Sync,
{
    fn handle<'a>(
        &'a self,
        failure: Failure,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        self(failure, req, res)
    }
}

/// A registered handler, tagged with the track it runs on.
#[derive(Clone)]
pub enum Handler {
    Normal(Arc<dyn NormalHandler>),
    ErrorCapable(Arc<dyn ErrorHandler>),
}

impl Handler {
    pub fn normal(handler: impl NormalHandler + 'static) -> Self {
        Self::Normal(Arc::new(handler))
    }

    pub fn error(handler: impl ErrorHandler + 'static) -> Self {
        Self::ErrorCapable(Arc::new(handler))
    }

    pub fn is_error_capable(&self) -> bool {
        matches!(self, Self::ErrorCapable(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal(h) => h.name(),
            Self::ErrorCapable(h) => h.name(),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal(h) => f.debug_tuple("Normal").field(&h.name()).finish(),
            Self::ErrorCapable(h) => f.debug_tuple("ErrorCapable").field(&h.name()).finish(),
        }
    }
}

/// Ordered chain of normal handlers for one route. The last is terminal.
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Vec<Arc<dyn NormalHandler>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, handler: impl NormalHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn then_arc(mut self, handler: Arc<dyn NormalHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn handlers(&self) -> &[Arc<dyn NormalHandler>] {
        &self.handlers
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}
