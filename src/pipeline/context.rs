//! Per-request state.
//!
//! A [`RequestContext`] is owned by exactly one in-flight dispatch. Guards
//! enrich it through the typed attachment bag; terminal handlers read from it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use axum::http::{HeaderMap, Method};
use serde_json::{Map, Value};

use crate::routing::matcher::Params;

/// Decoded JSON request body.
pub type JsonBody = Map<String, Value>;

/// Typed key into the attachment bag.
///
/// Keys can only be minted inside this crate, so the set of keys is fixed and
/// listed in one place per module that owns the attached type (for example
/// `hubs::keys`).
pub struct AttachmentKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AttachmentKey<T> {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for AttachmentKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttachmentKey<T> {}

impl<T> fmt::Debug for AttachmentKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AttachmentKey").field(&self.name).finish()
    }
}

/// Values passed from guards to later handlers.
#[derive(Default)]
pub struct Attachments {
    slots: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Attachments {
    pub fn insert<T: Any + Send + Sync>(&mut self, key: AttachmentKey<T>, value: T) {
        self.slots.insert(key.name, Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self, key: AttachmentKey<T>) -> Option<&T> {
        self.slots.get(key.name).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn remove<T: Any + Send + Sync>(&mut self, key: AttachmentKey<T>) -> Option<T> {
        let boxed = self.slots.remove(key.name)?;
        boxed.downcast::<T>().ok().map(|b| *b)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}

/// Mutable state for one request.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Filled by the dispatcher from the matched route.
    pub params: Params,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    /// `None` when the request carried no body.
    pub body: Option<JsonBody>,
    pub request_id: String,
    attachments: Attachments,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: None,
            request_id: String::from("unknown"),
            attachments: Attachments::default(),
        }
    }

    pub fn with_body(mut self, body: Option<JsonBody>) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn attach<T: Any + Send + Sync>(&mut self, key: AttachmentKey<T>, value: T) {
        self.attachments.insert(key, value);
    }

    pub fn attachment<T: Any + Send + Sync>(&self, key: AttachmentKey<T>) -> Option<&T> {
        self.attachments.get(key)
    }

    pub fn take_attachment<T: Any + Send + Sync>(&mut self, key: AttachmentKey<T>) -> Option<T> {
        self.attachments.remove(key)
    }

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: AttachmentKey<u32> = AttachmentKey::new("count");
    const LABEL: AttachmentKey<String> = AttachmentKey::new("label");

    #[test]
    fn test_attachments_are_typed() {
        let mut ctx = RequestContext::new(Method::GET, "/");
        ctx.attach(COUNT, 3);
        ctx.attach(LABEL, "hub".to_string());

        assert_eq!(ctx.attachment(COUNT), Some(&3));
        assert_eq!(ctx.attachment(LABEL).map(String::as_str), Some("hub"));
        assert_eq!(ctx.attachments().len(), 2);

        assert_eq!(ctx.take_attachment(COUNT), Some(3));
        assert_eq!(ctx.attachment(COUNT), None);
    }

    #[test]
    fn test_key_type_mismatch_reads_none() {
        let mut ctx = RequestContext::new(Method::GET, "/");
        ctx.attach(COUNT, 1);

        let wrong: AttachmentKey<String> = AttachmentKey::new("count");
        assert!(ctx.attachment(wrong).is_none());
    }

    #[test]
    fn test_param_lookup() {
        let mut ctx = RequestContext::new(Method::GET, "/hubs/5");
        ctx.params.insert("id".into(), "5".into());
        assert_eq!(ctx.param("id"), Some("5"));
        assert_eq!(ctx.param("name"), None);
    }
}
