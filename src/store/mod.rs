//! Persistence collaborator for hubs and their messages.
//!
//! # Responsibilities
//! - Define the record types and the async store interface
//! - Keep "absent" (`None` / count 0) distinct from failure (`StoreError`)
//!
//! # Design Decisions
//! - The dispatcher never sees this module; only guards and terminal handlers do
//! - The trait is object-safe so handlers hold `Arc<dyn HubStore>`

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;

pub type HubId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewHub {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HubPatch {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub hub_id: HubId,
    pub sender: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMessage {
    pub sender: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// Listing options, usually read from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubFilter {
    pub sort_by: SortField,
    pub sort_dir: SortDir,
    /// `None` returns every hub.
    pub limit: Option<usize>,
    /// 1-based page, only meaningful with a limit.
    pub page: usize,
}

impl Default for HubFilter {
    fn default() -> Self {
        Self {
            sort_by: SortField::Id,
            sort_dir: SortDir::Asc,
            limit: None,
            page: 1,
        }
    }
}

impl HubFilter {
    /// Read `sortby`, `sortdir`, `limit` and `page`. Unknown or malformed
    /// values fall back to the defaults.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let mut filter = Self::default();
        if let Some(field) = query.get("sortby") {
            filter.sort_by = match field.as_str() {
                "name" => SortField::Name,
                _ => SortField::Id,
            };
        }
        if let Some(dir) = query.get("sortdir") {
            filter.sort_dir = if dir.eq_ignore_ascii_case("desc") {
                SortDir::Desc
            } else {
                SortDir::Asc
            };
        }
        filter.limit = query
            .get("limit")
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0);
        filter.page = query
            .get("page")
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(1);
        filter
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violated: {0}")]
    Constraint(String),
}

#[async_trait]
pub trait HubStore: Send + Sync {
    async fn find(&self, filter: &HubFilter) -> Result<Vec<Hub>, StoreError>;

    async fn find_by_id(&self, id: HubId) -> Result<Option<Hub>, StoreError>;

    async fn add(&self, hub: NewHub) -> Result<Hub, StoreError>;

    async fn update(&self, id: HubId, patch: HubPatch) -> Result<Option<Hub>, StoreError>;

    /// Number of hubs removed (0 or 1).
    async fn remove(&self, id: HubId) -> Result<u64, StoreError>;

    /// Messages belonging to a hub, oldest first.
    async fn find_related(&self, id: HubId) -> Result<Vec<Message>, StoreError>;

    async fn add_message(&self, hub_id: HubId, message: NewMessage) -> Result<Message, StoreError>;
}
