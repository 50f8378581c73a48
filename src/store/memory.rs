//! In-memory store.
//!
//! Used by the binary and the tests. Ids start at 1 and are never reused.
//! Removing a hub removes its messages.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{
    Hub, HubFilter, HubId, HubPatch, HubStore, Message, NewHub, NewMessage, SortDir, SortField,
    StoreError,
};

#[derive(Debug, Default)]
struct Tables {
    hubs: BTreeMap<HubId, Hub>,
    messages: BTreeMap<u64, Message>,
    next_hub_id: HubId,
    next_message_id: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with hubs named `names`, ids 1..=n.
    pub fn with_hubs<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tables = Tables::default();
        for name in names {
            tables.next_hub_id += 1;
            let id = tables.next_hub_id;
            tables.hubs.insert(
                id,
                Hub {
                    id,
                    name: name.into(),
                },
            );
        }
        Self {
            tables: RwLock::new(tables),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl HubStore for MemoryStore {
    async fn find(&self, filter: &HubFilter) -> Result<Vec<Hub>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut hubs: Vec<Hub> = tables.hubs.values().cloned().collect();

        if filter.sort_by == SortField::Name {
            hubs.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        }
        if filter.sort_dir == SortDir::Desc {
            hubs.reverse();
        }
        if let Some(limit) = filter.limit {
            let offset = limit.saturating_mul(filter.page.saturating_sub(1));
            hubs = hubs.into_iter().skip(offset).take(limit).collect();
        }
        Ok(hubs)
    }

    async fn find_by_id(&self, id: HubId) -> Result<Option<Hub>, StoreError> {
        self.check()?;
        Ok(self.tables.read().await.hubs.get(&id).cloned())
    }

    async fn add(&self, hub: NewHub) -> Result<Hub, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        tables.next_hub_id += 1;
        let stored = Hub {
            id: tables.next_hub_id,
            name: hub.name,
        };
        tables.hubs.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: HubId, patch: HubPatch) -> Result<Option<Hub>, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(hub) = tables.hubs.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            hub.name = name;
        }
        Ok(Some(hub.clone()))
    }

    async fn remove(&self, id: HubId) -> Result<u64, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.hubs.remove(&id).is_none() {
            return Ok(0);
        }
        tables.messages.retain(|_, m| m.hub_id != id);
        Ok(1)
    }

    async fn find_related(&self, id: HubId) -> Result<Vec<Message>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .values()
            .filter(|m| m.hub_id == id)
            .cloned()
            .collect())
    }

    async fn add_message(&self, hub_id: HubId, message: NewMessage) -> Result<Message, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if !tables.hubs.contains_key(&hub_id) {
            return Err(StoreError::Constraint(format!("hub {hub_id} does not exist")));
        }
        tables.next_message_id += 1;
        let stored = Message {
            id: tables.next_message_id,
            hub_id,
            sender: message.sender,
            text: message.text,
        };
        tables.messages.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
