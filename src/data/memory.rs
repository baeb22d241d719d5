use crate::domain::blood::{BloodType, InventoryRecord, UpsertOutcome};
use crate::domain::repository::InventoryRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Inventory records keyed by owning bank id.
#[derive(Clone)]
pub struct InMemoryInventoryRepository {
    storage: Arc<RwLock<HashMap<String, InventoryRecord>>>,
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryInventoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn upsert_inventory(&self, record: InventoryRecord) -> Result<UpsertOutcome> {
        let mut storage = self.storage.write().await;
        let outcome = match storage.insert(record.bank_id.clone(), record) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        Ok(outcome)
    }

    async fn find_inventory(&self, bank_id: &str) -> Result<Option<InventoryRecord>> {
        let storage = self.storage.read().await;
        Ok(storage.get(bank_id).cloned())
    }

    async fn find_inventories(&self, bank_ids: &[String]) -> Result<Vec<InventoryRecord>> {
        let storage = self.storage.read().await;
        Ok(bank_ids
            .iter()
            .filter_map(|id| storage.get(id).cloned())
            .collect())
    }

    async fn find_stocking(&self, blood_type: BloodType) -> Result<Vec<InventoryRecord>> {
        let storage = self.storage.read().await;
        Ok(storage
            .values()
            .filter(|r| r.quantities.get(blood_type) > 0)
            .cloned()
            .collect())
    }
}
