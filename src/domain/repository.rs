use crate::domain::account::{Account, AccountKind};
use crate::domain::blood::{BloodType, InventoryRecord, UpsertOutcome};
use crate::domain::search::AccountQuery;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Stores a new account. Fails with `DomainError::Conflict` when another
    /// account of the same kind already uses the name or email.
    async fn insert_account(&self, account: Account) -> Result<()>;
    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>>;
    async fn find_account_by_name(&self, kind: AccountKind, name: &str) -> Result<Option<Account>>;
    /// Matching accounts ordered by name.
    async fn search_accounts(&self, query: AccountQuery) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Replaces the whole record for `record.bank_id`, creating it if absent.
    async fn upsert_inventory(&self, record: InventoryRecord) -> Result<UpsertOutcome>;
    async fn find_inventory(&self, bank_id: &str) -> Result<Option<InventoryRecord>>;
    async fn find_inventories(&self, bank_ids: &[String]) -> Result<Vec<InventoryRecord>>;
    /// Records holding a positive quantity of `blood_type`.
    async fn find_stocking(&self, blood_type: BloodType) -> Result<Vec<InventoryRecord>>;
}
