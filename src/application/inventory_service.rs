use crate::domain::account::AccountKind;
use crate::domain::blood::{BloodQuantities, InventoryRecord, QuantitiesInput, UpsertOutcome};
use crate::domain::error::DomainError;
use crate::domain::repository::{AccountRepository, InventoryRepository};
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct InventoryService<A, I>
where
    A: AccountRepository + ?Sized,
    I: InventoryRepository + ?Sized,
{
    accounts: Arc<A>,
    inventory: Arc<I>,
}

impl<A, I> InventoryService<A, I>
where
    A: AccountRepository + ?Sized,
    I: InventoryRepository + ?Sized,
{
    pub fn new(accounts: Arc<A>, inventory: Arc<I>) -> Self {
        Self { accounts, inventory }
    }

    /// Replaces the bank's whole stock sheet, creating it on first write.
    /// Every quantity must be supplied; nothing is merged with the old record.
    #[instrument(skip(self, input))]
    pub async fn upsert(&self, bank_id: &str, input: QuantitiesInput) -> Result<UpsertOutcome> {
        let quantities = BloodQuantities::try_from(input)?;
        self.require_bank(bank_id).await?;

        let record = InventoryRecord {
            bank_id: bank_id.to_string(),
            quantities,
            last_updated: Utc::now(),
        };
        let outcome = self.inventory.upsert_inventory(record).await?;

        info!(outcome = ?outcome, "Blood quantities stored");
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, bank_id: &str) -> Result<InventoryRecord> {
        self.inventory
            .find_inventory(bank_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound("No blood quantities recorded for this bank".to_string())
                    .into()
            })
    }

    async fn require_bank(&self, bank_id: &str) -> Result<()> {
        match self.accounts.find_account_by_id(bank_id).await? {
            Some(account) if account.kind == AccountKind::Bank => Ok(()),
            Some(_) => {
                warn!("Inventory write for a non-bank account");
                Err(DomainError::Forbidden("Only blood banks hold inventory".to_string()).into())
            }
            None => {
                warn!("Inventory write for an unknown bank");
                Err(DomainError::NotFound(format!("Blood bank not found: {}", bank_id)).into())
            }
        }
    }
}
