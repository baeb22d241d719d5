use crate::domain::account::AccountKind;
use crate::domain::repository::{AccountRepository, InventoryRepository};
use crate::domain::search::{AccountQuery, BankSummary, DonorSummary, SearchFilter};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Filtered lookups over donors and banks. A query with no matches yields
/// an empty list, never an error.
pub struct SearchService<A, I>
where
    A: AccountRepository + ?Sized,
    I: InventoryRepository + ?Sized,
{
    accounts: Arc<A>,
    inventory: Arc<I>,
}

impl<A, I> SearchService<A, I>
where
    A: AccountRepository + ?Sized,
    I: InventoryRepository + ?Sized,
{
    pub fn new(accounts: Arc<A>, inventory: Arc<I>) -> Self {
        Self { accounts, inventory }
    }

    #[instrument(skip(self))]
    pub async fn find_donors(&self, filter: &SearchFilter) -> Result<Vec<DonorSummary>> {
        let query = AccountQuery {
            kind: AccountKind::Donor,
            subdivision: filter.subdivision,
            blood_type: filter.blood_type,
        };
        let donors: Vec<DonorSummary> = self
            .accounts
            .search_accounts(query)
            .await?
            .iter()
            .map(DonorSummary::from)
            .collect();
        debug!(count = donors.len(), "Donor search finished");
        Ok(donors)
    }

    /// Banks in the sub-division; with a blood type, only banks that
    /// currently hold a positive quantity of it.
    #[instrument(skip(self))]
    pub async fn find_banks(&self, filter: &SearchFilter) -> Result<Vec<BankSummary>> {
        let query = AccountQuery {
            kind: AccountKind::Bank,
            subdivision: filter.subdivision,
            blood_type: None,
        };
        let mut banks = self.accounts.search_accounts(query).await?;

        if let Some(blood_type) = filter.blood_type {
            let stocking: HashSet<String> = self
                .inventory
                .find_stocking(blood_type)
                .await?
                .into_iter()
                .map(|r| r.bank_id)
                .collect();
            banks.retain(|b| stocking.contains(&b.id));
        }

        let ids: Vec<String> = banks.iter().map(|b| b.id.clone()).collect();
        let available: HashMap<String, _> = self
            .inventory
            .find_inventories(&ids)
            .await?
            .into_iter()
            .map(|r| (r.bank_id, r.quantities.available()))
            .collect();

        let summaries: Vec<BankSummary> = banks
            .iter()
            .map(|b| BankSummary::new(b, available.get(&b.id).cloned().unwrap_or_default()))
            .collect();
        debug!(count = summaries.len(), "Bank search finished");
        Ok(summaries)
    }
}
