use crate::domain::account::{Account, AccountKind};
use crate::domain::error::DomainError;
use crate::domain::repository::AccountRepository;
use crate::domain::search::AccountQuery;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

#[derive(Clone)]
pub struct InMemoryAccountRepository {
    storage: Arc<RwLock<HashMap<String, Account>>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    #[instrument(skip(self, account), fields(account_id = %account.id, kind = %account.kind))]
    async fn insert_account(&self, account: Account) -> Result<()> {
        trace!("Acquiring write lock for account storage");
        let mut storage = self.storage.write().await;

        // Checked under the write lock so two signups cannot both pass.
        let clash = storage.values().find(|existing| {
            existing.kind == account.kind
                && (existing.email == account.email || existing.name == account.name)
        });
        if let Some(existing) = clash {
            let field = if existing.email == account.email {
                "email"
            } else {
                "name"
            };
            warn!(field = field, "Account already exists");
            return Err(DomainError::Conflict(format!(
                "A {} with this {} already exists",
                account.kind, field
            ))
            .into());
        }

        debug!(account_id = %account.id, name = %account.name, "Account saved to memory storage");
        storage.insert(account.id.clone(), account);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        let storage = self.storage.read().await;
        Ok(storage.get(id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_account_by_name(&self, kind: AccountKind, name: &str) -> Result<Option<Account>> {
        let storage = self.storage.read().await;
        let account = storage
            .values()
            .find(|a| a.kind == kind && a.name == name)
            .cloned();
        if account.is_none() {
            trace!(name = name, "Account not found in storage");
        }
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn search_accounts(&self, query: AccountQuery) -> Result<Vec<Account>> {
        let storage = self.storage.read().await;
        let mut accounts: Vec<Account> = storage
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = accounts.len(), "Accounts matched");
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Address;
    use crate::domain::blood::{BloodType, Subdivision};

    fn account(id: &str, kind: AccountKind, name: &str, email: &str, subdivision: &str) -> Account {
        Account {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            number: "9000000000".to_string(),
            address: Address {
                state: "Tripura".to_string(),
                subdivision: subdivision.to_string(),
            },
            blood_type: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let repo = InMemoryAccountRepository::new();
        let bank = account("b-1", AccountKind::Bank, "Khowai Bank", "k@bank.org", "Khowai");

        repo.insert_account(bank.clone()).await.unwrap();

        let found = repo.find_account_by_id("b-1").await.unwrap().unwrap();
        assert_eq!(found.name, "Khowai Bank");
        assert!(repo.find_account_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_within_kind_conflicts() {
        let repo = InMemoryAccountRepository::new();
        repo.insert_account(account("b-1", AccountKind::Bank, "First", "same@bank.org", "Sadar"))
            .await
            .unwrap();

        let err = repo
            .insert_account(account("b-2", AccountKind::Bank, "Second", "same@bank.org", "Sadar"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(msg)) if msg.contains("email")
        ));
    }

    #[tokio::test]
    async fn test_duplicate_name_within_kind_conflicts() {
        let repo = InMemoryAccountRepository::new();
        repo.insert_account(account("b-1", AccountKind::Bank, "Same", "one@bank.org", "Sadar"))
            .await
            .unwrap();

        let err = repo
            .insert_account(account("b-2", AccountKind::Bank, "Same", "two@bank.org", "Sadar"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(msg)) if msg.contains("name")
        ));
    }

    #[tokio::test]
    async fn test_same_email_across_kinds_is_allowed() {
        let repo = InMemoryAccountRepository::new();
        repo.insert_account(account("b-1", AccountKind::Bank, "Shared", "x@y.org", "Sadar"))
            .await
            .unwrap();
        repo.insert_account(account("d-1", AccountKind::Donor, "Shared", "x@y.org", "Sadar"))
            .await
            .unwrap();

        let bank = repo
            .find_account_by_name(AccountKind::Bank, "Shared")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bank.id, "b-1");
    }

    #[tokio::test]
    async fn test_search_filters_and_orders_by_name() {
        let repo = InMemoryAccountRepository::new();
        let mut zeta = account("d-1", AccountKind::Donor, "Zeta", "z@x.org", "Khowai");
        zeta.blood_type = Some(BloodType::APositive);
        let mut alpha = account("d-2", AccountKind::Donor, "Alpha", "a@x.org", "Khowai");
        alpha.blood_type = Some(BloodType::ONegative);
        let mut other = account("d-3", AccountKind::Donor, "Mid", "m@x.org", "Sadar");
        other.blood_type = Some(BloodType::APositive);
        for a in [zeta, alpha, other] {
            repo.insert_account(a).await.unwrap();
        }

        let khowai = repo
            .search_accounts(AccountQuery {
                subdivision: Some(Subdivision::Khowai),
                ..AccountQuery::all(AccountKind::Donor)
            })
            .await
            .unwrap();
        let names: Vec<_> = khowai.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);

        let a_pos = repo
            .search_accounts(AccountQuery {
                blood_type: Some(BloodType::APositive),
                ..AccountQuery::all(AccountKind::Donor)
            })
            .await
            .unwrap();
        assert_eq!(a_pos.len(), 2);

        let banks = repo
            .search_accounts(AccountQuery::all(AccountKind::Bank))
            .await
            .unwrap();
        assert!(banks.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_signups_with_same_email_only_one_wins() {
        let repo = InMemoryAccountRepository::new();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo_clone = repo.clone();
                let a = account(
                    &format!("b-{i}"),
                    AccountKind::Bank,
                    &format!("Bank {i}"),
                    "race@bank.org",
                    "Sadar",
                );
                tokio::spawn(async move { repo_clone.insert_account(a).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}
