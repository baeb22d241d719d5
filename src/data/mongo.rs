use crate::domain::account::{Account, AccountKind};
use crate::domain::blood::{BloodType, InventoryRecord, UpsertOutcome};
use crate::domain::error::DomainError;
use crate::domain::repository::{AccountRepository, InventoryRepository};
use crate::domain::search::AccountQuery;
use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const ACCOUNTS: &str = "accounts";
const INVENTORIES: &str = "inventories";
const DUPLICATE_KEY: i32 = 11000;

/// Pooled MongoDB connection shared by the repositories.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("bloodlink-api".to_string());
        options.max_pool_size = Some(20);
        options.min_pool_size = Some(2);
        options.max_idle_time = Some(Duration::from_secs(300));
        options.connect_timeout = Some(Duration::from_secs(5));
        options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(options)?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;
        info!(database = database, "Connected to MongoDB");

        let store = Self { db };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Unique indexes back the one-account-per-name/email and
    /// one-inventory-per-bank rules.
    async fn ensure_indexes(&self) -> Result<()> {
        let unique = || IndexOptions::builder().unique(true).build();
        let accounts = self.db.collection::<Document>(ACCOUNTS);
        let inventories = self.db.collection::<Document>(INVENTORIES);

        for keys in [
            doc! { "id": 1 },
            doc! { "kind": 1, "email": 1 },
            doc! { "kind": 1, "name": 1 },
        ] {
            let index = IndexModel::builder().keys(keys).options(unique()).build();
            accounts.create_index(index).await?;
        }
        let search_index = IndexModel::builder()
            .keys(doc! { "kind": 1, "address.subdivision": 1 })
            .build();
        accounts.create_index(search_index).await?;

        let bank_index = IndexModel::builder()
            .keys(doc! { "bank_id": 1 })
            .options(unique())
            .build();
        inventories.create_index(bank_index).await?;

        info!("Database indexes ready");
        Ok(())
    }

    pub fn accounts(&self) -> MongoAccountRepository {
        MongoAccountRepository {
            collection: self.db.collection(ACCOUNTS),
        }
    }

    pub fn inventories(&self) -> MongoInventoryRepository {
        MongoInventoryRepository {
            collection: self.db.collection(INVENTORIES),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn account_filter(query: &AccountQuery) -> Document {
    let mut filter = doc! { "kind": query.kind.as_str() };
    if let Some(subdivision) = query.subdivision {
        filter.insert("address.subdivision", subdivision.as_str());
    }
    if let Some(blood_type) = query.blood_type {
        filter.insert("blood_type", blood_type.label());
    }
    filter
}

#[derive(Clone)]
pub struct MongoAccountRepository {
    collection: Collection<Account>,
}

#[async_trait]
impl AccountRepository for MongoAccountRepository {
    #[instrument(skip(self, account), fields(account_id = %account.id, kind = %account.kind))]
    async fn insert_account(&self, account: Account) -> Result<()> {
        match self.collection.insert_one(&account).await {
            Ok(_) => {
                debug!("Account inserted");
                Ok(())
            }
            Err(e) if is_duplicate_key(&e) => {
                warn!("Duplicate account rejected by unique index");
                Err(DomainError::Conflict(format!(
                    "A {} with this name or email already exists",
                    account.kind
                ))
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn find_account_by_name(&self, kind: AccountKind, name: &str) -> Result<Option<Account>> {
        let filter = doc! { "kind": kind.as_str(), "name": name };
        Ok(self.collection.find_one(filter).await?)
    }

    #[instrument(skip(self))]
    async fn search_accounts(&self, query: AccountQuery) -> Result<Vec<Account>> {
        let cursor = self
            .collection
            .find(account_filter(&query))
            .sort(doc! { "name": 1 })
            .await?;
        let accounts: Vec<Account> = cursor.try_collect().await?;
        debug!(count = accounts.len(), "Accounts matched");
        Ok(accounts)
    }
}

#[derive(Clone)]
pub struct MongoInventoryRepository {
    collection: Collection<InventoryRecord>,
}

#[async_trait]
impl InventoryRepository for MongoInventoryRepository {
    #[instrument(skip(self, record), fields(bank_id = %record.bank_id))]
    async fn upsert_inventory(&self, record: InventoryRecord) -> Result<UpsertOutcome> {
        let filter = doc! { "bank_id": record.bank_id.as_str() };
        let result = match self
            .collection
            .replace_one(filter.clone(), &record)
            .upsert(true)
            .await
        {
            Ok(result) => result,
            // A concurrent first write for the same bank won the insert; the
            // record exists now, so the retry replaces it.
            Err(e) if is_duplicate_key(&e) => {
                debug!("Upsert lost insert race, retrying as replace");
                self.collection
                    .replace_one(filter, &record)
                    .upsert(true)
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        Ok(if result.upserted_id.is_some() {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn find_inventory(&self, bank_id: &str) -> Result<Option<InventoryRecord>> {
        Ok(self.collection.find_one(doc! { "bank_id": bank_id }).await?)
    }

    async fn find_inventories(&self, bank_ids: &[String]) -> Result<Vec<InventoryRecord>> {
        if bank_ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "bank_id": { "$in": bank_ids.to_vec() } };
        let cursor = self.collection.find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_stocking(&self, blood_type: BloodType) -> Result<Vec<InventoryRecord>> {
        let mut filter = Document::new();
        filter.insert(
            format!("quantities.{}", blood_type.field_name()),
            doc! { "$gt": 0 },
        );
        let cursor = self.collection.find(filter).await?;
        Ok(cursor.try_collect().await?)
    }
}
