use crate::domain::blood::{BloodType, Subdivision};
use crate::domain::search::{BankSummary, DonorSummary, SearchFilter};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

/// Transport used by [`SearchView`] to reach the search endpoints.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn find_banks(&self, filter: &SearchFilter) -> Result<Vec<BankSummary>>;
    async fn find_donors(&self, filter: &SearchFilter) -> Result<Vec<DonorSummary>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Donors,
    Banks,
}

/// Results of one refresh. `sequence` is the refresh that produced them,
/// zero before the first one lands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub sequence: u64,
    pub filter: SearchFilter,
    pub donors: Vec<DonorSummary>,
    pub banks: Vec<BankSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visible {
    Donors(Vec<DonorSummary>),
    Banks(Vec<BankSummary>),
}

impl Visible {
    pub fn is_empty(&self) -> bool {
        match self {
            Visible::Donors(d) => d.is_empty(),
            Visible::Banks(b) => b.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The responses replaced the displayed results.
    Applied(u64),
    /// A newer refresh had been issued; the responses were dropped.
    Stale(u64),
}

/// Search screen state: the current filter, which tab is shown, and the
/// latest results.
///
/// Every filter change issues both searches concurrently. Refreshes are
/// numbered when issued, and a response is only displayed if it belongs to
/// the most recently issued refresh, so a slow early request can never
/// overwrite the answer to a later one, even when the later one fails.
pub struct SearchView<C: SearchClient + ?Sized> {
    client: Arc<C>,
    filter: Mutex<SearchFilter>,
    mode: RwLock<DisplayMode>,
    issued: AtomicU64,
    results: RwLock<SearchResults>,
}

impl<C: SearchClient + ?Sized> SearchView<C> {
    pub fn new(client: Arc<C>, state: impl Into<String>) -> Self {
        Self {
            client,
            filter: Mutex::new(SearchFilter {
                state: Some(state.into()),
                ..Default::default()
            }),
            mode: RwLock::new(DisplayMode::default()),
            issued: AtomicU64::new(0),
            results: RwLock::new(SearchResults::default()),
        }
    }

    pub async fn set_subdivision(&self, subdivision: Option<Subdivision>) -> Result<RefreshOutcome> {
        self.update(|f| f.subdivision = subdivision).await
    }

    pub async fn set_blood_type(&self, blood_type: Option<BloodType>) -> Result<RefreshOutcome> {
        self.update(|f| f.blood_type = blood_type).await
    }

    /// Re-issues the searches for the current filter.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        self.update(|_| {}).await
    }

    pub async fn filter(&self) -> SearchFilter {
        self.filter.lock().await.clone()
    }

    pub async fn toggle(&self, mode: DisplayMode) {
        *self.mode.write().await = mode;
    }

    pub async fn mode(&self) -> DisplayMode {
        *self.mode.read().await
    }

    pub async fn results(&self) -> SearchResults {
        self.results.read().await.clone()
    }

    /// Collection for the active tab.
    pub async fn visible(&self) -> Visible {
        let mode = self.mode().await;
        let results = self.results.read().await;
        match mode {
            DisplayMode::Donors => Visible::Donors(results.donors.clone()),
            DisplayMode::Banks => Visible::Banks(results.banks.clone()),
        }
    }

    /// Number of the most recently issued refresh.
    pub fn latest_issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    #[instrument(skip(self, change))]
    async fn update<F>(&self, change: F) -> Result<RefreshOutcome>
    where
        F: FnOnce(&mut SearchFilter),
    {
        // The sequence number is taken while the filter is locked, so
        // issue order and filter order agree.
        let (sequence, filter) = {
            let mut current = self.filter.lock().await;
            change(&mut current);
            let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            (sequence, current.clone())
        };
        debug!(sequence, "Issuing search refresh");

        let (donors, banks) = tokio::try_join!(
            self.client.find_donors(&filter),
            self.client.find_banks(&filter)
        )
        .inspect_err(|e| warn!(sequence, error = %e, "Search refresh failed"))?;

        // Only the most recently issued refresh may be displayed.
        let mut results = self.results.write().await;
        let latest = self.issued.load(Ordering::SeqCst);
        if sequence != latest {
            debug!(sequence, latest, "Discarding stale search results");
            return Ok(RefreshOutcome::Stale(sequence));
        }
        *results = SearchResults {
            sequence,
            filter,
            donors,
            banks,
        };
        Ok(RefreshOutcome::Applied(sequence))
    }
}
