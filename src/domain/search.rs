use crate::domain::account::{Account, AccountKind};
use crate::domain::blood::{BloodType, Subdivision};
use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};

/// Search body as sent by the browser. Empty strings mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub subdivision: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub state: Option<String>,
    pub subdivision: Option<Subdivision>,
    pub blood_type: Option<BloodType>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<SearchRequest> for SearchFilter {
    type Error = DomainError;

    fn try_from(req: SearchRequest) -> Result<Self, Self::Error> {
        let subdivision = non_empty(req.subdivision)
            .map(|s| s.parse::<Subdivision>())
            .transpose()?;
        let blood_type = non_empty(req.blood_type)
            .map(|s| s.parse::<BloodType>())
            .transpose()?;
        Ok(Self {
            state: non_empty(req.state),
            subdivision,
            blood_type,
        })
    }
}

impl From<&SearchFilter> for SearchRequest {
    fn from(filter: &SearchFilter) -> Self {
        Self {
            state: filter.state.clone(),
            subdivision: filter.subdivision.map(|s| s.as_str().to_string()),
            blood_type: filter.blood_type.map(|t| t.label().to_string()),
        }
    }
}

/// Predicate over stored accounts. `None` fields match everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountQuery {
    pub kind: AccountKind,
    pub subdivision: Option<Subdivision>,
    pub blood_type: Option<BloodType>,
}

impl AccountQuery {
    pub fn all(kind: AccountKind) -> Self {
        Self {
            kind,
            subdivision: None,
            blood_type: None,
        }
    }

    pub fn matches(&self, account: &Account) -> bool {
        account.kind == self.kind
            && self
                .subdivision
                .is_none_or(|s| account.address.subdivision == s.as_str())
            && self
                .blood_type
                .is_none_or(|t| account.blood_type == Some(t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub number: String,
    pub state: String,
    pub subdivision: String,
    pub blood_type: Option<BloodType>,
}

impl From<&Account> for DonorSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            number: account.number.clone(),
            state: account.address.state.clone(),
            subdivision: account.address.subdivision.clone(),
            blood_type: account.blood_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub number: String,
    pub state: String,
    pub subdivision: String,
    pub available_blood_types: Vec<BloodType>,
}

impl BankSummary {
    pub fn new(account: &Account, available_blood_types: Vec<BloodType>) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            number: account.number.clone(),
            state: account.address.state.clone(),
            subdivision: account.address.subdivision.clone(),
            available_blood_types,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BanksResponse {
    pub banks: Vec<BankSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonorsResponse {
    pub donors: Vec<DonorSummary>,
}
