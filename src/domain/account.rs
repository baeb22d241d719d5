use crate::domain::blood::{BloodType, Subdivision};
use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Bank,
    Donor,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Bank => "bank",
            AccountKind::Donor => "donor",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub state: String,
    pub subdivision: String,
}

/// Stored account. Holds the password hash, so it is never serialized into a
/// response; use [`PublicAccount`] or the search summaries instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub kind: AccountKind,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub number: String,
    pub address: Address,
    #[serde(default)]
    pub blood_type: Option<BloodType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccount {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub number: String,
    pub state: String,
    pub district: String,
}

impl BankSignup {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_identity(&self.name, &self.email, &self.password, &self.number)?;
        validate_length("state", &self.state, 2, 100)?;
        validate_length("district", &self.district, 2, 100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub number: String,
    pub state: String,
    pub subdivision: String,
    #[serde(rename = "bloodType")]
    pub blood_type: String,
}

impl DonorSignup {
    /// Checks field shapes and resolves the enumerated fields.
    pub fn validate(&self) -> Result<(Subdivision, BloodType), DomainError> {
        validate_identity(&self.name, &self.email, &self.password, &self.number)?;
        validate_length("state", &self.state, 2, 100)?;
        let subdivision = self.subdivision.parse::<Subdivision>()?;
        let blood_type = self.blood_type.parse::<BloodType>()?;
        Ok((subdivision, blood_type))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninRequest {
    pub name: String,
    pub password: String,
}

impl SigninRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_length("name", &self.name, 3, 100)?;
        validate_length("password", &self.password, 3, 100)
    }
}

fn validate_identity(
    name: &str,
    email: &str,
    password: &str,
    number: &str,
) -> Result<(), DomainError> {
    validate_length("name", name, 3, 100)?;
    validate_length("email", email, 3, 100)?;
    validate_email(email)?;
    validate_length("password", password, 3, 100)?;
    validate_phone(number)
}

/// Bounds are inclusive and counted in characters, not bytes.
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let invalid = || DomainError::Validation("email must be a valid email address".to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || domain.starts_with('.')
        || domain.ends_with('.')
        || !domain.contains('.')
    {
        return Err(invalid());
    }
    Ok(())
}

/// Stored form of an email address. Uniqueness is checked on this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_phone(number: &str) -> Result<(), DomainError> {
    if number.len() != 10 || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::Validation(
            "Enter a valid 10-digit phone number".to_string(),
        ));
    }
    Ok(())
}
