use crate::domain::account::{
    Account, AccountKind, Address, BankSignup, DonorSignup, PublicAccount, SigninRequest,
    normalize_email,
};
use crate::domain::error::DomainError;
use crate::domain::repository::AccountRepository;
use crate::infrastructure::security::{TokenKeys, hash_password, verify_password};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid name or password";

pub struct AuthService<R: AccountRepository + ?Sized> {
    accounts: Arc<R>,
    keys: TokenKeys,
}

impl<R: AccountRepository + ?Sized> AuthService<R> {
    pub fn new(accounts: Arc<R>, keys: TokenKeys) -> Self {
        Self { accounts, keys }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    #[instrument(skip(self, req), fields(name = %req.name, email = %req.email))]
    pub async fn signup_bank(&self, req: BankSignup) -> Result<PublicAccount> {
        trace!("Starting blood bank signup");
        req.validate()?;

        let account = Account {
            id: Uuid::new_v4().to_string(),
            kind: AccountKind::Bank,
            password_hash: self.hash(&req.password)?,
            name: req.name,
            email: normalize_email(&req.email),
            number: req.number,
            address: Address {
                state: req.state,
                subdivision: req.district,
            },
            blood_type: None,
        };
        self.store(account).await
    }

    #[instrument(skip(self, req), fields(name = %req.name, email = %req.email))]
    pub async fn signup_donor(&self, req: DonorSignup) -> Result<PublicAccount> {
        trace!("Starting donor signup");
        let (subdivision, blood_type) = req.validate()?;

        let account = Account {
            id: Uuid::new_v4().to_string(),
            kind: AccountKind::Donor,
            password_hash: self.hash(&req.password)?,
            name: req.name,
            email: normalize_email(&req.email),
            number: req.number,
            address: Address {
                state: req.state,
                subdivision: subdivision.as_str().to_string(),
            },
            blood_type: Some(blood_type),
        };
        self.store(account).await
    }

    /// Checks credentials and issues an access token for the account.
    #[instrument(skip(self, req), fields(kind = %kind, name = %req.name))]
    pub async fn signin(&self, kind: AccountKind, req: SigninRequest) -> Result<String> {
        trace!("Starting signin");
        req.validate()?;

        let account = self
            .accounts
            .find_account_by_name(kind, &req.name)
            .await?
            .ok_or_else(|| {
                warn!("Account not found during signin");
                DomainError::Unauthorized(INVALID_CREDENTIALS.to_string())
            })?;

        let is_valid = verify_password(&req.password, &account.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(account_id = %account.id, "Invalid password during signin");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        }

        let token = self
            .keys
            .issue(&account.id, &account.name, account.kind)
            .map_err(|e| {
                error!(error = %e, "Failed to generate token");
                DomainError::Internal(format!("Failed to generate token: {}", e))
            })?;

        info!(account_id = %account.id, "Signin successful");
        Ok(token)
    }

    fn hash(&self, password: &str) -> Result<String> {
        let hash = hash_password(password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;
        Ok(hash)
    }

    async fn store(&self, account: Account) -> Result<PublicAccount> {
        let public = PublicAccount::from(&account);
        debug!(account_id = %account.id, kind = %account.kind, "Saving account to repository");
        self.accounts.insert_account(account).await?;
        info!(account_id = %public.id, "Account created");
        Ok(public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::account_repository::InMemoryAccountRepository;
    use chrono::Duration;

    fn service() -> AuthService<InMemoryAccountRepository> {
        let keys = TokenKeys::new("unit-test-secret-key", Vec::new(), Duration::hours(1));
        AuthService::new(Arc::new(InMemoryAccountRepository::new()), keys)
    }

    fn bank(number: &str) -> BankSignup {
        BankSignup {
            name: "Khowai District Bank".to_string(),
            email: "khowai@bank.org".to_string(),
            password: "s3cret!".to_string(),
            number: number.to_string(),
            state: "Tripura".to_string(),
            district: "Khowai".to_string(),
        }
    }

    fn signin(name: &str, password: &str) -> SigninRequest {
        SigninRequest {
            name: name.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_rejects_nine_digit_phone() {
        let err = service().signup_bank(bank("987654321")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_signup_accepts_ten_digit_phone() {
        let account = service().signup_bank(bank("9876543210")).await.unwrap();
        assert_eq!(account.name, "Khowai District Bank");
        assert_eq!(account.email, "khowai@bank.org");
        assert!(!account.id.is_empty());
    }

    #[tokio::test]
    async fn test_signup_duplicate_is_conflict() {
        let service = service();
        service.signup_bank(bank("9876543210")).await.unwrap();

        let err = service.signup_bank(bank("9876543210")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_signup_email_is_case_insensitive() {
        let service = service();
        let mut first = bank("9876543210");
        first.email = "City@Bank.org".to_string();
        let account = service.signup_bank(first).await.unwrap();
        assert_eq!(account.email, "city@bank.org");

        let mut second = bank("9876543210");
        second.name = "Another Bank".to_string();
        second.email = "city@bank.org".to_string();
        let err = service.signup_bank(second).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_signin_wrong_password_is_unauthorized() {
        let service = service();
        service.signup_bank(bank("9876543210")).await.unwrap();

        let err = service
            .signin(AccountKind::Bank, signin("Khowai District Bank", "wrong-pass"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Unauthorized(msg)) if msg == INVALID_CREDENTIALS
        ));
    }

    #[tokio::test]
    async fn test_signin_unknown_name_is_unauthorized() {
        let err = service()
            .signin(AccountKind::Bank, signin("Nobody Here", "whatever"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Unauthorized(msg)) if msg == INVALID_CREDENTIALS
        ));
    }

    #[tokio::test]
    async fn test_signin_issues_decodable_token() {
        let service = service();
        let account = service.signup_bank(bank("9876543210")).await.unwrap();

        let token = service
            .signin(AccountKind::Bank, signin("Khowai District Bank", "s3cret!"))
            .await
            .unwrap();
        let claims = service.keys().verify(&token).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.name, "Khowai District Bank");
        assert_eq!(claims.role, AccountKind::Bank);
    }

    #[tokio::test]
    async fn test_signin_is_scoped_to_account_kind() {
        let service = service();
        service.signup_bank(bank("9876543210")).await.unwrap();

        let err = service
            .signin(AccountKind::Donor, signin("Khowai District Bank", "s3cret!"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Unauthorized(_))
        ));
    }
}
