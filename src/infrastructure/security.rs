use crate::domain::account::AccountKind;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

// Argon2 parameters for 50-150ms target latency
const ARGON2_M_COST: u32 = 19456; // 19 MB
const ARGON2_T_COST: u32 = 2; // 2 iterations
const ARGON2_P_COST: u32 = 1; // 1 parallelism

const TOKEN_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub name: String,
    pub role: AccountKind,
    pub exp: i64,
    pub iat: i64,
}

fn argon2() -> Result<Argon2<'static>, argon2::password_hash::Error> {
    let params = argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(argon2::password_hash::Error::from)?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2()?.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match argon2()?.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn generate_token(
    account_id: &str,
    name: &str,
    role: AccountKind,
    secret: &str,
    ttl: Duration,
) -> Result<String, JwtError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: account_id.to_string(),
        name: name.to_string(),
        role,
        exp: now + ttl.num_seconds(),
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = TOKEN_LEEWAY_SECS;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// Signing material for access tokens.
///
/// Tokens are always signed with the current secret. Verification also
/// accepts the previous secrets so a rotation does not log everyone out.
#[derive(Clone)]
pub struct TokenKeys {
    current: String,
    previous: Vec<String>,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(current: impl Into<String>, previous: Vec<String>, ttl: Duration) -> Self {
        Self {
            current: current.into(),
            previous,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, account_id: &str, name: &str, role: AccountKind) -> Result<String, JwtError> {
        generate_token(account_id, name, role, &self.current, self.ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut last_err = JwtError::from(JwtErrorKind::InvalidSignature);
        for secret in std::iter::once(&self.current).chain(self.previous.iter()) {
            match validate_token(token, secret) {
                Ok(claims) => return Ok(claims),
                Err(e) if matches!(e.kind(), JwtErrorKind::InvalidSignature) => last_err = e,
                Err(e) => return Err(e),
            }
        }
        Err(last_err)
    }
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("current", &"<redacted>")
            .field("previous", &self.previous.len())
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}
