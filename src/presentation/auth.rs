use crate::domain::account::{AccountKind, BankSignup, DonorSignup, PublicAccount, SigninRequest};
use crate::presentation::handlers::{ApiError, AppState};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: PublicAccount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SigninResponse {
    pub message: String,
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

#[instrument(skip(state, req), fields(name = %req.name))]
pub async fn bank_signup(
    state: web::Data<AppState>,
    req: web::Json<BankSignup>,
) -> Result<HttpResponse, ApiError> {
    info!(email = %req.email, "Blood bank signup request received");

    let user = state
        .auth_service
        .signup_bank(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sign up blood bank");
            ApiError::from(e)
        })?;

    info!(account_id = %user.id, "Blood bank signed up");
    Ok(HttpResponse::Created().json(SignupResponse {
        message: "Signup successful".to_string(),
        user,
    }))
}

#[instrument(skip(state, req), fields(name = %req.name))]
pub async fn donor_signup(
    state: web::Data<AppState>,
    req: web::Json<DonorSignup>,
) -> Result<HttpResponse, ApiError> {
    info!(email = %req.email, "Donor signup request received");

    let user = state
        .auth_service
        .signup_donor(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to sign up donor");
            ApiError::from(e)
        })?;

    info!(account_id = %user.id, "Donor signed up");
    Ok(HttpResponse::Created().json(SignupResponse {
        message: "Signup successful".to_string(),
        user,
    }))
}

async fn signin(
    state: web::Data<AppState>,
    kind: AccountKind,
    req: SigninRequest,
) -> Result<HttpResponse, ApiError> {
    let token = state.auth_service.signin(kind, req).await.map_err(|e| {
        error!(error = %e, "Failed to sign in");
        ApiError::from(e)
    })?;

    info!("Signin successful");
    Ok(HttpResponse::Ok().json(SigninResponse {
        message: "Signin successful".to_string(),
        token,
        expires_in: state.auth_service.keys().ttl().num_seconds(),
    }))
}

#[instrument(skip(state, req), fields(name = %req.name))]
pub async fn bank_signin(
    state: web::Data<AppState>,
    req: web::Json<SigninRequest>,
) -> Result<HttpResponse, ApiError> {
    signin(state, AccountKind::Bank, req.into_inner()).await
}

#[instrument(skip(state, req), fields(name = %req.name))]
pub async fn donor_signin(
    state: web::Data<AppState>,
    req: web::Json<SigninRequest>,
) -> Result<HttpResponse, ApiError> {
    signin(state, AccountKind::Donor, req.into_inner()).await
}
