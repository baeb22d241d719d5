use crate::application::auth_service::AuthService;
use crate::application::inventory_service::InventoryService;
use crate::application::search_service::SearchService;
use crate::domain::account::AccountKind;
use crate::domain::blood::{QuantitiesInput, UpsertOutcome};
use crate::domain::error::DomainError;
use crate::domain::repository::{AccountRepository, InventoryRepository};
use crate::domain::search::{BanksResponse, DonorsResponse, SearchFilter, SearchRequest};
use crate::infrastructure::security::TokenKeys;
use crate::presentation::middleware::{AuthRejection, AuthenticatedUser};
use actix_web::{FromRequest, HttpMessage, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub struct AppState {
    pub auth_service: AuthService<dyn AccountRepository>,
    pub inventory_service: InventoryService<dyn AccountRepository, dyn InventoryRepository>,
    pub search_service: SearchService<dyn AccountRepository, dyn InventoryRepository>,
    pub region_state: String,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        inventory: Arc<dyn InventoryRepository>,
        keys: TokenKeys,
        region_state: impl Into<String>,
    ) -> Self {
        Self {
            auth_service: AuthService::new(accounts.clone(), keys),
            inventory_service: InventoryService::new(accounts.clone(), inventory.clone()),
            search_service: SearchService::new(accounts, inventory),
            region_state: region_state.into(),
        }
    }
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: serde_json::Value,
}

const INTERNAL_MESSAGE: &str = "An error occurred while processing your request";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Store or infrastructure failure. The detail is logged, never sent.
    #[error("Internal error")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        let message = match self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => {
                warn!(error = %error_msg, status = %status, "Request rejected");
                msg.as_str()
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, status = %status, "Internal error");
                INTERNAL_MESSAGE
            }
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: error_msg,
            details: serde_json::json!({ "message": message }),
        })
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            DomainError::Forbidden(msg) => ApiError::Forbidden(msg),
            DomainError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(domain) => ApiError::from(domain.clone()),
            None => ApiError::Internal(format!("{:#}", err)),
        }
    }
}

impl AuthenticatedUser {
    pub fn require(&self, kind: AccountKind) -> Result<(), ApiError> {
        if self.kind != kind {
            warn!(account_id = %self.id, kind = %self.kind, required = %kind, "Wrong account kind");
            return Err(ApiError::Forbidden(format!("Only a {} account may do this", kind)));
        }
        Ok(())
    }
}

// AuthenticatedUser extractor
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let extensions = req.extensions();
        let result = match (
            extensions.get::<AuthenticatedUser>(),
            extensions.get::<AuthRejection>(),
        ) {
            (Some(user), _) => Ok(user.clone()),
            (None, Some(rejection)) => Err(ApiError::Unauthorized(rejection.0.clone())),
            (None, None) => Err(ApiError::Unauthorized(
                "Missing authorization token".to_string(),
            )),
        };
        Box::pin(async move { result })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    region: String,
    timestamp: String,
}

#[instrument(skip(state))]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    info!("Health check requested");
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        region: state.region_state.clone(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[instrument(skip(state, req))]
pub async fn find_banks(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let filter = SearchFilter::try_from(req.into_inner())?;
    info!(subdivision = ?filter.subdivision, blood_type = ?filter.blood_type, "Searching banks");

    let banks = state.search_service.find_banks(&filter).await.map_err(|e| {
        error!(error = %e, "Bank search failed");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(BanksResponse { banks }))
}

#[instrument(skip(state, req))]
pub async fn find_donors(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let filter = SearchFilter::try_from(req.into_inner())?;
    info!(subdivision = ?filter.subdivision, blood_type = ?filter.blood_type, "Searching donors");

    let donors = state.search_service.find_donors(&filter).await.map_err(|e| {
        error!(error = %e, "Donor search failed");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(DonorsResponse { donors }))
}

#[instrument(skip(state, user, req), fields(bank_id = %user.id))]
pub async fn add_bloods(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<QuantitiesInput>,
) -> Result<HttpResponse, ApiError> {
    user.require(AccountKind::Bank)?;
    info!("Storing blood quantities");

    let outcome = state
        .inventory_service
        .upsert(&user.id, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store blood quantities");
            ApiError::from(e)
        })?;

    let response = match outcome {
        UpsertOutcome::Created => HttpResponse::Created().json(MessageResponse {
            message: "Blood quantities added successfully.".to_string(),
        }),
        UpsertOutcome::Updated => HttpResponse::Ok().json(MessageResponse {
            message: "Blood quantities updated successfully.".to_string(),
        }),
    };
    Ok(response)
}

#[instrument(skip(state, user), fields(bank_id = %user.id))]
pub async fn get_inventory(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    user.require(AccountKind::Bank)?;

    let record = state.inventory_service.get(&user.id).await.map_err(|e| {
        warn!(error = %e, "Failed to load blood quantities");
        ApiError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(record))
}
