use crate::presentation::auth::{bank_signin, bank_signup, donor_signin, donor_signup};
use crate::presentation::handlers::{
    ApiError, add_bloods, find_banks, find_donors, get_inventory, health_check,
};
use actix_web::web;

/// Malformed or incomplete JSON bodies are reported as validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/bloodbank")
                .route("/signup", web::post().to(bank_signup))
                .route("/signin", web::post().to(bank_signin))
                .route("/find-banks", web::post().to(find_banks))
                .route("/add-bloods", web::post().to(add_bloods))
                .route("/inventory", web::get().to(get_inventory)),
        )
        .service(
            web::scope("/blooddonor")
                .route("/signup", web::post().to(donor_signup))
                .route("/signin", web::post().to(donor_signin))
                .route("/find-donors", web::post().to(find_donors)),
        );
}
