use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use anyhow::Context;
use bloodlink_api::data::account_repository::InMemoryAccountRepository;
use bloodlink_api::data::memory::InMemoryInventoryRepository;
use bloodlink_api::data::mongo::MongoStore;
use bloodlink_api::domain::repository::{AccountRepository, InventoryRepository};
use bloodlink_api::infrastructure::config::{Config, StorageBackend};
use bloodlink_api::infrastructure::logging::init_logging;
use bloodlink_api::presentation::handlers::AppState;
use bloodlink_api::presentation::middleware::{JwtAuthMiddleware, RequestTracing};
use bloodlink_api::presentation::routes::configure;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(bind = %config.bind_addr, storage = %storage_name(&config.storage), "Configuration loaded");

    let (accounts, inventory) = match &config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory repositories");
            in_memory_repositories()
        }
        StorageBackend::Mongo { uri, database } => {
            let store = MongoStore::connect(uri, database)
                .await
                .context("Failed to connect to MongoDB")?;
            let accounts: Arc<dyn AccountRepository> = Arc::new(store.accounts());
            let inventory: Arc<dyn InventoryRepository> = Arc::new(store.inventories());
            (accounts, inventory)
        }
    };

    let keys = config.token_keys();
    let state = web::Data::new(AppState::new(
        accounts,
        inventory,
        keys.clone(),
        config.region_state.clone(),
    ));
    let cors_origins = config.cors_origins.clone();

    let server = HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(keys.clone()))
            .wrap(cors)
            .wrap(RequestTracing)
            .configure(configure)
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!(
        address = %config.bind_addr,
        routes = %"GET /health, POST /bloodbank/{signup,signin,find-banks,add-bloods}, GET /bloodbank/inventory, POST /blooddonor/{signup,signin,find-donors}",
        "Starting HTTP server"
    );
    server.run().await?;
    Ok(())
}

fn in_memory_repositories() -> (Arc<dyn AccountRepository>, Arc<dyn InventoryRepository>) {
    (
        Arc::new(InMemoryAccountRepository::new()),
        Arc::new(InMemoryInventoryRepository::new()),
    )
}

fn storage_name(storage: &StorageBackend) -> &'static str {
    match storage {
        StorageBackend::Memory => "memory",
        StorageBackend::Mongo { .. } => "mongo",
    }
}
