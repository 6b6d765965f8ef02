use std::sync::Arc;

use dotenvy::dotenv;

use art_hub_checkout::application::checkout_service::CheckoutSettings;
use art_hub_checkout::config::{Settings, StorageBackend};
use art_hub_checkout::domain::ports::{CartStore, OrderLedger, ProductCatalog};
use art_hub_checkout::gateway::{HmacSha256Signer, PaymentGateway};
use art_hub_checkout::infrastructure::catalog_repo::DieselProductCatalog;
use art_hub_checkout::infrastructure::ledger_repo::DieselOrderLedger;
use art_hub_checkout::infrastructure::local::LocalStore;
use art_hub_checkout::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let gateway = Arc::new(PaymentGateway::new(
        Arc::new(HmacSha256Signer::new(settings.gateway_secret.clone())),
        settings.gateway_key.clone(),
        settings.gateway_checkout_url.clone(),
    ));

    // Storage policy: decided here, once, and nowhere else.
    let (catalog, cart_store, ledger): (
        Arc<dyn ProductCatalog>,
        Arc<dyn CartStore>,
        Arc<dyn OrderLedger>,
    ) = match &settings.storage {
        StorageBackend::Postgres { database_url } => {
            log::info!("storage backend: postgres");
            let pool = create_pool(database_url);
            run_migrations(&pool);
            // Carts are session-scoped and stay in process memory even when
            // the ledger and catalog live in the database.
            let carts = Arc::new(LocalStore::in_memory());
            (
                Arc::new(DieselProductCatalog::new(pool.clone())),
                carts,
                Arc::new(DieselOrderLedger::new(pool)),
            )
        }
        StorageBackend::Local { snapshot_path } => {
            log::info!(
                "storage backend: local ({})",
                snapshot_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "memory only".to_string())
            );
            let store = match snapshot_path {
                Some(path) => Arc::new(LocalStore::open(path.clone())?),
                None => Arc::new(LocalStore::in_memory()),
            };
            (store.clone(), store.clone(), store)
        }
    };

    let state = AppState::new(
        catalog,
        cart_store,
        ledger,
        gateway,
        CheckoutSettings {
            online_discount_percent: settings.online_discount_percent,
            callback_url: settings.callback_url.clone(),
        },
    );

    log::info!(
        "Starting server at http://{}:{}",
        settings.host,
        settings.port
    );

    build_server(state, &settings.host, settings.port)?.await
}
