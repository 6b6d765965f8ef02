pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::cart_service::CartService;
use application::checkout_service::{CheckoutService, CheckoutSettings};
use domain::ports::{CartStore, OrderLedger, ProductCatalog};
use gateway::PaymentGateway;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Application context built once at startup and handed to every handler.
/// The storage backend behind `catalog`/`carts`/`ledger` was chosen by the
/// startup policy, never by the business logic.
#[derive(Clone)]
pub struct AppState {
    pub carts: CartService,
    pub checkout: CheckoutService,
    pub catalog: Arc<dyn ProductCatalog>,
    pub ledger: Arc<dyn OrderLedger>,
    pub gateway: Arc<PaymentGateway>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        cart_store: Arc<dyn CartStore>,
        ledger: Arc<dyn OrderLedger>,
        gateway: Arc<PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        let carts = CartService::new(cart_store, catalog.clone());
        let checkout = CheckoutService::new(
            carts.clone(),
            catalog.clone(),
            ledger.clone(),
            gateway.clone(),
            settings,
        );
        Self {
            carts,
            checkout,
            catalog,
            ledger,
            gateway,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::cart::view_cart,
        handlers::cart::add_item,
        handlers::cart::update_quantity,
        handlers::cart::remove_item,
        handlers::checkout::quote,
        handlers::checkout::place_cash_order,
        handlers::checkout::initiate_online_payment,
        handlers::checkout::payment_callback,
        handlers::payment::initiate,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_status,
    ),
    components(schemas(
        handlers::products::CreateProductRequest,
        handlers::products::ProductResponse,
        handlers::cart::AddItemRequest,
        handlers::cart::UpdateQuantityRequest,
        handlers::cart::CartLineResponse,
        handlers::cart::CartResponse,
        handlers::checkout::QuoteResponse,
        handlers::checkout::CustomerRequest,
        handlers::checkout::OnlineCheckoutResponse,
        handlers::payment::InitiatePaymentRequest,
        handlers::payment::InitiatePaymentResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
        handlers::orders::UpdateStatusRequest,
    ))
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/products")
                    .route("", web::post().to(handlers::products::create_product))
                    .route("", web::get().to(handlers::products::list_products))
                    .route("/{id}", web::get().to(handlers::products::get_product)),
            )
            .service(
                web::scope("/cart/{shopper_id}")
                    .route("", web::get().to(handlers::cart::view_cart))
                    .route("/items", web::post().to(handlers::cart::add_item))
                    .route(
                        "/items/{product_id}",
                        web::put().to(handlers::cart::update_quantity),
                    )
                    .route(
                        "/items/{product_id}",
                        web::delete().to(handlers::cart::remove_item),
                    ),
            )
            .service(
                web::scope("/checkout")
                    .route(
                        "/callback",
                        web::get().to(handlers::checkout::payment_callback),
                    )
                    .route(
                        "/{shopper_id}/quote",
                        web::get().to(handlers::checkout::quote),
                    )
                    .route(
                        "/{shopper_id}/cash",
                        web::post().to(handlers::checkout::place_cash_order),
                    )
                    .route(
                        "/{shopper_id}/online",
                        web::post().to(handlers::checkout::initiate_online_payment),
                    ),
            )
            .service(
                web::scope("/api/payment")
                    .route("/initiate", web::post().to(handlers::payment::initiate)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route(
                        "/{id}/status",
                        web::put().to(handlers::orders::update_status),
                    ),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
