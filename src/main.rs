use std::{net::SocketAddr, sync::Arc, time::Duration};

use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canteen_backend::{
    app_router,
    config::{AppConfig, PaymentMode},
    handlers::rate_limit::RateLimiter,
    services::{
        clock::SystemClock,
        payments::{PaymentProvider, StripeProvider},
    },
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,canteen_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Invalid configuration");

    // Connect to database
    tracing::info!("Connecting to database...");
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let payments: Option<Arc<dyn PaymentProvider>> = match &config.payment_mode {
        PaymentMode::Simulated => {
            tracing::warn!("PAYMENT_MODE=simulated: orders are marked paid without payment");
            None
        }
        PaymentMode::Stripe {
            secret_key,
            webhook_secret,
        } => {
            tracing::info!(currency = %config.currency, "Stripe checkout enabled");
            Some(Arc::new(StripeProvider::new(
                secret_key.clone(),
                webhook_secret.clone(),
                config.public_base_url.clone(),
                config.currency.clone(),
            )))
        }
    };

    let bind_addr = config.bind_addr;
    let rate_limiter = RateLimiter::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    );

    // Periodic rate limiter cleanup (every 5 minutes)
    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup().await;
        }
    });

    let state = AppState {
        db,
        config: Arc::new(config),
        clock: Arc::new(SystemClock),
        payments,
        rate_limiter,
    };

    let app = app_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
