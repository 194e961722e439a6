use concert_booking_service::adapter::driven::{
    demo_data, InMemorySubscriptionRegistry, MySqlBookingRepository, MySqlCatalogRepository,
    MySqlSeatRepository, MySqlUserRepository, TracingLogger,
};
use concert_booking_service::adapter::driver::{create_router, AppState, Repositories};
use concert_booking_service::adapter::{
    DatabaseConfig, DatabaseMigration, ServerConfig, StorageBackend,
};
use concert_booking_service::domain::port::Logger;

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 設定された保存先のリポジトリ一式を用意する
async fn build_repositories(
    backend: StorageBackend,
) -> Result<Repositories, Box<dyn std::error::Error>> {
    match backend {
        StorageBackend::MySql => {
            let config = DatabaseConfig::from_env()?;
            tracing::info!(host = %config.host, port = config.port, "database configuration loaded");

            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.connection_string())
                .await?;

            DatabaseMigration::new(pool.clone()).run().await?;

            let catalog = Arc::new(MySqlCatalogRepository::new(pool.clone()));
            Ok(Repositories {
                concerts: catalog.clone(),
                performers: catalog,
                seats: Arc::new(MySqlSeatRepository::new(pool.clone())),
                bookings: Arc::new(MySqlBookingRepository::new(pool.clone())),
                users: Arc::new(MySqlUserRepository::new(pool)),
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; bookings are lost on restart");
            let data = demo_data();
            let catalog = Arc::new(data.catalog);
            let inventory = Arc::new(data.inventory);
            Ok(Repositories {
                concerts: catalog.clone(),
                performers: catalog,
                seats: inventory.clone(),
                bookings: inventory,
                users: Arc::new(data.users),
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "concert_booking_service=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_config = ServerConfig::from_env()?;
    let repositories = build_repositories(server_config.storage_backend).await?;

    // 購読レジストリは再起動で失われるプロセス内の状態
    let registry = Arc::new(InMemorySubscriptionRegistry::new());
    let _sweeper = registry.spawn_sweeper(server_config.subscription_sweep_interval);

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new());
    let app_state = AppState::new(
        repositories,
        registry,
        logger,
        server_config.subscription_timeout,
    );

    let app = create_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(server_config.bind_address()).await?;
    tracing::info!(
        address = %server_config.bind_address(),
        backend = ?server_config.storage_backend,
        "concert booking service listening"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
