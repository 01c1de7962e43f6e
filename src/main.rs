use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use event_server::config::Config;
use event_server::media::CloudinaryClient;
use event_server::repositories::PgEventRepository;
use event_server::routes::{create_routes, RouteOptions};
use event_server::services::EventService;
use event_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("event_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    if !config.cloudinary.is_configured() {
        tracing::warn!("Cloudinary credentials are not set; image uploads will fail");
    }

    let events = EventService::new(
        Arc::new(PgEventRepository::new(pool)),
        Arc::new(
            CloudinaryClient::new(config.cloudinary.clone())
                .expect("Failed to build media client"),
        ),
    );
    let state = AppState {
        events,
        clock: config.clock,
        upload_dir: config.upload_dir.clone(),
    };

    let app = create_routes(state, RouteOptions::from(&config));

    let addr = config.bind_addr;
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
