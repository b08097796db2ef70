use academic_api::{config::AppConfig, database, routes::api_router};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logger() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("academic_api=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let config = AppConfig::from_env()?;
    let db = database::connect(&config.database_url).await?;
    database::create_schema(&db).await?;
    if config.seed_demo_data {
        database::seed_demo_data(&db).await?;
    }

    let app = api_router(db);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Listening on /api/v1");
    axum::serve(listener, app).await?;
    Ok(())
}
