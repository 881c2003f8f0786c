use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "expenseflow={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    tracing::info!("Initializing database...");
    let db = parse_database(&settings.server.database).await?;

    let mut builder = engine::Engine::builder().database(db);
    if let Some(base_url) = settings.rates.and_then(|rates| rates.base_url) {
        tracing::info!("Using rate provider at {base_url}");
        builder = builder.rate_source(Box::new(engine::Frankfurter::with_base_url(base_url)?));
    }
    let engine = builder.build()?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(engine, Arc::new(engine::MockExtractor), listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
