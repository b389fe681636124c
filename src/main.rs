use basic_auth::{
    build_router,
    user::{BcryptPasswordHasher, InMemoryUserRepository, PostgresUserRepository, UserRepository},
    AppConfig, AppState,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basic_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting basic-auth server");

    let config = AppConfig::from_env()?;
    info!(?config, "Loaded configuration");

    // Pick the user store: PostgreSQL when DATABASE_URL is set, memory otherwise
    let user_repository: Arc<dyn UserRepository + Send + Sync> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresUserRepository::new(pool);
            repository.migrate().await?;
            info!("Using PostgreSQL user repository");
            Arc::new(repository)
        }
        None => {
            warn!("DATABASE_URL not set, users will be kept in memory");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let app_state = AppState::new(
        user_repository,
        Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
        config.token_codec(),
    );

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
