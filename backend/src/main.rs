use std::sync::Arc;
use backend::{
    build_rocket,
    config::AppConfig,
    queries::PgStore,
    routes::AppState,
    session::SessionGuard,
};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

async fn run_session_cleanup(sessions: Arc<SessionGuard>) {
    let mut interval = interval(Duration::from_secs(60));
    info!("🧹 Session cleanup started");

    loop {
        interval.tick().await;
        let removed = sessions.prune_expired();
        if removed > 0 {
            debug!("Removed {} expired voter sessions", removed);
        }
    }
}

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🗳️ Starting ballot box server");

    let config = AppConfig::from_lookup(|key| secret_store.get(key));

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let state = AppState::new(Arc::new(PgStore::new(pool)), config);
    tokio::spawn(run_session_cleanup(state.sessions.clone()));

    Ok(build_rocket(state).into())
}
