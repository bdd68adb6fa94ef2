pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::{Database, DbInitError};
use crate::services::oracle::ScoringOracle;
use crate::state::AppState;

pub async fn create_app() -> Result<axum::Router, DbInitError> {
    let config = Config::from_env();
    let db = Database::connect(&config.database_url).await?;
    let oracle = ScoringOracle::from_env();
    let state = AppState::new(db, oracle, config.max_upload_bytes);

    Ok(routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
