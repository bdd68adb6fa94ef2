use axum::Router;
use tempfile::TempDir;

use recall_backend::config::DEFAULT_MAX_UPLOAD_BYTES;
use recall_backend::db::Database;
use recall_backend::routes;
use recall_backend::services::oracle::{MockOracle, ScoringOracle};
use recall_backend::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    _dir: TempDir,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(
        ScoringOracle::Mock(MockOracle::default()),
        DEFAULT_MAX_UPLOAD_BYTES,
    )
    .await
}

pub async fn create_test_app_with(oracle: ScoringOracle, max_upload_bytes: usize) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let db = Database::connect(&url).await.expect("connect test db");
    let state = AppState::new(db.clone(), oracle, max_upload_bytes);

    TestApp {
        router: routes::router(state),
        db,
        _dir: dir,
    }
}
