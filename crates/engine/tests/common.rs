#![allow(dead_code)]

use engine::{Engine, Event, User};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

/// Low enough to keep debug-build tests fast.
pub const TEST_ITERATIONS: u32 = 1_000;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .password_iterations(TEST_ITERATIONS)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// File-backed database, so the pool hands out several connections.
pub async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .password_iterations(TEST_ITERATIONS)
        .build()
        .await
        .unwrap();

    (engine, path)
}

pub async fn user(engine: &Engine, name: &str) -> User {
    engine
        .register_user(name, &format!("{}@example.com", name.to_lowercase()), "pw")
        .await
        .unwrap()
}

pub async fn event(engine: &Engine, title: &str, max_seats: i32) -> Event {
    engine.create_event(title, None, max_seats).await.unwrap()
}
