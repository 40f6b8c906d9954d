//! Throwaway PostgreSQL databases for integration tests.
//!
//! One container is started per test binary and every [`TestDb`] gets its own database inside
//! it, with migrations applied. Databases are dropped in the background once the handle goes
//! away.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};
use uuid::Uuid;

const DB_USER: &str = "trusioo_test";
const DB_PASSWORD: &str = "trusioo_test_password";
const DB_PREFIX: &str = "trusioo_test_";

static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

static DROP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

/// Only names this module generated may be dropped.
fn is_test_database(name: &str) -> bool {
    name.strip_prefix(DB_PREFIX).is_some_and(|suffix| {
        !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_hexdigit())
    }) && name.len() <= 63
}

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(DB_USER)
        .with_password(DB_PASSWORD)
        .with_db_name("trusioo_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

async fn server_url(database: &str) -> Option<String> {
    let container = POSTGRES_CONTAINER.get()?;
    let port = container.get_host_port_ipv4(5432).await.ok()?;
    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    Some(format!(
        "postgresql://{DB_USER}:{DB_PASSWORD}@{host}:{port}/{database}"
    ))
}

async fn drop_database(name: &str) -> Result<(), sqlx::Error> {
    if !is_test_database(name) {
        return Ok(());
    }

    let Some(url) = server_url("postgres").await else {
        return Ok(());
    };

    let mut conn = PgConnection::connect(&url).await?;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\""))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

async fn start_dropper() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if let Err(err) = drop_database(&name).await {
                eprintln!("Failed to drop test database '{name}': {err}");
            }
        }
    });

    sender
}

/// An isolated, migrated database.
///
/// Services commit normally; isolation comes from each test owning its database.
#[derive(Debug)]
pub struct TestDb {
    pool: PgPool,
    name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = DROP_SENDER.get() {
            let _ = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        DROP_SENDER.get_or_init(start_dropper).await;
        POSTGRES_CONTAINER.get_or_init(start_container).await;

        let name = format!("{DB_PREFIX}{}", Uuid::new_v4().simple());

        let admin_url = server_url("postgres")
            .await
            .expect("PostgreSQL container is not reachable");

        let mut conn = PgConnection::connect(&admin_url)
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let url = server_url(&name)
            .await
            .expect("PostgreSQL container is not reachable");

        let pool = PgPool::connect(&url)
            .await
            .expect("Failed to create pool for test database");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool, name }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_generated_names_are_dropped() {
        assert!(is_test_database("trusioo_test_0a1b2c"));
        assert!(!is_test_database("trusioo_test_"));
        assert!(!is_test_database("trusioo_test"));
        assert!(!is_test_database("postgres"));
        assert!(!is_test_database("trusioo_test_x\"; DROP"));
    }

    #[tokio::test]
    async fn migrations_seed_the_catalog() {
        let db = TestDb::new().await;

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cd_products")
            .fetch_one(db.pool())
            .await
            .expect("Failed to count products");

        assert_eq!(products, 7);
    }
}
