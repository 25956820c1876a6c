use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use std::str::FromStr;
use tracing::debug;

use super::{CacheStore, StoreError};
use crate::config::DatabaseConfig;
use crate::model::{Location, WeatherPayload, WeatherSnapshot};

/// SQLite-backed cache.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let db_path = &config.path;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database. A single connection, since every SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the schema if it doesn't exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS location (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                country_code TEXT NOT NULL,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                UNIQUE(city, country_code)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weather (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_id INTEGER NOT NULL,
                dt INTEGER NOT NULL,
                data TEXT NOT NULL,
                UNIQUE(location_id, dt),
                FOREIGN KEY (location_id) REFERENCES location(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn location_from_row(row: &SqliteRow) -> Result<Location, sqlx::Error> {
    Ok(Location {
        id: row.try_get("id")?,
        city: row.try_get("city")?,
        country_code: row.try_get("country_code")?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
    })
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn find_location(
        &self,
        city: &str,
        country_code: &str,
    ) -> Result<Option<Location>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, city, country_code, lat, lon
            FROM location
            WHERE city = ? AND country_code = ?
            "#,
        )
        .bind(city)
        .bind(country_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(location_from_row).transpose()?)
    }

    async fn insert_location(
        &self,
        city: &str,
        country_code: &str,
        lat: f64,
        lon: f64,
    ) -> Result<Location, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO location (city, country_code, lat, lon)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(city, country_code) DO NOTHING
            "#,
        )
        .bind(city)
        .bind(country_code)
        .bind(lat)
        .bind(lon)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            debug!(city, country_code, "location already cached");
        }

        self.find_location(city, country_code)
            .await?
            .ok_or_else(|| StoreError::Missing {
                city: city.to_string(),
                country_code: country_code.to_string(),
            })
    }

    async fn find_weather(
        &self,
        location_id: i64,
        dt: i64,
    ) -> Result<Option<WeatherPayload>, StoreError> {
        let data: Option<String> =
            sqlx::query_scalar("SELECT data FROM weather WHERE location_id = ? AND dt = ?")
                .bind(location_id)
                .bind(dt)
                .fetch_optional(&self.pool)
                .await?;

        Ok(data.map(|raw| serde_json::from_str(&raw)).transpose()?)
    }

    async fn insert_weather_batch(
        &self,
        location_id: i64,
        entries: &[WeatherSnapshot],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO weather (location_id, dt, data)
                VALUES (?, ?, ?)
                ON CONFLICT(location_id, dt) DO NOTHING
                "#,
            )
            .bind(location_id)
            .bind(entry.dt)
            .bind(serde_json::to_string(&entry.data)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
