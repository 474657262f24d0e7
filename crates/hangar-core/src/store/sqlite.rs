//! SQLite metadata store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use super::MetadataStore;
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::types::{ExtractedMetadata, NewPhoto, PersistedPhoto, ReviewStatus};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS photos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        category_id INTEGER,
        title TEXT NOT NULL,
        description TEXT,
        aircraft_type TEXT,
        airline TEXT,
        registration TEXT,
        airport TEXT,
        file_path TEXT NOT NULL,
        thumbnail_path TEXT,
        raw_file_path TEXT,
        file_size INTEGER NOT NULL,
        camera_make TEXT,
        camera_model TEXT,
        camera_serial TEXT,
        lens_make TEXT,
        lens_model TEXT,
        focal_length REAL,
        focal_length_35mm INTEGER,
        aperture REAL,
        shutter_speed TEXT,
        iso INTEGER,
        exposure_mode TEXT,
        exposure_program TEXT,
        metering_mode TEXT,
        white_balance TEXT,
        flash TEXT,
        exposure_bias TEXT,
        taken_at TEXT,
        gps_latitude REAL,
        gps_longitude REAL,
        gps_altitude REAL,
        width INTEGER,
        height INTEGER,
        orientation INTEGER,
        color_space TEXT,
        software TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS photo_tags (
        photo_id INTEGER NOT NULL REFERENCES photos(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id),
        PRIMARY KEY (photo_id, tag_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_photo_tags_tag ON photo_tags(tag_id)",
    "CREATE INDEX IF NOT EXISTS idx_photos_user ON photos(user_id)",
];

const INSERT_PHOTO: &str = r#"
    INSERT INTO photos (
        user_id, category_id, title, description,
        aircraft_type, airline, registration, airport,
        file_path, thumbnail_path, raw_file_path, file_size,
        camera_make, camera_model, camera_serial, lens_make, lens_model,
        focal_length, focal_length_35mm, aperture, shutter_speed, iso,
        exposure_mode, exposure_program, metering_mode, white_balance, flash, exposure_bias,
        taken_at, gps_latitude, gps_longitude, gps_altitude,
        width, height, orientation, color_space, software,
        status, created_at
    )
    VALUES (
        ?, ?, ?, ?,
        ?, ?, ?, ?,
        ?, ?, ?, ?,
        ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?,
        ?, ?, ?, ?, ?, ?,
        ?, ?, ?, ?,
        ?, ?, ?, ?, ?,
        ?, ?
    )
    RETURNING id
"#;

const SELECT_PHOTO: &str = r#"
    SELECT
        id, user_id, category_id, title, description,
        aircraft_type, airline, registration, airport,
        file_path, thumbnail_path, raw_file_path, file_size,
        camera_make, camera_model, camera_serial, lens_make, lens_model,
        focal_length, focal_length_35mm, aperture, shutter_speed, iso,
        exposure_mode, exposure_program, metering_mode, white_balance, flash, exposure_bias,
        taken_at, gps_latitude, gps_longitude, gps_altitude,
        width, height, orientation, color_space, software,
        status, created_at
    FROM photos
    WHERE id = ?
"#;

const SELECT_TAG_NAMES: &str = r#"
    SELECT t.name
    FROM tags t
    JOIN photo_tags pt ON pt.tag_id = t.id
    WHERE pt.photo_id = ?
    ORDER BY t.name
"#;

/// Row type for the photos table.
#[derive(Debug, sqlx::FromRow)]
struct PhotoRow {
    id: i64,
    user_id: i64,
    category_id: Option<i64>,
    title: String,
    description: Option<String>,
    aircraft_type: Option<String>,
    airline: Option<String>,
    registration: Option<String>,
    airport: Option<String>,
    file_path: String,
    thumbnail_path: Option<String>,
    raw_file_path: Option<String>,
    file_size: i64,
    camera_make: Option<String>,
    camera_model: Option<String>,
    camera_serial: Option<String>,
    lens_make: Option<String>,
    lens_model: Option<String>,
    focal_length: Option<f64>,
    focal_length_35mm: Option<i64>,
    aperture: Option<f64>,
    shutter_speed: Option<String>,
    iso: Option<i64>,
    exposure_mode: Option<String>,
    exposure_program: Option<String>,
    metering_mode: Option<String>,
    white_balance: Option<String>,
    flash: Option<String>,
    exposure_bias: Option<String>,
    taken_at: Option<NaiveDateTime>,
    gps_latitude: Option<f64>,
    gps_longitude: Option<f64>,
    gps_altitude: Option<f64>,
    width: Option<i64>,
    height: Option<i64>,
    orientation: Option<i64>,
    color_space: Option<String>,
    software: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl PhotoRow {
    fn into_persisted(self, tags: Vec<String>) -> Result<PersistedPhoto, StoreError> {
        let status = ReviewStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown review status: {}", self.status).into(),
            ))
        })?;

        Ok(PersistedPhoto {
            id: self.id,
            photo: NewPhoto {
                user_id: self.user_id,
                category_id: self.category_id,
                title: self.title,
                description: self.description,
                aircraft_type: self.aircraft_type,
                airline: self.airline,
                registration: self.registration,
                airport: self.airport,
                file_path: self.file_path,
                thumbnail_path: self.thumbnail_path,
                raw_file_path: self.raw_file_path,
                file_size: u64::try_from(self.file_size).unwrap_or_default(),
                metadata: ExtractedMetadata {
                    camera_make: self.camera_make,
                    camera_model: self.camera_model,
                    camera_serial: self.camera_serial,
                    lens_make: self.lens_make,
                    lens_model: self.lens_model,
                    focal_length: self.focal_length,
                    focal_length_35mm: to_u32(self.focal_length_35mm),
                    aperture: self.aperture,
                    shutter_speed: self.shutter_speed,
                    iso: to_u32(self.iso),
                    exposure_mode: self.exposure_mode,
                    exposure_program: self.exposure_program,
                    metering_mode: self.metering_mode,
                    white_balance: self.white_balance,
                    flash: self.flash,
                    exposure_bias: self.exposure_bias,
                    taken_at: self.taken_at,
                    gps_latitude: self.gps_latitude,
                    gps_longitude: self.gps_longitude,
                    gps_altitude: self.gps_altitude,
                    width: to_u32(self.width),
                    height: to_u32(self.height),
                    orientation: to_u32(self.orientation),
                    color_space: self.color_space,
                    software: self.software,
                },
                status,
            },
            tags,
            created_at: self.created_at,
        })
    }
}

fn to_u32(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

/// SQLite-backed [`MetadataStore`].
#[derive(Debug, Clone)]
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    /// Open (creating if missing) the database at `path` and apply the schema.
    ///
    /// WAL mode plus a busy timeout lets concurrent uploads queue for the
    /// write lock instead of failing.
    pub async fn connect(path: &Path, config: &DatabaseConfig) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %path.display(), "Opened metadata store");
        Self::with_pool(pool).await
    }

    /// Private in-memory database. Lives as long as the store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_photo(
        tx: &mut Transaction<'_, Sqlite>,
        photo: &NewPhoto,
    ) -> Result<i64, sqlx::Error> {
        let m = &photo.metadata;
        sqlx::query_scalar(INSERT_PHOTO)
            .bind(photo.user_id)
            .bind(photo.category_id)
            .bind(&photo.title)
            .bind(&photo.description)
            .bind(&photo.aircraft_type)
            .bind(&photo.airline)
            .bind(&photo.registration)
            .bind(&photo.airport)
            .bind(&photo.file_path)
            .bind(&photo.thumbnail_path)
            .bind(&photo.raw_file_path)
            .bind(i64::try_from(photo.file_size).unwrap_or(i64::MAX))
            .bind(&m.camera_make)
            .bind(&m.camera_model)
            .bind(&m.camera_serial)
            .bind(&m.lens_make)
            .bind(&m.lens_model)
            .bind(m.focal_length)
            .bind(m.focal_length_35mm.map(i64::from))
            .bind(m.aperture)
            .bind(&m.shutter_speed)
            .bind(m.iso.map(i64::from))
            .bind(&m.exposure_mode)
            .bind(&m.exposure_program)
            .bind(&m.metering_mode)
            .bind(&m.white_balance)
            .bind(&m.flash)
            .bind(&m.exposure_bias)
            .bind(m.taken_at)
            .bind(m.gps_latitude)
            .bind(m.gps_longitude)
            .bind(m.gps_altitude)
            .bind(m.width.map(i64::from))
            .bind(m.height.map(i64::from))
            .bind(m.orientation.map(i64::from))
            .bind(&m.color_space)
            .bind(&m.software)
            .bind(photo.status.as_str())
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await
    }

    /// Get-or-create a tag and link it to the photo.
    async fn link_tag(
        tx: &mut Transaction<'_, Sqlite>,
        photo_id: i64,
        name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(&mut **tx)
            .await?;
        let tag_id: i64 = sqlx::query_scalar("SELECT id FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;
        sqlx::query("INSERT OR IGNORE INTO photo_tags (photo_id, tag_id) VALUES (?, ?)")
            .bind(photo_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn fetch(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<PersistedPhoto, StoreError> {
        let row = sqlx::query_as::<_, PhotoRow>(SELECT_PHOTO)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        let tags: Vec<String> = sqlx::query_scalar(SELECT_TAG_NAMES)
            .bind(id)
            .fetch_all(&mut **tx)
            .await?;
        row.into_persisted(tags)
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    #[tracing::instrument(skip(self, photo), fields(db.table = "photos", tag_count = tags.len()))]
    async fn create_photo_with_tags(
        &self,
        photo: &NewPhoto,
        tags: &[String],
    ) -> Result<i64, StoreError> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        let id = Self::insert_photo(&mut tx, photo).await?;
        for name in tags {
            Self::link_tag(&mut tx, id, name).await?;
        }
        tx.commit().await?;
        Ok(id)
    }

    #[tracing::instrument(skip(self), fields(db.table = "photos"))]
    async fn get_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError> {
        let mut tx = self.pool.begin().await?;
        let photo = Self::fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(photo)
    }

    #[tracing::instrument(skip(self), fields(db.table = "photos"))]
    async fn delete_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError> {
        let mut tx = self.pool.begin().await?;
        let photo = Self::fetch(&mut tx, id).await?;
        sqlx::query("DELETE FROM photo_tags WHERE photo_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(photo)
    }
}
