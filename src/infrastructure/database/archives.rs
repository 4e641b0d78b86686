use sqlx::PgPool;
use uuid::Uuid;

use crate::{domain::archive::ZipArchive, infrastructure::error::AppResult};

/// Repository pour les archives zip uploadées
#[derive(Clone)]
pub struct ArchivesRepository {
    pool: PgPool,
}

impl ArchivesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attache une archive à un modèle
    pub async fn create_for_model(
        &self,
        model_id: &Uuid,
        url: &str,
        key: &str,
        size: i64,
        file_count: i32,
    ) -> AppResult<ZipArchive> {
        let archive = sqlx::query_as::<_, ZipArchive>(
            r#"
            INSERT INTO zip_archives (model_id, url, key, size, file_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(model_id)
        .bind(url)
        .bind(key)
        .bind(size)
        .bind(file_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(archive)
    }

    /// Attache une archive à une galerie
    pub async fn create_for_gallery(
        &self,
        gallery_id: &Uuid,
        url: &str,
        key: &str,
        size: i64,
        file_count: i32,
    ) -> AppResult<ZipArchive> {
        let archive = sqlx::query_as::<_, ZipArchive>(
            r#"
            INSERT INTO zip_archives (gallery_id, url, key, size, file_count)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(gallery_id)
        .bind(url)
        .bind(key)
        .bind(size)
        .bind(file_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(archive)
    }
}
