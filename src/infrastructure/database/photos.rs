use sqlx::PgPool;
use uuid::Uuid;

use crate::{domain::photo::GeneratedPhoto, infrastructure::error::AppResult};

/// Repository pour les images générées
#[derive(Clone)]
pub struct PhotosRepository {
    pool: PgPool,
}

impl PhotosRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persiste un lot d'images générées pour un modèle
    pub async fn create_many(
        &self,
        model_id: &Uuid,
        urls: &[String],
        prompt: Option<&str>,
    ) -> AppResult<Vec<GeneratedPhoto>> {
        let mut photos = Vec::with_capacity(urls.len());

        for url in urls {
            let photo = sqlx::query_as::<_, GeneratedPhoto>(
                r#"
                INSERT INTO generated_photos (model_id, url, prompt)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(model_id)
            .bind(url)
            .bind(prompt)
            .fetch_one(&self.pool)
            .await?;

            photos.push(photo);
        }

        Ok(photos)
    }

    /// Images générées d'un modèle, de la plus récente à la plus ancienne
    pub async fn list_by_model(&self, model_id: &Uuid) -> AppResult<Vec<GeneratedPhoto>> {
        let photos = sqlx::query_as::<_, GeneratedPhoto>(
            "SELECT * FROM generated_photos WHERE model_id = $1 ORDER BY created_at DESC",
        )
        .bind(model_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    /// URLs des images générées pour un ensemble de modèles,
    /// groupées par modèle côté appelant
    pub async fn urls_for_models(&self, model_ids: &[Uuid]) -> AppResult<Vec<(Uuid, String)>> {
        if model_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT model_id, url FROM generated_photos
            WHERE model_id = ANY($1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(model_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
