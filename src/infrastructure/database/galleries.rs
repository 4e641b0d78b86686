use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::gallery::{Gallery, NewGallery},
    infrastructure::error::{AppError, AppResult},
};

/// Repository pour les opérations sur les galeries (collections de photos)
#[derive(Clone)]
pub struct GalleriesRepository {
    pool: PgPool,
}

impl GalleriesRepository {
    /// Crée une nouvelle instance du repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insère une nouvelle galerie en statut PROCESSING
    pub async fn create(&self, new_gallery: &NewGallery) -> AppResult<Gallery> {
        let gallery = sqlx::query_as::<_, Gallery>(
            r#"
            INSERT INTO galleries (
                user_id, title, slug, full_name, gender, eye_color, hair_color,
                photo_count, status, zip_url, zip_key, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PROCESSING', $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new_gallery.user_id)
        .bind(new_gallery.title.trim())
        .bind(&new_gallery.slug)
        .bind(&new_gallery.full_name)
        .bind(&new_gallery.gender)
        .bind(&new_gallery.eye_color)
        .bind(&new_gallery.hair_color)
        .bind(new_gallery.photo_count)
        .bind(&new_gallery.zip_url)
        .bind(&new_gallery.zip_key)
        .bind(new_gallery.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(gallery)
    }

    /// Récupère les galeries d'un utilisateur, de la plus récente à la plus ancienne
    pub async fn list_by_user(&self, user_id: &Uuid) -> AppResult<Vec<Gallery>> {
        let galleries = sqlx::query_as::<_, Gallery>(
            "SELECT * FROM galleries WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(galleries)
    }

    /// Récupère une galerie par slug, restreinte au propriétaire
    pub async fn get_by_slug_for_user(&self, slug: &str, user_id: &Uuid) -> AppResult<Gallery> {
        let gallery = sqlx::query_as::<_, Gallery>(
            "SELECT * FROM galleries WHERE slug = $1 AND user_id = $2",
        )
        .bind(slug)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Gallery".to_string()))?;

        Ok(gallery)
    }

    /// Persiste la sélection de styles d'une galerie
    pub async fn update_styles(
        &self,
        slug: &str,
        user_id: &Uuid,
        styles: &[String],
    ) -> AppResult<Gallery> {
        let gallery = sqlx::query_as::<_, Gallery>(
            r#"
            UPDATE galleries
            SET selected_styles = $1, updated_at = now()
            WHERE slug = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(styles)
        .bind(slug)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Gallery".to_string()))?;

        Ok(gallery)
    }

    /// Cherche une galerie non expirée portant ce titre chez cet utilisateur
    pub async fn find_active_by_title(
        &self,
        user_id: &Uuid,
        title: &str,
    ) -> AppResult<Option<Gallery>> {
        let gallery = sqlx::query_as::<_, Gallery>(
            r#"
            SELECT * FROM galleries
            WHERE user_id = $1 AND title = $2 AND status <> 'EXPIRED'
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(title.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(gallery)
    }

    /// Nombre de galeries actives (non expirées) d'un utilisateur
    pub async fn count_active(&self, user_id: &Uuid, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM galleries
            WHERE user_id = $1 AND status <> 'EXPIRED' AND expires_at > $2
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Galeries arrivées à expiration, candidates au nettoyage
    pub async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Gallery>> {
        let galleries = sqlx::query_as::<_, Gallery>(
            r#"
            SELECT * FROM galleries
            WHERE expires_at < $1 AND status <> 'EXPIRED'
            ORDER BY expires_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(galleries)
    }

    /// Marque une galerie comme expirée
    pub async fn mark_expired(&self, gallery_id: &Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE galleries SET status = 'EXPIRED', updated_at = now() WHERE id = $1",
        )
        .bind(gallery_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
