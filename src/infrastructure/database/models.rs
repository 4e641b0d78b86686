use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::model::{Model, ModelStatus, NewModel},
    infrastructure::error::{AppError, AppResult},
};

/// Repository pour les opérations sur les modèles fine-tunés
#[derive(Clone)]
pub struct ModelsRepository {
    pool: PgPool,
}

impl ModelsRepository {
    /// Crée une nouvelle instance du repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insère un nouveau modèle en statut PROCESSING
    pub async fn create(&self, new_model: &NewModel) -> AppResult<Model> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            INSERT INTO models (
                user_id, title, slug, full_name, gender, eye_color, hair_color,
                age, ethnicity, photo_count, status, trigger_word,
                zip_url, zip_key, cover_image, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'PROCESSING', $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(new_model.user_id)
        .bind(new_model.title.trim())
        .bind(&new_model.slug)
        .bind(&new_model.full_name)
        .bind(&new_model.gender)
        .bind(&new_model.eye_color)
        .bind(&new_model.hair_color)
        .bind(new_model.age)
        .bind(new_model.ethnicity)
        .bind(new_model.photo_count)
        .bind(&new_model.trigger_word)
        .bind(&new_model.zip_url)
        .bind(&new_model.zip_key)
        .bind(&new_model.cover_image)
        .bind(new_model.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(model)
    }

    /// Récupère les modèles d'un utilisateur, du plus récent au plus ancien
    pub async fn list_by_user(&self, user_id: &Uuid) -> AppResult<Vec<Model>> {
        let models = sqlx::query_as::<_, Model>(
            "SELECT * FROM models WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(models)
    }

    /// Récupère un modèle par slug, restreint au propriétaire
    pub async fn get_by_slug_for_user(&self, slug: &str, user_id: &Uuid) -> AppResult<Model> {
        let model = sqlx::query_as::<_, Model>(
            "SELECT * FROM models WHERE slug = $1 AND user_id = $2",
        )
        .bind(slug)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Model".to_string()))?;

        Ok(model)
    }

    /// Cherche un modèle non expiré portant ce titre chez cet utilisateur
    pub async fn find_active_by_title(
        &self,
        user_id: &Uuid,
        title: &str,
    ) -> AppResult<Option<Model>> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            SELECT * FROM models
            WHERE user_id = $1 AND title = $2 AND status <> 'EXPIRED'
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(title.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(model)
    }

    /// Cherche le modèle associé à un job d'entraînement Replicate
    pub async fn find_by_training_id(&self, training_id: &str) -> AppResult<Option<Model>> {
        let model = sqlx::query_as::<_, Model>("SELECT * FROM models WHERE training_id = $1")
            .bind(training_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(model)
    }

    /// Supprime un modèle (les archives et photos associées suivent en cascade)
    pub async fn delete(&self, model_id: &Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM models WHERE id = $1")
            .bind(model_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Enregistre le lancement de l'entraînement: passage en TRAINING
    pub async fn set_training_started(
        &self,
        model_id: &Uuid,
        training_id: &str,
    ) -> AppResult<Model> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            UPDATE models
            SET training_id = $1,
                status = 'TRAINING',
                training_status = 'started',
                training_started = now(),
                updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(training_id)
        .bind(model_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(model)
    }

    /// Mémorise un statut intermédiaire rapporté par le webhook
    pub async fn set_training_status(
        &self,
        model_id: &Uuid,
        raw_status: &str,
    ) -> AppResult<Model> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            UPDATE models
            SET status = 'TRAINING', training_status = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(raw_status)
        .bind(model_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(model)
    }

    /// Entraînement terminé: READY + version du modèle entraîné
    pub async fn mark_ready(
        &self,
        model_id: &Uuid,
        model_version: Option<&str>,
        raw_status: &str,
    ) -> AppResult<Model> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            UPDATE models
            SET status = 'READY',
                model_version = $1,
                training_status = $2,
                training_ended = now(),
                updated_at = now()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(model_version)
        .bind(raw_status)
        .bind(model_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(model)
    }

    /// Entraînement échoué: FAILED + message d'erreur
    pub async fn mark_failed(
        &self,
        model_id: &Uuid,
        error_message: &str,
        raw_status: &str,
    ) -> AppResult<Model> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            UPDATE models
            SET status = 'FAILED',
                training_error = $1,
                training_status = $2,
                training_ended = now(),
                updated_at = now()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(error_message)
        .bind(raw_status)
        .bind(model_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(model)
    }

    /// Entraînement annulé côté service externe
    pub async fn mark_cancelled(&self, model_id: &Uuid, raw_status: &str) -> AppResult<Model> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            UPDATE models
            SET status = 'CANCELLED',
                training_error = 'Training was cancelled',
                training_status = $1,
                training_ended = now(),
                updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(raw_status)
        .bind(model_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(model)
    }

    /// Modèles arrivés à expiration, candidats au nettoyage
    pub async fn list_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Model>> {
        let models = sqlx::query_as::<_, Model>(
            r#"
            SELECT * FROM models
            WHERE expires_at < $1 AND status <> 'EXPIRED'
            ORDER BY expires_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(models)
    }

    /// Marque un modèle comme expiré
    pub async fn mark_expired(&self, model_id: &Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE models SET status = 'EXPIRED', updated_at = now() WHERE id = $1",
        )
        .bind(model_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Vérifie que le statut stocké correspond (utilisé avant génération)
    pub fn ensure_status(model: &Model, expected: ModelStatus) -> AppResult<()> {
        if model.status != expected {
            return Err(AppError::Conflict(format!(
                "Le modèle est en statut {} (attendu: {}).",
                model.status, expected
            )));
        }
        Ok(())
    }
}
