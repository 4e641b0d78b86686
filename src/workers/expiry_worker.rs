//! Worker d'expiration: les modèles et galeries portent une date
//! d'expiration à 30 jours; ce worker marque les enregistrements en retard
//! comme EXPIRED et supprime leurs objets du stockage.

use std::time::Duration;
use tracing::{error, info, warn};

use crate::domain::model::Model;
use crate::infrastructure::database::{Database, GalleriesRepository, ModelsRepository};
use crate::infrastructure::error::AppResult;
use crate::infrastructure::storage::StorageService;

/// Configuration du worker d'expiration
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Intervalle entre les cycles (secondes)
    pub interval_seconds: u64,
    /// Nombre maximum d'enregistrements traités par cycle
    pub batch_size: i64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,
            batch_size: 100,
        }
    }
}

/// Worker d'expiration background
pub struct ExpiryWorker {
    config: ExpiryConfig,
    db: Database,
    storage: StorageService,
}

impl ExpiryWorker {
    /// Crée une nouvelle instance du worker
    pub fn new(config: ExpiryConfig, db: Database, storage: StorageService) -> Self {
        Self {
            config,
            db,
            storage,
        }
    }

    /// Démarre le worker en boucle infinie
    pub async fn start(self) -> ! {
        info!("🔧 Worker d'expiration démarré avec config: {:?}", self.config);

        loop {
            match self.run_expiry_cycle().await {
                Ok((models, galleries)) if models + galleries > 0 => {
                    info!(
                        "✅ Cycle d'expiration terminé: {} modèle(s), {} galerie(s)",
                        models, galleries
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    error!("❌ Erreur lors du cycle d'expiration: {}", e);
                }
            }

            tokio::time::sleep(Duration::from_secs(self.config.interval_seconds)).await;
        }
    }

    /// Exécute un cycle complet d'expiration
    async fn run_expiry_cycle(&self) -> AppResult<(usize, usize)> {
        let expired_models = self.expire_models().await?;
        let expired_galleries = self.expire_galleries().await?;
        Ok((expired_models, expired_galleries))
    }

    /// Expire les modèles en retard et nettoie leurs objets stockés
    async fn expire_models(&self) -> AppResult<usize> {
        let models_repo = ModelsRepository::new(self.db.pool.clone());
        let models = models_repo
            .list_expired(chrono::Utc::now(), self.config.batch_size)
            .await?;

        let count = models.len();
        for model in models {
            self.delete_object_logged(&model.zip_key).await;
            if let Some(cover_key) = cover_key_for(&model) {
                self.delete_object_logged(&cover_key).await;
            }

            models_repo.mark_expired(&model.id).await?;
            info!("🧹 Modèle {} expiré", model.slug);
        }

        Ok(count)
    }

    /// Expire les galeries en retard et nettoie leurs archives
    async fn expire_galleries(&self) -> AppResult<usize> {
        let galleries_repo = GalleriesRepository::new(self.db.pool.clone());
        let galleries = galleries_repo
            .list_expired(chrono::Utc::now(), self.config.batch_size)
            .await?;

        let count = galleries.len();
        for gallery in galleries {
            self.delete_object_logged(&gallery.zip_key).await;
            galleries_repo.mark_expired(&gallery.id).await?;
            info!("🧹 Galerie {} expirée", gallery.slug);
        }

        Ok(count)
    }

    /// Suppression S3 best-effort: un échec n'empêche pas le marquage EXPIRED
    async fn delete_object_logged(&self, key: &str) {
        if let Err(e) = self.storage.delete_object(key).await {
            warn!("⚠️  Suppression S3 de {} échouée: {}", key, e);
        }
    }
}

/// Clé S3 de la couverture, reconstruite depuis le préfixe de l'archive et
/// l'extension de l'URL de couverture
fn cover_key_for(model: &Model) -> Option<String> {
    let cover_url = model.cover_image.as_deref()?;
    let extension = cover_url.rsplit('.').next()?;
    Some(format!("{}/cover.{}", model.storage_prefix(), extension))
}

/// Démarrage du worker d'expiration dans une tâche Tokio séparée
pub async fn start_expiry_worker(
    config: ExpiryConfig,
    db: Database,
    storage: StorageService,
) -> AppResult<()> {
    info!("🔧 Initialisation du worker d'expiration...");

    let worker = ExpiryWorker::new(config, db, storage);

    tokio::spawn(async move {
        worker.start().await;
    });

    info!("✅ Worker d'expiration démarré avec succès");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Ethnicity, ModelStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn expired_model() -> Model {
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Old".to_string(),
            slug: "old-ab12c".to_string(),
            full_name: "Jane Doe".to_string(),
            gender: "Woman".to_string(),
            eye_color: "Green".to_string(),
            hair_color: "Brown".to_string(),
            age: 31,
            ethnicity: Ethnicity::White,
            photo_count: 10,
            status: ModelStatus::Ready,
            trigger_word: "JA_FLUX".to_string(),
            zip_url: "http://localhost:9000/bucket/models/u1/old/photos.zip".to_string(),
            zip_key: "models/u1/old/photos.zip".to_string(),
            cover_image: Some("http://localhost:9000/bucket/models/u1/old/cover.jpg".to_string()),
            training_id: None,
            model_version: None,
            training_status: None,
            training_error: None,
            training_started: None,
            training_ended: None,
            expires_at: Utc::now() - chrono::Duration::days(1),
            created_at: Utc::now() - chrono::Duration::days(31),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cover_key_derivation() {
        let model = expired_model();
        assert_eq!(
            cover_key_for(&model).as_deref(),
            Some("models/u1/old/cover.jpg")
        );

        let mut without_cover = expired_model();
        without_cover.cover_image = None;
        assert!(cover_key_for(&without_cover).is_none());
    }
}
