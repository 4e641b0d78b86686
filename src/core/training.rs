//! Orchestration de l'entraînement: création du modèle de destination chez
//! Replicate puis lancement du fine-tuning LoRA sur l'archive de photos.

use serde_json::json;
use tracing::info;

use crate::{
    domain::model::Model,
    infrastructure::error::{AppError, AppResult},
    infrastructure::replicate::{
        CreateModelRequest, CreateTrainingRequest, Prediction, ReplicateClient, Training,
    },
};

// Entraîneur de base utilisé pour le fine-tuning
const BASE_MODEL_OWNER: &str = "ostris";
const BASE_MODEL_NAME: &str = "flux-dev-lora-trainer";
const BASE_MODEL_VERSION: &str =
    "e440909d3512c31646ee2e0c7d6f6f4923224863a6a10c494606e79fb5844497";

const TRAINING_STEPS: u32 = 2000;
const LORA_RANK: u32 = 16;
const LEARNING_RATE: f64 = 0.0004;
const CAPTION_DROPOUT_RATE: f64 = 0.05;

/// Ratios d'image acceptés pour la génération
pub const ASPECT_RATIOS: [&str; 5] = ["1:1", "3:4", "4:3", "9:16", "16:9"];

/// Service d'orchestration des entraînements et générations
#[derive(Clone)]
pub struct TrainingService {
    replicate: ReplicateClient,
    username: String,
    webhook_url: String,
}

impl TrainingService {
    pub fn new(replicate: ReplicateClient, username: String, webhook_url: String) -> Self {
        Self {
            replicate,
            username,
            webhook_url,
        }
    }

    /// Nom du modèle de destination: nom complet slugifié + slug du modèle
    pub fn destination_model_name(model: &Model) -> String {
        let name_part = model.full_name.to_lowercase().split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        format!("{}-{}", name_part, model.slug)
    }

    /// Préfixe d'autocaption construit depuis les métadonnées du sujet
    pub fn autocaption_prefix(model: &Model) -> String {
        format!(
            "a photo of {}, a {} year old {} {} with {} eyes and {} hair, ",
            model.trigger_word,
            model.age,
            model.ethnicity.prompt_label(),
            model.gender.to_lowercase(),
            model.eye_color.to_lowercase(),
            model.hair_color.to_lowercase(),
        )
    }

    /// Crée le modèle de destination puis lance l'entraînement.
    /// L'URL pré-signée donne au service d'entraînement accès à l'archive.
    pub async fn start_training(&self, model: &Model, zip_signed_url: &str) -> AppResult<Training> {
        let model_name = Self::destination_model_name(model);
        let destination = format!("{}/{}", self.username, model_name);

        info!("🚀 Création du modèle Replicate {}", destination);
        self.replicate
            .create_model(&CreateModelRequest {
                owner: self.username.clone(),
                name: model_name.clone(),
                visibility: "private".to_string(),
                hardware: "gpu-t4".to_string(),
                description: format!(
                    "Fine-tuned model for {} ({}, {}, {})",
                    model.full_name,
                    model.gender,
                    model.age,
                    model.ethnicity.prompt_label()
                ),
            })
            .await?;

        let input = json!({
            "steps": TRAINING_STEPS,
            "lora_rank": LORA_RANK,
            "optimizer": "adamw8bit",
            "batch_size": 1,
            "resolution": "512,768,1024",
            "autocaption": true,
            "autocaption_prefix": Self::autocaption_prefix(model),
            "input_images": zip_signed_url,
            "trigger_word": model.trigger_word,
            "learning_rate": LEARNING_RATE,
            "wandb_project": "flux_train_replicate",
            "wandb_save_interval": 100,
            "caption_dropout_rate": CAPTION_DROPOUT_RATE,
            "cache_latents_to_disk": false,
            "wandb_sample_interval": 100,
        });

        info!("🏋️  Lancement de l'entraînement pour le modèle {}", model.slug);
        let training = self
            .replicate
            .create_training(
                BASE_MODEL_OWNER,
                BASE_MODEL_NAME,
                BASE_MODEL_VERSION,
                &CreateTrainingRequest {
                    destination,
                    input,
                    webhook: self.webhook_url.clone(),
                    webhook_events_filter: vec!["start".to_string(), "completed".to_string()],
                },
            )
            .await?;

        Ok(training)
    }

    /// Génère des images depuis un modèle entraîné (prédiction synchrone)
    pub async fn generate(
        &self,
        model: &Model,
        prompt: &str,
        num_outputs: u8,
        aspect_ratio: &str,
    ) -> AppResult<Prediction> {
        let version = Self::trained_version(model)?;
        let prompt = Self::prompt_with_trigger(prompt, &model.trigger_word);

        let input = json!({
            "prompt": prompt,
            "num_outputs": num_outputs,
            "aspect_ratio": aspect_ratio,
            "output_format": "webp",
            "output_quality": 90,
        });

        info!("🎨 Génération de {} image(s) pour le modèle {}", num_outputs, model.slug);
        self.replicate.create_prediction(&version, input).await
    }

    /// Identifiant de version à exécuter, extrait de "owner/name:version"
    fn trained_version(model: &Model) -> AppResult<String> {
        let raw = model.model_version.as_deref().ok_or_else(|| {
            AppError::Conflict("Le modèle n'a pas encore de version entraînée.".to_string())
        })?;

        let version = raw.rsplit(':').next().unwrap_or(raw);
        Ok(version.to_string())
    }

    /// Prépend le mot déclencheur au prompt s'il n'y figure pas déjà
    fn prompt_with_trigger(prompt: &str, trigger_word: &str) -> String {
        if prompt.contains(trigger_word) {
            prompt.to_string()
        } else {
            format!("a photo of {}, {}", trigger_word, prompt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Ethnicity, ModelStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn test_model() -> Model {
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "My Headshots".to_string(),
            slug: "my-headshots-ab12c".to_string(),
            full_name: "Jane Doe".to_string(),
            gender: "Woman".to_string(),
            eye_color: "Green".to_string(),
            hair_color: "Brown".to_string(),
            age: 31,
            ethnicity: Ethnicity::MiddleEastern,
            photo_count: 12,
            status: ModelStatus::Ready,
            trigger_word: "JA_FLUX".to_string(),
            zip_url: "https://bucket.s3.amazonaws.com/models/u/my-headshots/photos.zip"
                .to_string(),
            zip_key: "models/u/my-headshots/photos.zip".to_string(),
            cover_image: None,
            training_id: Some("train-1".to_string()),
            model_version: Some("acme/jane-doe-my-headshots-ab12c:deadbeef".to_string()),
            training_status: Some("succeeded".to_string()),
            training_error: None,
            training_started: Some(Utc::now()),
            training_ended: Some(Utc::now()),
            expires_at: Utc::now() + chrono::Duration::days(30),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_destination_model_name() {
        let model = test_model();
        assert_eq!(
            TrainingService::destination_model_name(&model),
            "jane-doe-my-headshots-ab12c"
        );
    }

    #[test]
    fn test_autocaption_prefix() {
        let model = test_model();
        assert_eq!(
            TrainingService::autocaption_prefix(&model),
            "a photo of JA_FLUX, a 31 year old middle eastern woman with green eyes and brown hair, "
        );
    }

    #[test]
    fn test_trained_version_extraction() {
        let model = test_model();
        assert_eq!(
            TrainingService::trained_version(&model).unwrap(),
            "deadbeef"
        );

        let mut without_version = test_model();
        without_version.model_version = None;
        assert!(TrainingService::trained_version(&without_version).is_err());
    }

    #[test]
    fn test_prompt_with_trigger() {
        assert_eq!(
            TrainingService::prompt_with_trigger("in a dark suit", "JA_FLUX"),
            "a photo of JA_FLUX, in a dark suit"
        );
        assert_eq!(
            TrainingService::prompt_with_trigger("JA_FLUX wearing glasses", "JA_FLUX"),
            "JA_FLUX wearing glasses"
        );
    }
}
