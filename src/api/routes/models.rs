//! # Routes des modèles
//!
//! Parcours principal de l'application: l'utilisateur uploade une archive
//! zip de photos personnelles avec les métadonnées du sujet, l'archive part
//! dans le stockage objet, et un fine-tuning est lancé chez Replicate avec
//! une URL pré-signée vers l'archive.
//!
//! ## Workflow de création
//! 1. Validation des champs et de l'archive (type, contenu)
//! 2. Remplacement d'un éventuel modèle actif portant le même titre
//! 3. Upload de la couverture puis de l'archive vers S3
//! 4. URL pré-signée (1h) remise au service d'entraînement
//! 5. Insertion du modèle en PROCESSING + archive enfant
//! 6. Création du modèle de destination et lancement de l'entraînement
//! 7. Passage en TRAINING avec l'ID du job

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::auth::get_current_user,
    core::training::{TrainingService, ASPECT_RATIOS},
    core::zip_inspect,
    domain::model::{Ethnicity, Model, ModelStatus, NewModel},
    domain::photo::GeneratedPhoto,
    domain::slug::{sanitize_file_name, trigger_word, unique_slug},
    infrastructure::config::AppConfig,
    infrastructure::database::{
        ArchivesRepository, Database, ModelsRepository, PhotosRepository,
    },
    infrastructure::error::{bad_request, AppError, AppResult},
    infrastructure::storage::StorageService,
};

/// Durée de validité de l'URL pré-signée remise au service d'entraînement
const ZIP_SIGNED_URL_TTL_SECS: u64 = 3600;
const MIN_AGE: i32 = 18;
const MAX_GENERATION_OUTPUTS: u8 = 4;

/// Formulaire multipart de création de modèle.
/// Tous les champs sont optionnels ici pour répondre 400 "Missing required
/// fields" plutôt qu'une erreur d'extraction opaque.
#[derive(Debug, MultipartForm)]
pub struct CreateModelForm {
    pub title: Option<Text<String>>,
    #[multipart(rename = "fullName")]
    pub full_name: Option<Text<String>>,
    pub gender: Option<Text<String>>,
    #[multipart(rename = "eyeColor")]
    pub eye_color: Option<Text<String>>,
    #[multipart(rename = "hairColor")]
    pub hair_color: Option<Text<String>>,
    pub age: Option<Text<i32>>,
    pub ethnicity: Option<Text<String>>,
    #[multipart(rename = "photoCount")]
    pub photo_count: Option<Text<i32>>,
    #[multipart(rename = "zipFile", limit = "256MB")]
    pub zip_file: Option<TempFile>,
}

/// Résumé d'un modèle (pour les listes)
#[derive(Serialize)]
pub struct ModelSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: ModelStatus,
    pub cover_image: Option<String>,
    pub photo_count: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub generated_photos: Vec<String>,
}

impl ModelSummary {
    fn from_model(model: Model, generated_photos: Vec<String>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            status: model.status,
            cover_image: model.cover_image,
            photo_count: model.photo_count,
            expires_at: model.expires_at,
            created_at: model.created_at,
            generated_photos,
        }
    }
}

/// Modèle complet avec ses images générées
#[derive(Serialize)]
pub struct ModelDetail {
    #[serde(flatten)]
    pub model: Model,
    pub generated_photos: Vec<GeneratedPhoto>,
}

/// Requête de vérification de titre
#[derive(Deserialize)]
pub struct CheckTitleRequest {
    pub title: String,
}

/// Requête de génération d'images
#[derive(Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "Le prompt est requis"))]
    pub prompt: String,
    pub num_outputs: Option<u8>,
    pub aspect_ratio: Option<String>,
}

fn require<'a>(field: &'a Option<Text<String>>) -> AppResult<&'a str> {
    field
        .as_ref()
        .map(|text| text.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| bad_request("Missing required fields"))
}

/// Endpoint pour lister les modèles de l'utilisateur
#[get("/models")]
pub async fn list_models(req: HttpRequest, db: web::Data<Database>) -> AppResult<HttpResponse> {
    let user = get_current_user(&req, &db).await?;

    let models_repo = ModelsRepository::new(db.pool.clone());
    let photos_repo = PhotosRepository::new(db.pool.clone());

    let models = models_repo.list_by_user(&user.id).await?;

    // URLs des images générées, groupées par modèle
    let model_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut urls_by_model: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (model_id, url) in photos_repo.urls_for_models(&model_ids).await? {
        urls_by_model.entry(model_id).or_default().push(url);
    }

    let summaries: Vec<ModelSummary> = models
        .into_iter()
        .map(|model| {
            let photos = urls_by_model.remove(&model.id).unwrap_or_default();
            ModelSummary::from_model(model, photos)
        })
        .collect();

    Ok(HttpResponse::Ok().json(summaries))
}

/// Endpoint de création de modèle: upload de l'archive puis lancement
/// de l'entraînement
#[post("/models")]
pub async fn create_model(
    req: HttpRequest,
    MultipartForm(form): MultipartForm<CreateModelForm>,
    db: web::Data<Database>,
    storage: web::Data<StorageService>,
    training: web::Data<TrainingService>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    let user = get_current_user(&req, &db).await?;

    // 1. Validation des champs requis
    let title = require(&form.title)?.to_string();
    let full_name = require(&form.full_name)?.to_string();
    let gender = require(&form.gender)?.to_string();
    let eye_color = require(&form.eye_color)?.to_string();
    let hair_color = require(&form.hair_color)?.to_string();
    let ethnicity_raw = require(&form.ethnicity)?.to_string();

    let age = form
        .age
        .as_ref()
        .map(|text| text.0)
        .ok_or_else(|| bad_request("Missing required fields"))?;
    let zip_file = form
        .zip_file
        .as_ref()
        .ok_or_else(|| bad_request("Missing required fields"))?;

    if age < MIN_AGE {
        return Err(bad_request("Must be 18 or older"));
    }

    let ethnicity: Ethnicity = ethnicity_raw
        .parse()
        .map_err(|e: String| bad_request(e))?;

    // 2. Lecture et inspection de l'archive
    let zip_content = fs::read(zip_file.file.path())?;
    zip_inspect::ensure_zip(&zip_content)?;
    let inspection = zip_inspect::inspect_photo_archive(&zip_content)?;

    let cover = inspection
        .cover
        .ok_or_else(|| bad_request("L'archive ne contient aucune image"))?;

    // Le client envoie son propre compte, l'archive fait foi en secours
    let photo_count = form
        .photo_count
        .as_ref()
        .map(|text| text.0)
        .unwrap_or(inspection.image_count as i32);

    let models_repo = ModelsRepository::new(db.pool.clone());
    let archives_repo = ArchivesRepository::new(db.pool.clone());

    // 3. Remplacement d'un modèle actif portant le même titre
    if let Some(existing) = models_repo.find_active_by_title(&user.id, &title).await? {
        tracing::info!("♻️  Remplacement du modèle existant {}", existing.id);

        // La suppression S3 est best-effort, elle ne bloque pas la création
        if let Err(e) = storage.delete_object(&existing.zip_key).await {
            tracing::warn!("⚠️  Suppression S3 échouée, on continue: {}", e);
        }

        models_repo.delete(&existing.id).await?;
    }

    // 4. Upload de la couverture puis de l'archive
    let sanitized_title = sanitize_file_name(&title);
    let base_path = format!("models/{}/{}", user.id, sanitized_title);
    let zip_key = format!("{}/photos.zip", base_path);
    let cover_key = format!("{}/cover.{}", base_path, cover.extension);

    let cover_url = storage
        .put_object(
            &cover_key,
            cover.content,
            &format!("image/{}", cover.extension),
        )
        .await?;
    let zip_size = zip_content.len() as i64;
    let zip_url = storage
        .put_object(&zip_key, zip_content, "application/zip")
        .await?;

    // 5. URL pré-signée remise au service d'entraînement (1h)
    let signed_url = storage
        .presign_get(&zip_key, std::time::Duration::from_secs(ZIP_SIGNED_URL_TTL_SECS))
        .await?;

    // 6. Insertion du modèle et de son archive
    let new_model = NewModel {
        user_id: user.id,
        title: title.clone(),
        slug: unique_slug(&title),
        full_name: full_name.clone(),
        gender,
        eye_color,
        hair_color,
        age,
        ethnicity,
        photo_count,
        trigger_word: trigger_word(&full_name),
        zip_url: zip_url.clone(),
        zip_key: zip_key.clone(),
        cover_image: Some(cover_url),
        expires_at: Utc::now() + Duration::days(config.retention.model_ttl_days),
    };

    let model = models_repo.create(&new_model).await?;
    archives_repo
        .create_for_model(&model.id, &zip_url, &zip_key, zip_size, photo_count)
        .await?;

    // 7. Lancement de l'entraînement puis passage en TRAINING
    let training_job = training.start_training(&model, &signed_url).await?;
    let model = models_repo
        .set_training_started(&model.id, &training_job.id)
        .await?;

    tracing::info!(
        "✅ Modèle {} créé, entraînement {} démarré",
        model.slug,
        training_job.id
    );

    Ok(HttpResponse::Created().json(model))
}

/// Endpoint pour obtenir un modèle et ses images générées
#[get("/models/{slug}")]
pub async fn get_model(
    req: HttpRequest,
    path: web::Path<String>,
    db: web::Data<Database>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let user = get_current_user(&req, &db).await?;

    let models_repo = ModelsRepository::new(db.pool.clone());
    let photos_repo = PhotosRepository::new(db.pool.clone());

    let model = models_repo.get_by_slug_for_user(&slug, &user.id).await?;
    let generated_photos = photos_repo.list_by_model(&model.id).await?;

    Ok(HttpResponse::Ok().json(ModelDetail {
        model,
        generated_photos,
    }))
}

/// Endpoint de vérification de disponibilité d'un titre
#[post("/models/check-title")]
pub async fn check_model_title(
    req: HttpRequest,
    request: web::Json<CheckTitleRequest>,
    db: web::Data<Database>,
) -> AppResult<HttpResponse> {
    let user = get_current_user(&req, &db).await?;

    let models_repo = ModelsRepository::new(db.pool.clone());
    let existing = models_repo
        .find_active_by_title(&user.id, &request.title)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "exists": existing.is_some() })))
}

/// Endpoint de génération d'images depuis un modèle entraîné
#[post("/models/{slug}/generate")]
pub async fn generate_photos(
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<GenerateRequest>,
    db: web::Data<Database>,
    training: web::Data<TrainingService>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let user = get_current_user(&req, &db).await?;
    request.validate()?;

    let num_outputs = request.num_outputs.unwrap_or(1);
    if num_outputs == 0 || num_outputs > MAX_GENERATION_OUTPUTS {
        return Err(bad_request(format!(
            "num_outputs doit être entre 1 et {}",
            MAX_GENERATION_OUTPUTS
        )));
    }

    let aspect_ratio = request.aspect_ratio.as_deref().unwrap_or("1:1");
    if !ASPECT_RATIOS.contains(&aspect_ratio) {
        return Err(bad_request(format!(
            "aspect_ratio invalide: {} (valides: {})",
            aspect_ratio,
            ASPECT_RATIOS.join(", ")
        )));
    }

    let models_repo = ModelsRepository::new(db.pool.clone());
    let model = models_repo.get_by_slug_for_user(&slug, &user.id).await?;
    ModelsRepository::ensure_status(&model, ModelStatus::Ready)?;

    let prediction = training
        .generate(&model, &request.prompt, num_outputs, aspect_ratio)
        .await?;

    if prediction.status != "succeeded" {
        let detail = prediction
            .error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| prediction.status.clone());
        return Err(AppError::ExternalService(format!(
            "La génération a échoué: {}",
            detail
        )));
    }

    let urls = prediction.output_urls();
    if urls.is_empty() {
        return Err(AppError::ExternalService(
            "La génération n'a produit aucune image".to_string(),
        ));
    }

    let photos_repo = PhotosRepository::new(db.pool.clone());
    let photos = photos_repo
        .create_many(&model.id, &urls, Some(&request.prompt))
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "photos": photos })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_missing_and_blank() {
        assert!(require(&None).is_err());
        assert!(require(&Some(Text("   ".to_string()))).is_err());
        assert_eq!(require(&Some(Text("Jane".to_string()))).unwrap(), "Jane");
        // Les espaces autour sont retirés
        assert_eq!(require(&Some(Text("  Jane  ".to_string()))).unwrap(), "Jane");
    }

    #[test]
    fn test_generate_request_validation() {
        let empty_prompt = GenerateRequest {
            prompt: "".to_string(),
            num_outputs: None,
            aspect_ratio: None,
        };
        assert!(empty_prompt.validate().is_err());

        let valid = GenerateRequest {
            prompt: "in a dark suit, studio lighting".to_string(),
            num_outputs: Some(2),
            aspect_ratio: Some("3:4".to_string()),
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_model_summary_keeps_photo_urls() {
        use crate::domain::model::Ethnicity;

        let model = Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "My Headshots".to_string(),
            slug: "my-headshots-ab12c".to_string(),
            full_name: "Jane Doe".to_string(),
            gender: "Woman".to_string(),
            eye_color: "Green".to_string(),
            hair_color: "Brown".to_string(),
            age: 31,
            ethnicity: Ethnicity::White,
            photo_count: 12,
            status: ModelStatus::Ready,
            trigger_word: "JA_FLUX".to_string(),
            zip_url: "https://example.com/photos.zip".to_string(),
            zip_key: "models/u/t/photos.zip".to_string(),
            cover_image: Some("https://example.com/cover.jpg".to_string()),
            training_id: None,
            model_version: None,
            training_status: None,
            training_error: None,
            training_started: None,
            training_ended: None,
            expires_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let summary = ModelSummary::from_model(
            model,
            vec!["https://cdn.example.com/out.webp".to_string()],
        );
        assert_eq!(summary.generated_photos.len(), 1);
        assert_eq!(summary.status, ModelStatus::Ready);
    }
}
