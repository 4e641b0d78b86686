//! # Routes des collections
//!
//! Variante du parcours d'upload sans entraînement: l'archive de photos est
//! stockée telle quelle et la galerie attend sa sélection de styles.

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::fs;

use crate::{
    core::auth::get_current_user,
    core::zip_inspect,
    domain::gallery::NewGallery,
    domain::slug::unique_slug,
    infrastructure::config::AppConfig,
    infrastructure::database::{ArchivesRepository, Database, GalleriesRepository},
    infrastructure::error::{bad_request, conflict, AppResult},
    infrastructure::storage::StorageService,
};

/// Formulaire multipart de création de collection
#[derive(Debug, MultipartForm)]
pub struct CreateCollectionForm {
    pub title: Option<Text<String>>,
    #[multipart(rename = "fullName")]
    pub full_name: Option<Text<String>>,
    pub gender: Option<Text<String>>,
    #[multipart(rename = "eyeColor")]
    pub eye_color: Option<Text<String>>,
    #[multipart(rename = "hairColor")]
    pub hair_color: Option<Text<String>>,
    #[multipart(rename = "photoCount")]
    pub photo_count: Option<Text<i32>>,
    #[multipart(rename = "zipFile", limit = "256MB")]
    pub zip_file: Option<TempFile>,
}

/// Requête de vérification de titre
#[derive(Deserialize)]
pub struct CheckTitleRequest {
    pub title: String,
}

fn require<'a>(field: &'a Option<Text<String>>) -> AppResult<&'a str> {
    field
        .as_ref()
        .map(|text| text.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| bad_request("Missing required fields"))
}

/// Endpoint de création de collection
#[post("/collections")]
pub async fn create_collection(
    req: HttpRequest,
    MultipartForm(form): MultipartForm<CreateCollectionForm>,
    db: web::Data<Database>,
    storage: web::Data<StorageService>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    let user = get_current_user(&req, &db).await?;

    // 1. Validation des champs requis
    let title = require(&form.title)?.to_string();
    let full_name = require(&form.full_name)?.to_string();
    let gender = require(&form.gender)?.to_string();
    let eye_color = require(&form.eye_color)?.to_string();
    let hair_color = require(&form.hair_color)?.to_string();

    let photo_count = form
        .photo_count
        .as_ref()
        .map(|text| text.0)
        .ok_or_else(|| bad_request("Missing required fields"))?;
    let zip_file = form
        .zip_file
        .as_ref()
        .ok_or_else(|| bad_request("Missing required fields"))?;

    let galleries_repo = GalleriesRepository::new(db.pool.clone());

    // 2. Limite de collections actives par utilisateur
    let active = galleries_repo.count_active(&user.id, Utc::now()).await?;
    if active >= config.retention.collection_limit {
        return Err(conflict("Collection limit reached"));
    }

    // 3. Upload de l'archive
    let zip_content = fs::read(zip_file.file.path())?;
    zip_inspect::ensure_zip(&zip_content)?;

    let file_name = zip_file
        .file_name
        .clone()
        .unwrap_or_else(|| "photos.zip".to_string());
    let zip_key = format!(
        "collections/{}/{}-{}",
        user.id,
        Utc::now().timestamp_millis(),
        file_name
    );
    let zip_size = zip_content.len() as i64;
    let zip_url = storage
        .put_object(&zip_key, zip_content, "application/zip")
        .await?;

    // 4. Insertion de la galerie et de son archive
    let new_gallery = NewGallery {
        user_id: user.id,
        title: title.clone(),
        slug: unique_slug(&title),
        full_name,
        gender,
        eye_color,
        hair_color,
        photo_count,
        zip_url: zip_url.clone(),
        zip_key: zip_key.clone(),
        expires_at: Utc::now() + Duration::days(config.retention.model_ttl_days),
    };

    let gallery = galleries_repo.create(&new_gallery).await?;

    let archives_repo = ArchivesRepository::new(db.pool.clone());
    archives_repo
        .create_for_gallery(&gallery.id, &zip_url, &zip_key, zip_size, photo_count)
        .await?;

    tracing::info!("✅ Collection {} créée", gallery.slug);

    Ok(HttpResponse::Created().json(gallery))
}

/// Endpoint pour lister les collections de l'utilisateur
#[get("/collections")]
pub async fn list_collections(
    req: HttpRequest,
    db: web::Data<Database>,
) -> AppResult<HttpResponse> {
    let user = get_current_user(&req, &db).await?;

    let galleries_repo = GalleriesRepository::new(db.pool.clone());
    let galleries = galleries_repo.list_by_user(&user.id).await?;

    Ok(HttpResponse::Ok().json(galleries))
}

/// Endpoint de vérification de disponibilité d'un titre
#[post("/collections/check-title")]
pub async fn check_collection_title(
    req: HttpRequest,
    request: web::Json<CheckTitleRequest>,
    db: web::Data<Database>,
) -> AppResult<HttpResponse> {
    let user = get_current_user(&req, &db).await?;

    let galleries_repo = GalleriesRepository::new(db.pool.clone());
    let existing = galleries_repo
        .find_active_by_title(&user.id, &request.title)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "exists": existing.is_some() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_missing_fields() {
        assert!(require(&None).is_err());
        assert!(require(&Some(Text(String::new()))).is_err());
        assert_eq!(require(&Some(Text("Team".to_string()))).unwrap(), "Team");
    }
}
