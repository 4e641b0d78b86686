use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::model::ModelStatus;

/// Représente un lot de photos uploadé sans entraînement associé
/// (le parcours "collection" de l'application)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Gallery {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub full_name: String,
    pub gender: String,
    pub eye_color: String,
    pub hair_color: String,
    pub photo_count: i32,
    pub status: ModelStatus,
    pub zip_url: String,
    pub zip_key: String,
    /// Les deux styles choisis par l'utilisateur (vide avant sélection)
    pub selected_styles: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Données requises pour créer une nouvelle galerie
#[derive(Debug, Clone)]
pub struct NewGallery {
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub full_name: String,
    pub gender: String,
    pub eye_color: String,
    pub hair_color: String,
    pub photo_count: i32,
    pub zip_url: String,
    pub zip_key: String,
    pub expires_at: DateTime<Utc>,
}
