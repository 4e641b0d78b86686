use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Image générée par un modèle entraîné
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GeneratedPhoto {
    pub id: Uuid,
    pub model_id: Uuid,
    pub url: String,
    /// Prompt ayant produit l'image (absent pour les sorties importées)
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}
