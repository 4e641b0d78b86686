use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Archive zip uploadée, rattachée à un modèle ou à une galerie
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ZipArchive {
    pub id: Uuid,
    pub model_id: Option<Uuid>,
    pub gallery_id: Option<Uuid>,
    /// URL publique de l'objet stocké
    pub url: String,
    /// Clé de l'objet dans le bucket
    pub key: String,
    /// Taille de l'archive en octets
    pub size: i64,
    /// Nombre de photos contenues
    pub file_count: i32,
    pub created_at: DateTime<Utc>,
}
