use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Statut du cycle de vie d'un modèle ou d'une galerie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "model_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStatus {
    Processing,
    Training,
    Ready,
    Failed,
    Cancelled,
    Expired,
}

impl Default for ModelStatus {
    fn default() -> Self {
        ModelStatus::Processing
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelStatus::Processing => "PROCESSING",
            ModelStatus::Training => "TRAINING",
            ModelStatus::Ready => "READY",
            ModelStatus::Failed => "FAILED",
            ModelStatus::Cancelled => "CANCELLED",
            ModelStatus::Expired => "EXPIRED",
        };
        write!(f, "{}", s)
    }
}

/// Origine ethnique du sujet, utilisée pour l'autocaption d'entraînement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ethnicity", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ethnicity {
    Asian,
    Black,
    Hispanic,
    MiddleEastern,
    White,
    PacificIslander,
    Mixed,
    Other,
}

impl Ethnicity {
    /// Libellé en minuscules pour les prompts ("middle eastern", "asian", ...)
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Ethnicity::Asian => "asian",
            Ethnicity::Black => "black",
            Ethnicity::Hispanic => "hispanic",
            Ethnicity::MiddleEastern => "middle eastern",
            Ethnicity::White => "white",
            Ethnicity::PacificIslander => "pacific islander",
            Ethnicity::Mixed => "mixed",
            Ethnicity::Other => "other",
        }
    }
}

impl FromStr for Ethnicity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASIAN" => Ok(Ethnicity::Asian),
            "BLACK" => Ok(Ethnicity::Black),
            "HISPANIC" => Ok(Ethnicity::Hispanic),
            "MIDDLE_EASTERN" => Ok(Ethnicity::MiddleEastern),
            "WHITE" => Ok(Ethnicity::White),
            "PACIFIC_ISLANDER" => Ok(Ethnicity::PacificIslander),
            "MIXED" => Ok(Ethnicity::Mixed),
            "OTHER" => Ok(Ethnicity::Other),
            other => Err(format!("Ethnicité inconnue: {}", other)),
        }
    }
}

/// Représente un modèle fine-tuné à partir d'un lot de photos utilisateur
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Model {
    /// Identifiant unique du modèle
    pub id: Uuid,
    /// ID de l'utilisateur propriétaire
    pub user_id: Uuid,
    /// Titre choisi par l'utilisateur
    pub title: String,
    /// Slug unique pour les URLs
    pub slug: String,
    /// Nom complet du sujet
    pub full_name: String,
    pub gender: String,
    pub eye_color: String,
    pub hair_color: String,
    pub age: i32,
    pub ethnicity: Ethnicity,
    /// Nombre de photos dans l'archive uploadée
    pub photo_count: i32,
    /// Statut actuel du cycle de vie
    pub status: ModelStatus,
    /// Mot déclencheur injecté dans les prompts
    pub trigger_word: String,
    /// URL publique de l'archive zip
    pub zip_url: String,
    /// Clé S3 de l'archive zip
    pub zip_key: String,
    /// URL de l'image de couverture extraite de l'archive
    pub cover_image: Option<String>,
    /// ID opaque du job d'entraînement chez Replicate
    pub training_id: Option<String>,
    /// Version du modèle entraîné, rapportée par le webhook de complétion
    pub model_version: Option<String>,
    /// Dernier statut brut reçu du service d'entraînement
    pub training_status: Option<String>,
    /// Message d'erreur si l'entraînement a échoué
    pub training_error: Option<String>,
    pub training_started: Option<DateTime<Utc>>,
    pub training_ended: Option<DateTime<Utc>>,
    /// Date d'expiration (30 jours après création)
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Clé S3 du dossier contenant tous les objets du modèle
    pub fn storage_prefix(&self) -> String {
        self.zip_key
            .rsplit_once('/')
            .map(|(prefix, _)| prefix.to_string())
            .unwrap_or_else(|| self.zip_key.clone())
    }
}

/// Données requises pour créer un nouveau modèle
#[derive(Debug, Clone)]
pub struct NewModel {
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub full_name: String,
    pub gender: String,
    pub eye_color: String,
    pub hair_color: String,
    pub age: i32,
    pub ethnicity: Ethnicity,
    pub photo_count: i32,
    pub trigger_word: String,
    pub zip_url: String,
    pub zip_key: String,
    pub cover_image: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethnicity_from_form_value() {
        assert_eq!(
            "MIDDLE_EASTERN".parse::<Ethnicity>().unwrap(),
            Ethnicity::MiddleEastern
        );
        assert_eq!("asian".parse::<Ethnicity>().unwrap(), Ethnicity::Asian);
        assert!("MARTIAN".parse::<Ethnicity>().is_err());
    }

    #[test]
    fn test_ethnicity_prompt_label() {
        assert_eq!(Ethnicity::MiddleEastern.prompt_label(), "middle eastern");
        assert_eq!(Ethnicity::PacificIslander.prompt_label(), "pacific islander");
    }

    #[test]
    fn test_status_display_matches_stored_values() {
        assert_eq!(ModelStatus::Processing.to_string(), "PROCESSING");
        assert_eq!(ModelStatus::Cancelled.to_string(), "CANCELLED");
        assert_eq!(ModelStatus::Expired.to_string(), "EXPIRED");
    }

    #[test]
    fn test_status_serde_roundtrip() {
        let json = serde_json::to_string(&ModelStatus::Training).unwrap();
        assert_eq!(json, "\"TRAINING\"");
        let back: ModelStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ModelStatus::Training);
    }
}
