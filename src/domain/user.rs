use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::infrastructure::error::{AppError, AppResult};

/// Représente un utilisateur du système
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Identifiant unique de l'utilisateur (UUID)
    pub id: Uuid,
    /// Nom complet de l'utilisateur
    pub name: String,
    /// Email de l'utilisateur (unique)
    pub email: String,
    /// Hash du mot de passe (stocké sécurisé, non exposé dans les APIs)
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Fournisseur d'authentification (email, google, linkedin)
    pub auth_provider: Option<String>,
    /// ID du fournisseur d'authentification (pour les comptes sociaux)
    pub auth_provider_id: Option<String>,
    /// Statut du compte (actif/désactivé)
    pub is_active: bool,
    /// Date de création du compte
    pub created_at: DateTime<Utc>,
    /// Date de dernière mise à jour
    pub updated_at: DateTime<Utc>,
}

/// Données requises pour créer un nouvel utilisateur
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 2, message = "Le nom doit contenir au moins 2 caractères"))]
    pub name: String,
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,
    #[validate(length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"))]
    pub password: Option<String>,
}

impl User {
    /// Hash un mot de passe avec Argon2
    pub fn hash_password(password: &str) -> AppResult<String> {
        let argon2 = Argon2::default();
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Vérifie si un mot de passe correspond au hash stocké
    pub fn verify_password(&self, password: &str) -> bool {
        let Some(hash) = &self.password_hash else {
            return false;
        };
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: Some(User::hash_password(password).unwrap()),
            auth_provider: Some("email".to_string()),
            auth_provider_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_and_verify() {
        let user = user_with_password("correct horse battery staple");
        assert!(user.verify_password("correct horse battery staple"));
        assert!(!user.verify_password("wrong password"));
    }

    #[test]
    fn test_verify_without_hash() {
        let mut user = user_with_password("whatever");
        user.password_hash = None;
        assert!(!user.verify_password("whatever"));
    }

    #[test]
    fn test_new_user_validation() {
        let valid = NewUser {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: Some("longenough".to_string()),
        };
        assert!(valid.validate().is_ok());

        let invalid = NewUser {
            name: "J".to_string(),
            email: "not-an-email".to_string(),
            password: Some("short".to_string()),
        };
        assert!(invalid.validate().is_err());
    }
}
