//! Authentification JWT: émission et validation des tokens, résolution de
//! l'utilisateur courant depuis l'en-tête Authorization.

use actix_web::{web, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::user::User,
    infrastructure::config::AppConfig,
    infrastructure::database::{Database, UserRepository},
    infrastructure::error::{unauthorized, AppError, AppResult},
};

/// Type de token émis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims portées par les tokens JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// ID de l'utilisateur
    pub sub: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Crée un token JWT signé pour un utilisateur
pub fn create_jwt_token(
    user_id: &Uuid,
    token_type: TokenType,
    validity: Duration,
    secret: &str,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        token_type,
        iat: now.timestamp(),
        exp: (now + validity).timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token creation failed: {}", e)))?;

    Ok(token)
}

/// Valide la signature et l'expiration d'un token JWT
pub fn validate_jwt_token(token: &str, secret: &str) -> AppResult<JwtClaims> {
    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(data.claims)
}

/// Extrait le token Bearer de l'en-tête Authorization
fn bearer_token(req: &HttpRequest) -> AppResult<&str> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization header"))
}

/// Résout l'utilisateur courant depuis la requête.
///
/// Un token valide dont l'utilisateur n'existe plus en base répond 401
/// "User not found", pas 404.
pub async fn get_current_user(req: &HttpRequest, db: &Database) -> AppResult<User> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::ConfigurationError("AppConfig non enregistrée".to_string()))?;

    let token = bearer_token(req)?;
    let claims = validate_jwt_token(token, &config.security.jwt_secret)?;

    if claims.token_type != TokenType::Access {
        return Err(unauthorized("Un token d'accès est requis"));
    }

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| unauthorized("Invalid token subject"))?;

    let user_repo = UserRepository::new(db.pool.clone());
    let user = match user_repo.get_by_id(&user_id).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => return Err(unauthorized("User not found")),
        Err(other) => return Err(other),
    };

    if !user.is_active {
        return Err(AppError::Forbidden("Compte désactivé".to_string()));
    }

    Ok(user)
}

/// Service d'authentification email/mot de passe
pub struct AuthService {
    user_repo: UserRepository,
}

impl AuthService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Vérifie les identifiants et retourne l'utilisateur correspondant
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| unauthorized("Email ou mot de passe incorrect"))?;

        if !user.verify_password(password) {
            return Err(unauthorized("Email ou mot de passe incorrect"));
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Compte désactivé".to_string()));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_of_at_least_32_chars!!";

    #[test]
    fn test_token_roundtrip() {
        let user_id = Uuid::new_v4();
        let token =
            create_jwt_token(&user_id, TokenType::Access, Duration::hours(2), SECRET).unwrap();

        let claims = validate_jwt_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let user_id = Uuid::new_v4();
        let token =
            create_jwt_token(&user_id, TokenType::Access, Duration::hours(-1), SECRET).unwrap();

        assert!(validate_jwt_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let user_id = Uuid::new_v4();
        let token =
            create_jwt_token(&user_id, TokenType::Access, Duration::hours(2), SECRET).unwrap();

        assert!(validate_jwt_token(&token, "another_secret_with_32_characters!").is_err());
    }

    #[test]
    fn test_refresh_token_keeps_its_type() {
        let user_id = Uuid::new_v4();
        let token =
            create_jwt_token(&user_id, TokenType::Refresh, Duration::days(30), SECRET).unwrap();

        let claims = validate_jwt_token(&token, SECRET).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
    }
}
