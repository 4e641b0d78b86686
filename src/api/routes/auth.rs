use actix_web::{post, web, HttpResponse};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    core::auth::{create_jwt_token, validate_jwt_token, AuthService, TokenType},
    domain::user::{NewUser, User},
    infrastructure::config::AppConfig,
    infrastructure::database::{Database, UserRepository},
    infrastructure::error::{unauthorized, AppResult},
};

/// Requête pour la connexion
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,
    pub password: String,
}

/// Requête pour l'inscription
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, message = "Le nom doit contenir au moins 2 caractères"))]
    pub name: String,
    #[validate(email(message = "Format d'email invalide"))]
    pub email: String,
    #[validate(length(min = 8, message = "Le mot de passe doit contenir au moins 8 caractères"))]
    pub password: String,
}

/// Requête pour le renouvellement de token
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Réponse d'authentification réussie
#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Réponse simplifiée pour l'utilisateur (exclut les données sensibles)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

fn auth_response(user: User, config: &AppConfig) -> AppResult<AuthResponse> {
    let access_validity = Duration::hours(config.security.access_token_expiry_hours);
    let refresh_validity = Duration::days(config.security.refresh_token_expiry_days);

    let access_token = create_jwt_token(
        &user.id,
        TokenType::Access,
        access_validity,
        &config.security.jwt_secret,
    )?;
    let refresh = create_jwt_token(
        &user.id,
        TokenType::Refresh,
        refresh_validity,
        &config.security.jwt_secret,
    )?;

    Ok(AuthResponse {
        user: user.into(),
        access_token,
        refresh_token: refresh,
        token_type: "Bearer".to_string(),
        expires_in: access_validity.num_seconds(),
    })
}

/// Endpoint d'inscription
#[post("/auth/register")]
pub async fn register(
    new_user: web::Json<RegisterRequest>,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    // Validation des inputs
    new_user.validate()?;

    let user_repo = UserRepository::new(db.pool.clone());
    let user = user_repo
        .create(&NewUser {
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password: Some(new_user.password.clone()),
        })
        .await?;

    tracing::info!("👤 Nouvel utilisateur inscrit: {}", user.id);

    let response = auth_response(user, &config)?;
    Ok(HttpResponse::Created().json(response))
}

/// Endpoint de connexion (email/mot de passe)
#[post("/auth/login")]
pub async fn login(
    credentials: web::Json<LoginRequest>,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    // Validation des inputs
    credentials.validate()?;

    let user_repo = UserRepository::new(db.pool.clone());
    let auth_service = AuthService::new(user_repo);

    // Authentification de l'utilisateur
    let user = auth_service
        .authenticate(&credentials.email, &credentials.password)
        .await?;

    let response = auth_response(user, &config)?;
    Ok(HttpResponse::Ok().json(response))
}

/// Endpoint de renouvellement du token d'accès
#[post("/auth/refresh")]
pub async fn refresh_token(
    request: web::Json<RefreshRequest>,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    let claims = validate_jwt_token(&request.refresh_token, &config.security.jwt_secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized("Un token de rafraîchissement est requis"));
    }

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| unauthorized("Invalid token subject"))?;

    // L'utilisateur doit toujours exister et être actif
    let user_repo = UserRepository::new(db.pool.clone());
    let user = user_repo.get_by_id(&user_id).await?;

    let access_validity = Duration::hours(config.security.access_token_expiry_hours);
    let access_token = create_jwt_token(
        &user.id,
        TokenType::Access,
        access_validity,
        &config.security.jwt_secret,
    )?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": access_validity.num_seconds(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "nope".to_string(),
            password: "longenough".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: Some("secret-hash".to_string()),
            auth_provider: Some("email".to_string()),
            auth_provider_id: None,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let response: UserResponse = user.into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("jane@example.com"));
    }
}
