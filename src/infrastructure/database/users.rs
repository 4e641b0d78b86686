use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    domain::user::{NewUser, User},
    infrastructure::error::{AppError, AppResult},
};

/// Repository pour les opérations sur les utilisateurs
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Crée une nouvelle instance du repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Crée un nouvel utilisateur; 409 si l'email est déjà pris
    pub async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        let password_hash = match &new_user.password {
            Some(password) => Some(User::hash_password(password)?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, auth_provider)
            VALUES ($1, $2, $3, 'email')
            RETURNING *
            "#,
        )
        .bind(&new_user.name)
        .bind(new_user.email.trim().to_lowercase())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Cet email est déjà utilisé.".to_string()),
            other => other,
        })?;

        Ok(user)
    }

    /// Récupère un utilisateur par son ID
    pub async fn get_by_id(&self, user_id: &Uuid) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(user)
    }

    /// Récupère un utilisateur par email (normalisé en minuscules)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
