pub mod archives;
pub mod galleries;
pub mod models;
pub mod photos;
pub mod users;

pub use archives::ArchivesRepository;
pub use galleries::GalleriesRepository;
pub use models::ModelsRepository;
pub use photos::PhotosRepository;
pub use users::UserRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Error as SqlxError, PgPool};
use tracing::info;

/// Gestion de la connexion à la base de données
#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Crée une nouvelle connexion à la base de données
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, SqlxError> {
        info!("🔌 Connexion à la base de données PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("✅ Connexion établie avec succès");

        Ok(Self { pool })
    }

    /// Applique les migrations embarquées
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("📦 Application des migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("✅ Migrations à jour");
        Ok(())
    }

    /// Création pour les tests (utilise une connexion existante)
    #[cfg(test)]
    pub fn new_with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}
