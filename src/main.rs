use actix_cors::Cors;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{middleware, web, App, HttpServer};
use std::env;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod core;
mod domain;
mod infrastructure;
mod workers;

use crate::core::training::TrainingService;
use infrastructure::{
    config::AppConfig, database::Database, replicate::ReplicateClient, storage::StorageService,
};
use workers::expiry_worker::{start_expiry_worker, ExpiryConfig};

// Limites d'upload: archives de photos jusqu'à 256 Mo, champs texte en mémoire
const MULTIPART_TOTAL_LIMIT: usize = 512 * 1024 * 1024;
const MULTIPART_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Chargement du .env local avant toute lecture d'environnement
    let _ = dotenv::dotenv();

    // Initialisation du logging
    setup_tracing();
    info!("🚀 Démarrage de Headshot Platform Backend");

    // Chargement de la configuration
    let config = AppConfig::load().expect("❌ Impossible de charger la configuration");
    info!("✅ Configuration chargée avec succès");

    // Initialisation des services
    let db = Database::new(&config.database.url, config.database.max_connections)
        .await
        .expect("❌ Impossible de se connecter à la base de données");

    db.migrate()
        .await
        .expect("❌ Impossible d'appliquer les migrations");

    let storage = StorageService::new(&config.storage)
        .await
        .expect("❌ Impossible d'initialiser le stockage");

    let replicate = ReplicateClient::new(config.replicate.api_token.clone());
    let training = TrainingService::new(
        replicate,
        config.replicate.username.clone(),
        config.training_webhook_url(),
    );

    // Démarrage du worker d'expiration
    let expiry_config = ExpiryConfig {
        interval_seconds: config.retention.expiry_interval_seconds,
        ..ExpiryConfig::default()
    };
    start_expiry_worker(expiry_config, db.clone(), storage.clone())
        .await
        .expect("❌ Impossible de démarrer le worker d'expiration");

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let server_workers = config.server.workers;

    let config_data = web::Data::new(config);
    let db_data = web::Data::new(db);
    let storage_data = web::Data::new(storage);
    let training_data = web::Data::new(training);

    // Configuration du serveur Actix-Web
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .app_data(config_data.clone())
            .app_data(db_data.clone())
            .app_data(storage_data.clone())
            .app_data(training_data.clone())
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(MULTIPART_TOTAL_LIMIT)
                    .memory_limit(MULTIPART_MEMORY_LIMIT),
            )
            .configure(api::config)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .workers(server_workers)
    .shutdown_timeout(10);

    info!("✅ Backend démarré avec succès!");
    info!("🔗 API disponible sur http://{}:{}", server_host, server_port);

    server.run().await
}

/// Configure le tracing pour le logging structuré
fn setup_tracing() {
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".into());

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(if log_format == "json" {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        } else {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .with_file(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        });

    subscriber.init();
}
