pub mod routes;

use actix_web::web;

/// Configure toutes les routes de l'API
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Routes d'authentification
            .service(routes::auth::register)
            .service(routes::auth::login)
            .service(routes::auth::refresh_token)
            // Routes des modèles
            .service(routes::models::list_models)
            .service(routes::models::create_model)
            .service(routes::models::check_model_title)
            .service(routes::models::get_model)
            .service(routes::models::generate_photos)
            // Routes des collections
            .service(routes::collections::create_collection)
            .service(routes::collections::list_collections)
            .service(routes::collections::check_collection_title)
            // Routes des galeries
            .service(routes::galleries::get_gallery)
            .service(routes::galleries::select_styles)
            .service(routes::galleries::list_styles)
            // Webhooks du service d'entraînement
            .service(routes::webhooks::replicate_training_webhook),
    );

    // Routes publiques
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
}

/// Endpoint de santé pour les probes Kubernetes/Docker
async fn health_check() -> impl actix_web::Responder {
    actix_web::HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(
            App::new().service(web::resource("/health").route(web::get().to(health_check))),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
    }
}
