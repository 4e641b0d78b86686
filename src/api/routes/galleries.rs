//! # Routes des galeries
//!
//! Consultation d'une galerie et sélection des deux styles de portrait.

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::{
    core::auth::get_current_user,
    domain::style::{self, STYLES},
    infrastructure::database::{Database, GalleriesRepository},
    infrastructure::error::AppResult,
};

/// Requête de sélection de styles
#[derive(Deserialize)]
pub struct SelectStylesRequest {
    pub styles: Vec<String>,
}

/// Endpoint pour obtenir une galerie par slug
#[get("/galleries/{slug}")]
pub async fn get_gallery(
    req: HttpRequest,
    path: web::Path<String>,
    db: web::Data<Database>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let user = get_current_user(&req, &db).await?;

    let galleries_repo = GalleriesRepository::new(db.pool.clone());
    let gallery = galleries_repo.get_by_slug_for_user(&slug, &user.id).await?;

    Ok(HttpResponse::Ok().json(gallery))
}

/// Endpoint de sélection des deux styles d'une galerie
#[post("/galleries/{slug}/styles")]
pub async fn select_styles(
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<SelectStylesRequest>,
    db: web::Data<Database>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let user = get_current_user(&req, &db).await?;

    style::validate_selection(&request.styles)?;

    let galleries_repo = GalleriesRepository::new(db.pool.clone());
    let gallery = galleries_repo
        .update_styles(&slug, &user.id, &request.styles)
        .await?;

    tracing::info!(
        "🎨 Styles [{}] sélectionnés pour la galerie {}",
        request.styles.join(", "),
        gallery.slug
    );

    Ok(HttpResponse::Ok().json(gallery))
}

/// Endpoint listant les styles proposés à la sélection
#[get("/styles")]
pub async fn list_styles() -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(STYLES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_list_styles_returns_catalog() {
        let app = test::init_service(App::new().service(list_styles)).await;

        let req = test::TestRequest::get().uri("/styles").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: serde_json::Value = test::read_body_json(resp).await;
        let styles = body.as_array().unwrap();
        assert_eq!(styles.len(), 8);
        assert_eq!(styles[0]["id"], "grey");
    }
}
