//! # Webhook d'entraînement Replicate
//!
//! Reçoit les callbacks asynchrones du service d'entraînement et reporte le
//! statut sur le modèle correspondant. Simple écrasement du champ statut:
//! pas de machine à états, pas de rejeu. Un statut inconnu est acquitté
//! sans mutation pour que Replicate ne réessaie pas indéfiniment.
//!
//! La signature HMAC des webhooks est vérifiée si un secret est configuré
//! (`replicate.webhook_secret`), ignorée sinon.

use actix_web::{post, web, HttpRequest, HttpResponse};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{info, warn};

use crate::{
    infrastructure::config::AppConfig,
    infrastructure::database::{Database, ModelsRepository},
    infrastructure::error::{bad_request, not_found, unauthorized, AppError, AppResult},
};

type HmacSha256 = Hmac<Sha256>;

/// Payload des callbacks d'entraînement
#[derive(Debug, Deserialize)]
pub struct TrainingWebhook {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Endpoint recevant les callbacks du service d'entraînement
#[post("/webhooks/replicate/training")]
pub async fn replicate_training_webhook(
    req: HttpRequest,
    body: web::Bytes,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
) -> AppResult<HttpResponse> {
    info!("📥 Webhook d'entraînement reçu");

    if let Some(secret) = &config.replicate.webhook_secret {
        verify_webhook_signature(&req, &body, secret)?;
    }

    let payload: TrainingWebhook =
        serde_json::from_slice(&body).map_err(|_| bad_request("Invalid payload"))?;

    let training_id = payload
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| bad_request("Missing training ID"))?;

    let models_repo = ModelsRepository::new(db.pool.clone());
    let model = models_repo
        .find_by_training_id(training_id)
        .await?
        .ok_or_else(|| not_found("Model"))?;

    let status = payload.status.as_deref().unwrap_or("");
    match status {
        "starting" | "processing" => {
            info!("🏋️  Entraînement {} en cours ({})", training_id, status);
            models_repo.set_training_status(&model.id, status).await?;
        }
        "succeeded" | "completed" => {
            let model_version = extract_model_version(&payload.output);
            info!(
                "✅ Entraînement {} terminé, version: {:?}",
                training_id, model_version
            );
            models_repo
                .mark_ready(&model.id, model_version.as_deref(), status)
                .await?;
        }
        "failed" => {
            let message = error_message(&payload.error);
            warn!("❌ Entraînement {} échoué: {}", training_id, message);
            models_repo.mark_failed(&model.id, &message, status).await?;
        }
        "canceled" | "cancelled" => {
            info!("🛑 Entraînement {} annulé", training_id);
            models_repo.mark_cancelled(&model.id, status).await?;
        }
        other => {
            warn!(
                "⚠️  Statut d'entraînement inconnu '{}' pour {}, ignoré",
                other, training_id
            );
        }
    }

    Ok(HttpResponse::Ok().body("OK"))
}

/// Vérifie la signature HMAC-SHA256 du webhook.
/// Contenu signé: `{webhook-id}.{webhook-timestamp}.{body}`, signature
/// attendue parmi les entrées `v1,<base64>` de l'en-tête.
fn verify_webhook_signature(req: &HttpRequest, body: &[u8], secret: &str) -> AppResult<()> {
    let webhook_id = required_header(req, "webhook-id")?;
    let timestamp = required_header(req, "webhook-timestamp")?;
    let signature_header = required_header(req, "webhook-signature")?;

    let key = BASE64
        .decode(secret.trim_start_matches("whsec_"))
        .map_err(|_| {
            AppError::ConfigurationError("replicate.webhook_secret invalide".to_string())
        })?;

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| AppError::ConfigurationError(format!("Clé HMAC invalide: {}", e)))?;
    mac.update(webhook_id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);

    let expected = BASE64.encode(mac.finalize().into_bytes());

    let matches = signature_header.split_whitespace().any(|entry| {
        entry
            .split_once(',')
            .map(|(_, signature)| signature == expected)
            .unwrap_or(false)
    });

    if !matches {
        return Err(unauthorized("Invalid webhook signature"));
    }

    Ok(())
}

fn required_header<'a>(req: &'a HttpRequest, name: &str) -> AppResult<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| unauthorized(format!("Missing {} header", name)))
}

/// Version du modèle entraîné, rapportée dans `output.version` (ou
/// `output.model` selon la version de l'API)
fn extract_model_version(output: &Option<Value>) -> Option<String> {
    let output = output.as_ref()?;
    output
        .get("version")
        .or_else(|| output.get("model"))
        .and_then(|value| value.as_str())
        .map(|s| s.to_string())
}

/// Message d'erreur du payload, ou un libellé par défaut
fn error_message(error: &Option<Value>) -> String {
    match error {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => "Training failed".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_payload_parsing() {
        let payload: TrainingWebhook = serde_json::from_str(
            r#"{
                "id": "train-1",
                "status": "succeeded",
                "output": { "version": "acme/jane:deadbeef" }
            }"#,
        )
        .unwrap();

        assert_eq!(payload.id.as_deref(), Some("train-1"));
        assert_eq!(payload.status.as_deref(), Some("succeeded"));
        assert_eq!(
            extract_model_version(&payload.output).as_deref(),
            Some("acme/jane:deadbeef")
        );
    }

    #[test]
    fn test_extract_model_version_fallback_to_model_field() {
        let output = Some(serde_json::json!({ "model": "acme/jane" }));
        assert_eq!(extract_model_version(&output).as_deref(), Some("acme/jane"));
        assert_eq!(extract_model_version(&None), None);
        assert_eq!(
            extract_model_version(&Some(serde_json::json!({ "weights": "..." }))),
            None
        );
    }

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(&Some(Value::String("out of memory".to_string()))),
            "out of memory"
        );
        assert_eq!(error_message(&None), "Training failed");
        assert_eq!(error_message(&Some(Value::Null)), "Training failed");

        let structured = Some(serde_json::json!({ "detail": "oom" }));
        assert!(error_message(&structured).contains("oom"));
    }

    #[test]
    fn test_signature_verification_roundtrip() {
        // Secret et signature calculés avec la même primitive
        let key = b"super-secret-webhook-key";
        let secret = format!("whsec_{}", BASE64.encode(key));
        let body = br#"{"id":"train-1","status":"succeeded"}"#;

        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(b"msg-1.1700000000.");
        mac.update(body);
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let req = TestRequest::post()
            .insert_header(("webhook-id", "msg-1"))
            .insert_header(("webhook-timestamp", "1700000000"))
            .insert_header(("webhook-signature", format!("v1,{}", signature)))
            .to_http_request();

        assert!(verify_webhook_signature(&req, body, &secret).is_ok());

        // Corps altéré: signature refusée
        let tampered = br#"{"id":"train-1","status":"failed"}"#;
        assert!(verify_webhook_signature(&req, tampered, &secret).is_err());
    }

    #[test]
    fn test_signature_missing_headers() {
        let key = b"super-secret-webhook-key";
        let secret = format!("whsec_{}", BASE64.encode(key));

        let req = TestRequest::post().to_http_request();
        assert!(verify_webhook_signature(&req, b"{}", &secret).is_err());
    }
}
