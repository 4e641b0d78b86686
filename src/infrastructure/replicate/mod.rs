//! Client HTTP pour l'API Replicate (création de modèles, entraînements
//! et prédictions). Les URLs sont surchargeables pour les tests.

use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::infrastructure::error::{AppError, AppResult};

const REPLICATE_API_BASE: &str = "https://api.replicate.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;
// Les prédictions synchrones peuvent bloquer jusqu'à 60s côté Replicate
const PREDICTION_TIMEOUT_SECS: u64 = 90;

/// Client pour l'API Replicate
#[derive(Clone)]
pub struct ReplicateClient {
    http_client: Arc<HttpClient>,
    api_token: String,
    base_url: String,
}

/// Requête de création d'un modèle de destination
#[derive(Debug, Serialize)]
pub struct CreateModelRequest {
    pub owner: String,
    pub name: String,
    pub visibility: String,
    pub hardware: String,
    pub description: String,
}

/// Requête de lancement d'un entraînement
#[derive(Debug, Serialize)]
pub struct CreateTrainingRequest {
    pub destination: String,
    pub input: Value,
    pub webhook: String,
    pub webhook_events_filter: Vec<String>,
}

/// Job d'entraînement tel que retourné par l'API
#[derive(Debug, Clone, Deserialize)]
pub struct Training {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Prédiction (génération d'images) telle que retournée par l'API
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    /// URLs de sortie, si la prédiction a abouti
    pub fn output_urls(&self) -> Vec<String> {
        match &self.output {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            Some(Value::String(url)) => vec![url.clone()],
            _ => Vec::new(),
        }
    }
}

impl ReplicateClient {
    pub fn new(api_token: String) -> Self {
        Self::with_base_url(api_token, REPLICATE_API_BASE.to_string())
    }

    /// Construit un client pointant sur une autre base (tests)
    pub fn with_base_url(api_token: String, base_url: String) -> Self {
        let http_client = Arc::new(
            HttpClient::builder()
                .timeout(Duration::from_secs(PREDICTION_TIMEOUT_SECS))
                .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        );

        Self {
            http_client,
            api_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Crée le modèle de destination qui recevra les poids fine-tunés
    pub async fn create_model(&self, request: &CreateModelRequest) -> AppResult<()> {
        let url = format!("{}/v1/models", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .json(request)
            .send()
            .await?;

        // 409: le modèle de destination existe déjà, on peut réutiliser
        if response.status() == StatusCode::CONFLICT {
            info!("ℹ️  Modèle Replicate {} déjà existant, réutilisation", request.name);
            return Ok(());
        }

        Self::ensure_success(response).await.map(|_| ())
    }

    /// Lance un entraînement sur la version de base indiquée
    pub async fn create_training(
        &self,
        owner: &str,
        model: &str,
        version: &str,
        request: &CreateTrainingRequest,
    ) -> AppResult<Training> {
        let url = format!(
            "{}/v1/models/{}/{}/versions/{}/trainings",
            self.base_url, owner, model, version
        );

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .json(request)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let training: Training = response.json().await?;

        Ok(training)
    }

    /// Crée une prédiction en mode synchrone (header `Prefer: wait`)
    pub async fn create_prediction(&self, version: &str, input: Value) -> AppResult<Prediction> {
        let url = format!("{}/v1/predictions", self.base_url);

        let body = serde_json::json!({
            "version": version,
            "input": input,
        });

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let prediction: Prediction = response.json().await?;

        Ok(prediction)
    }

    /// Transforme une réponse non-2xx en erreur ExternalService
    async fn ensure_success(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::ExternalService(format!(
            "Replicate API error ({}): {}",
            status, body
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_training_posts_expected_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models/ostris/flux-dev-lora-trainer/versions/abc123/trainings"))
            .and(header("Authorization", "Token r8_test"))
            .and(body_partial_json(serde_json::json!({
                "destination": "acme/jane-doe-xyz",
                "webhook_events_filter": ["start", "completed"],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "train-1",
                "status": "starting",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReplicateClient::with_base_url("r8_test".to_string(), server.uri());
        let training = client
            .create_training(
                "ostris",
                "flux-dev-lora-trainer",
                "abc123",
                &CreateTrainingRequest {
                    destination: "acme/jane-doe-xyz".to_string(),
                    input: serde_json::json!({ "steps": 2000 }),
                    webhook: "https://app.example.com/api/webhooks/replicate/training".to_string(),
                    webhook_events_filter: vec!["start".to_string(), "completed".to_string()],
                },
            )
            .await
            .unwrap();

        assert_eq!(training.id, "train-1");
        assert_eq!(training.status, "starting");
    }

    #[tokio::test]
    async fn test_create_model_tolerates_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let client = ReplicateClient::with_base_url("r8_test".to_string(), server.uri());
        let result = client
            .create_model(&CreateModelRequest {
                owner: "acme".to_string(),
                name: "jane-doe-xyz".to_string(),
                visibility: "private".to_string(),
                hardware: "gpu-t4".to_string(),
                description: "Fine-tuned model".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_api_error_maps_to_external_service() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ReplicateClient::with_base_url("r8_test".to_string(), server.uri());
        let result = client
            .create_prediction("version-1", serde_json::json!({ "prompt": "x" }))
            .await;

        match result {
            Err(AppError::ExternalService(msg)) => assert!(msg.contains("boom")),
            other => panic!("Expected ExternalService error, got {:?}", other.map(|p| p.id)),
        }
    }

    #[tokio::test]
    async fn test_prediction_output_urls() {
        let prediction = Prediction {
            id: "p1".to_string(),
            status: "succeeded".to_string(),
            output: Some(serde_json::json!([
                "https://cdn.example.com/a.webp",
                "https://cdn.example.com/b.webp",
            ])),
            error: None,
        };

        assert_eq!(
            prediction.output_urls(),
            vec![
                "https://cdn.example.com/a.webp".to_string(),
                "https://cdn.example.com/b.webp".to_string(),
            ]
        );

        let single = Prediction {
            id: "p2".to_string(),
            status: "succeeded".to_string(),
            output: Some(serde_json::json!("https://cdn.example.com/c.webp")),
            error: None,
        };
        assert_eq!(single.output_urls().len(), 1);
    }
}
