use aws_config::meta::region::RegionProviderChain;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;
use tracing::info;

use crate::infrastructure::config::StorageConfig;
use crate::infrastructure::error::{AppError, AppResult};

/// Service de stockage objet (S3 ou MinIO)
#[derive(Clone)]
pub struct StorageService {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
}

impl StorageService {
    /// Crée une nouvelle instance du service de stockage
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        info!("🔧 Initialisation du service de stockage...");

        let region_provider = RegionProviderChain::first_try(Region::new(config.region.clone()))
            .or_else(Region::new("us-east-1"));

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "app-config",
        );

        let mut loader = aws_config::from_env()
            .region(region_provider)
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.as_str());
        }

        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);

        info!("✅ Service de stockage initialisé pour le bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    /// Upload un objet dans le bucket et retourne son URL publique
    pub async fn put_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::InfrastructureError(format!("S3 put_object failed: {}", e)))?;

        Ok(self.public_url(key))
    }

    /// Supprime un objet du bucket
    pub async fn delete_object(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::InfrastructureError(format!("S3 delete_object failed: {}", e))
            })?;

        Ok(())
    }

    /// Génère une URL GET pré-signée, à remettre au service d'entraînement
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> AppResult<String> {
        let presigning_config = PresigningConfig::expires_in(expires_in).map_err(|e| {
            AppError::InfrastructureError(format!("Invalid presigning config: {}", e))
        })?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| AppError::InfrastructureError(format!("S3 presign failed: {}", e)))?;

        Ok(presigned.uri().to_string())
    }

    /// URL publique d'un objet: style virtual-host sur AWS,
    /// style path sur un endpoint compatible (MinIO)
    pub fn public_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }

    /// Création mock pour les tests
    #[cfg(test)]
    pub fn new_test() -> Self {
        Self {
            client: Client::from_conf(aws_sdk_s3::Config::builder().build()),
            bucket: "test-bucket".to_string(),
            endpoint: Some("http://localhost:9000".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_with_endpoint() {
        let service = StorageService::new_test();
        assert_eq!(
            service.public_url("models/u1/title/photos.zip"),
            "http://localhost:9000/test-bucket/models/u1/title/photos.zip"
        );
    }

    #[test]
    fn test_public_url_aws_style() {
        let mut service = StorageService::new_test();
        service.endpoint = None;
        assert_eq!(
            service.public_url("collections/u1/photos.zip"),
            "https://test-bucket.s3.amazonaws.com/collections/u1/photos.zip"
        );
    }
}
