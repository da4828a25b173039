use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use url::Url;
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{AppError, MediaError};
use crate::media::{MediaAsset, MediaKind, MediaStore, MediaUpload};
use crate::Result;

/// Signed-request client for a Cloudinary-compatible upload API.
pub struct CloudinaryClient {
    client: reqwest::Client,
    base_url: Url,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: String,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| AppError::ConfigError(format!("media.base_url: {}", e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn endpoint(&self, kind: MediaKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.cloud_name,
            kind.resource_type(),
            action
        )
    }

    /// SHA-256 over the `&`-joined, key-sorted parameters followed by the secret.
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let joined = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        let digest = Sha256::digest(format!("{}{}", joined, self.api_secret).as_bytes());
        format!("{digest:x}")
    }

    fn signed_form(&self, mut params: BTreeMap<&'static str, String>) -> Vec<(&'static str, String)> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = self.sign(&params);

        let mut form: Vec<(&'static str, String)> = params.into_iter().collect();
        form.push(("api_key", self.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));
        form
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(&self, upload: &MediaUpload, folder: &str) -> Result<MediaAsset> {
        let kind = upload.kind();
        let file = upload.data_uri()?;

        let mut params = BTreeMap::new();
        params.insert("public_id", format!("{}/{}", folder, Uuid::new_v4()));
        let mut form = self.signed_form(params);
        form.push(("file", file));

        let response = self
            .client
            .post(self.endpoint(kind, "upload"))
            .form(&form)
            .send()
            .await
            .map_err(MediaError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "media upload rejected");
            return Err(MediaError::UploadFailed(format!("provider returned {}", status)).into());
        }

        let body: UploadResponse = response.json().await.map_err(MediaError::from)?;
        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| MediaError::UploadFailed("response carried no url".into()))?;

        tracing::info!(public_id = %body.public_id, "uploaded {}", upload.file_name);
        Ok(MediaAsset {
            url,
            public_id: body.public_id,
            duration: body.duration,
        })
    }

    async fn delete(&self, public_id: &str, kind: MediaKind) -> Result<()> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        let form = self.signed_form(params);

        let response = self
            .client
            .post(self.endpoint(kind, "destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| MediaError::DeleteFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::DeleteFailed(format!("provider returned {}", response.status())).into());
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::DeleteFailed(e.to_string()))?;

        // "not found" means the file is already gone
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::DeleteFailed(other.to_string()).into()),
        }
    }
}
