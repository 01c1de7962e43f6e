//! Cloudinary upload API client.
//!
//! Implements [`MediaStore`] with signed `image/upload` and `image/destroy`
//! calls.

use std::env;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::{MediaError, MediaStore};
use crate::config::parse_or;
use crate::models::ImageAsset;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl CloudinaryConfig {
    pub fn from_env() -> Self {
        let timeout_secs = parse_or("MEDIA_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            api_key: env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
            api_secret: env::var("CLOUDINARY_API_SECRET").unwrap_or_default(),
            api_base: env::var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MediaError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    async fn read_json<T>(response: reqwest::Response) -> Result<T, MediaError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| MediaError::InvalidResponse(e.to_string()))
    }
}

/// Signs request parameters the way Cloudinary expects: sorted `key=value`
/// pairs joined with `&`, followed by the API secret, SHA-1 hex encoded.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(&self, file: &Path, folder: &str) -> Result<ImageAsset, MediaError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("folder", folder.to_string())
            .text("timestamp", timestamp)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let uploaded: UploadResponse = Self::read_json(response).await?;
        tracing::debug!(image_id = %uploaded.public_id, "Image uploaded");

        Ok(ImageAsset {
            image_url: uploaded.secure_url,
            image_id: uploaded.public_id,
        })
    }

    async fn delete(&self, image_id: &str) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", image_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", image_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let destroyed: DestroyResponse = Self::read_json(response).await?;
        if destroyed.result != "ok" {
            return Err(MediaError::Rejected {
                status: 200,
                message: format!("destroy {image_id}: {}", destroyed.result),
            });
        }

        tracing::debug!(image_id = %image_id, "Image deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::io::Write;
    use tokio::net::TcpListener;

    async fn spawn_media_host(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(api_base: String) -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            api_base,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_bad_timeout_falls_back_to_default() {
        std::env::set_var("MEDIA_TIMEOUT_SECS", "soon");
        let config = CloudinaryConfig::from_env();
        std::env::remove_var("MEDIA_TIMEOUT_SECS");

        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_client_keeps_configured_timeout() {
        let client = client_for("http://127.0.0.1:9".to_string());

        assert_eq!(client.config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_sign_params_matches_documented_example() {
        let signature = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "sample_image"),
                ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
            ],
            "abcd",
        );

        assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
    }

    #[test]
    fn test_sign_upload_params() {
        let signature = sign_params(
            &[("timestamp", "1700000000"), ("folder", "event/images")],
            "secret",
        );

        assert_eq!(signature, "e72f9a678f1f4450c1d4e1beee8d8188407a9a93");
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url_and_public_id() {
        let router = Router::new().route(
            "/demo/image/upload",
            post(|| async {
                Json(json!({
                    "secure_url": "https://cdn/x",
                    "public_id": "event/images/abc123",
                }))
            }),
        );
        let client = client_for(spawn_media_host(router).await);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"png bytes").unwrap();

        let asset = client.upload(file.path(), "event/images").await.unwrap();

        assert_eq!(asset.image_url, "https://cdn/x");
        assert_eq!(asset.image_id, "event/images/abc123");
    }

    #[tokio::test]
    async fn test_upload_surfaces_host_error_message() {
        let router = Router::new().route(
            "/demo/image/upload",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": { "message": "Invalid Signature" } })),
                )
            }),
        );
        let client = client_for(spawn_media_host(router).await);
        let file = tempfile::NamedTempFile::new().unwrap();

        let err = client.upload(file.path(), "event/images").await.unwrap_err();

        match err {
            MediaError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let client = client_for("http://127.0.0.1:9".to_string());

        let err = client
            .upload(Path::new("/nonexistent/upload.png"), "event/images")
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Io(_)));
    }

    #[tokio::test]
    async fn test_delete_ok() {
        let router = Router::new().route(
            "/demo/image/destroy",
            post(|| async { Json(json!({ "result": "ok" })) }),
        );
        let client = client_for(spawn_media_host(router).await);

        assert!(client.delete("abc123").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let router = Router::new().route(
            "/demo/image/destroy",
            post(|| async { Json(json!({ "result": "not found" })) }),
        );
        let client = client_for(spawn_media_host(router).await);

        let err = client.delete("missing").await.unwrap_err();

        assert!(matches!(err, MediaError::Rejected { .. }));
    }
}
