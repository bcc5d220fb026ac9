//! Image host client
//!
//! Thin client for a Cloudinary-shaped asset host: multipart upload into
//! a folder returning `{url, public_id}`, and deletion by public id.
//! Requests are signed with SHA-256 over the sorted parameter string.
//!
//! The public id returned at upload time is persisted next to the stored
//! URL and used as the deletion key; `extract_public_id_from_url` exists
//! only as a fallback for documents written before the id was persisted.

use crate::config::ImageHostConfig;
use crate::errors::{AppError, Result};
use regex_lite::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Eager transformation applied to every uploaded image
const UPLOAD_TRANSFORMATION: &str = "c_fill,g_face,h_400,w_400/f_auto,q_auto";

/// A stored asset as reported by the host
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Image host client
#[derive(Clone)]
pub struct ImageHost {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
}

impl ImageHost {
    /// Create a new client from configuration
    pub fn new(config: &ImageHostConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Upload an image buffer into `folder`; returns the hosted URL and
    /// the opaque public id used for later deletion
    pub async fn upload(&self, data: Vec<u8>, folder: &str, filename: &str) -> Result<UploadedImage> {
        let timestamp = unix_timestamp();
        let params = [
            ("folder", folder.to_string()),
            ("timestamp", timestamp.to_string()),
            ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ];
        let signature = sign_params(&params, &self.api_secret);

        let form = reqwest::multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", folder.to_string())
            .text("transformation", UPLOAD_TRANSFORMATION)
            .text("signature", signature)
            .part(
                "file",
                reqwest::multipart::Part::bytes(data).file_name(filename.to_string()),
            );

        let url = format!("{}/{}/image/upload", self.api_base, self.cloud_name);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ImageHost {
                message: format!("Upload request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ImageHost {
                message: format!("Upload failed with {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::ImageHost {
            message: format!("Failed to parse upload response: {}", e),
        })
    }

    /// Delete a stored asset by its public id
    pub async fn destroy(&self, public_id: &str) -> Result<()> {
        let timestamp = unix_timestamp();
        let params = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = sign_params(&params, &self.api_secret);

        let url = format!("{}/{}/image/destroy", self.api_base, self.cloud_name);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("timestamp", &timestamp.to_string()),
                ("api_key", &self.api_key),
                ("signature", &signature),
            ])
            .send()
            .await
            .map_err(|e| AppError::ImageHost {
                message: format!("Destroy request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ImageHost {
                message: format!("Destroy failed with {}: {}", status, body),
            });
        }

        let result: DestroyResponse =
            response.json().await.map_err(|e| AppError::ImageHost {
                message: format!("Failed to parse destroy response: {}", e),
            })?;

        tracing::debug!(public_id = public_id, result = %result.result, "Image destroy completed");
        Ok(())
    }
}

/// SHA-256 signature over the sorted `key=value` parameter string
fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Recover the public id from a hosted asset URL.
///
/// Fallback for documents that predate the persisted public id. Assumes
/// the `.../upload/[v<digits>/]folder/id.ext` URL shape.
pub fn extract_public_id_from_url(url: &str) -> Option<String> {
    if !url.contains("cloudinary.com") {
        return None;
    }

    let parts: Vec<&str> = url.split('/').collect();
    let upload_index = parts.iter().position(|part| *part == "upload")?;
    if upload_index + 1 >= parts.len() {
        return None;
    }

    let version = Regex::new(r"^v\d+$").expect("static regex");
    let mut path = &parts[upload_index + 1..];

    // Skip the optional version segment
    if path.first().is_some_and(|segment| version.is_match(segment)) {
        path = &path[1..];
    }
    if path.is_empty() {
        return None;
    }

    let full_path = path.join("/");

    // Strip the file extension from the last segment
    let public_id = match full_path.rfind('.') {
        Some(dot) if dot > full_path.rfind('/').map_or(0, |slash| slash + 1) => {
            full_path[..dot].to_string()
        }
        _ => full_path,
    };

    Some(public_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_version_segment() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1712345678/libris/books/abc123.jpg";
        assert_eq!(
            extract_public_id_from_url(url),
            Some("libris/books/abc123".to_string())
        );
    }

    #[test]
    fn test_extract_without_version_segment() {
        let url = "https://res.cloudinary.com/demo/image/upload/libris/authors/xyz.png";
        assert_eq!(
            extract_public_id_from_url(url),
            Some("libris/authors/xyz".to_string())
        );
    }

    #[test]
    fn test_extract_rejects_foreign_urls() {
        assert_eq!(extract_public_id_from_url("https://example.com/a/b.jpg"), None);
        assert_eq!(extract_public_id_from_url(""), None);
    }

    #[test]
    fn test_extract_rejects_bare_upload_path() {
        assert_eq!(
            extract_public_id_from_url("https://res.cloudinary.com/demo/image/upload"),
            None
        );
    }

    #[test]
    fn test_extract_keeps_dots_in_folders() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1/my.folder/asset.webp";
        assert_eq!(
            extract_public_id_from_url(url),
            Some("my.folder/asset".to_string())
        );
    }

    #[test]
    fn test_signature_is_deterministic_and_sorted() {
        let a = sign_params(
            &[("timestamp", "100".into()), ("folder", "libris".into())],
            "secret",
        );
        let b = sign_params(
            &[("folder", "libris".into()), ("timestamp", "100".into())],
            "secret",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
