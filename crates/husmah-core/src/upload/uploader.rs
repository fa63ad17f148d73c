use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{ImageFile, UploadError};
use crate::models::ProjectDraft;

/// Image host API root.
pub const UPLOAD_HOST: &str = "https://api.cloudinary.com";

/// Upload presets tried in order; `None` posts without a preset for accounts
/// that allow unsigned uploads by default.
const UPLOAD_PRESETS: [Option<&str>; 4] = [
    Some("ml_default"),
    Some("unsigned_preset"),
    Some("default"),
    None,
];

/// Uploads can be slow on large images
const UPLOAD_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Client for the image host's unsigned upload endpoint.
#[derive(Clone)]
pub struct ImageUploader {
    client: Client,
    endpoint: Url,
}

impl ImageUploader {
    pub fn new(cloud_name: &str) -> Result<Self> {
        Self::with_host(UPLOAD_HOST, cloud_name)
    }

    /// Point the uploader at a different host root (used by tests)
    pub fn with_host(host: &str, cloud_name: &str) -> Result<Self> {
        let endpoint = format!(
            "{}/v1_1/{}/image/upload",
            host.trim_end_matches('/'),
            cloud_name
        );
        let endpoint = Url::parse(&endpoint)
            .with_context(|| format!("Invalid upload endpoint: {}", endpoint))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Check the host can be reached at all. Any HTTP answer counts.
    pub async fn probe(&self) -> Result<(), UploadError> {
        match self.client.head(self.endpoint.clone()).send().await {
            Ok(response) => {
                debug!(status = %response.status(), "Upload host reachable");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Upload host unreachable");
                Err(UploadError::Unreachable)
            }
        }
    }

    /// Upload one image and return its public URL.
    ///
    /// Presets are tried in order while the host complains about the preset.
    /// If none is accepted the image is returned inline as a `data:` URL.
    pub async fn upload(&self, image: &ImageFile) -> Result<String, UploadError> {
        self.upload_inner(image)
            .await
            .map_err(|e| UploadError::Image(Box::new(e)))
    }

    async fn upload_inner(&self, image: &ImageFile) -> Result<String, UploadError> {
        image.validate()?;
        info!(file = %image.file_name, size_mb = image.size_mb(), "Uploading image");

        for preset in UPLOAD_PRESETS {
            match self.post_image(image, preset).await {
                Ok(url) => {
                    debug!(preset = preset.unwrap_or("none"), url = %url, "Image uploaded");
                    return Ok(url);
                }
                Err(e) if e.is_preset_error() => {
                    warn!(preset = preset.unwrap_or("none"), "Upload preset refused, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(file = %image.file_name, "No upload preset accepted, storing image inline");
        Ok(image.to_data_url())
    }

    async fn post_image(
        &self,
        image: &ImageFile,
        preset: Option<&str>,
    ) -> Result<String, UploadError> {
        let mut part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        if let Some(mime) = image.content_type {
            part = part.mime_str(mime)?;
        }
        let mut form = Form::new().part("file", part);
        if let Some(preset) = preset {
            form = form.text("upload_preset", preset.to_string());
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        Ok(parsed.secure_url)
    }

    /// Upload the images picked in the project editor into `draft`.
    ///
    /// A new main image replaces `mainImage`; additional images are appended
    /// to `allImages` in the order given. Everything is validated before the
    /// first request, and `draft` is left untouched on any failure.
    pub async fn upload_images(
        &self,
        draft: &mut ProjectDraft,
        main: Option<&ImageFile>,
        additional: &[ImageFile],
    ) -> Result<(), UploadError> {
        if main.is_none() && additional.is_empty() {
            return Ok(());
        }

        if let Some(image) = main {
            image
                .validate()
                .map_err(|e| UploadError::MainImage(Box::new(UploadError::Image(Box::new(e)))))?;
        }
        for image in additional {
            image.validate().map_err(|e| {
                UploadError::AdditionalImages(Box::new(UploadError::Image(Box::new(e))))
            })?;
        }

        self.probe().await?;

        let main_url = match main {
            Some(image) => Some(
                self.upload(image)
                    .await
                    .map_err(|e| UploadError::MainImage(Box::new(e)))?,
            ),
            None => None,
        };

        // Sequential so the host sees one upload at a time
        let mut additional_urls = Vec::with_capacity(additional.len());
        for (i, image) in additional.iter().enumerate() {
            debug!(
                index = i + 1,
                total = additional.len(),
                file = %image.file_name,
                "Uploading additional image"
            );
            let url = self
                .upload(image)
                .await
                .map_err(|e| UploadError::AdditionalImages(Box::new(e)))?;
            additional_urls.push(url);
        }

        if let Some(url) = main_url {
            draft.main_image = url;
        }
        draft.all_images.extend(additional_urls);
        Ok(())
    }
}
