//! Media store seam: image and video files live with an external provider.

mod cloudinary;

pub use cloudinary::CloudinaryClient;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::db::models::MediaRef;
use crate::error::MediaError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn resource_type(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// A file carried inline in a JSON request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    /// Base64 (standard alphabet) file contents.
    pub data: String,
}

impl MediaUpload {
    pub fn kind(&self) -> MediaKind {
        if self.content_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        if self.data.is_empty() {
            return Err(MediaError::InvalidPayload(format!("{} is empty", self.file_name)).into());
        }
        BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| MediaError::InvalidPayload(format!("{}: {}", self.file_name, e)).into())
    }

    /// `data:` URI form accepted by the provider's upload endpoint.
    pub fn data_uri(&self) -> Result<String> {
        self.decode()?;
        Ok(format!("data:{};base64,{}", self.content_type, self.data))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
    /// Seconds; only reported for video uploads.
    pub duration: Option<f64>,
}

impl MediaAsset {
    pub fn media_ref(&self) -> MediaRef {
        MediaRef {
            url: self.url.clone(),
            public_id: self.public_id.clone(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the file under `folder`.
    async fn upload(&self, upload: &MediaUpload, folder: &str) -> Result<MediaAsset>;

    async fn delete(&self, public_id: &str, kind: MediaKind) -> Result<()>;
}
