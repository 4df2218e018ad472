//! Image uploads embedded in JSON bodies.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use wishreg_core::catalog::{ImageSource, Upload};

use crate::error::ApiError;

/// `{"media_type": "image/png", "data": "<base64>"}`.
///
/// `data` may also be a full `data:` URL as produced by the local preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadBody {
  pub media_type: String,
  pub data:       String,
}

impl UploadBody {
  pub fn decode(self) -> Result<Upload, ApiError> {
    let payload = match self.data.split_once(";base64,") {
      Some((prefix, rest)) if prefix.starts_with("data:") => rest,
      _ => self.data.as_str(),
    };
    let bytes = B64
      .decode(payload.trim())
      .map_err(|e| ApiError::BadRequest(format!("upload is not valid base64: {e}")))?;
    Ok(Upload { media_type: self.media_type, bytes: Bytes::from(bytes) })
  }
}

/// An upload wins over a link; neither means no image.
pub fn image_source(
  upload: Option<UploadBody>,
  link: Option<String>,
) -> Result<ImageSource, ApiError> {
  Ok(match (upload, link) {
    (Some(upload), _) => ImageSource::Upload(upload.decode()?),
    (None, Some(url)) => ImageSource::Link(url),
    (None, None) => ImageSource::None,
  })
}
