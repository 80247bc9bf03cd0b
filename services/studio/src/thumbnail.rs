//! Thumbnail acquisition: uploaded image files and frames captured from a preview

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, RgbImage, RgbaImage, codecs::jpeg::JpegEncoder, imageops};
use thiserror::Error;
use tracing::{info, warn};

use crate::validation::{ValidationError, validate_thumbnail};

/// Captured frames are scaled down to at most this width
pub const MAX_CAPTURE_WIDTH: u32 = 1280;

/// JPEG quality used for every capture path
pub const CAPTURE_QUALITY: u8 = 90;

/// Errors raised while turning a preview frame into an image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Please wait for video to load or play the video to capture a frame")]
    NotReady,

    #[error("Frame readback blocked by cross-origin restrictions")]
    CrossOrigin,

    #[error("Frame encoding failed: {0}")]
    Encoding(String),

    #[error("Could not capture frame. This might be due to cross-origin restrictions on the video file")]
    Blocked,
}

/// An image waiting to become the video thumbnail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ThumbnailFile {
    /// Accept an uploaded file after checking its type and size
    pub fn from_upload(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let mime_type = mime_type.into();
        validate_thumbnail(&mime_type, bytes.len())?;

        Ok(Self {
            name: name.into(),
            mime_type,
            bytes,
        })
    }

    /// Inline `data:` URI of the image
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Split a base64 `data:` URI into its mime type and payload
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime_type.to_string(), bytes))
}

/// A surface holding the frame to capture, with the three encode paths it offers.
pub trait FrameSurface {
    /// Direct synchronous JPEG encode
    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, CaptureError>;

    /// Blob encode
    fn encode_blob(&self, quality: u8) -> Result<Vec<u8>, CaptureError>;

    /// `data:` URI encode
    fn encode_data_uri(&self, quality: u8) -> Result<String, CaptureError>;
}

/// Capture the current frame of `surface` as a JPEG thumbnail.
///
/// Tries the direct encode, then the blob encode, then the data URI encode;
/// only when all three fail is [`CaptureError::Blocked`] returned.
pub fn capture_frame(surface: &impl FrameSurface) -> Result<ThumbnailFile, CaptureError> {
    let name = format!("thumbnail-{}.jpg", chrono::Utc::now().timestamp_millis());
    let jpeg = |bytes: Vec<u8>| ThumbnailFile {
        name: name.clone(),
        mime_type: "image/jpeg".to_string(),
        bytes,
    };

    match surface.encode_jpeg(CAPTURE_QUALITY) {
        Ok(bytes) => return Ok(jpeg(bytes)),
        Err(CaptureError::NotReady) => return Err(CaptureError::NotReady),
        Err(e) => warn!("Direct frame encode failed, trying blob encode: {}", e),
    }

    match surface.encode_blob(CAPTURE_QUALITY) {
        Ok(bytes) => return Ok(jpeg(bytes)),
        Err(e) => warn!("Blob frame encode failed, trying data URI encode: {}", e),
    }

    match surface.encode_data_uri(CAPTURE_QUALITY) {
        Ok(uri) => match decode_data_uri(&uri) {
            Some((_, bytes)) => {
                info!("Frame captured through data URI fallback");
                Ok(jpeg(bytes))
            }
            None => Err(CaptureError::Blocked),
        },
        Err(e) => {
            warn!("Data URI frame encode failed: {}", e);
            Err(CaptureError::Blocked)
        }
    }
}

/// Decoded RGBA frame, e.g. a still taken from the preview player
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    image: RgbaImage,
    /// False when the frame came from a different origin than the studio
    origin_clean: bool,
}

impl RgbaFrame {
    pub fn from_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        origin_clean: bool,
    ) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::NotReady);
        }
        let image = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            CaptureError::Encoding(format!("pixel buffer does not match {width}x{height}"))
        })?;

        Ok(Self {
            image,
            origin_clean,
        })
    }

    /// Decode an encoded still image (PNG or JPEG)
    pub fn decode(bytes: &[u8], origin_clean: bool) -> Result<Self, CaptureError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CaptureError::Encoding(e.to_string()))?
            .to_rgba8();
        Self::from_rgba(image.width(), image.height(), image.into_raw(), origin_clean)
    }

    /// Frame scaled to at most [`MAX_CAPTURE_WIDTH`] with alpha dropped
    fn readback(&self) -> Result<RgbImage, CaptureError> {
        if !self.origin_clean {
            return Err(CaptureError::CrossOrigin);
        }

        let (width, height) = self.image.dimensions();
        let rgb = DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
        if width <= MAX_CAPTURE_WIDTH {
            return Ok(rgb);
        }

        let scaled_height =
            ((u64::from(height) * u64::from(MAX_CAPTURE_WIDTH)) / u64::from(width)).max(1) as u32;
        Ok(imageops::resize(
            &rgb,
            MAX_CAPTURE_WIDTH,
            scaled_height,
            imageops::FilterType::Triangle,
        ))
    }
}

impl FrameSurface for RgbaFrame {
    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, CaptureError> {
        let rgb = self.readback()?;
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode_image(&rgb)
            .map_err(|e| CaptureError::Encoding(e.to_string()))?;
        Ok(out)
    }

    fn encode_blob(&self, quality: u8) -> Result<Vec<u8>, CaptureError> {
        let rgb = self.readback()?;
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, quality))
            .map_err(|e| CaptureError::Encoding(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn encode_data_uri(&self, quality: u8) -> Result<String, CaptureError> {
        let rgb = self.readback()?;
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, quality))
            .map_err(|e| CaptureError::Encoding(e.to_string()))?;
        Ok(format!(
            "data:image/jpeg;base64,{}",
            STANDARD.encode(cursor.into_inner())
        ))
    }
}
