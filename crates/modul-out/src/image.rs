//! Header image (letterhead) decoding and sizing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use modul_core::{ExportFailure, ModulError};
use printpdf::image_crate::{self, DynamicImage, ImageFormat};

/// Decoded letterhead with its intrinsic pixel size
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderImage {
    bytes: Vec<u8>,
    mime: &'static str,
    width: u32,
    height: u32,
}

impl HeaderImage {
    /// Decode fetched bytes. Only formats the PDF backend can embed are accepted.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, ModulError> {
        let format = image_crate::guess_format(&bytes).map_err(image_error)?;
        let mime = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            other => {
                return Err(ExportFailure::Image(format!("unsupported format {:?}", other)).into())
            }
        };
        let decoded = image_crate::load_from_memory_with_format(&bytes, format).map_err(image_error)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ExportFailure::Image("image has no pixels".to_string()).into());
        }
        Ok(Self {
            mime,
            width: decoded.width(),
            height: decoded.height(),
            bytes,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }

    /// Size at a fixed display width, keeping the aspect ratio.
    pub fn display_size(&self, width_px: u32) -> (u32, u32) {
        let height = (self.height as f64 * width_px as f64 / self.width as f64).round() as u32;
        (width_px, height.max(1))
    }

    /// Height in millimetres when drawn `width_mm` wide
    pub fn height_for_width(&self, width_mm: f32) -> f32 {
        width_mm * self.height as f32 / self.width as f32
    }

    /// Pixels for the PDF backend, flattened to RGB.
    pub(crate) fn pixels(&self) -> Result<DynamicImage, ModulError> {
        let decoded = image_crate::load_from_memory(&self.bytes).map_err(image_error)?;
        Ok(DynamicImage::ImageRgb8(decoded.to_rgb8()))
    }
}

fn image_error(e: image_crate::ImageError) -> ModulError {
    ExportFailure::Image(e.to_string()).into()
}
