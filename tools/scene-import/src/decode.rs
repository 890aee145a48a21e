//! Image-decode collaborator
//!
//! Turns encoded bytes or image files into RGBA8 pixel buffers. The default
//! implementation is backed by the `image` crate; tests and embedders can
//! swap in their own through [`Importer::with_decoder`].
//!
//! [`Importer::with_decoder`]: crate::Importer::with_decoder

use std::path::Path;

use glam::{UVec2, Vec4};

use crate::error::ImageDecodeError;

/// Row-major, tightly packed RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create an image, checking the buffer holds `width * height` RGBA8 texels
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageDecodeError> {
        let image = Self {
            width,
            height,
            pixels,
        };
        image.check_size()?;
        Ok(image)
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    fn check_size(&self) -> Result<(), ImageDecodeError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(ImageDecodeError::SizeMismatch {
                width: self.width,
                height: self.height,
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    /// Expand to floating-point RGBA in [0, 1]
    pub fn to_rgba_f32(&self) -> Result<Vec<Vec4>, ImageDecodeError> {
        self.check_size()?;
        Ok(self
            .pixels
            .chunks_exact(4)
            .map(|p| {
                Vec4::new(
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                )
            })
            .collect())
    }
}

/// Decodes encoded images to RGBA8
///
/// Implementations are called from worker threads, one texture per call.
pub trait ImageDecoder: Send + Sync {
    /// `mime_type` is the container's declared format, when it has one
    fn decode_bytes(
        &self,
        bytes: &[u8],
        mime_type: Option<&str>,
    ) -> Result<DecodedImage, ImageDecodeError>;

    fn decode_file(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError>;
}

/// Decoder backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode_bytes(
        &self,
        bytes: &[u8],
        mime_type: Option<&str>,
    ) -> Result<DecodedImage, ImageDecodeError> {
        let img = match mime_type.and_then(image::ImageFormat::from_mime_type) {
            Some(format) => image::load_from_memory_with_format(bytes, format)?,
            None => image::load_from_memory(bytes)?,
        };
        Ok(to_decoded(img))
    }

    fn decode_file(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError> {
        let img = image::open(path)?;
        tracing::debug!("Decoded {:?} ({}x{})", path, img.width(), img.height());
        Ok(to_decoded(img))
    }
}

fn to_decoded(img: image::DynamicImage) -> DecodedImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    }
}
