//! Size-bounded JPEG encoding.
//!
//! The encoder walks quality down from 1.00 in steps of 0.05 until the
//! encoded bytes fit the ceiling or quality reaches the 0.10 floor. At the
//! floor the last encoding is returned even if it is still too large.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::error::{MergeSplitError, Result};

/// Quality expressed in hundredths, so 100 is 1.00 and 10 is 0.10.
const START_QUALITY: u8 = 100;
const QUALITY_STEP: u8 = 5;
const QUALITY_FLOOR: u8 = 10;

/// Result of a bounded encode.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Encoded JPEG bytes.
    pub bytes: Vec<u8>,
    /// Quality used, in hundredths.
    pub quality: u8,
    /// Number of encode attempts made.
    pub attempts: u32,
}

impl EncodedImage {
    /// Quality as a factor in `0.10..=1.00`.
    pub fn quality_factor(&self) -> f32 {
        f32::from(self.quality) / 100.0
    }

    /// Whether the bytes fit `ceiling`.
    pub fn fits(&self, ceiling: u64) -> bool {
        self.bytes.len() as u64 <= ceiling
    }
}

/// Encodes images as JPEG under a byte ceiling by lowering quality.
#[derive(Debug, Clone, Copy)]
pub struct SizeBoundedEncoder {
    ceiling: u64,
}

impl SizeBoundedEncoder {
    /// Create an encoder with a ceiling in bytes.
    pub fn new(ceiling: u64) -> Self {
        Self { ceiling }
    }

    /// Byte ceiling this encoder targets.
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Encode `image`, lowering quality until it fits or hits the floor.
    ///
    /// # Errors
    ///
    /// Returns [`MergeSplitError::EncodeFailed`] if the JPEG encoder itself fails.
    pub fn encode(&self, image: &DynamicImage) -> Result<EncodedImage> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut quality = START_QUALITY;
        let mut attempts = 0;

        loop {
            let bytes = encode_jpeg(&rgb, quality)?;
            attempts += 1;

            let size = bytes.len() as u64;
            if size <= self.ceiling || quality <= QUALITY_FLOOR {
                debug!(
                    quality,
                    attempts,
                    size,
                    ceiling = self.ceiling,
                    within = size <= self.ceiling,
                    "JPEG encoding settled"
                );
                return Ok(EncodedImage {
                    bytes,
                    quality,
                    attempts,
                });
            }

            quality = quality.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR);
        }
    }
}

/// Encode `image` as JPEG at `quality` (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|err| MergeSplitError::EncodeFailed {
            reason: err.to_string(),
        })?;
    Ok(buffer)
}
