use anyhow::anyhow;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

use crate::config::SiteConfig;
use crate::error::{Error, Result};

/// A page image ready for embedding: JPEG bytes plus final pixel size.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Resizes downloaded images so they cover a fixed box without cropping.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    box_width: u32,
    box_height: u32,
    quality: u8,
}

impl ImageNormalizer {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            box_width: config.page_width,
            box_height: config.page_height,
            quality: config.jpeg_quality,
        }
    }

    pub async fn normalize(&self, url: &str, bytes: Vec<u8>) -> Result<NormalizedImage> {
        let this = self.clone();
        let owned_url = url.to_string();

        tokio::task::spawn_blocking(move || this.normalize_blocking(&owned_url, &bytes))
            .await
            .map_err(|e| anyhow!("Resize task for {} failed: {}", url, e))?
    }

    fn normalize_blocking(&self, url: &str, bytes: &[u8]) -> Result<NormalizedImage> {
        let image_err = |source: image::ImageError| Error::Image {
            url: url.to_string(),
            source,
        };

        let source = image::load_from_memory(bytes).map_err(image_err)?;
        let (width, height) = fit_outside(
            source.width(),
            source.height(),
            self.box_width,
            self.box_height,
        );
        debug!(
            "Resizing {} from {}x{} to {}x{}",
            url,
            source.width(),
            source.height(),
            width,
            height
        );

        let rgb = source
            .resize_exact(width, height, FilterType::Lanczos3)
            .to_rgb8();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .encode_image(&rgb)
            .map_err(image_err)?;

        Ok(NormalizedImage {
            jpeg,
            width,
            height,
        })
    }
}

/// Smallest size with the source aspect ratio that covers
/// `box_width` x `box_height`. One side always equals the box side.
pub fn fit_outside(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (box_width, box_height);
    }

    let (w, h) = (width as u64, height as u64);
    let (bw, bh) = (box_width as u64, box_height as u64);

    // w / bw < h / bh, cross-multiplied
    if w * bh < h * bw {
        let scaled = (h * bw + w / 2) / w;
        (box_width, scaled.max(1) as u32)
    } else {
        let scaled = (w * bh + h / 2) / h;
        (scaled.max(1) as u32, box_height)
    }
}
