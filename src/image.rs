//! Still-image conversion for animated assets.
//!
//! PDF and office export targets cannot animate, so animated images are
//! optionally flattened to their first frame before packaging.

use anyhow::{Context, Result};
use image::codecs::gif::GifDecoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::loader::{AssetPayload, StillImageConverter};

/// File extensions subject to forced still conversion.
pub(crate) const STILL_CONVERT_EXTS: &[&str] = &["gif"];

/// Check whether a filename would be renamed by still conversion.
pub(crate) fn needs_still_rename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| STILL_CONVERT_EXTS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Default converter: decodes the first GIF frame and re-encodes as PNG.
/// Non-animated payloads pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifStillConverter;

impl StillImageConverter for GifStillConverter {
    fn flatten_animated(&self, payload: AssetPayload) -> Result<AssetPayload> {
        if !payload.bytes.starts_with(b"GIF8") {
            return Ok(payload);
        }

        let decoder = GifDecoder::new(Cursor::new(payload.bytes.as_ref()))
            .context("failed to decode animated image")?;
        let first_frame =
            DynamicImage::from_decoder(decoder).context("failed to read first frame")?;

        let mut out = Vec::new();
        first_frame
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .context("failed to encode still frame")?;

        Ok(AssetPayload::new(out, "image/png"))
    }
}
