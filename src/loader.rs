//! Collaborator seams the asset pipeline consumes.
//!
//! The core never performs network or storage I/O itself; a host
//! application supplies implementations of these traits. Loads are
//! fallible and non-fatal: an `Err` from a loader is logged and handled
//! locally (placeholder substitution or skip), never propagated.

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use std::sync::LazyLock;
use url::Url;

/// A loaded binary with its declared content type.
#[derive(Debug, Clone)]
pub struct AssetPayload {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl AssetPayload {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Loads referenced binaries. The implementation owns all network,
/// proxying, and CORS concerns.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Load an image as a self-contained `data:` URI. When `still_hint`
    /// is set the loader should flatten animated images to their first
    /// frame.
    async fn image_data_uri(&self, reference: &str, still_hint: bool) -> Result<String>;

    /// Load an image's raw bytes.
    async fn image_bytes(&self, reference: &str) -> Result<AssetPayload>;

    /// Load an attachment's raw bytes.
    async fn attachment_bytes(&self, reference: &str) -> Result<AssetPayload>;
}

/// Rewrites a reference through an asset proxy.
pub trait ProxyRewriter: Send + Sync {
    /// Returns the rewritten URL, or `None` when the reference cannot be
    /// proxied.
    fn rewrite(&self, reference: &str) -> Option<String>;
}

/// Decides whether a link href points at an attachment.
pub trait AttachmentPredicate: Send + Sync {
    fn is_attachment(&self, href: &str) -> bool;
}

/// Default predicate: hrefs under a custom URI scheme
/// (`attachment://...`).
#[derive(Debug, Clone)]
pub struct SchemePredicate {
    scheme: String,
}

impl SchemePredicate {
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
        }
    }
}

impl Default for SchemePredicate {
    fn default() -> Self {
        Self::new("attachment")
    }
}

impl AttachmentPredicate for SchemePredicate {
    fn is_attachment(&self, href: &str) -> bool {
        // Relative hrefs fail to parse and are never attachments.
        Url::parse(href).is_ok_and(|href| href.scheme() == self.scheme)
    }
}

/// Converts animated image payloads to a static raster format.
pub trait StillImageConverter: Send + Sync {
    /// Flatten an animated payload to its first frame. Non-animated
    /// payloads pass through unchanged.
    fn flatten_animated(&self, payload: AssetPayload) -> Result<AssetPayload>;
}

// ============================================================================
// Broken-image placeholder
// ============================================================================

/// Placeholder PNG substituted for images that fail to load.
pub const BROKEN_IMAGE_BYTES: &[u8] = include_bytes!("asset/broken_image.png");

/// Content type of the placeholder.
pub const BROKEN_IMAGE_MIME: &str = "image/png";

static BROKEN_IMAGE_DATA_URI: LazyLock<String> = LazyLock::new(|| {
    format!(
        "data:{BROKEN_IMAGE_MIME};base64,{}",
        STANDARD.encode(BROKEN_IMAGE_BYTES)
    )
});

/// The placeholder as a `data:` URI, for embedding strategies.
pub fn broken_image_data_uri() -> &'static str {
    &BROKEN_IMAGE_DATA_URI
}
