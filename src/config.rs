//! Export options: strategies, folders, and toggles.
//!
//! Options are plain serde-derived data so an export profile can live in
//! a TOML file:
//!
//! ```toml
//! image-strategy = "relocate"
//! attachment-strategy = "relocate"
//! image-folder = "images"
//! attachment-folder = "attachments"
//! replace-broken-images = true
//! ```
//!
//! An unsupported strategy value fails at parse time; `validate()` covers
//! the constraints serde cannot express.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Strategies
// ============================================================================

/// How an image reference is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStrategy {
    /// Inline the binary as a `data:` URI.
    Embed,
    /// Rewrite to a unique local path under the image folder.
    Relocate,
    /// Rewrite to a symbolic identifier (`image1`, `image2`, ...).
    SymbolicId,
    /// Rewrite through the proxy collaborator.
    Proxy,
    /// Leave references untouched; nothing is exported.
    Drop,
    /// Hide image tokens entirely.
    Silent,
}

/// How an attachment reference is resolved.
///
/// Deliberately a smaller set than [`ImageStrategy`]: attachments are
/// never embedded or proxied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentStrategy {
    /// Rewrite to a unique local path under the attachment folder.
    Relocate,
    /// Rewrite to a symbolic identifier (`attachment1`, ...).
    SymbolicId,
    /// Leave references untouched; nothing is exported.
    Drop,
    /// Hide the attachment link and everything inside it.
    Silent,
}

// ============================================================================
// Options
// ============================================================================

/// Options for one export session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExportOptions {
    pub image_strategy: ImageStrategy,
    pub attachment_strategy: AttachmentStrategy,
    /// Folder relocated images land under.
    pub image_folder: String,
    /// Folder relocated attachments land under.
    pub attachment_folder: String,
    /// Extra path segment between folder and filename (per-note prefixes
    /// for bulk exports).
    pub filename_prefix: Option<String>,
    /// Substitute the built-in placeholder when an image fails to load.
    pub replace_broken_images: bool,
    /// Flatten animated images to their first frame.
    pub flatten_animated_images: bool,
    /// Attachment export override: `Some(false)` forces silent,
    /// `Some(true)` forces relocate, `None` defers to
    /// `attachment_strategy`.
    pub export_attachments: Option<bool>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            image_strategy: ImageStrategy::Embed,
            attachment_strategy: AttachmentStrategy::Silent,
            image_folder: "images".to_string(),
            attachment_folder: "attachments".to_string(),
            filename_prefix: None,
            replace_broken_images: true,
            flatten_animated_images: false,
            export_attachments: None,
        }
    }
}

impl ExportOptions {
    /// Parse and validate options from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate constraints serde cannot express.
    pub fn validate(&self) -> Result<(), OptionsError> {
        validate_folder("image-folder", &self.image_folder)?;
        validate_folder("attachment-folder", &self.attachment_folder)?;
        if let Some(prefix) = &self.filename_prefix
            && (prefix.is_empty() || prefix.contains('/'))
        {
            return Err(OptionsError::Validation(format!(
                "filename-prefix must be a single non-empty path segment, got `{prefix}`"
            )));
        }
        Ok(())
    }

    /// Attachment strategy after applying the export override.
    pub fn effective_attachment_strategy(&self) -> AttachmentStrategy {
        match self.export_attachments {
            Some(false) => AttachmentStrategy::Silent,
            Some(true) => AttachmentStrategy::Relocate,
            None => self.attachment_strategy,
        }
    }
}

fn validate_folder(field: &str, folder: &str) -> Result<(), OptionsError> {
    if folder.is_empty() {
        return Err(OptionsError::Validation(format!("{field} must not be empty")));
    }
    if folder.starts_with('/') {
        return Err(OptionsError::Validation(format!(
            "{field} must be relative, got `{folder}`"
        )));
    }
    if folder.split('/').any(|seg| seg == "..") {
        return Err(OptionsError::Validation(format!(
            "{field} must not contain `..`, got `{folder}`"
        )));
    }
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Export option errors.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to parse export options")]
    Toml(#[from] toml::de::Error),

    #[error("invalid export options: {0}")]
    Validation(String),
}
