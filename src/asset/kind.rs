//! Asset kind and bound-strategy definitions.

/// Kind of collected asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Image token (`src` attribute).
    Image,
    /// Attachment-style link token (`href` attribute).
    Attachment,
}

impl AssetKind {
    /// Label used for symbolic identifiers (`image1`, `attachment1`).
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Attachment => "attachment",
        }
    }
}

/// Strategy bound to a bucket at resolution time.
///
/// Collection buckets tokens without a strategy; the strategy active
/// during `process_assets` is recorded here so a later strategy change
/// cannot retroactively reinterpret an already-resolved bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundStrategy {
    Embed,
    Relocate,
    SymbolicId,
    Proxy,
    Drop,
}
