//! Asset collection, resolution, and streaming.
//!
//! Assets enter as references in parsed tokens (image `src`, attachment
//! `href`), are deduplicated into per-reference buckets, resolved once
//! per session under the configured strategy, and finally served either
//! inline in the rendered output or as a lazy byte stream for packaging.

mod collect;
mod exporter;
mod kind;
mod path;
mod resolve;
mod store;
mod stream;

pub use exporter::AssetExporter;
pub use kind::{AssetKind, BoundStrategy};
pub use store::CollectedAsset;
pub use stream::{AssetStream, LocalAsset};
