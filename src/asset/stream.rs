//! Lazy, pull-based delivery of relocated asset bytes.
//!
//! A stream snapshots the relocated buckets at construction; each `next`
//! call loads exactly one asset. Consumers that stop early never pay for
//! the assets they skipped. A failed load never ends the stream: broken
//! images yield the placeholder (when replacement is enabled), broken
//! attachments are logged and skipped.

use std::sync::Arc;
use std::vec;

use bytes::Bytes;
use futures::Stream;

use super::kind::AssetKind;
use crate::loader::{AssetLoader, BROKEN_IMAGE_BYTES, BROKEN_IMAGE_MIME, StillImageConverter};
use crate::log;

/// One asset to stream: the original reference plus its local name.
#[derive(Debug, Clone)]
pub(crate) struct StreamEntry {
    pub key: String,
    pub kind: AssetKind,
    pub name: String,
    pub flatten: bool,
    pub replace_broken: bool,
}

/// A relocated asset with its bytes loaded.
#[derive(Debug, Clone)]
pub struct LocalAsset {
    /// Relative output path, e.g. `images/photo.png`.
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Pull-based iterator over relocated assets. Bytes are loaded one
/// asset at a time, on demand.
pub struct AssetStream {
    entries: vec::IntoIter<StreamEntry>,
    loader: Arc<dyn AssetLoader>,
    converter: Arc<dyn StillImageConverter>,
}

impl AssetStream {
    pub(crate) fn new(
        entries: Vec<StreamEntry>,
        loader: Arc<dyn AssetLoader>,
        converter: Arc<dyn StillImageConverter>,
    ) -> Self {
        Self {
            entries: entries.into_iter(),
            loader,
            converter,
        }
    }

    /// Load and return the next asset, skipping entries whose bytes
    /// cannot be produced. Returns `None` once exhausted.
    pub async fn next(&mut self) -> Option<LocalAsset> {
        loop {
            let entry = self.entries.next()?;
            match self.load(&entry).await {
                Some(asset) => return Some(asset),
                None => continue,
            }
        }
    }

    /// Drain the stream into a vector, preserving order.
    pub async fn collect(mut self) -> Vec<LocalAsset> {
        let mut assets = Vec::new();
        while let Some(asset) = self.next().await {
            assets.push(asset);
        }
        assets
    }

    /// Adapt into a `futures::Stream` for combinator-style consumers.
    pub fn into_stream(self) -> impl Stream<Item = LocalAsset> {
        futures::stream::unfold(self, |mut inner| async move {
            inner.next().await.map(|asset| (asset, inner))
        })
    }

    async fn load(&self, entry: &StreamEntry) -> Option<LocalAsset> {
        match entry.kind {
            AssetKind::Image => {
                let payload = match self.loader.image_bytes(&entry.key).await {
                    Ok(payload) => payload,
                    Err(err) => {
                        log!("assets"; "could not find asset: {} ({err:#})", entry.name);
                        if !entry.replace_broken {
                            return None;
                        }
                        return Some(LocalAsset {
                            name: entry.name.clone(),
                            mime_type: BROKEN_IMAGE_MIME.to_string(),
                            bytes: Bytes::from_static(BROKEN_IMAGE_BYTES),
                        });
                    }
                };
                let payload = if entry.flatten {
                    match self.converter.flatten_animated(payload) {
                        Ok(flattened) => flattened,
                        Err(err) => {
                            // Same degradation path as a failed load.
                            log!("assets"; "could not flatten image {}: {err:#}", entry.name);
                            if !entry.replace_broken {
                                return None;
                            }
                            return Some(LocalAsset {
                                name: entry.name.clone(),
                                mime_type: BROKEN_IMAGE_MIME.to_string(),
                                bytes: Bytes::from_static(BROKEN_IMAGE_BYTES),
                            });
                        }
                    }
                } else {
                    payload
                };
                Some(LocalAsset {
                    name: entry.name.clone(),
                    mime_type: payload.mime_type,
                    bytes: payload.bytes,
                })
            }
            AssetKind::Attachment => match self.loader.attachment_bytes(&entry.key).await {
                Ok(payload) => Some(LocalAsset {
                    name: entry.name.clone(),
                    mime_type: payload.mime_type,
                    bytes: payload.bytes,
                }),
                Err(err) => {
                    log!("assets"; "could not find asset: {} ({err:#})", entry.name);
                    None
                }
            },
        }
    }
}
