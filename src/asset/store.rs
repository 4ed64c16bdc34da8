//! Collected-asset store: buckets keyed by reference string.
//!
//! The reference key (literal `src`/`href` before resolution) is asset
//! identity: two tokens with the same key are the same asset, regardless
//! of which document or render pass produced them. Buckets are created
//! on first sight, mutated in place by resolution, and never deleted
//! while the session lives, which is what gives bulk exports
//! cross-document dedup.

use rustc_hash::FxHashMap;

use super::kind::{AssetKind, BoundStrategy};
use crate::token::TokenId;

/// One bucket: every token sharing a reference key, plus its resolution
/// state.
#[derive(Debug, Clone)]
pub struct CollectedAsset {
    /// Literal source reference (image `src` or link `href`).
    pub key: String,
    pub kind: AssetKind,
    /// Bound at resolution time; `None` until then.
    pub strategy: Option<BoundStrategy>,
    /// Resolved value tokens are rewritten to (data URI, escaped local
    /// path, symbolic id, or proxied URL).
    pub resolved: Option<String>,
    pub processed: bool,
    /// Tokens sharing this key, tagged with their arena id (one session
    /// may span several documents).
    pub tokens: Vec<(u64, TokenId)>,
    /// Display names observed for attachment links; the first one wins
    /// for local export.
    pub filenames: Vec<String>,
    /// Unescaped local path, set only when relocated.
    pub local_path: Option<String>,
}

impl CollectedAsset {
    fn new(key: String, kind: AssetKind) -> Self {
        Self {
            key,
            kind,
            strategy: None,
            resolved: None,
            processed: false,
            tokens: Vec::new(),
            filenames: Vec::new(),
            local_path: None,
        }
    }
}

/// Session-wide bucket storage, preserving encounter order across
/// documents.
#[derive(Debug, Default)]
pub(crate) struct AssetStore {
    slots: Vec<CollectedAsset>,
    images: FxHashMap<String, usize>,
    attachments: FxHashMap<String, usize>,
}

impl AssetStore {
    /// Slot index for a reference key, creating the bucket if new.
    pub fn slot_for(&mut self, kind: AssetKind, key: &str) -> usize {
        let index = match kind {
            AssetKind::Image => &mut self.images,
            AssetKind::Attachment => &mut self.attachments,
        };
        if let Some(&slot) = index.get(key) {
            return slot;
        }
        let slot = self.slots.len();
        index.insert(key.to_string(), slot);
        self.slots.push(CollectedAsset::new(key.to_string(), kind));
        slot
    }

    pub fn get(&self, slot: usize) -> &CollectedAsset {
        &self.slots[slot]
    }

    pub fn get_mut(&mut self, slot: usize) -> &mut CollectedAsset {
        &mut self.slots[slot]
    }

    /// All buckets in encounter order.
    pub fn iter(&self) -> impl Iterator<Item = &CollectedAsset> {
        self.slots.iter()
    }

    /// Slot indices of unprocessed buckets of one kind, in encounter
    /// order.
    pub fn unprocessed(&self, kind: AssetKind) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, a)| a.kind == kind && !a.processed)
            .map(|(slot, _)| slot)
            .collect()
    }
}
