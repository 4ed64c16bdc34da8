//! Token-tree traversal that discovers asset references.
//!
//! One depth-first pass buckets every image token and every
//! attachment-style link by its literal reference string. A single piece
//! of visibility state, passed by value into recursive calls, implements
//! suppression regions: when the attachment strategy is silent, the
//! link-open token and everything up to (and including) its matching
//! link-close are marked hidden. The region can span arbitrarily many
//! descendant tokens, which is why the state is threaded through the
//! traversal instead of a two-pass close-matching scan.

use super::exporter::SessionState;
use super::kind::AssetKind;
use crate::config::{AttachmentStrategy, ExportOptions, ImageStrategy};
use crate::loader::AttachmentPredicate;
use crate::token::{TokenArena, TokenId, TokenKind};

/// Fallback display name for attachment links without a text sibling.
const DEFAULT_ATTACHMENT_NAME: &str = "attachment";

/// Visibility state threaded through the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Visible,
    /// Inside a silent attachment link; everything is hidden until the
    /// matching link-close.
    Suppressed,
}

pub(crate) struct Collector<'a> {
    pub options: &'a ExportOptions,
    pub predicate: &'a dyn AttachmentPredicate,
    pub state: &'a mut SessionState,
}

impl Collector<'_> {
    pub fn run(&mut self, arena: &mut TokenArena) {
        let roots = arena.roots().to_vec();
        self.traverse(arena, &roots, Visibility::Visible);
    }

    fn traverse(&mut self, arena: &mut TokenArena, ids: &[TokenId], visibility: Visibility) {
        let mut visibility = visibility;

        for (idx, &id) in ids.iter().enumerate() {
            if visibility == Visibility::Suppressed {
                arena.get_mut(id).hidden = true;
                if arena.get(id).kind == TokenKind::LinkClose {
                    // The close of the suppressing link ends the region.
                    visibility = Visibility::Visible;
                    continue;
                }
                let children = arena.get(id).children.clone();
                if !children.is_empty() {
                    self.traverse(arena, &children, Visibility::Suppressed);
                }
                continue;
            }

            match arena.get(id).kind {
                TokenKind::Image => self.collect_image(arena, id),
                TokenKind::LinkOpen => {
                    if let Some(next) = self.collect_link_open(arena, ids, idx, id) {
                        visibility = next;
                    }
                }
                _ => {}
            }

            let children = arena.get(id).children.clone();
            if !children.is_empty() {
                self.traverse(arena, &children, visibility);
            }
        }
    }

    fn collect_image(&mut self, arena: &mut TokenArena, id: TokenId) {
        if self.options.image_strategy == ImageStrategy::Silent {
            arena.get_mut(id).hidden = true;
            return;
        }
        let Some(src) = arena.get(id).attr("src").map(str::to_string) else {
            return;
        };
        let slot = self.state.store.slot_for(AssetKind::Image, &src);
        self.state.store.get_mut(slot).tokens.push((arena.id(), id));
    }

    /// Returns the new visibility when this link opens a suppression
    /// region.
    fn collect_link_open(
        &mut self,
        arena: &mut TokenArena,
        siblings: &[TokenId],
        idx: usize,
        id: TokenId,
    ) -> Option<Visibility> {
        let Some(href) = arena.get(id).attr("href").map(str::to_string) else {
            return None;
        };
        if !self.predicate.is_attachment(&href) {
            return None;
        }

        if self.options.effective_attachment_strategy() == AttachmentStrategy::Silent {
            arena.get_mut(id).hidden = true;
            return Some(Visibility::Suppressed);
        }

        // The display filename is the immediately following text sibling.
        let filename = siblings
            .get(idx + 1)
            .map(|&next| arena.get(next))
            .filter(|t| t.kind == TokenKind::Text)
            .map(|t| t.content.clone())
            .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string());

        let slot = self.state.store.slot_for(AssetKind::Attachment, &href);
        let asset = self.state.store.get_mut(slot);
        asset.tokens.push((arena.id(), id));
        asset.filenames.push(filename);
        None
    }
}
