//! Per-bucket resolution and token rewriting.
//!
//! Each unprocessed bucket is resolved exactly once per session; the
//! `processed` flag makes repeated calls no-ops. Image buckets that need
//! I/O (embed) are issued as one concurrent batch and awaited together —
//! rewriting only starts after every resolution has settled, so two
//! tokens in one bucket can never observe different resolved values.
//!
//! Load failures are terminal for the one asset and reported through the
//! logger: images degrade to the built-in placeholder when replacement
//! is enabled, otherwise the original reference is left in place.

use futures::future::join_all;
use parking_lot::Mutex;

use super::exporter::SessionState;
use super::kind::{AssetKind, BoundStrategy};
use super::path::{escape_url, extract_filename, rename_extension, unique_file_path};
use crate::config::{AttachmentStrategy, ExportOptions, ImageStrategy};
use crate::image::needs_still_rename;
use crate::loader::{AssetLoader, ProxyRewriter, broken_image_data_uri};
use crate::token::{TokenArena, TokenId};
use crate::{debug, log};

/// Meta flag marking a token as already rewritten.
pub(crate) const META_ASSET_PROCESSED: &str = "asset_processed";

/// Fallback display name for attachments without a recorded filename.
const DEFAULT_ATTACHMENT_NAME: &str = "attachment";

/// Resolve all unprocessed image buckets under the active strategy.
pub(crate) async fn resolve_images(
    state: &Mutex<SessionState>,
    options: &ExportOptions,
    loader: &dyn AssetLoader,
    proxy: Option<&dyn ProxyRewriter>,
) {
    let pending: Vec<(usize, String)> = {
        let guard = state.lock();
        guard
            .store
            .unprocessed(AssetKind::Image)
            .into_iter()
            .map(|slot| (slot, guard.store.get(slot).key.clone()))
            .collect()
    };
    if pending.is_empty() {
        return;
    }

    match options.image_strategy {
        ImageStrategy::Embed => {
            // One concurrent batch; no lock is held while loads are in
            // flight.
            let loads = pending.into_iter().map(|(slot, key)| async move {
                let result = loader
                    .image_data_uri(&key, options.flatten_animated_images)
                    .await;
                (slot, key, result)
            });
            let results = join_all(loads).await;
            debug!("assets"; "embedded {} image(s)", results.len());

            let mut guard = state.lock();
            for (slot, key, result) in results {
                let data_uri = match result {
                    Ok(uri) => Some(uri),
                    Err(err) => {
                        log!("assets"; "failed to load image `{key}`: {err:#}");
                        None
                    }
                };
                let resolved = data_uri
                    .or_else(|| {
                        options
                            .replace_broken_images
                            .then(|| broken_image_data_uri().to_string())
                    })
                    .unwrap_or_else(|| key.clone());
                finish(&mut guard, slot, BoundStrategy::Embed, Some(resolved));
            }
        }
        ImageStrategy::Relocate => {
            let mut guard = state.lock();
            let st = &mut *guard;
            for (slot, key) in pending {
                let mut filename = extract_filename(&key);
                if options.flatten_animated_images && needs_still_rename(&filename) {
                    filename = rename_extension(&filename, "png");
                }
                let path = unique_file_path(
                    &mut st.path_cache,
                    &options.image_folder,
                    options.filename_prefix.as_deref(),
                    &filename,
                );
                st.store.get_mut(slot).local_path = Some(path.clone());
                finish(st, slot, BoundStrategy::Relocate, Some(escape_url(&path)));
            }
        }
        ImageStrategy::SymbolicId => {
            let mut guard = state.lock();
            for (slot, _) in pending {
                let id = guard.next_symbolic_id(AssetKind::Image);
                finish(&mut guard, slot, BoundStrategy::SymbolicId, Some(id));
            }
        }
        ImageStrategy::Proxy => {
            let mut guard = state.lock();
            for (slot, key) in pending {
                let rewritten = proxy.and_then(|p| p.rewrite(&key));
                if rewritten.is_none() {
                    log!("assets"; "no proxy rewrite for image `{key}`");
                }
                let resolved = rewritten
                    .or_else(|| {
                        options
                            .replace_broken_images
                            .then(|| broken_image_data_uri().to_string())
                    })
                    .unwrap_or_else(|| key.clone());
                finish(&mut guard, slot, BoundStrategy::Proxy, Some(resolved));
            }
        }
        ImageStrategy::Drop => {
            let mut guard = state.lock();
            for (slot, _) in pending {
                finish(&mut guard, slot, BoundStrategy::Drop, None);
            }
        }
        // Silent images are hidden at collection time and never bucketed.
        ImageStrategy::Silent => {}
    }
}

/// Resolve all unprocessed attachment buckets. Attachments only ever
/// relocate or take symbolic ids, so no I/O happens here.
pub(crate) fn resolve_attachments(state: &Mutex<SessionState>, options: &ExportOptions) {
    let strategy = options.effective_attachment_strategy();
    let mut guard = state.lock();
    let pending = guard.store.unprocessed(AssetKind::Attachment);

    for slot in pending {
        match strategy {
            AttachmentStrategy::Relocate => {
                let filename = guard
                    .store
                    .get(slot)
                    .filenames
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string());
                let st = &mut *guard;
                let path = unique_file_path(
                    &mut st.path_cache,
                    &options.attachment_folder,
                    options.filename_prefix.as_deref(),
                    &filename,
                );
                st.store.get_mut(slot).local_path = Some(path.clone());
                finish(st, slot, BoundStrategy::Relocate, Some(escape_url(&path)));
            }
            AttachmentStrategy::SymbolicId => {
                let id = guard.next_symbolic_id(AssetKind::Attachment);
                finish(&mut guard, slot, BoundStrategy::SymbolicId, Some(id));
            }
            AttachmentStrategy::Drop => {
                finish(&mut guard, slot, BoundStrategy::Drop, None);
            }
            // Silent attachments are suppressed at collection time.
            AttachmentStrategy::Silent => {}
        }
    }
}

/// Record a bucket's resolution and update the url cache.
fn finish(state: &mut SessionState, slot: usize, strategy: BoundStrategy, resolved: Option<String>) {
    if let Some(resolved) = &resolved {
        let key = state.store.get(slot).key.clone();
        state.url_cache.insert(key, resolved.clone());
    }
    let asset = state.store.get_mut(slot);
    asset.strategy = Some(strategy);
    asset.resolved = resolved;
    asset.processed = true;
}

/// Rewrite every collected token of the given arena to its bucket's
/// resolved value. Idempotent per token via the meta flag.
pub(crate) fn rewrite_tokens(state: &SessionState, arena: &mut TokenArena) {
    for asset in state.store.iter() {
        let Some(resolved) = asset.resolved.clone() else {
            // Dropped buckets keep their original references.
            continue;
        };
        let attr = match asset.kind {
            AssetKind::Image => "src",
            AssetKind::Attachment => "href",
        };
        for &(arena_id, id) in &asset.tokens {
            if arena_id != arena.id() {
                continue;
            }
            if arena.get(id).meta_flag(META_ASSET_PROCESSED) {
                continue;
            }
            arena.get_mut(id).set_attr(attr, resolved.clone());
            if asset.kind == AssetKind::Image {
                split_width_suffix(arena, id);
            }
            arena.get_mut(id).set_meta_flag(META_ASSET_PROCESSED);
        }
    }
}

/// Split a trailing `|<width>` off an image's display text into a
/// `width` attribute (`Alt text|300` -> alt `Alt text`, width `300`).
fn split_width_suffix(arena: &mut TokenArena, id: TokenId) {
    let content = arena.get(id).content.clone();
    let Some((name, width)) = content.rsplit_once('|') else {
        return;
    };
    let Ok(width) = width.trim().parse::<u32>() else {
        return;
    };
    if width == 0 {
        return;
    }

    let first_child = {
        let token = arena.get_mut(id);
        token.set_attr("width", width.to_string());
        token.content = name.to_string();
        token.children.first().copied()
    };
    if let Some(child) = first_child {
        arena.get_mut(child).content = name.to_string();
    }
}
