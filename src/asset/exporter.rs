//! The asset export session.
//!
//! An [`AssetExporter`] is one long-lived session shared by every
//! document of an export run. Installed into a [`Pipeline`] it collects
//! asset references after each parse and resolves them before each
//! render; caches inside the session guarantee that a reference resolves
//! to the same value in every document and that relocated filenames
//! never collide across documents.
//!
//! All methods take `&self`; options and session state live behind
//! mutexes so one exporter can be shared across tasks. No lock is ever
//! held across an await point.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::collect::Collector;
use super::kind::AssetKind;
use super::resolve;
use super::store::{AssetStore, CollectedAsset};
use super::stream::{AssetStream, LocalAsset, StreamEntry};
use crate::config::{AttachmentStrategy, ExportOptions, ImageStrategy};
use crate::image::GifStillConverter;
use crate::loader::{AssetLoader, AttachmentPredicate, ProxyRewriter, SchemePredicate, StillImageConverter};
use crate::pipeline::{MarkupParser, ParseRule, Pipeline, RenderHook};
use crate::token::{Env, TokenArena};

/// Mutable session caches, all guarded by one mutex.
pub(crate) struct SessionState {
    /// Deduplicated asset buckets in encounter order.
    pub store: AssetStore,
    /// Reference -> resolved value, for fast replay in later documents.
    pub url_cache: FxHashMap<String, String>,
    /// Every relocated path handed out this session.
    pub path_cache: FxHashSet<String>,
    /// Per-kind counters backing symbolic id allocation.
    pub id_counters: FxHashMap<&'static str, u32>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            store: AssetStore::default(),
            url_cache: FxHashMap::default(),
            path_cache: FxHashSet::default(),
            id_counters: FxHashMap::default(),
        }
    }

    /// Allocate the next symbolic id for a kind (`image1`, `image2`,
    /// `attachment1`, ...).
    pub(crate) fn next_symbolic_id(&mut self, kind: AssetKind) -> String {
        let counter = self.id_counters.entry(kind.label()).or_insert(0);
        *counter += 1;
        format!("{}{}", kind.label(), counter)
    }
}

/// Collects, resolves, and serves the assets of an export run.
pub struct AssetExporter {
    options: Mutex<ExportOptions>,
    state: Mutex<SessionState>,
    loader: Arc<dyn AssetLoader>,
    proxy: Option<Arc<dyn ProxyRewriter>>,
    predicate: Arc<dyn AttachmentPredicate>,
    converter: Arc<dyn StillImageConverter>,
}

impl AssetExporter {
    pub fn new(options: ExportOptions, loader: Arc<dyn AssetLoader>) -> Self {
        Self {
            options: Mutex::new(options),
            state: Mutex::new(SessionState::new()),
            loader,
            proxy: None,
            predicate: Arc::new(SchemePredicate::default()),
            converter: Arc::new(GifStillConverter),
        }
    }

    /// Supply a proxy rewriter for the proxy image strategy.
    pub fn with_proxy(mut self, proxy: Arc<dyn ProxyRewriter>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Replace the attachment predicate (default: `attachment://` hrefs).
    pub fn with_predicate(mut self, predicate: Arc<dyn AttachmentPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    /// Replace the still-image converter (default: GIF to PNG).
    pub fn with_converter(mut self, converter: Arc<dyn StillImageConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Register this exporter's collection rule on a pipeline.
    pub fn install<P: MarkupParser>(self: &Arc<Self>, pipeline: &mut Pipeline<P>) {
        pipeline.install(Arc::clone(self) as Arc<dyn ParseRule>);
    }

    /// Parse, resolve assets, and render one document through the
    /// session.
    pub async fn render_with_assets<P: MarkupParser>(
        &self,
        pipeline: &Pipeline<P>,
        src: &str,
        env: &mut Env,
    ) -> Result<String> {
        pipeline.render_async(src, env, Some(self)).await
    }

    /// Resolve every collected asset and rewrite this arena's tokens.
    /// Idempotent: already-processed buckets and tokens are skipped.
    pub async fn process_assets(&self, arena: &mut TokenArena) {
        let options = self.options.lock().clone();
        resolve::resolve_images(
            &self.state,
            &options,
            self.loader.as_ref(),
            self.proxy.as_deref(),
        )
        .await;
        resolve::resolve_attachments(&self.state, &options);
        let state = self.state.lock();
        resolve::rewrite_tokens(&state, arena);
    }

    /// Change strategies mid-session. Already-resolved buckets keep
    /// their bound strategy; only later collections are affected.
    pub fn set_strategies(&self, image: ImageStrategy, attachment: AttachmentStrategy) {
        let mut options = self.options.lock();
        options.image_strategy = image;
        options.attachment_strategy = attachment;
    }

    /// Scope relocated filenames under a per-document prefix segment.
    pub fn set_filename_prefix(&self, prefix: impl Into<String>) {
        self.options.lock().filename_prefix = Some(prefix.into());
    }

    pub fn reset_filename_prefix(&self) {
        self.options.lock().filename_prefix = None;
    }

    /// Snapshot the active options.
    pub fn options(&self) -> ExportOptions {
        self.options.lock().clone()
    }

    /// The resolved value a reference was rewritten to, if resolved.
    pub fn resolved_reference(&self, reference: &str) -> Option<String> {
        self.state.lock().url_cache.get(reference).cloned()
    }

    /// Snapshot of every collected bucket, in encounter order.
    pub fn collected(&self) -> Vec<CollectedAsset> {
        self.state.lock().store.iter().cloned().collect()
    }

    /// Stream the relocated assets matching `predicate`, in encounter
    /// order. Bytes are loaded lazily, one asset per pull.
    pub fn stream_assets<F>(&self, predicate: F) -> AssetStream
    where
        F: Fn(&CollectedAsset) -> bool,
    {
        let options = self.options.lock().clone();
        let state = self.state.lock();
        let entries: Vec<StreamEntry> = state
            .store
            .iter()
            .filter(|asset| asset.processed && predicate(asset))
            .filter_map(|asset| {
                // Relocated assets stream under their local path; other
                // resolved assets a predicate admits use their resolved
                // value as the name.
                let name = asset.local_path.clone().or_else(|| asset.resolved.clone())?;
                Some(StreamEntry {
                    key: asset.key.clone(),
                    kind: asset.kind,
                    name,
                    flatten: options.flatten_animated_images && asset.kind == AssetKind::Image,
                    replace_broken: options.replace_broken_images,
                })
            })
            .collect();
        AssetStream::new(entries, Arc::clone(&self.loader), Arc::clone(&self.converter))
    }

    /// All relocated images, loaded.
    pub async fn local_images(&self) -> Vec<LocalAsset> {
        self.stream_assets(|a| a.kind == AssetKind::Image && a.local_path.is_some())
            .collect()
            .await
    }

    /// All relocated attachments, loaded.
    pub async fn local_attachments(&self) -> Vec<LocalAsset> {
        self.stream_assets(|a| a.kind == AssetKind::Attachment && a.local_path.is_some())
            .collect()
            .await
    }

    /// All relocated assets of both kinds, loaded.
    pub async fn local_assets(&self) -> Vec<LocalAsset> {
        self.stream_assets(|a| a.local_path.is_some()).collect().await
    }
}

impl ParseRule for AssetExporter {
    fn name(&self) -> &'static str {
        "collect_assets"
    }

    fn run(&self, arena: &mut TokenArena, _env: &mut Env) {
        let options = self.options.lock().clone();
        let mut state = self.state.lock();
        let mut collector = Collector {
            options: &options,
            predicate: self.predicate.as_ref(),
            state: &mut *state,
        };
        collector.run(arena);
    }
}

#[async_trait]
impl RenderHook for AssetExporter {
    async fn run(&self, arena: &mut TokenArena, _env: &mut Env) -> Result<()> {
        self.process_assets(arena).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::kind::BoundStrategy;
    use crate::loader::{AssetPayload, broken_image_data_uri};
    use crate::markdown::MarkdownParser;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TINY_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // GIF89a
        0x01, 0x00, 0x01, 0x00, // 1x1
        0x80, 0x00, 0x00, // global color table, 2 entries
        0xff, 0xff, 0xff, 0x00, 0x00, 0x00, // palette
        0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // image descriptor
        0x02, 0x02, 0x44, 0x01, 0x00, // image data
        0x3b, // trailer
    ];

    /// In-memory loader that fabricates payloads from the reference and
    /// counts every load.
    #[derive(Default)]
    struct MockLoader {
        image_loads: AtomicUsize,
        attachment_loads: AtomicUsize,
        missing: Vec<String>,
        gifs: Vec<String>,
    }

    impl MockLoader {
        fn check(&self, reference: &str) -> Result<()> {
            if self.missing.iter().any(|m| m == reference) {
                bail!("no such asset: {reference}");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AssetLoader for MockLoader {
        async fn image_data_uri(&self, reference: &str, _still_hint: bool) -> Result<String> {
            self.image_loads.fetch_add(1, Ordering::SeqCst);
            self.check(reference)?;
            Ok(format!("data:image/png;base64,uri-of-{reference}"))
        }

        async fn image_bytes(&self, reference: &str) -> Result<AssetPayload> {
            self.image_loads.fetch_add(1, Ordering::SeqCst);
            self.check(reference)?;
            if self.gifs.iter().any(|g| g == reference) {
                return Ok(AssetPayload::new(TINY_GIF.to_vec(), "image/gif"));
            }
            Ok(AssetPayload::new(reference.as_bytes().to_vec(), "image/png"))
        }

        async fn attachment_bytes(&self, reference: &str) -> Result<AssetPayload> {
            self.attachment_loads.fetch_add(1, Ordering::SeqCst);
            self.check(reference)?;
            Ok(AssetPayload::new(reference.as_bytes().to_vec(), "application/pdf"))
        }
    }

    fn setup(
        options: ExportOptions,
        loader: Arc<MockLoader>,
    ) -> (Pipeline<MarkdownParser>, Arc<AssetExporter>) {
        let exporter = Arc::new(AssetExporter::new(options, loader));
        let mut pipeline = Pipeline::new(MarkdownParser::default());
        exporter.install(&mut pipeline);
        (pipeline, exporter)
    }

    async fn export(
        pipeline: &Pipeline<MarkdownParser>,
        exporter: &AssetExporter,
        src: &str,
    ) -> String {
        let mut env = Env::default();
        exporter
            .render_with_assets(pipeline, src, &mut env)
            .await
            .unwrap()
    }

    fn relocate_options() -> ExportOptions {
        ExportOptions {
            image_strategy: ImageStrategy::Relocate,
            attachment_strategy: AttachmentStrategy::Relocate,
            export_attachments: Some(true),
            ..ExportOptions::default()
        }
    }

    #[tokio::test]
    async fn test_embed_deduplicates_loads() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(ExportOptions::default(), loader.clone());
        let out = export(
            &pipeline,
            &exporter,
            "![a](https://x.test/image.png) ![b](https://x.test/image.png)",
        )
        .await;

        assert_eq!(loader.image_loads.load(Ordering::SeqCst), 1);
        assert_eq!(
            out.matches("data:image/png;base64,uri-of-https://x.test/image.png")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_process_assets_idempotent() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(ExportOptions::default(), loader.clone());
        let src = "![a](https://x.test/image.png)";

        let mut env = Env::default();
        let mut arena = pipeline.parse(src, &mut env);
        exporter.process_assets(&mut arena).await;
        let first = pipeline.render(&arena, &env);
        exporter.process_assets(&mut arena).await;
        let second = pipeline.render(&arena, &env);

        assert_eq!(first, second);
        assert_eq!(loader.image_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_relocate_rewrites_to_local_path() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader.clone());
        let out = export(&pipeline, &exporter, "![a](https://x.test/image.png)").await;

        assert_eq!(out, "<p><img src=\"images/image.png\" alt=\"a\"></p>\n");
        // Relocation resolves from the reference alone; no bytes loaded.
        assert_eq!(loader.image_loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_relocate_suffixes_duplicate_filenames() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);
        let out = export(
            &pipeline,
            &exporter,
            "![a](https://x.test/one/photo.png) ![b](https://x.test/two/photo.png)",
        )
        .await;

        assert!(out.contains("src=\"images/photo.png\""));
        assert!(out.contains("src=\"images/photo-1.png\""));
    }

    #[tokio::test]
    async fn test_width_suffix_split() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);
        let out = export(&pipeline, &exporter, "![Alt text|300](https://x.test/pic.png)").await;

        assert_eq!(
            out,
            "<p><img src=\"images/pic.png\" alt=\"Alt text\" width=\"300\"></p>\n"
        );
    }

    #[tokio::test]
    async fn test_width_suffix_rejects_non_numeric_and_zero() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);
        let out = export(
            &pipeline,
            &exporter,
            "![Alt|wide](https://x.test/a.png) ![Alt|0](https://x.test/b.png)",
        )
        .await;

        assert!(out.contains("alt=\"Alt|wide\""));
        assert!(out.contains("alt=\"Alt|0\""));
        assert!(!out.contains("width="));
    }

    #[tokio::test]
    async fn test_silent_attachments_suppressed() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(ExportOptions::default(), loader.clone());
        let out = export(&pipeline, &exporter, "[file.pdf](attachment://uniqueid)").await;

        assert_eq!(out, "<p></p>\n");
        assert_eq!(loader.attachment_loads.load(Ordering::SeqCst), 0);
        assert!(exporter.collected().is_empty());
    }

    #[tokio::test]
    async fn test_silent_images_suppressed() {
        let loader = Arc::new(MockLoader::default());
        let options = ExportOptions {
            image_strategy: ImageStrategy::Silent,
            ..ExportOptions::default()
        };
        let (pipeline, exporter) = setup(options, loader.clone());
        let out = export(&pipeline, &exporter, "before ![a](https://x.test/image.png) after").await;

        assert!(!out.contains("<img"));
        assert!(out.contains("before"));
        assert_eq!(loader.image_loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_relocated_attachment_keeps_display_name() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);
        let out = export(&pipeline, &exporter, "[report.pdf](attachment://uniqueid)").await;

        assert_eq!(
            out,
            "<p><a href=\"attachments/report.pdf\">report.pdf</a></p>\n"
        );
    }

    #[tokio::test]
    async fn test_broken_image_embeds_placeholder() {
        let loader = Arc::new(MockLoader {
            missing: vec!["https://x.test/gone.png".to_string()],
            ..MockLoader::default()
        });
        let (pipeline, exporter) = setup(ExportOptions::default(), loader);
        let out = export(&pipeline, &exporter, "![a](https://x.test/gone.png)").await;

        assert!(out.contains(broken_image_data_uri()));
    }

    #[tokio::test]
    async fn test_broken_image_replacement_disabled() {
        let loader = Arc::new(MockLoader {
            missing: vec!["https://x.test/gone.png".to_string()],
            ..MockLoader::default()
        });
        let options = ExportOptions {
            replace_broken_images: false,
            ..ExportOptions::default()
        };
        let (pipeline, exporter) = setup(options, loader);
        let out = export(&pipeline, &exporter, "![a](https://x.test/gone.png)").await;

        assert!(out.contains("src=\"https://x.test/gone.png\""));
    }

    #[tokio::test]
    async fn test_local_assets_order_and_failure_skip() {
        let loader = Arc::new(MockLoader {
            missing: vec!["attachment://gone".to_string()],
            ..MockLoader::default()
        });
        let (pipeline, exporter) = setup(relocate_options(), loader);
        export(
            &pipeline,
            &exporter,
            "![a](https://x.test/a.png)\n\n[doc.pdf](attachment://gone)\n\n![b](https://x.test/b.png)",
        )
        .await;

        let assets = exporter.local_assets().await;
        let names: Vec<&str> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["images/a.png", "images/b.png"]);
        assert_eq!(assets[0].bytes.as_ref(), b"https://x.test/a.png");
        assert_eq!(assets[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_broken_relocated_image_streams_placeholder() {
        let loader = Arc::new(MockLoader {
            missing: vec!["https://x.test/gone.png".to_string()],
            ..MockLoader::default()
        });
        let (pipeline, exporter) = setup(relocate_options(), loader);
        export(&pipeline, &exporter, "![a](https://x.test/gone.png)").await;

        let images = exporter.local_images().await;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "images/gone.png");
        assert_eq!(&images[0].bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_gif_flattened_and_renamed() {
        let loader = Arc::new(MockLoader {
            gifs: vec!["https://x.test/test.gif".to_string()],
            ..MockLoader::default()
        });
        let options = ExportOptions {
            flatten_animated_images: true,
            ..relocate_options()
        };
        let (pipeline, exporter) = setup(options, loader);
        let out = export(&pipeline, &exporter, "![anim](https://x.test/test.gif)").await;

        assert!(out.contains("src=\"images/test.png\""));
        let images = exporter.local_images().await;
        assert_eq!(images[0].name, "images/test.png");
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(&images[0].bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_flatten_failure_streams_placeholder() {
        struct FailingConverter;
        impl StillImageConverter for FailingConverter {
            fn flatten_animated(&self, _payload: AssetPayload) -> Result<AssetPayload> {
                bail!("corrupt frame data")
            }
        }

        let loader = Arc::new(MockLoader {
            gifs: vec!["https://x.test/anim.gif".to_string()],
            ..MockLoader::default()
        });
        let options = ExportOptions {
            flatten_animated_images: true,
            ..relocate_options()
        };
        let exporter = Arc::new(
            AssetExporter::new(options, loader).with_converter(Arc::new(FailingConverter)),
        );
        let mut pipeline = Pipeline::new(MarkdownParser::default());
        exporter.install(&mut pipeline);
        export(&pipeline, &exporter, "![a](https://x.test/anim.gif)").await;

        let images = exporter.local_images().await;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "images/anim.png");
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(&images[0].bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_symbolic_ids_count_per_kind() {
        let loader = Arc::new(MockLoader::default());
        let options = ExportOptions {
            image_strategy: ImageStrategy::SymbolicId,
            attachment_strategy: AttachmentStrategy::SymbolicId,
            ..ExportOptions::default()
        };
        let (pipeline, exporter) = setup(options, loader);
        let out = export(
            &pipeline,
            &exporter,
            "![a](https://x.test/a.png) ![b](https://x.test/b.png)\n\n[f.pdf](attachment://f1)",
        )
        .await;

        assert!(out.contains("src=\"image1\""));
        assert!(out.contains("src=\"image2\""));
        assert!(out.contains("href=\"attachment1\""));
    }

    #[tokio::test]
    async fn test_proxy_strategy_rewrites() {
        struct PrefixProxy;
        impl ProxyRewriter for PrefixProxy {
            fn rewrite(&self, reference: &str) -> Option<String> {
                reference
                    .strip_prefix("https://")
                    .map(|rest| format!("https://proxy.test/{rest}"))
            }
        }

        let loader = Arc::new(MockLoader::default());
        let options = ExportOptions {
            image_strategy: ImageStrategy::Proxy,
            ..ExportOptions::default()
        };
        let exporter =
            Arc::new(AssetExporter::new(options, loader).with_proxy(Arc::new(PrefixProxy)));
        let mut pipeline = Pipeline::new(MarkdownParser::default());
        exporter.install(&mut pipeline);

        let out = export(&pipeline, &exporter, "![a](https://x.test/a.png)").await;
        assert!(out.contains("src=\"https://proxy.test/x.test/a.png\""));
    }

    #[tokio::test]
    async fn test_drop_strategy_leaves_reference() {
        let loader = Arc::new(MockLoader::default());
        let options = ExportOptions {
            image_strategy: ImageStrategy::Drop,
            ..ExportOptions::default()
        };
        let (pipeline, exporter) = setup(options, loader.clone());
        let out = export(&pipeline, &exporter, "![a](https://x.test/a.png)").await;

        assert!(out.contains("src=\"https://x.test/a.png\""));
        assert_eq!(loader.image_loads.load(Ordering::SeqCst), 0);
        let collected = exporter.collected();
        assert_eq!(collected.len(), 1);
        assert!(collected[0].processed);
        assert_eq!(collected[0].strategy, Some(BoundStrategy::Drop));
        assert_eq!(collected[0].resolved, None);
        assert!(exporter.local_assets().await.is_empty());
    }

    #[tokio::test]
    async fn test_plain_links_ignored() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);
        let out = export(&pipeline, &exporter, "[site](https://example.com/page)").await;

        assert_eq!(out, "<p><a href=\"https://example.com/page\">site</a></p>\n");
        assert!(exporter.collected().is_empty());
    }

    #[tokio::test]
    async fn test_cross_document_dedup() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);

        export(&pipeline, &exporter, "![Image 1.5](https://x.test/image.png)").await;

        // Same session bound to a second pipeline.
        let mut other = Pipeline::new(MarkdownParser::default());
        exporter.install(&mut other);
        let second = export(
            &other,
            &exporter,
            "![Image 1.5](https://x.test/image.png) ![Image2](https://x.test/image2.png)",
        )
        .await;

        // The repeated reference replays the first document's path; only
        // the new reference allocates one.
        assert_eq!(
            second,
            "<p><img src=\"images/image.png\" alt=\"Image 1.5\"> <img src=\"images/image2.png\" alt=\"Image2\"></p>\n"
        );
        let assets = exporter.local_assets().await;
        assert_eq!(assets.len(), 2);
    }

    #[tokio::test]
    async fn test_filename_prefix_scopes_paths() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);

        exporter.set_filename_prefix("note-1");
        let first = export(&pipeline, &exporter, "![a](https://x.test/a.png)").await;
        exporter.reset_filename_prefix();
        let second = export(&pipeline, &exporter, "![b](https://x.test/b.png)").await;

        assert!(first.contains("src=\"images/note-1/a.png\""));
        assert!(second.contains("src=\"images/b.png\""));
    }

    #[tokio::test]
    async fn test_resolved_reference_cache() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);
        assert_eq!(exporter.resolved_reference("https://x.test/a.png"), None);

        export(&pipeline, &exporter, "![a](https://x.test/a.png)").await;
        assert_eq!(
            exporter.resolved_reference("https://x.test/a.png").as_deref(),
            Some("images/a.png")
        );
    }

    #[tokio::test]
    async fn test_export_attachments_override() {
        let loader = Arc::new(MockLoader::default());
        // Configured silent, but the override forces relocation.
        let options = ExportOptions {
            attachment_strategy: AttachmentStrategy::Silent,
            export_attachments: Some(true),
            ..ExportOptions::default()
        };
        let (pipeline, exporter) = setup(options, loader);
        let out = export(&pipeline, &exporter, "[f.pdf](attachment://f1)").await;

        assert!(out.contains("href=\"attachments/f.pdf\""));
    }

    #[tokio::test]
    async fn test_escaped_relocated_path() {
        let loader = Arc::new(MockLoader::default());
        let (pipeline, exporter) = setup(relocate_options(), loader);
        let out = export(&pipeline, &exporter, "[my file.pdf](attachment://f1)").await;

        assert!(out.contains("href=\"attachments/my%20file.pdf\""));
    }
}
