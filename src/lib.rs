//! Markdown export with first-class asset handling.
//!
//! Documents reference remote images and attachments; exporting them to
//! portable formats requires those references to be collected, resolved
//! under a configurable strategy (inline data URIs, relocated local
//! files, symbolic ids, proxy URLs, or omission), and the relocated
//! bytes delivered alongside the rendered output.
//!
//! The crate is organized around one [`asset::AssetExporter`] session
//! shared by all documents of an export run:
//!
//! ```no_run
//! use std::sync::Arc;
//! use markout::asset::AssetExporter;
//! use markout::config::ExportOptions;
//! use markout::markdown::MarkdownParser;
//! use markout::pipeline::Pipeline;
//! use markout::token::Env;
//! # use markout::loader::AssetLoader;
//! # async fn run(loader: Arc<dyn AssetLoader>) -> anyhow::Result<()> {
//! let exporter = Arc::new(AssetExporter::new(ExportOptions::default(), loader));
//! let mut pipeline = Pipeline::new(MarkdownParser::default());
//! exporter.install(&mut pipeline);
//!
//! let mut env = Env::default();
//! let html = exporter
//!     .render_with_assets(&pipeline, "![photo](https://example.com/photo.png)", &mut env)
//!     .await?;
//! let files = exporter.local_assets().await;
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod config;
pub mod image;
pub mod loader;
pub mod logger;
pub mod markdown;
pub mod pipeline;
pub mod token;

pub use asset::{AssetExporter, AssetStream, LocalAsset};
pub use config::{AttachmentStrategy, ExportOptions, ImageStrategy};
pub use loader::{AssetLoader, AssetPayload};
pub use pipeline::Pipeline;
