//! Markdown adapter behind the parser seam.
//!
//! The asset pipeline never parses markup itself; this module supplies a
//! reference [`MarkupParser`] over pulldown-cmark so the pipeline has a
//! complete parse-to-HTML path out of the box. Any other parser can be
//! plugged in behind the same seam.

pub mod convert;
mod render;

pub use convert::MarkdownOptions;

use crate::pipeline::MarkupParser;
use crate::token::{Env, TokenArena};

/// Markdown parser and HTML renderer over pulldown-cmark.
#[derive(Debug, Clone, Default)]
pub struct MarkdownParser {
    options: MarkdownOptions,
}

impl MarkdownParser {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl MarkupParser for MarkdownParser {
    fn parse(&self, src: &str, _env: &mut Env) -> TokenArena {
        convert::to_arena(src, &self.options)
    }

    fn render(&self, arena: &TokenArena, _env: &Env) -> String {
        render::render_html(arena)
    }
}
