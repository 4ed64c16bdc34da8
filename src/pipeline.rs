//! Parse-resolve-render pipeline.
//!
//! The underlying parser contract is fully synchronous: parse source
//! into a token arena, render the arena into output text. Asset
//! resolution needs to await I/O between those two steps, so the
//! pipeline inserts exactly one awaited hook there without forking the
//! synchronous contract:
//!
//! ```text
//! parse (sync) --> parse rules (sync) --> hook (awaited) --> render (sync)
//! ```
//!
//! The pipeline itself is stateless composition; all side effects belong
//! to the registered rules and the hook.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::token::{Env, TokenArena};

/// A markup parser: text in, token arena out, arena back to text.
pub trait MarkupParser {
    fn parse(&self, src: &str, env: &mut Env) -> TokenArena;
    fn render(&self, arena: &TokenArena, env: &Env) -> String;
}

/// A named post-parse traversal step, run synchronously after every
/// parse.
pub trait ParseRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn run(&self, arena: &mut TokenArena, env: &mut Env);
}

/// The awaited step between parse and render. Errors propagate to the
/// caller and no render occurs.
#[async_trait]
pub trait RenderHook: Send + Sync {
    async fn run(&self, arena: &mut TokenArena, env: &mut Env) -> Result<()>;
}

/// A parser extended with post-parse rules and an async render entry
/// point.
pub struct Pipeline<P> {
    parser: P,
    rules: Vec<Arc<dyn ParseRule>>,
}

impl<P: MarkupParser> Pipeline<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            rules: Vec::new(),
        }
    }

    /// Register a post-parse rule. Idempotent by rule name.
    pub fn install(&mut self, rule: Arc<dyn ParseRule>) {
        if self.rules.iter().any(|r| r.name() == rule.name()) {
            return;
        }
        self.rules.push(rule);
    }

    /// Parse source text and run all registered rules.
    pub fn parse(&self, src: &str, env: &mut Env) -> TokenArena {
        let mut arena = self.parser.parse(src, env);
        for rule in &self.rules {
            rule.run(&mut arena, env);
        }
        arena
    }

    /// Render a token arena.
    pub fn render(&self, arena: &TokenArena, env: &Env) -> String {
        self.parser.render(arena, env)
    }

    /// Parse, await the hook, then render.
    pub async fn render_async(
        &self,
        src: &str,
        env: &mut Env,
        hook: Option<&dyn RenderHook>,
    ) -> Result<String> {
        let mut arena = self.parse(src, env);
        if let Some(hook) = hook {
            hook.run(&mut arena, env).await?;
        }
        Ok(self.parser.render(&arena, env))
    }
}
