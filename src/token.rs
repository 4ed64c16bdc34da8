//! Token arena - the parsed-document structure the asset pipeline walks.
//!
//! Tokens are produced by an external parser and only mutated here:
//! the pipeline touches attributes, the `hidden` flag, `content`, and the
//! free-form `meta` bag, never the tree shape.
//!
//! Nodes are addressed by index (`TokenId`) with children stored as id
//! lists, so there are no ownership cycles and no back-pointers. Each
//! arena carries a process-unique id so a session shared across several
//! documents can tell their tokens apart.

use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Environment record threaded through parse and render.
pub type Env = FxHashMap<String, serde_json::Value>;

/// Next arena id (process-wide, monotonic).
static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Index of a token within its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(u32);

impl TokenId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Token type tag.
///
/// Block containers hold children; inline formatting is flat, with
/// open/close marker tokens as siblings of the content they wrap. The
/// flat inline shape is load-bearing: suppression regions and
/// display-filename lookup both work on sibling order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    CodeBlock { lang: Option<String> },
    List { start: Option<u64> },
    Item,
    Rule,
    HtmlBlock,
    /// Transparent container for structures the renderer passes through.
    Other,
    Text,
    Code,
    Html,
    SoftBreak,
    HardBreak,
    Image,
    LinkOpen,
    LinkClose,
    EmphasisOpen,
    EmphasisClose,
    StrongOpen,
    StrongClose,
    StrikeOpen,
    StrikeClose,
}

impl TokenKind {
    /// Block-level kinds rendered on their own line.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            TokenKind::Paragraph
                | TokenKind::Heading { .. }
                | TokenKind::BlockQuote
                | TokenKind::CodeBlock { .. }
                | TokenKind::List { .. }
                | TokenKind::Item
                | TokenKind::Rule
                | TokenKind::HtmlBlock
        )
    }
}

/// A single node in the token tree.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Ordered attribute list (insertion order is render order).
    attrs: Vec<(String, String)>,
    /// Raw text content (text tokens) or source text (image alt).
    pub content: String,
    pub children: Vec<TokenId>,
    /// Hidden tokens are skipped by renderers.
    pub hidden: bool,
    /// Free-form metadata bag.
    pub meta: FxHashMap<String, serde_json::Value>,
}

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            content: String::new(),
            children: Vec::new(),
            hidden: false,
            meta: FxHashMap::default(),
        }
    }

    pub fn with_content(kind: TokenKind, content: impl Into<String>) -> Self {
        let mut token = Self::new(kind);
        token.content = content.into();
        token
    }

    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value or appending.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Check a boolean flag in the meta bag.
    pub fn meta_flag(&self, name: &str) -> bool {
        self.meta
            .get(name)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Set a boolean flag in the meta bag.
    pub fn set_meta_flag(&mut self, name: &str) {
        self.meta.insert(name.to_string(), serde_json::Value::Bool(true));
    }
}

/// Arena of tokens for one parsed document.
#[derive(Debug)]
pub struct TokenArena {
    id: u64,
    nodes: Vec<Token>,
    roots: Vec<TokenId>,
}

impl TokenArena {
    pub fn new() -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Process-unique arena id.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Allocate a token and return its id.
    pub fn push(&mut self, token: Token) -> TokenId {
        let id = TokenId(self.nodes.len() as u32);
        self.nodes.push(token);
        id
    }

    /// Append a top-level (block) token.
    pub fn push_root(&mut self, id: TokenId) {
        self.roots.push(id);
    }

    #[inline]
    pub fn get(&self, id: TokenId) -> &Token {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.nodes[id.index()]
    }

    pub fn roots(&self) -> &[TokenId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for TokenArena {
    fn default() -> Self {
        Self::new()
    }
}
