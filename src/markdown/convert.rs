//! Markdown to token-arena conversion using pulldown-cmark.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::token::{Token, TokenArena, TokenId, TokenKind};

/// Options for markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
    /// Enable smart punctuation
    pub smart_punctuation: bool,
}

impl MarkdownOptions {
    /// Create options with all extensions enabled
    pub fn all() -> Self {
        Self {
            strikethrough: true,
            task_lists: true,
            smart_punctuation: true,
        }
    }

    /// Convert to pulldown-cmark Options
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.smart_punctuation {
            opts.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        opts
    }
}

/// Convert markdown text into a token arena.
pub(crate) fn to_arena(src: &str, options: &MarkdownOptions) -> TokenArena {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(src, options.to_pulldown_options()) {
        builder.handle_event(event);
    }
    builder.finish()
}

/// Event-stream to tree builder (stack of open containers).
struct TreeBuilder {
    arena: TokenArena,
    stack: Vec<TokenId>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            arena: TokenArena::new(),
            stack: Vec::new(),
        }
    }

    fn finish(mut self) -> TokenArena {
        // A malformed event stream could leave containers open; close
        // them so their tokens are not lost.
        while !self.stack.is_empty() {
            self.close();
        }
        self.arena
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(TagEnd::Emphasis) => self.leaf(Token::new(TokenKind::EmphasisClose)),
            Event::End(TagEnd::Strong) => self.leaf(Token::new(TokenKind::StrongClose)),
            Event::End(TagEnd::Strikethrough) => self.leaf(Token::new(TokenKind::StrikeClose)),
            Event::End(TagEnd::Link) => self.leaf(Token::new(TokenKind::LinkClose)),
            Event::End(TagEnd::Image) => self.close_image(),
            Event::End(_) => self.close(),
            Event::Text(text) => self.leaf(Token::with_content(TokenKind::Text, text.as_ref())),
            Event::Code(code) => self.leaf(Token::with_content(TokenKind::Code, code.as_ref())),
            Event::Html(html) | Event::InlineHtml(html) => {
                self.leaf(Token::with_content(TokenKind::Html, html.as_ref()))
            }
            Event::SoftBreak => self.leaf(Token::new(TokenKind::SoftBreak)),
            Event::HardBreak => self.leaf(Token::new(TokenKind::HardBreak)),
            Event::Rule => self.leaf(Token::new(TokenKind::Rule)),
            Event::FootnoteReference(name) => {
                self.leaf(Token::with_content(TokenKind::Text, format!("[{name}]")))
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.leaf(Token::with_content(TokenKind::Text, marker))
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.leaf(Token::with_content(TokenKind::Text, math.as_ref()))
            }
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => self.open(Token::new(TokenKind::Paragraph)),
            Tag::Heading { level, .. } => self.open(Token::new(TokenKind::Heading {
                level: heading_level(level),
            })),
            Tag::BlockQuote(_) => self.open(Token::new(TokenKind::BlockQuote)),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.open(Token::new(TokenKind::CodeBlock { lang }));
            }
            Tag::List(start) => self.open(Token::new(TokenKind::List { start })),
            Tag::Item => self.open(Token::new(TokenKind::Item)),
            Tag::HtmlBlock => self.open(Token::new(TokenKind::HtmlBlock)),
            Tag::Emphasis => self.leaf(Token::new(TokenKind::EmphasisOpen)),
            Tag::Strong => self.leaf(Token::new(TokenKind::StrongOpen)),
            Tag::Strikethrough => self.leaf(Token::new(TokenKind::StrikeOpen)),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut token = Token::new(TokenKind::LinkOpen);
                token.set_attr("href", dest_url.as_ref());
                if !title.is_empty() {
                    token.set_attr("title", title.as_ref());
                }
                self.leaf(token);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut token = Token::new(TokenKind::Image);
                token.set_attr("src", dest_url.as_ref());
                if !title.is_empty() {
                    token.set_attr("title", title.as_ref());
                }
                let id = self.arena.push(token);
                self.stack.push(id);
            }
            _ => self.open(Token::new(TokenKind::Other)),
        }
    }

    /// Push a container token onto the stack.
    fn open(&mut self, token: Token) {
        let id = self.arena.push(token);
        self.stack.push(id);
    }

    /// Pop the current container and attach it to its parent.
    fn close(&mut self) {
        let Some(id) = self.stack.pop() else { return };
        self.attach(id);
    }

    /// Pop an image container: its children are the alt text, which is
    /// also flattened into `content` (the pipe-width convention lives
    /// there).
    fn close_image(&mut self) {
        let Some(id) = self.stack.pop() else { return };
        let alt: String = self
            .arena
            .get(id)
            .children
            .iter()
            .map(|&child| self.arena.get(child).content.as_str())
            .collect();
        self.arena.get_mut(id).content = alt;
        self.attach(id);
    }

    /// Create a leaf token attached to the current container.
    fn leaf(&mut self, token: Token) {
        let id = self.arena.push(token);
        self.attach(id);
    }

    fn attach(&mut self, id: TokenId) {
        match self.stack.last() {
            Some(&parent) => self.arena.get_mut(parent).children.push(id),
            None => self.arena.push_root(id),
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> TokenArena {
        to_arena(src, &MarkdownOptions::default())
    }

    fn kinds_of(arena: &TokenArena, ids: &[TokenId]) -> Vec<TokenKind> {
        ids.iter().map(|&id| arena.get(id).kind.clone()).collect()
    }

    #[test]
    fn test_paragraph_with_image() {
        let arena = parse("![Alt text](image.png)");
        assert_eq!(arena.roots().len(), 1);
        let para = arena.get(arena.roots()[0]);
        assert_eq!(para.kind, TokenKind::Paragraph);
        let image = arena.get(para.children[0]);
        assert_eq!(image.kind, TokenKind::Image);
        assert_eq!(image.attr("src"), Some("image.png"));
        assert_eq!(image.content, "Alt text");
    }

    #[test]
    fn test_link_tokens_are_flat_siblings() {
        let arena = parse("[file.pdf](attachment://uniqueid)");
        let para = arena.get(arena.roots()[0]);
        assert_eq!(
            kinds_of(&arena, &para.children),
            [TokenKind::LinkOpen, TokenKind::Text, TokenKind::LinkClose]
        );
        let open = arena.get(para.children[0]);
        assert_eq!(open.attr("href"), Some("attachment://uniqueid"));
        assert_eq!(arena.get(para.children[1]).content, "file.pdf");
    }

    #[test]
    fn test_two_paragraphs() {
        let arena = parse("one\n\ntwo");
        assert_eq!(arena.roots().len(), 2);
    }

    #[test]
    fn test_heading_level() {
        let arena = parse("## Title");
        assert_eq!(
            arena.get(arena.roots()[0]).kind,
            TokenKind::Heading { level: 2 }
        );
    }
}
