//! Token arena to HTML rendering.
//!
//! Hidden tokens (and therefore whole suppression regions) are skipped.
//! Attribute order is insertion order, with `src`/`alt` pinned first on
//! images so downstream converters see a stable shape.

use std::borrow::Cow;

use crate::token::{TokenArena, TokenId, TokenKind};

pub(crate) fn render_html(arena: &TokenArena) -> String {
    let mut out = String::new();
    for &id in arena.roots() {
        render_node(arena, id, &mut out);
    }
    out
}

fn render_node(arena: &TokenArena, id: TokenId, out: &mut String) {
    let token = arena.get(id);
    if token.hidden {
        return;
    }

    match &token.kind {
        TokenKind::Paragraph => {
            out.push_str("<p>");
            render_children(arena, id, out);
            out.push_str("</p>\n");
        }
        TokenKind::Heading { level } => {
            out.push_str(&format!("<h{level}>"));
            render_children(arena, id, out);
            out.push_str(&format!("</h{level}>\n"));
        }
        TokenKind::BlockQuote => {
            out.push_str("<blockquote>\n");
            render_children(arena, id, out);
            out.push_str("</blockquote>\n");
        }
        TokenKind::CodeBlock { lang } => {
            match lang {
                Some(lang) => {
                    out.push_str(&format!("<pre><code class=\"language-{}\">", escape(lang)))
                }
                None => out.push_str("<pre><code>"),
            }
            for &child in &token.children {
                out.push_str(&escape(&arena.get(child).content));
            }
            out.push_str("</code></pre>\n");
        }
        TokenKind::List { start } => {
            let (open, close) = match start {
                None => ("<ul>\n".to_string(), "</ul>\n"),
                Some(1) => ("<ol>\n".to_string(), "</ol>\n"),
                Some(n) => (format!("<ol start=\"{n}\">\n"), "</ol>\n"),
            };
            out.push_str(&open);
            render_children(arena, id, out);
            out.push_str(close);
        }
        TokenKind::Item => {
            out.push_str("<li>");
            render_children(arena, id, out);
            out.push_str("</li>\n");
        }
        TokenKind::Rule => out.push_str("<hr>\n"),
        TokenKind::HtmlBlock | TokenKind::Other => render_children(arena, id, out),
        TokenKind::Text => out.push_str(&escape(&token.content)),
        TokenKind::Code => {
            out.push_str("<code>");
            out.push_str(&escape(&token.content));
            out.push_str("</code>");
        }
        TokenKind::Html => out.push_str(&token.content),
        TokenKind::SoftBreak => out.push('\n'),
        TokenKind::HardBreak => out.push_str("<br>\n"),
        TokenKind::EmphasisOpen => out.push_str("<em>"),
        TokenKind::EmphasisClose => out.push_str("</em>"),
        TokenKind::StrongOpen => out.push_str("<strong>"),
        TokenKind::StrongClose => out.push_str("</strong>"),
        TokenKind::StrikeOpen => out.push_str("<del>"),
        TokenKind::StrikeClose => out.push_str("</del>"),
        TokenKind::LinkOpen => {
            out.push_str("<a");
            for (name, value) in token.attrs() {
                out.push_str(&format!(" {name}=\"{}\"", escape(value)));
            }
            out.push('>');
        }
        TokenKind::LinkClose => out.push_str("</a>"),
        TokenKind::Image => render_image(arena, id, out),
    }
}

fn render_children(arena: &TokenArena, id: TokenId, out: &mut String) {
    for &child in &arena.get(id).children {
        render_node(arena, child, out);
    }
}

fn render_image(arena: &TokenArena, id: TokenId, out: &mut String) {
    let token = arena.get(id);
    let src = token.attr("src").unwrap_or("");
    let alt = alt_text(arena, id);

    out.push_str(&format!("<img src=\"{}\" alt=\"{}\"", escape(src), escape(&alt)));
    for (name, value) in token.attrs() {
        if name == "src" {
            continue;
        }
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
    out.push('>');
}

/// Alt text is the concatenated plain text of the image's children.
fn alt_text(arena: &TokenArena, id: TokenId) -> String {
    let mut alt = String::new();
    collect_text(arena, id, &mut alt);
    alt
}

fn collect_text(arena: &TokenArena, id: TokenId, out: &mut String) {
    for &child in &arena.get(id).children {
        let token = arena.get(child);
        match token.kind {
            TokenKind::Text | TokenKind::Code => out.push_str(&token.content),
            _ => collect_text(arena, child, out),
        }
    }
}

// =============================================================================
// HTML Escaping
// =============================================================================

const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters, borrowing when nothing needs escaping.
#[inline]
fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(ESCAPE_CHARS) {
        return Cow::Borrowed(s);
    }
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}
