use std::fmt::Write;

use super::token::{Token, TokenKind};
use super::tokenizer::Tokenizer;

/// Tokenize `text` for display. Total: any input yields a token stream that
/// covers it byte-for-byte.
pub fn tokens(text: &str) -> Vec<Token> {
    Tokenizer::new(text).tokenize_all()
}

/// Render `text` as a markup string, one `<span class="hl-…">` per
/// classified token. Only `&`, `<` and `>` are escaped so that every other
/// character keeps its width and the markup overlays the raw buffer
/// pixel-for-pixel. Stripping the tags and unescaping those three entities
/// reconstructs the input exactly.
pub fn to_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);

    for token in tokens(text) {
        let lexeme = &text[token.start..token.end];
        if token.kind.is_bracket() {
            let _ = write!(
                out,
                "<span class=\"hl-bracket hl-bracket-{}\">{}</span>",
                token.depth, lexeme
            );
        } else if let Some(class) = token.kind.markup_class() {
            out.push_str("<span class=\"");
            out.push_str(class);
            out.push_str("\">");
            escape_into(&mut out, lexeme);
            out.push_str("</span>");
        } else {
            escape_into(&mut out, lexeme);
        }
    }

    out
}

/// Escape only the three characters that would break the markup.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Inverse of `to_markup`: drop tags, unescape the three entities. Consumers
/// can use this to recover the plain text behind a markup string.
pub fn strip_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut chars = markup.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                // Tags are machine-generated and never contain '>'.
                for tag_ch in chars.by_ref() {
                    if tag_ch == '>' {
                        break;
                    }
                }
            }
            '&' => {
                let mut entity = String::from("&");
                for ent_ch in chars.by_ref() {
                    entity.push(ent_ch);
                    if ent_ch == ';' {
                        break;
                    }
                }
                match entity.as_str() {
                    "&amp;" => out.push('&'),
                    "&lt;" => out.push('<'),
                    "&gt;" => out.push('>'),
                    other => out.push_str(other),
                }
            }
            _ => out.push(ch),
        }
    }

    out
}
