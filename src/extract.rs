//! Markdown → plain-text rendering.
//!
//! Documents are ingested as markdown; only the human-readable text reaches
//! the index. Structural markup is dropped while list items and table cell
//! contents are kept, with block boundaries turned into newlines so the
//! chunker never glues unrelated sections together.

use pulldown_cmark::{Event, Options, Parser, Tag};

/// Render markdown to plain text, preserving textual content only.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::new();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Text(text) => out.push_str(&text),
            Event::Code(code) => out.push_str(&code),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Rule => push_newline(&mut out),
            Event::End(tag) => match tag {
                Tag::Paragraph
                | Tag::Heading(..)
                | Tag::Item
                | Tag::List(_)
                | Tag::BlockQuote
                | Tag::CodeBlock(_)
                | Tag::Table(_)
                | Tag::TableHead
                | Tag::TableRow => push_newline(&mut out),
                Tag::TableCell => out.push(' '),
                _ => {}
            },
            _ => {}
        }
    }

    // Collapse runs of blank lines left by nested block ends.
    let mut text = String::with_capacity(out.len());
    let mut blank = 0;
    for line in out.lines() {
        if line.trim().is_empty() {
            blank += 1;
            if blank > 1 {
                continue;
            }
        } else {
            blank = 0;
        }
        text.push_str(line.trim_end());
        text.push('\n');
    }

    text.trim().to_string()
}

fn push_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}
