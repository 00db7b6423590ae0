//! Markdown conversion — folds the pulldown-cmark event stream into a
//! [`DocumentTree`].
//!
//! This is the producer of pristine trees for the previewer. Raw HTML is
//! dropped rather than sanitized; sanitization policy is not this crate's
//! concern.


use std::io;
use std::path::Path;

use pulldown_cmark::{
    Alignment as MdAlignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag as MdTag,
};

use crate::tree::{Alignment, Container, DocumentTree, Node, Tag};

/// Reads a Markdown file and converts it to a document tree.
pub fn load(path: &Path) -> io::Result<DocumentTree> {
    let source = std::fs::read_to_string(path)?;
    log::debug!("rendering {} ({} bytes)", path.display(), source.len());
    Ok(to_tree(&source))
}

/// Converts Markdown source to a document tree. GFM tables and
/// strikethrough are enabled.
pub fn to_tree(source: &str) -> DocumentTree {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(source, options) {
        builder.push(event);
    }
    builder.finish()
}

/// Traversal-local accumulator: open containers live on an explicit stack,
/// not on the converter, so interleaved conversions cannot contaminate each
/// other.
#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Container>,
}

impl TreeBuilder {
    fn push(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(map_tag(&tag)),
            Event::End(_) => self.close(),
            Event::Text(text) => self.emit(Node::Text(text.to_string())),
            Event::Code(text) => self.emit(Node::Container(Container::with_children(
                Tag::InlineCode,
                vec![Node::Text(text.to_string())],
            ))),
            // Raw HTML is dropped, not rendered.
            Event::Html(_) | Event::InlineHtml(_) | Event::FootnoteReference(_) => {}
            Event::SoftBreak => self.emit(Node::Text("\n".to_string())),
            Event::HardBreak => self.emit(Node::Container(Container::new(Tag::HardBreak))),
            Event::Rule => self.emit(Node::Container(Container::new(Tag::Rule))),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.emit(Node::Text(marker.to_string()));
            }
        }
    }

    fn open(&mut self, tag: Tag) {
        self.stack.push(Container::new(tag));
    }

    fn close(&mut self) {
        if let Some(done) = self.stack.pop() {
            self.emit(Node::Container(done));
        }
    }

    fn emit(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(open) => open.children.push(node),
            None => self.root.push(node),
        }
    }

    fn finish(mut self) -> DocumentTree {
        // Unbalanced input cannot happen with pulldown-cmark, but close
        // anything left open rather than lose it.
        while !self.stack.is_empty() {
            self.close();
        }
        DocumentTree::new(self.root)
    }
}

fn map_tag(tag: &MdTag<'_>) -> Tag {
    match tag {
        MdTag::Heading { level, .. } => Tag::Heading(heading_level(*level)),
        MdTag::BlockQuote => Tag::BlockQuote,
        MdTag::CodeBlock(kind) => Tag::CodeBlock(match kind {
            CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
            CodeBlockKind::Fenced(_) | CodeBlockKind::Indented => None,
        }),
        MdTag::List(start) => Tag::List(*start),
        MdTag::Item => Tag::ListItem,
        MdTag::Table(aligns) => Tag::Table(aligns.iter().map(|a| alignment(*a)).collect()),
        MdTag::TableHead | MdTag::TableRow => Tag::TableRow,
        MdTag::TableCell => Tag::TableCell,
        MdTag::Emphasis => Tag::Emphasis,
        MdTag::Strong => Tag::Strong,
        MdTag::Strikethrough => Tag::Strikethrough,
        MdTag::Link { dest_url, .. } => Tag::Link(dest_url.to_string()),
        MdTag::Image { dest_url, .. } => Tag::Image(dest_url.to_string()),
        // HTML blocks keep their block position but lose their content;
        // footnote definitions and metadata blocks are parser options this
        // crate does not enable.
        MdTag::Paragraph
        | MdTag::HtmlBlock
        | MdTag::FootnoteDefinition(_)
        | MdTag::MetadataBlock(_) => Tag::Paragraph,
    }
}

const fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

const fn alignment(align: MdAlignment) -> Alignment {
    match align {
        MdAlignment::None => Alignment::None,
        MdAlignment::Left => Alignment::Left,
        MdAlignment::Center => Alignment::Center,
        MdAlignment::Right => Alignment::Right,
    }
}
