//! Terminal rendering — draws the annotated tree as ANSI-styled text.
//!
//! This is the thin front end standing in for the original's HTML view:
//! match spans get a background highlight, the focused match a distinct
//! one, and the renderer reports which output line every logical match
//! landed on so the viewport can find it.

use unicode_width::UnicodeWidthStr;

use crate::config::ColorConfig;
use crate::tree::{self, DocumentTree, Node, Tag};
use crate::viewport::{Rect, ViewportQuery};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const ITALIC: &str = "\x1b[3m";
const UNDERLINE: &str = "\x1b[4m";
const STRIKE: &str = "\x1b[9m";
const CYAN_FG: &str = "\x1b[36m";

/// Rendered text plus the output line of each logical match, in match
/// order, and the line of the focused match if any.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub text: String,
    pub match_lines: Vec<usize>,
    pub current_line: Option<usize>,
}

/// Renders `tree` to ANSI-styled text.
pub fn render(tree: &DocumentTree, colors: &ColorConfig) -> Rendered {
    let mut ctx = Ctx {
        out: String::new(),
        line: 0,
        prefixes: Vec::new(),
        styles: Vec::new(),
        match_lines: Vec::new(),
        current_line: None,
        match_bg: bg_code(&colors.match_bg),
        current_bg: bg_code(&colors.current_bg),
    };
    for node in &tree.children {
        walk(&mut ctx, node);
    }
    ctx.out.push('\n');
    Rendered {
        text: ctx.out,
        match_lines: ctx.match_lines,
        current_line: ctx.current_line,
    }
}

/// Named ANSI color to a background escape code; unknown names fall back
/// to yellow.
fn bg_code(name: &str) -> String {
    let idx = match name {
        "black" => 0,
        "red" => 1,
        "green" => 2,
        "blue" => 4,
        "magenta" => 5,
        "cyan" => 6,
        "white" => 7,
        _ => 3, // yellow
    };
    format!("\x1b[{}m", 40 + idx)
}

struct Ctx {
    out: String,
    line: usize,
    /// Printed at the start of every new line (blockquote bars, indents).
    prefixes: Vec<&'static str>,
    /// Active ANSI styles, reapplied after a reset.
    styles: Vec<String>,
    match_lines: Vec<usize>,
    current_line: Option<usize>,
    match_bg: String,
    current_bg: String,
}

impl Ctx {
    fn newline(&mut self) {
        self.out.push('\n');
        self.line += 1;
        for prefix in &self.prefixes {
            self.out.push_str(prefix);
        }
    }

    fn blank_line(&mut self) {
        self.newline();
        self.newline();
    }

    fn push_text(&mut self, text: &str) {
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.newline();
            }
            self.out.push_str(segment);
        }
    }

    fn push_style(&mut self, code: &str) {
        self.styles.push(code.to_string());
        self.out.push_str(code);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
        self.out.push_str(RESET);
        for code in &self.styles {
            self.out.push_str(code);
        }
    }
}

#[expect(
    clippy::too_many_lines,
    reason = "one arm per tag keeps the dispatch in one place"
)]
fn walk(ctx: &mut Ctx, node: &Node) {
    let container = match node {
        Node::Text(text) => {
            ctx.push_text(text);
            return;
        }
        Node::Container(c) => c,
    };
    match &container.tag {
        Tag::Paragraph => {
            walk_children(ctx, container);
            ctx.blank_line();
        }
        Tag::Heading(level) => {
            let level = usize::from(*level);
            ctx.push_style(BOLD);
            ctx.push_text(&"#".repeat(level));
            ctx.push_text(" ");
            walk_children(ctx, container);
            ctx.pop_style();
            if level <= 2 {
                let title = tree::text_of(&container.children);
                ctx.newline();
                ctx.push_text(&"─".repeat(UnicodeWidthStr::width(title.as_str()) + level + 1));
            }
            ctx.blank_line();
        }
        Tag::CodeBlock(_) => {
            ctx.prefixes.push("    ");
            ctx.out.push_str("    ");
            ctx.push_style(DIM);
            walk_children(ctx, container);
            ctx.pop_style();
            ctx.prefixes.pop();
            ctx.blank_line();
        }
        Tag::InlineCode => {
            ctx.push_style(CYAN_FG);
            walk_children(ctx, container);
            ctx.pop_style();
        }
        Tag::Emphasis => {
            ctx.push_style(ITALIC);
            walk_children(ctx, container);
            ctx.pop_style();
        }
        Tag::Strong => {
            ctx.push_style(BOLD);
            walk_children(ctx, container);
            ctx.pop_style();
        }
        Tag::Strikethrough => {
            ctx.push_style(STRIKE);
            walk_children(ctx, container);
            ctx.pop_style();
        }
        Tag::Link(href) => {
            ctx.push_style(UNDERLINE);
            walk_children(ctx, container);
            ctx.pop_style();
            if !href.is_empty() {
                ctx.push_style(DIM);
                ctx.push_text(&format!(" ({href})"));
                ctx.pop_style();
            }
        }
        Tag::Image(src) => {
            ctx.push_style(DIM);
            ctx.push_text(&format!("[image: {src}]"));
            ctx.pop_style();
        }
        Tag::List(start) => {
            let mut counter = *start;
            for item in &container.children {
                let marker = match counter {
                    Some(n) => {
                        counter = Some(n + 1);
                        format!("{n}. ")
                    }
                    None => "• ".to_string(),
                };
                ctx.push_text(&marker);
                ctx.prefixes.push("  ");
                walk(ctx, item);
                ctx.prefixes.pop();
                ctx.newline();
            }
            ctx.newline();
        }
        Tag::ListItem => {
            walk_children(ctx, container);
        }
        Tag::BlockQuote => {
            ctx.prefixes.push("│ ");
            ctx.out.push_str("│ ");
            walk_children(ctx, container);
            ctx.prefixes.pop();
        }
        Tag::Table(_) => {
            walk_children(ctx, container);
            ctx.newline();
        }
        Tag::TableRow => {
            ctx.push_text("|");
            for cell in &container.children {
                ctx.push_text(" ");
                walk(ctx, cell);
                ctx.push_text(" |");
            }
            ctx.newline();
        }
        Tag::TableCell => {
            walk_children(ctx, container);
        }
        Tag::Rule => {
            ctx.push_text(&"─".repeat(40));
            ctx.blank_line();
        }
        Tag::HardBreak => {
            ctx.newline();
        }
        Tag::Match(flavor) => {
            if flavor.start {
                ctx.match_lines.push(ctx.line);
            }
            if flavor.current {
                ctx.current_line = Some(ctx.line);
            }
            let bg = if flavor.current {
                ctx.current_bg.clone()
            } else {
                ctx.match_bg.clone()
            };
            ctx.push_style(&bg);
            walk_children(ctx, container);
            ctx.pop_style();
        }
    }
}

fn walk_children(ctx: &mut Ctx, container: &crate::tree::Container) {
    for child in &container.children {
        walk(ctx, child);
    }
}

/// Line-based viewport over rendered terminal text: match ordinal `i`
/// occupies one line at `match_lines[i]`.
#[derive(Debug, Clone)]
pub struct TermViewport {
    top: usize,
    height: usize,
    match_lines: Vec<usize>,
}

impl TermViewport {
    pub const fn new(top: usize, height: usize, match_lines: Vec<usize>) -> Self {
        Self {
            top,
            height,
            match_lines,
        }
    }
}

impl ViewportQuery for TermViewport {
    fn viewport(&self) -> Rect {
        Rect::new(0.0, to_f64(self.top), 1e9, to_f64(self.height))
    }

    fn match_rect(&self, ordinal: usize) -> Option<Rect> {
        let line = self.match_lines.get(ordinal)?;
        Some(Rect::new(0.0, to_f64(*line), 1e9, 1.0))
    }
}

fn to_f64(value: usize) -> f64 {
    u32::try_from(value).map_or(f64::MAX, f64::from)
}
