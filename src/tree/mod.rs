//! Document tree — the rendered representation of a Markdown file.
//!
//! Trees are immutable snapshots: search annotation produces a new tree
//! rather than editing one in place. Annotation only changes structure;
//! the concatenated text content is invariant.


/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Flavor of a match span.
///
/// `start` marks the first span of a distinct logical match; counting
/// start-flavored spans yields the match total in a single walk. `current`
/// marks the focused match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFlavor {
    pub current: bool,
    pub start: bool,
}

/// Semantic tag of a container node.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Paragraph,
    /// Heading with level 1..=6.
    Heading(u8),
    /// Fenced or indented code block, with the fence language if any.
    CodeBlock(Option<String>),
    InlineCode,
    Emphasis,
    Strong,
    Strikethrough,
    /// Link with its destination URL.
    Link(String),
    /// Image with its source URL.
    Image(String),
    /// List; `Some(n)` is an ordered list starting at `n`.
    List(Option<u64>),
    ListItem,
    BlockQuote,
    /// Table with per-column alignment.
    Table(Vec<Alignment>),
    TableRow,
    TableCell,
    Rule,
    HardBreak,
    /// Search match span wrapping exactly the matched substring.
    Match(MatchFlavor),
}

/// A node in the document tree: a literal text leaf or a tagged container.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Container(Container),
}

/// A tagged container holding an ordered sequence of children.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub tag: Tag,
    pub children: Vec<Node>,
}

impl Container {
    /// Creates an empty container with the given tag.
    pub const fn new(tag: Tag) -> Self {
        Self {
            tag,
            children: Vec::new(),
        }
    }

    /// Creates a container with the given tag and children.
    pub const fn with_children(tag: Tag, children: Vec<Node>) -> Self {
        Self { tag, children }
    }
}

/// An immutable snapshot of a rendered document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    pub children: Vec<Node>,
}

impl DocumentTree {
    /// Creates a tree from top-level nodes.
    pub const fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Whether the tree has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenation of all text leaves in document order.
    pub fn text_content(&self) -> String {
        text_of(&self.children)
    }

    /// Number of match-span nodes in the tree, start-flavored or not.
    pub fn match_span_count(&self) -> usize {
        count_spans(&self.children)
    }
}

/// Concatenation of the text leaves under `nodes`, in document order.
pub fn text_of(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Container(c) => collect_text(&c.children, out),
        }
    }
}

fn count_spans(nodes: &[Node]) -> usize {
    let mut total = 0;
    for node in nodes {
        if let Node::Container(c) = node {
            if matches!(c.tag, Tag::Match(_)) {
                total += 1;
            }
            total += count_spans(&c.children);
        }
    }
    total
}
