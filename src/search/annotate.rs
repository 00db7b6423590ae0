//! Tree annotator — rewrites text leaves into a mix of plain text and
//! match spans, leaving all other structure untouched.

use crate::tree::{Container, DocumentTree, MatchFlavor, Node, Tag};

use super::matcher::Matcher;

/// Walks `pristine` depth-first and wraps every match in a span node.
/// Returns the annotated tree and the number of logical matches.
///
/// Must be called on a marker-free tree; annotating an already-annotated
/// tree would drift, so callers always start from the pristine cache.
/// Matches never cross a leaf boundary: a query split across two adjacent
/// text leaves (e.g. by inline formatting) is not found.
pub(super) fn annotate(
    pristine: &DocumentTree,
    matcher: &Matcher,
    current: Option<usize>,
) -> (DocumentTree, usize) {
    let mut ordinal = 0;
    let children = annotate_nodes(&pristine.children, matcher, current, &mut ordinal);
    (DocumentTree::new(children), ordinal)
}

fn annotate_nodes(
    nodes: &[Node],
    matcher: &Matcher,
    current: Option<usize>,
    ordinal: &mut usize,
) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => annotate_leaf(text, matcher, current, ordinal, &mut out),
            Node::Container(c) => {
                debug_assert!(
                    !matches!(c.tag, Tag::Match(_)),
                    "annotate called on an already-annotated tree"
                );
                out.push(Node::Container(Container::with_children(
                    c.tag.clone(),
                    annotate_nodes(&c.children, matcher, current, ordinal),
                )));
            }
        }
    }
    out
}

/// Splits one text leaf around its matches. A leaf with no matches is
/// cloned unchanged. Each match becomes a span opening a new logical match
/// (start flavor); the span whose ordinal equals `current` is tagged as the
/// focused one. An out-of-range `current` simply tags nothing.
#[expect(
    clippy::string_slice,
    reason = "matcher ranges are byte positions on char boundaries"
)]
fn annotate_leaf(
    text: &str,
    matcher: &Matcher,
    current: Option<usize>,
    ordinal: &mut usize,
    out: &mut Vec<Node>,
) {
    let ranges = matcher.find_all(text);
    if ranges.is_empty() {
        out.push(Node::Text(text.to_string()));
        return;
    }
    let mut cursor = 0;
    for range in ranges {
        if range.start > cursor {
            out.push(Node::Text(text[cursor..range.start].to_string()));
        }
        let flavor = MatchFlavor {
            current: current == Some(*ordinal),
            start: true,
        };
        out.push(Node::Container(Container::with_children(
            Tag::Match(flavor),
            vec![Node::Text(text[range.start..range.end].to_string())],
        )));
        *ordinal += 1;
        cursor = range.end;
    }
    if cursor < text.len() {
        out.push(Node::Text(text[cursor..].to_string()));
    }
}
