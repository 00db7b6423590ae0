//! Match index — a document-order enumeration of the logical matches in an
//! annotated tree, used to map the abstract current-match number to a
//! concrete span and to pick next/previous targets.

use crate::tree::{DocumentTree, Node, Tag};
use crate::viewport::ViewportQuery;

/// Ordinal index over the start-flavored match spans of an annotated tree.
///
/// A start span plus any continuation spans that follow it count as one
/// logical match, so the total is the number of starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchIndex {
    total: usize,
}

impl MatchIndex {
    /// Builds the index by walking `tree` in document order.
    pub fn of(tree: &DocumentTree) -> Self {
        Self {
            total: count_starts(&tree.children),
        }
    }

    /// Number of distinct logical matches.
    pub const fn len(&self) -> usize {
        self.total
    }

    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The match to focus after a "next" command.
    ///
    /// With no prior selection the first match at or below the viewport top
    /// wins, falling back to match 0; otherwise the successor, wrapping.
    pub fn next(&self, current: Option<usize>, vq: &dyn ViewportQuery) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        match current {
            Some(i) => Some((i + 1) % self.total),
            None => {
                let top = vq.viewport().top;
                let below = (0..self.total)
                    .find(|&i| vq.match_rect(i).is_some_and(|rect| rect.top >= top));
                Some(below.unwrap_or(0))
            }
        }
    }

    /// The match to focus after a "previous" command.
    ///
    /// With no prior selection the nearest match strictly above the viewport
    /// bottom wins, falling back to the last match; otherwise the
    /// predecessor, wrapping.
    pub fn previous(&self, current: Option<usize>, vq: &dyn ViewportQuery) -> Option<usize> {
        if self.total == 0 {
            return None;
        }
        match current {
            Some(0) => Some(self.total - 1),
            Some(i) => Some(i - 1),
            None => {
                let bottom = vq.viewport().bottom();
                let above = (0..self.total)
                    .rev()
                    .find(|&i| vq.match_rect(i).is_some_and(|rect| rect.bottom() < bottom));
                Some(above.unwrap_or(self.total - 1))
            }
        }
    }
}

fn count_starts(nodes: &[Node]) -> usize {
    let mut total = 0;
    for node in nodes {
        if let Node::Container(c) = node {
            if let Tag::Match(flavor) = &c.tag {
                if flavor.start {
                    total += 1;
                }
            }
            total += count_starts(&c.children);
        }
    }
    total
}
