//! Incremental search over the rendered document — session state, match
//! navigation, and the previewer facade that orchestrates re-annotation.

mod annotate;
mod index;
mod matcher;
#[cfg(test)]
mod tests;

pub use index::MatchIndex;
pub use matcher::{Matcher, MatcherKind};

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::debounce::Debounce;
use crate::tree::DocumentTree;
use crate::viewport::{self, ScrollRequest, ViewportQuery};

/// State of an active search session. Owned exclusively by [`Previewer`];
/// dropped when the search closes.
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub query: String,
    pub kind: MatcherKind,
    /// Ordinal of the focused match, `None` when nothing is focused.
    pub current: Option<usize>,
    /// Number of logical matches in the annotated tree.
    pub total: usize,
}

/// Snapshot published to the view layer after every transition. The tree is
/// shared, never mutated by readers.
#[derive(Debug, Clone)]
pub struct Update {
    pub tree: Rc<DocumentTree>,
    pub current: Option<usize>,
    pub total: usize,
}

type Subscriber = Box<dyn FnMut(&Update)>;

/// Orchestrates the search lifecycle over the cached pristine tree.
///
/// Owns the pristine snapshot of the current document, the annotated tree
/// handed to the view, the search session, and the keystroke debouncer.
/// Every annotate pass starts from the pristine tree, so consecutive query
/// changes never compound.
pub struct Previewer {
    pristine: Option<Rc<DocumentTree>>,
    annotated: Rc<DocumentTree>,
    session: Option<SearchSession>,
    /// Matcher kind to start the next session with.
    last_kind: MatcherKind,
    debounce: Debounce<String>,
    subscriber: Option<Subscriber>,
}

impl Previewer {
    /// Creates a previewer with no document loaded.
    pub fn new(debounce_delay: Duration, default_kind: MatcherKind) -> Self {
        Self {
            pristine: None,
            annotated: Rc::new(DocumentTree::default()),
            session: None,
            last_kind: default_kind,
            debounce: Debounce::new(debounce_delay),
            subscriber: None,
        }
    }

    /// Registers the callback receiving a snapshot after every transition.
    pub fn set_subscriber(&mut self, subscriber: impl FnMut(&Update) + 'static) {
        self.subscriber = Some(Box::new(subscriber));
    }

    /// The tree the view should render right now.
    pub const fn annotated(&self) -> &Rc<DocumentTree> {
        &self.annotated
    }

    /// The active session, if the search UI is open.
    pub const fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    pub const fn search_open(&self) -> bool {
        self.session.is_some()
    }

    /// When the pending debounced query becomes due. Event loops can sleep
    /// until this instant before calling [`Previewer::poll`].
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Installs a freshly rendered document as the new pristine tree.
    ///
    /// A document change wins any race with a pending keystroke: the timer
    /// is cancelled and the newest query is applied against the new tree
    /// right away. The focused match resets since spatial continuity is
    /// not guaranteed across documents.
    pub fn on_document_rendered(&mut self, tree: DocumentTree) {
        let pristine = Rc::new(tree);
        self.pristine = Some(Rc::clone(&pristine));
        if let Some(session) = self.session.as_mut() {
            if let Some(query) = self.debounce.cancel() {
                session.query = query;
            }
            session.current = None;
            self.reannotate();
        } else {
            self.annotated = pristine;
        }
        self.publish();
    }

    /// Opens the search UI. Idempotent: re-opening an open search is a
    /// no-op. The session starts with an empty query and the last used
    /// matcher kind.
    pub fn open_search(&mut self) {
        if self.session.is_some() {
            return;
        }
        self.session = Some(SearchSession {
            query: String::new(),
            kind: self.last_kind,
            current: None,
            total: 0,
        });
        self.reannotate();
        self.publish();
    }

    /// Closes the search UI and strips all markers. Restoring the stored
    /// pristine tree is cheaper than re-annotating with an empty query.
    pub fn close_search(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.last_kind = session.kind;
        self.debounce.cancel();
        self.annotated = self
            .pristine
            .as_ref()
            .map_or_else(|| Rc::new(DocumentTree::default()), Rc::clone);
        self.publish();
    }

    /// Records a search-box keystroke. The annotate pass runs once the
    /// quiet period elapses (see [`Previewer::poll`]); rapid keystrokes
    /// coalesce and only the newest query is ever applied.
    pub fn set_query(&mut self, text: &str, now: Instant) {
        if self.session.is_none() {
            return;
        }
        self.debounce.schedule(text.to_string(), now);
    }

    /// Switches the matcher kind and re-annotates immediately, picking up
    /// any keystrokes still sitting in the debounce window.
    pub fn set_matcher(&mut self, kind: MatcherKind) {
        let pending = self.debounce.cancel();
        let Some(session) = self.session.as_mut() else {
            self.last_kind = kind;
            return;
        };
        session.kind = kind;
        if let Some(query) = pending {
            session.query = query;
        }
        self.reannotate();
        self.publish();
    }

    /// Applies the pending query change if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) {
        let Some(query) = self.debounce.take_due(now) else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.query = query;
        self.reannotate();
        self.publish();
    }

    /// Focuses the next match and reports the scroll needed to reveal it.
    pub fn next(&mut self, vq: &dyn ViewportQuery) -> Option<ScrollRequest> {
        self.step(vq, true)
    }

    /// Focuses the previous match and reports the scroll needed to reveal
    /// it.
    pub fn previous(&mut self, vq: &dyn ViewportQuery) -> Option<ScrollRequest> {
        self.step(vq, false)
    }

    fn step(&mut self, vq: &dyn ViewportQuery, forward: bool) -> Option<ScrollRequest> {
        let current = self.session.as_ref()?.current;
        let index = MatchIndex::of(&self.annotated);
        let target = if forward {
            index.next(current, vq)
        } else {
            index.previous(current, vq)
        };
        if let Some(session) = self.session.as_mut() {
            session.current = target;
        }
        self.reannotate();
        self.publish();
        target.and_then(|ordinal| viewport::scroll_target(vq, ordinal))
    }

    /// Recomputes the annotated tree from the pristine cache. A focused
    /// match survives only while its ordinal stays in range for the new
    /// total.
    fn reannotate(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(pristine) = self.pristine.as_ref() else {
            // Search opened before any document finished loading.
            session.total = 0;
            session.current = None;
            self.annotated = Rc::new(DocumentTree::default());
            return;
        };
        let matcher = Matcher::new(&session.query, session.kind);
        let (tree, total) = annotate::annotate(pristine, &matcher, session.current);
        session.total = total;
        if session.current.is_some_and(|i| i >= total) {
            session.current = None;
        }
        self.annotated = Rc::new(tree);
    }

    fn publish(&mut self) {
        let Some(subscriber) = self.subscriber.as_mut() else {
            return;
        };
        let (current, total) = self
            .session
            .as_ref()
            .map_or((None, 0), |s| (s.current, s.total));
        let update = Update {
            tree: Rc::clone(&self.annotated),
            current,
            total,
        };
        subscriber(&update);
    }
}
