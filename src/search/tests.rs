//! Tests for matching, annotation, indexing, and the previewer lifecycle.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::tree::{Container, DocumentTree, MatchFlavor, Node, Tag};
use crate::viewport::{Rect, ViewportQuery};

use super::annotate::annotate;
use super::*;

const DELAY: Duration = Duration::from_millis(100);

fn paragraph(text: &str) -> DocumentTree {
    DocumentTree::new(vec![Node::Container(Container::with_children(
        Tag::Paragraph,
        vec![Node::Text(text.to_string())],
    ))])
}

/// Collects `(text, flavor)` for every match span in document order.
fn spans(tree: &DocumentTree) -> Vec<(String, MatchFlavor)> {
    fn walk(nodes: &[Node], out: &mut Vec<(String, MatchFlavor)>) {
        for node in nodes {
            if let Node::Container(c) = node {
                if let Tag::Match(flavor) = c.tag {
                    let mut text = String::new();
                    for child in &c.children {
                        if let Node::Text(t) = child {
                            text.push_str(t);
                        }
                    }
                    out.push((text, flavor));
                }
                walk(&c.children, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(&tree.children, &mut out);
    out
}

/// Everything visible; match ordinal `i` sits on line `i`.
struct OpenViewport {
    total: usize,
}

impl ViewportQuery for OpenViewport {
    fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, 100.0, 1_000_000.0)
    }

    fn match_rect(&self, ordinal: usize) -> Option<Rect> {
        let line = u32::try_from(ordinal).ok()?;
        (ordinal < self.total).then(|| Rect::new(0.0, f64::from(line), 10.0, 1.0))
    }
}

/// Scrolled viewport with explicit match rects.
struct ScrolledViewport {
    view: Rect,
    rects: Vec<Rect>,
}

impl ViewportQuery for ScrolledViewport {
    fn viewport(&self) -> Rect {
        self.view
    }

    fn match_rect(&self, ordinal: usize) -> Option<Rect> {
        self.rects.get(ordinal).copied()
    }
}

// --- Matcher ---

#[test]
fn case_sensitive_finds_all_occurrences() {
    let m = Matcher::new("at", MatcherKind::CaseSensitive);
    let ranges = m.find_all("the cat sat on the mat");
    assert_eq!(ranges, vec![5..7, 9..11, 20..22]);
}

#[test]
fn case_insensitive_ranges_refer_to_the_original_string() {
    let m = Matcher::new("HELLO", MatcherKind::CaseInsensitive);
    let ranges = m.find_all("say Hello twice: hello");
    assert_eq!(ranges, vec![4..9, 17..22]);
}

#[test]
fn smart_case_with_uppercase_is_sensitive() {
    let m = Matcher::new("THE", MatcherKind::SmartCase);
    assert!(m.find_all("the cat sat on the mat").is_empty());
}

#[test]
fn smart_case_all_lowercase_is_insensitive() {
    let m = Matcher::new("the", MatcherKind::SmartCase);
    assert_eq!(m.find_all("The cat sat on the mat").len(), 2);
}

#[test]
fn regex_matches_leftmost_first() {
    let m = Matcher::new(r"\d+", MatcherKind::CaseSensitiveRegex);
    assert_eq!(m.find_all("abc 123 def 456"), vec![4..7, 12..15]);
}

#[test]
fn invalid_regex_yields_nothing() {
    let m = Matcher::new("[invalid(", MatcherKind::CaseSensitiveRegex);
    assert!(m.is_never());
    assert!(m.find_all("anything [invalid( here").is_empty());
}

#[test]
fn zero_length_regex_matches_terminate() {
    let m = Matcher::new("x*", MatcherKind::CaseSensitiveRegex);
    // Only the real occurrences survive; empty matches are dropped.
    assert_eq!(m.find_all("axbxx"), vec![1..2, 3..5]);
    assert!(m.find_all("bbb").is_empty());
}

#[test]
fn empty_query_never_matches() {
    let m = Matcher::new("", MatcherKind::CaseSensitive);
    assert!(m.is_never());
    assert!(m.find_all("anything").is_empty());
}

#[test]
fn matches_do_not_overlap() {
    let m = Matcher::new("aa", MatcherKind::CaseSensitive);
    assert_eq!(m.find_all("aaaa"), vec![0..2, 2..4]);
}

#[test]
fn case_fold_handles_multibyte_text() {
    let m = Matcher::new("grüße", MatcherKind::CaseInsensitive);
    let hay = "sage GRÜSSE nie, sage Grüße";
    let ranges = m.find_all(hay);
    assert_eq!(ranges.len(), 1);
    assert_eq!(&hay[ranges[0].clone()], "Grüße");
}

// --- Annotator ---

#[test]
fn empty_query_is_the_identity_transform() {
    let pristine = paragraph("the cat sat on the mat");
    let (tree, total) = annotate(&pristine, &Matcher::new("", MatcherKind::SmartCase), None);
    assert_eq!(total, 0);
    assert_eq!(tree, pristine);
}

#[test]
fn annotation_preserves_text_content() {
    let pristine = paragraph("the cat sat on the mat");
    let matcher = Matcher::new("at", MatcherKind::CaseSensitive);
    let (tree, total) = annotate(&pristine, &matcher, Some(1));
    assert_eq!(total, 3);
    assert_eq!(tree.text_content(), pristine.text_content());
}

#[test]
fn spans_wrap_exactly_the_matched_substrings() {
    let pristine = paragraph("the cat sat on the mat");
    let matcher = Matcher::new("at", MatcherKind::CaseSensitive);
    let (tree, _) = annotate(&pristine, &matcher, Some(1));
    let spans = spans(&tree);
    assert_eq!(spans.len(), 3);
    assert!(spans.iter().all(|(text, flavor)| text == "at" && flavor.start));
    assert_eq!(
        spans.iter().map(|(_, f)| f.current).collect::<Vec<_>>(),
        vec![false, true, false]
    );
}

#[test]
fn out_of_range_current_tags_no_span() {
    let pristine = paragraph("the cat sat on the mat");
    let matcher = Matcher::new("at", MatcherKind::CaseSensitive);
    let (tree, total) = annotate(&pristine, &matcher, Some(99));
    assert_eq!(total, 3);
    assert!(spans(&tree).iter().all(|(_, flavor)| !flavor.current));
}

#[test]
fn match_at_the_very_first_character() {
    let pristine = paragraph("the cat");
    let (tree, total) = annotate(
        &pristine,
        &Matcher::new("the", MatcherKind::CaseSensitive),
        None,
    );
    assert_eq!(total, 1);
    // No empty text node before the leading span.
    let Node::Container(p) = &tree.children[0] else {
        panic!("expected paragraph");
    };
    assert!(matches!(&p.children[0], Node::Container(c) if matches!(c.tag, Tag::Match(_))));
}

#[test]
fn query_longer_than_any_leaf_finds_nothing() {
    let pristine = DocumentTree::new(vec![Node::Container(Container::with_children(
        Tag::Paragraph,
        vec![Node::Text("ab".into()), Node::Text("cd".into())],
    ))]);
    let matcher = Matcher::new("abcd", MatcherKind::CaseSensitive);
    let (_, total) = annotate(&pristine, &matcher, None);
    assert_eq!(total, 0);
}

#[test]
fn matches_never_cross_a_leaf_boundary() {
    // "bold" splits the text into two leaves; "dtext" spans the boundary.
    let pristine = DocumentTree::new(vec![Node::Container(Container::with_children(
        Tag::Paragraph,
        vec![
            Node::Container(Container::with_children(
                Tag::Strong,
                vec![Node::Text("bold".into())],
            )),
            Node::Text("text".into()),
        ],
    ))]);
    let matcher = Matcher::new("dtext", MatcherKind::CaseSensitive);
    let (_, total) = annotate(&pristine, &matcher, None);
    assert_eq!(total, 0);
}

#[test]
fn structure_outside_text_leaves_is_untouched() {
    let pristine = DocumentTree::new(vec![Node::Container(Container::with_children(
        Tag::Heading(2),
        vec![
            Node::Text("find me".into()),
            Node::Container(Container::with_children(
                Tag::Link("https://example.com".into()),
                vec![Node::Text("find me too".into())],
            )),
        ],
    ))]);
    let matcher = Matcher::new("find", MatcherKind::CaseSensitive);
    let (tree, total) = annotate(&pristine, &matcher, None);
    assert_eq!(total, 2);
    let Node::Container(heading) = &tree.children[0] else {
        panic!("expected heading");
    };
    assert_eq!(heading.tag, Tag::Heading(2));
    let link = heading
        .children
        .iter()
        .find_map(|n| match n {
            Node::Container(c) if matches!(c.tag, Tag::Link(_)) => Some(c),
            _ => None,
        })
        .unwrap();
    assert_eq!(link.tag, Tag::Link("https://example.com".into()));
}

#[test]
fn consecutive_annotations_from_pristine_never_compound() {
    let pristine = paragraph("the cat sat on the mat");
    let m1 = Matcher::new("cat", MatcherKind::CaseSensitive);
    let m2 = Matcher::new("at", MatcherKind::CaseSensitive);
    let (_, _) = annotate(&pristine, &m1, None);
    let (from_pristine, total) = annotate(&pristine, &m2, None);
    assert_eq!(total, 3);
    assert_eq!(from_pristine.text_content(), pristine.text_content());
    assert_eq!(from_pristine, annotate(&pristine, &m2, None).0);
}

// --- Match index ---

#[test]
fn empty_tree_has_no_navigation() {
    let index = MatchIndex::of(&DocumentTree::default());
    let vq = OpenViewport { total: 0 };
    assert!(index.is_empty());
    assert_eq!(index.next(None, &vq), None);
    assert_eq!(index.previous(None, &vq), None);
}

#[test]
fn next_and_previous_wrap_and_invert() {
    let pristine = paragraph("the cat sat on the mat");
    let matcher = Matcher::new("at", MatcherKind::CaseSensitive);
    let (tree, _) = annotate(&pristine, &matcher, None);
    let index = MatchIndex::of(&tree);
    let vq = OpenViewport { total: index.len() };

    assert_eq!(index.len(), 3);
    assert_eq!(index.next(Some(0), &vq), Some(1));
    assert_eq!(index.next(Some(2), &vq), Some(0));
    assert_eq!(index.previous(Some(0), &vq), Some(2));
    for i in 0..index.len() {
        assert_eq!(index.previous(index.next(Some(i), &vq), &vq), Some(i));
    }
}

#[test]
fn first_selection_prefers_the_viewport() {
    let index = MatchIndex::of(&annotate(
        &paragraph("at at at"),
        &Matcher::new("at", MatcherKind::CaseSensitive),
        None,
    ).0);
    // Matches on lines 10, 50, 90; viewport shows lines 40..80.
    let vq = ScrolledViewport {
        view: Rect::new(0.0, 40.0, 100.0, 40.0),
        rects: vec![
            Rect::new(0.0, 10.0, 10.0, 1.0),
            Rect::new(0.0, 50.0, 10.0, 1.0),
            Rect::new(0.0, 90.0, 10.0, 1.0),
        ],
    };
    // Next: first match at or below the top of the viewport.
    assert_eq!(index.next(None, &vq), Some(1));
    // Previous: nearest match strictly above the bottom of the viewport.
    assert_eq!(index.previous(None, &vq), Some(1));
}

#[test]
fn first_selection_falls_back_to_the_edges() {
    let index = MatchIndex::of(&annotate(
        &paragraph("at at"),
        &Matcher::new("at", MatcherKind::CaseSensitive),
        None,
    ).0);
    // All matches above the viewport.
    let below_all = ScrolledViewport {
        view: Rect::new(0.0, 100.0, 100.0, 40.0),
        rects: vec![Rect::new(0.0, 10.0, 10.0, 1.0), Rect::new(0.0, 20.0, 10.0, 1.0)],
    };
    assert_eq!(index.next(None, &below_all), Some(0));
    assert_eq!(index.previous(None, &below_all), Some(1));
    // All matches below the viewport.
    let above_all = ScrolledViewport {
        view: Rect::new(0.0, 0.0, 100.0, 5.0),
        rects: vec![Rect::new(0.0, 10.0, 10.0, 1.0), Rect::new(0.0, 20.0, 10.0, 1.0)],
    };
    assert_eq!(index.next(None, &above_all), Some(0));
    assert_eq!(index.previous(None, &above_all), Some(1));
}

// --- Previewer ---

fn previewer_with(text: &str) -> Previewer {
    let mut previewer = Previewer::new(DELAY, MatcherKind::SmartCase);
    previewer.on_document_rendered(paragraph(text));
    previewer
}

fn apply_query(previewer: &mut Previewer, query: &str) {
    let now = Instant::now();
    previewer.set_query(query, now);
    previewer.poll(now + DELAY);
}

#[test]
fn scenario_case_sensitive_navigation() {
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    previewer.set_matcher(MatcherKind::CaseSensitive);
    apply_query(&mut previewer, "at");

    let session = previewer.session().unwrap();
    assert_eq!(session.total, 3);
    assert_eq!(session.current, None);

    let vq = OpenViewport { total: 3 };
    previewer.next(&vq);
    assert_eq!(previewer.session().unwrap().current, Some(0));
    previewer.next(&vq);
    assert_eq!(previewer.session().unwrap().current, Some(1));

    // Previous from match 0 wraps to the last match.
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    previewer.set_matcher(MatcherKind::CaseSensitive);
    apply_query(&mut previewer, "at");
    previewer.next(&vq);
    previewer.previous(&vq);
    assert_eq!(previewer.session().unwrap().current, Some(2));
}

#[test]
fn scenario_smart_case_uppercase_query() {
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    apply_query(&mut previewer, "THE");
    assert_eq!(previewer.session().unwrap().total, 0);
}

#[test]
fn scenario_smart_case_lowercase_query() {
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    apply_query(&mut previewer, "the");
    assert_eq!(previewer.session().unwrap().total, 2);
}

#[test]
fn scenario_invalid_regex_shows_zero_of_zero() {
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    previewer.set_matcher(MatcherKind::CaseSensitiveRegex);
    apply_query(&mut previewer, "[invalid(");
    let session = previewer.session().unwrap();
    assert_eq!(session.total, 0);
    assert_eq!(session.current, None);
    assert!(previewer.search_open());
}

#[test]
fn scenario_document_replaced_mid_search() {
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    apply_query(&mut previewer, "cat");
    let vq = OpenViewport { total: 1 };
    previewer.next(&vq);
    assert_eq!(previewer.session().unwrap().current, Some(0));

    previewer.on_document_rendered(paragraph("dog dog cat"));
    let session = previewer.session().unwrap();
    assert_eq!(session.current, None);
    assert_eq!(session.total, 1);

    previewer.next(&vq);
    assert_eq!(previewer.session().unwrap().current, Some(0));
    let (text, flavor) = &spans(previewer.annotated())[0];
    assert_eq!(text, "cat");
    assert!(flavor.current);
}

#[test]
fn scenario_close_strips_all_markers() {
    let pristine = paragraph("the cat sat on the mat");
    let mut previewer = Previewer::new(DELAY, MatcherKind::SmartCase);
    previewer.on_document_rendered(pristine.clone());
    previewer.open_search();
    apply_query(&mut previewer, "at");
    assert_eq!(previewer.annotated().match_span_count(), 3);

    previewer.close_search();
    assert!(!previewer.search_open());
    assert_eq!(previewer.annotated().match_span_count(), 0);
    assert_eq!(**previewer.annotated(), pristine);
}

#[test]
fn reopening_reproduces_the_same_totals() {
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    previewer.set_matcher(MatcherKind::CaseSensitive);
    apply_query(&mut previewer, "at");
    let before = previewer.session().unwrap().total;

    previewer.close_search();
    previewer.open_search();
    apply_query(&mut previewer, "at");
    assert_eq!(previewer.session().unwrap().total, before);
    // The matcher kind survives the close/reopen boundary.
    assert_eq!(previewer.session().unwrap().kind, MatcherKind::CaseSensitive);
}

#[test]
fn open_search_is_idempotent() {
    let mut previewer = previewer_with("text");
    previewer.open_search();
    apply_query(&mut previewer, "text");
    previewer.open_search();
    // The session kept its query; re-opening did not reset it.
    assert_eq!(previewer.session().unwrap().query, "text");
}

#[test]
fn keystrokes_coalesce_into_one_annotate_pass() {
    let updates = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&updates);
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    previewer.set_subscriber(move |update: &Update| {
        log.borrow_mut().push((update.current, update.total));
    });

    let start = Instant::now();
    previewer.set_query("a", start);
    previewer.set_query("at", start + Duration::from_millis(10));
    previewer.set_query("at ", start + Duration::from_millis(20));
    previewer.poll(start + Duration::from_millis(50));
    assert!(updates.borrow().is_empty());

    previewer.poll(start + Duration::from_millis(200));
    assert_eq!(updates.borrow().len(), 1);
    assert_eq!(previewer.session().unwrap().query, "at ");
}

#[test]
fn document_change_beats_a_pending_keystroke() {
    let mut previewer = previewer_with("old text");
    previewer.open_search();
    previewer.set_query("new", Instant::now());
    assert!(previewer.next_deadline().is_some());

    // The change arrives before the debounce fires; the newest query must
    // be applied against the new tree immediately.
    previewer.on_document_rendered(paragraph("new text, new hope"));
    assert!(previewer.next_deadline().is_none());
    let session = previewer.session().unwrap();
    assert_eq!(session.query, "new");
    assert_eq!(session.total, 2);
}

#[test]
fn matcher_change_picks_up_the_pending_query() {
    let mut previewer = previewer_with("Cat cat CAT");
    previewer.open_search();
    previewer.set_query("cat", Instant::now());
    previewer.set_matcher(MatcherKind::CaseSensitive);
    let session = previewer.session().unwrap();
    assert_eq!(session.query, "cat");
    assert_eq!(session.total, 1);

    previewer.set_matcher(MatcherKind::CaseInsensitive);
    assert_eq!(previewer.session().unwrap().total, 3);
}

#[test]
fn current_match_survives_a_query_change_when_still_in_range() {
    let mut previewer = previewer_with("the cat sat on the mat");
    previewer.open_search();
    apply_query(&mut previewer, "at");
    let vq = OpenViewport { total: 3 };
    previewer.next(&vq);
    previewer.next(&vq);
    assert_eq!(previewer.session().unwrap().current, Some(1));

    // Still three matches: the focused ordinal is preserved.
    apply_query(&mut previewer, "a");
    assert_eq!(previewer.session().unwrap().current, Some(1));

    // One match: ordinal 1 is out of range and resets.
    apply_query(&mut previewer, "cat");
    assert_eq!(previewer.session().unwrap().current, None);
}

#[test]
fn search_before_any_document_is_a_no_op() {
    let mut previewer = Previewer::new(DELAY, MatcherKind::SmartCase);
    previewer.open_search();
    apply_query(&mut previewer, "anything");
    let session = previewer.session().unwrap();
    assert!(previewer.search_open());
    assert_eq!(session.total, 0);
    assert_eq!(session.current, None);
    let vq = OpenViewport { total: 0 };
    assert_eq!(previewer.next(&vq), None);
    assert_eq!(previewer.previous(&vq), None);
}

#[test]
fn navigation_reports_a_scroll_for_offscreen_matches() {
    let mut previewer = previewer_with("at at");
    previewer.open_search();
    apply_query(&mut previewer, "at");
    // Both matches below a short viewport.
    let vq = ScrolledViewport {
        view: Rect::new(0.0, 0.0, 100.0, 5.0),
        rects: vec![Rect::new(0.0, 10.0, 10.0, 2.0), Rect::new(0.0, 20.0, 10.0, 2.0)],
    };
    let request = previewer.next(&vq).unwrap();
    assert!((request.center_y - 11.0).abs() < f64::EPSILON);

    // A match already inside the viewport needs no scroll.
    let visible = ScrolledViewport {
        view: Rect::new(0.0, 0.0, 100.0, 50.0),
        rects: vec![Rect::new(0.0, 10.0, 10.0, 2.0), Rect::new(0.0, 20.0, 10.0, 2.0)],
    };
    assert_eq!(previewer.next(&visible), None);
}

#[test]
fn every_transition_publishes_a_snapshot() {
    let updates = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&updates);
    let mut previewer = Previewer::new(DELAY, MatcherKind::SmartCase);
    previewer.set_subscriber(move |update: &Update| {
        log.borrow_mut().push((update.current, update.total, update.tree.match_span_count()));
    });

    previewer.on_document_rendered(paragraph("the cat sat on the mat"));
    previewer.open_search();
    apply_query(&mut previewer, "at");
    let vq = OpenViewport { total: 3 };
    previewer.next(&vq);
    previewer.close_search();

    let seen = updates.borrow();
    assert_eq!(
        *seen,
        vec![
            (None, 0, 0),       // document rendered
            (None, 0, 0),       // search opened, empty query
            (None, 3, 3),       // query applied
            (Some(0), 3, 3),    // next
            (None, 0, 0),       // closed, markers stripped
        ]
    );
}
