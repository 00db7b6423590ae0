//! Viewport geometry — an injected capability so match selection and the
//! scroll policy stay headless and unit-testable.

/// Axis-aligned rectangle in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a rect from its top-left corner and size.
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether `other` lies fully inside this rect.
    pub fn contains(&self, other: &Self) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Geometry source for the rendered document. The front end supplies the
/// real layout; tests supply deterministic boxes.
pub trait ViewportQuery {
    /// Currently visible region.
    fn viewport(&self) -> Rect;

    /// Bounding rect of the logical match with the given ordinal, or `None`
    /// if it is not (or no longer) rendered.
    fn match_rect(&self, ordinal: usize) -> Option<Rect>;
}

/// A request to smoothly scroll the viewport so `center_y` sits at its
/// vertical center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub center_y: f64,
}

/// Decides whether the match with `ordinal` needs a scroll: fully visible
/// means no-op, otherwise a center-aligned scroll request. Geometry is
/// re-queried at call time since layout can shift between renders; a
/// missing rect (racing relayout) silently drops the request.
pub fn scroll_target(vq: &dyn ViewportQuery, ordinal: usize) -> Option<ScrollRequest> {
    let target = vq.match_rect(ordinal)?;
    if vq.viewport().contains(&target) {
        return None;
    }
    Some(ScrollRequest {
        center_y: target.top + target.height / 2.0,
    })
}
