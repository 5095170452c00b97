//! lazyview Geometry
//!
//! Visibility scoring for lazily activated elements.
//!
//! All coordinates are viewport-relative (the element rect is what a
//! `getBoundingClientRect`-style query returns), so the viewport itself is
//! just a size with its origin at (0, 0).

/// Element bounding box, relative to the viewport origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rect.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// A rect that has not been laid out yet reports all zeros.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 0.0 && self.height == 0.0
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    /// Create a new viewport size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Proximity threshold that expands the effective viewport before scoring.
///
/// A pixel threshold expands both axes by the same amount; a percentage is
/// resolved against each viewport dimension independently.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Threshold {
    #[default]
    None,
    Px(f32),
    Percent(f32),
}

impl Threshold {
    /// Parse a threshold attribute value (`"300px"` or `"25%"`).
    ///
    /// Anything unparseable is treated as no threshold.
    pub fn parse(value: &str) -> Threshold {
        let value = value.trim();
        if let Some(px) = value.strip_suffix("px") {
            if let Ok(n) = px.parse::<u32>() {
                return Threshold::Px(n as f32);
            }
        } else if let Some(pct) = value.strip_suffix('%') {
            if let Ok(n) = pct.parse::<u32>() {
                return Threshold::Percent(n as f32);
            }
        }
        Threshold::None
    }

    /// Resolve to (horizontal, vertical) padding in pixels.
    pub fn resolve(&self, viewport: ViewportSize) -> (f32, f32) {
        match *self {
            Threshold::None => (0.0, 0.0),
            Threshold::Px(px) => (px, px),
            Threshold::Percent(pct) => {
                let ratio = pct / 100.0;
                ((viewport.width * ratio).floor(), (viewport.height * ratio).floor())
            }
        }
    }
}

/// Visible extent of a 1-D span `[start, start + size)` inside `[0, window)`.
fn visible_extent(start: f32, size: f32, window: f32) -> f32 {
    if start < window && start + size > 0.0 {
        window.min(start + size) - start.max(0.0)
    } else {
        0.0
    }
}

/// Score how much of the element's (threshold-padded) box overlaps the
/// viewport, in percent.
///
/// Returns a value in `[0, 100]`. A not-yet-laid-out (all-zero) rect scores
/// 0; zero width or height is clamped to 1 so thin elements still score.
pub fn visibility_score(rect: Rect, viewport: ViewportSize, threshold: Threshold) -> f32 {
    if rect.is_degenerate() {
        return 0.0;
    }
    let width = if rect.width == 0.0 { 1.0 } else { rect.width };
    let height = if rect.height == 0.0 { 1.0 } else { rect.height };
    let (pad_x, pad_y) = threshold.resolve(viewport);

    let visible_w = visible_extent(rect.x - pad_x, width + 2.0 * pad_x, viewport.width);
    let visible_h = visible_extent(rect.y - pad_y, height + 2.0 * pad_y, viewport.height);
    (visible_w * visible_h) / ((width + 2.0 * pad_x) * (height + 2.0 * pad_y)) * 100.0
}

/// Boolean variant: does the unpadded rect overlap the viewport at all?
pub fn is_visible(rect: Rect, viewport: ViewportSize) -> bool {
    rect.x < viewport.width
        && rect.x + rect.width > 0.0
        && rect.y < viewport.height
        && rect.y + rect.height > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: ViewportSize = ViewportSize::new(1000.0, 800.0);

    #[test]
    fn test_fully_visible_scores_100() {
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(visibility_score(rect, VIEWPORT, Threshold::None), 100.0);
    }

    #[test]
    fn test_half_visible() {
        // Bottom half hangs off the viewport.
        let rect = Rect::new(0.0, 700.0, 100.0, 200.0);
        let score = visibility_score(rect, VIEWPORT, Threshold::None);
        assert!((score - 50.0).abs() < 0.01, "expected ~50, got {}", score);
    }

    #[test]
    fn test_offscreen_scores_0() {
        let rect = Rect::new(0.0, 900.0, 100.0, 100.0);
        assert_eq!(visibility_score(rect, VIEWPORT, Threshold::None), 0.0);
        assert!(!is_visible(rect, VIEWPORT));
    }

    #[test]
    fn test_degenerate_rect_scores_0() {
        let rect = Rect::default();
        assert_eq!(visibility_score(rect, VIEWPORT, Threshold::None), 0.0);
    }

    #[test]
    fn test_zero_height_clamps_to_one() {
        let rect = Rect::new(10.0, 10.0, 100.0, 0.0);
        assert_eq!(visibility_score(rect, VIEWPORT, Threshold::None), 100.0);
    }

    #[test]
    fn test_px_threshold_reaches_below_fold() {
        // 100px below the fold; a 200px threshold pulls it into range.
        let rect = Rect::new(0.0, 900.0, 100.0, 100.0);
        assert_eq!(visibility_score(rect, VIEWPORT, Threshold::None), 0.0);
        assert!(visibility_score(rect, VIEWPORT, Threshold::Px(200.0)) > 0.0);
    }

    #[test]
    fn test_percent_threshold_per_axis() {
        // 25% of an 800px-tall viewport is 200px of vertical padding.
        let rect = Rect::new(0.0, 950.0, 100.0, 100.0);
        assert!(visibility_score(rect, VIEWPORT, Threshold::Percent(25.0)) > 0.0);
        assert_eq!(visibility_score(rect, VIEWPORT, Threshold::Percent(10.0)), 0.0);
    }

    #[test]
    fn test_threshold_parse() {
        assert_eq!(Threshold::parse("300px"), Threshold::Px(300.0));
        assert_eq!(Threshold::parse("25%"), Threshold::Percent(25.0));
        assert_eq!(Threshold::parse(" 40px "), Threshold::Px(40.0));
        assert_eq!(Threshold::parse("garbage"), Threshold::None);
        assert_eq!(Threshold::parse("px"), Threshold::None);
        assert_eq!(Threshold::parse(""), Threshold::None);
    }

    #[test]
    fn test_is_visible_partial_overlap() {
        let rect = Rect::new(-50.0, -50.0, 100.0, 100.0);
        assert!(is_visible(rect, VIEWPORT));

        // Touching the edge exactly is not a positive overlap.
        let rect = Rect::new(1000.0, 0.0, 100.0, 100.0);
        assert!(!is_visible(rect, VIEWPORT));
    }
}
