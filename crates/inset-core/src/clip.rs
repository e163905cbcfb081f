//! Rectangle clipping for projected geometry.
//!
//! Lines are clipped segment by segment (Liang–Barsky) so they can be
//! streamed; polygon rings are buffered and clipped as a whole
//! (Sutherland–Hodgman) so the result stays a closed ring.

use crate::geometry::{ScreenPoint, ScreenRect};

/// Clips the segment `a → b` to `rect`.
///
/// Returns the visible part of the segment, or `None` if it lies entirely
/// outside. Endpoints inside the rectangle are returned unchanged.
pub fn clip_segment(a: ScreenPoint, b: ScreenPoint, rect: ScreenRect) -> Option<(ScreenPoint, ScreenPoint)> {
    let dx = b.x() - a.x();
    let dy = b.y() - a.y();
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let checks = [
        (-dx, a.x() - rect.min_x()),
        (dx, rect.max_x() - a.x()),
        (-dy, a.y() - rect.min_y()),
        (dy, rect.max_y() - a.y()),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            // Parallel to this edge
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let start = if t0 > 0.0 { a.lerp(b, t0) } else { a };
    let end = if t1 < 1.0 { a.lerp(b, t1) } else { b };
    Some((start, end))
}

#[derive(Clone, Copy)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    fn keeps(self, point: ScreenPoint, rect: ScreenRect) -> bool {
        match self {
            Edge::Left => point.x() >= rect.min_x(),
            Edge::Right => point.x() <= rect.max_x(),
            Edge::Top => point.y() >= rect.min_y(),
            Edge::Bottom => point.y() <= rect.max_y(),
        }
    }

    fn intersect(self, a: ScreenPoint, b: ScreenPoint, rect: ScreenRect) -> ScreenPoint {
        let (value, along) = match self {
            Edge::Left => (rect.min_x(), b.x() - a.x()),
            Edge::Right => (rect.max_x(), b.x() - a.x()),
            Edge::Top => (rect.min_y(), b.y() - a.y()),
            Edge::Bottom => (rect.max_y(), b.y() - a.y()),
        };
        if along.abs() <= f64::EPSILON {
            return b;
        }
        match self {
            Edge::Left | Edge::Right => {
                let crossing = a.lerp(b, (value - a.x()) / along);
                ScreenPoint::new(value, crossing.y())
            }
            Edge::Top | Edge::Bottom => {
                let crossing = a.lerp(b, (value - a.y()) / along);
                ScreenPoint::new(crossing.x(), value)
            }
        }
    }
}

/// Clips a closed ring to `rect`.
///
/// The ring is given without a repeated closing point. The result is empty
/// when the ring lies entirely outside the rectangle.
pub fn clip_ring(ring: &[ScreenPoint], rect: ScreenRect) -> Vec<ScreenPoint> {
    let mut output = ring.to_vec();

    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        let Some(&last) = output.last() else {
            break;
        };
        let input = std::mem::take(&mut output);
        let mut prev = last;
        let mut prev_in = edge.keeps(prev, rect);

        for &cur in &input {
            let cur_in = edge.keeps(cur, rect);
            if prev_in != cur_in {
                output.push(edge.intersect(prev, cur, rect));
            }
            if cur_in {
                output.push(cur);
            }
            prev = cur;
            prev_in = cur_in;
        }
    }

    output
}
