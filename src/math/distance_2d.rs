use super::{Point2, TOLERANCE};

/// Returns the minimum distance from `p` to the segment `a`→`b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let t = closest_fraction_on_segment(p, a, b);
    let closest = a + (b - a) * t;
    (p - closest).norm()
}

/// Returns the clamped fraction `t ∈ [0, 1]` of the closest point to `p`
/// on the segment `a`→`b`.
///
/// A degenerate (zero-length) segment yields `0.0`.
#[must_use]
pub fn closest_fraction_on_segment(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return 0.0;
    }
    ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0)
}

/// Returns the minimum distance from `p` to an open polyline.
///
/// Empty input yields `f64::INFINITY`; a single point yields the
/// point-to-point distance.
#[must_use]
pub fn point_to_polyline_dist(p: &Point2, points: &[Point2]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (p - only).norm(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(p, &w[0], &w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Returns the arc-length fraction `f ∈ [0, 1]` of the closest point to
/// `p` along an open polyline.
///
/// The fraction is measured in cumulative arc length over the whole run,
/// so it is directly comparable across polylines of different vertex
/// counts. Degenerate input (fewer than 2 points, or zero total length)
/// yields `0.0`.
#[must_use]
pub fn closest_fraction_on_polyline(p: &Point2, points: &[Point2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut best_dist = f64::INFINITY;
    let mut best_len = 0.0;
    let mut walked = 0.0;
    let mut total = 0.0;

    for w in points.windows(2) {
        let seg_len = (w[1] - w[0]).norm();
        let t = closest_fraction_on_segment(p, &w[0], &w[1]);
        let closest = w[0] + (w[1] - w[0]) * t;
        let dist = (p - closest).norm();
        if dist < best_dist {
            best_dist = dist;
            best_len = walked + seg_len * t;
        }
        walked += seg_len;
        total += seg_len;
    }

    if total < TOLERANCE {
        return 0.0;
    }
    (best_len / total).clamp(0.0, 1.0)
}
