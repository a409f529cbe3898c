use crate::error::{GeometryError, Result};

use super::{points_coincide, Point2, Vector2, TOLERANCE};

/// Computes the total arc length of an open polyline.
#[must_use]
pub fn arc_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Computes, for each vertex, its cumulative arc-length fraction in `[0, 1]`.
///
/// The first vertex maps to `0.0` and the last to `1.0`. A polyline of
/// zero total length maps every vertex to `0.0`.
#[must_use]
pub fn cumulative_fractions(points: &[Point2]) -> Vec<f64> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }
    let total = arc_length(points);
    if total < TOLERANCE {
        return vec![0.0; n];
    }
    let mut fractions = Vec::with_capacity(n);
    let mut walked = 0.0;
    fractions.push(0.0);
    for w in points.windows(2) {
        walked += (w[1] - w[0]).norm();
        fractions.push((walked / total).min(1.0));
    }
    fractions
}

/// Returns the point at arc-length fraction `f ∈ [0, 1]` along a polyline.
///
/// Degenerate input (single point, zero length) returns the first point.
#[must_use]
pub fn point_at_fraction(points: &[Point2], f: f64) -> Point2 {
    debug_assert!(!points.is_empty());
    if points.len() < 2 {
        return points[0];
    }
    let total = arc_length(points);
    if total < TOLERANCE {
        return points[0];
    }
    let target = f.clamp(0.0, 1.0) * total;
    let mut walked = 0.0;
    for w in points.windows(2) {
        let seg_len = (w[1] - w[0]).norm();
        if walked + seg_len >= target - TOLERANCE && seg_len > TOLERANCE {
            let t = ((target - walked) / seg_len).clamp(0.0, 1.0);
            return w[0] + (w[1] - w[0]) * t;
        }
        walked += seg_len;
    }
    points[points.len() - 1]
}

/// Extracts the sub-run of a polyline between arc-length fractions
/// `f0` and `f1`.
///
/// When `f0 > f1` the result is oriented from `f0` back toward `f1`
/// (a reversed slice), so the returned run always starts at the point for
/// `f0` and ends at the point for `f1`. Interior vertices strictly between
/// the two cut points are preserved.
#[must_use]
pub fn slice_by_fractions(points: &[Point2], f0: f64, f1: f64) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    if f0 > f1 {
        let mut rev = slice_by_fractions(points, f1, f0);
        rev.reverse();
        return rev;
    }

    let start = point_at_fraction(points, f0);
    let end = point_at_fraction(points, f1);
    let fractions = cumulative_fractions(points);

    let mut out = Vec::with_capacity(points.len());
    out.push(start);
    for (pt, f) in points.iter().zip(fractions.iter()) {
        if *f > f0 + TOLERANCE && *f < f1 - TOLERANCE {
            out.push(*pt);
        }
    }
    out.push(end);
    dedup_consecutive(&out)
}

/// Removes consecutive near-duplicate points (within [`TOLERANCE`]).
#[must_use]
pub fn dedup_consecutive(points: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for pt in points {
        if let Some(last) = out.last() {
            if points_coincide(last, pt) {
                continue;
            }
        }
        out.push(*pt);
    }
    out
}

/// Computes the normalized direction from point `a` to point `b`.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroVector`] if the segment has zero length.
pub fn segment_direction(a: &Point2, b: &Point2) -> Result<Vector2> {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        return Err(GeometryError::ZeroVector.into());
    }
    Ok(d / len)
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: &Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// Signed turn angle at vertex `b` of the corner `a`→`b`→`c`, in radians.
///
/// Positive for a left (counter-clockwise) turn, negative for a right
/// turn, `0` for collinear or degenerate corners.
#[must_use]
pub fn turn_angle(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let d1 = b - a;
    let d2 = c - b;
    if d1.norm_squared() < TOLERANCE * TOLERANCE || d2.norm_squared() < TOLERANCE * TOLERANCE {
        return 0.0;
    }
    let cross = d1.x * d2.y - d1.y * d2.x;
    let dot = d1.dot(&d2);
    cross.atan2(dot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l_shape() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
        ]
    }

    #[test]
    fn arc_length_l_shape() {
        assert_relative_eq!(arc_length(&l_shape()), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn cumulative_fractions_l_shape() {
        let f = cumulative_fractions(&l_shape());
        assert_eq!(f.len(), 3);
        assert_relative_eq!(f[0], 0.0);
        assert_relative_eq!(f[1], 0.5);
        assert_relative_eq!(f[2], 1.0);
    }

    #[test]
    fn point_at_fraction_interior() {
        let p = point_at_fraction(&l_shape(), 0.25);
        assert_relative_eq!(p.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn point_at_fraction_crosses_joint() {
        let p = point_at_fraction(&l_shape(), 0.75);
        assert_relative_eq!(p.x, 4.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn point_at_fraction_extremes() {
        let pts = l_shape();
        assert!(points_coincide(&point_at_fraction(&pts, 0.0), &pts[0]));
        assert!(points_coincide(&point_at_fraction(&pts, 1.0), &pts[2]));
    }

    #[test]
    fn slice_keeps_interior_vertices() {
        let s = slice_by_fractions(&l_shape(), 0.25, 0.75);
        assert_eq!(s.len(), 3);
        assert_relative_eq!(s[0].x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(s[1].x, 4.0, epsilon = 1e-12);
        assert_relative_eq!(s[1].y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(s[2].y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn slice_reversed_fractions_flips_orientation() {
        let fwd = slice_by_fractions(&l_shape(), 0.25, 0.75);
        let rev = slice_by_fractions(&l_shape(), 0.75, 0.25);
        assert_eq!(fwd.len(), rev.len());
        for (a, b) in fwd.iter().zip(rev.iter().rev()) {
            assert!(points_coincide(a, b));
        }
    }

    #[test]
    fn slice_at_vertex_does_not_duplicate() {
        // Cut exactly at the joint vertex: it must appear once.
        let s = slice_by_fractions(&l_shape(), 0.0, 0.5);
        assert_eq!(s.len(), 2);
        assert!(points_coincide(&s[1], &Point2::new(4.0, 0.0)));
    }

    #[test]
    fn dedup_removes_touching_points() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1e-12),
            Point2::new(2.0, 0.0),
        ];
        let out = dedup_consecutive(&pts);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn direction_and_normal() {
        let dir = segment_direction(&Point2::new(0.0, 0.0), &Point2::new(3.0, 0.0)).unwrap();
        let n = left_normal(&dir);
        assert_relative_eq!(n.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn direction_zero_length_errors() {
        let r = segment_direction(&Point2::new(1.0, 1.0), &Point2::new(1.0, 1.0));
        assert!(r.is_err());
    }

    #[test]
    fn turn_angle_signs() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!(turn_angle(&a, &b, &Point2::new(1.0, 1.0)) > 0.0); // left
        assert!(turn_angle(&a, &b, &Point2::new(1.0, -1.0)) < 0.0); // right
        assert_relative_eq!(
            turn_angle(&a, &b, &Point2::new(2.0, 0.0)),
            0.0,
            epsilon = 1e-12
        );
    }
}
