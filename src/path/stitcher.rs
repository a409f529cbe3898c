use ahash::AHashMap;
use tracing::debug;

use crate::anchor::reference::ReferencePair;
use crate::anchor::resolver::Anchor;
use crate::cache::{fingerprint_points, Fingerprint};
use crate::error::{GeometryError, PathError, Result};
use crate::math::polyline_2d::arc_length;
use crate::math::Point2;
use crate::network::{DirectedSegment, SegmentRegistry};
use crate::route::{self, Route};

use super::joint;

/// Precomputed routes between directed segments, keyed by
/// (source, goal). Produced by [`route::solve_all`] as a warm-up; the
/// stitcher falls back to single-pair solves for pairs not present.
pub type RouteTable = AHashMap<(DirectedSegment, DirectedSegment), Route<DirectedSegment>>;

/// Stitching behavior flags.
#[derive(Debug, Clone)]
pub struct StitchConfig {
    /// Bridge anchors on disconnected components with a straight
    /// connector instead of failing. Default `false`.
    pub fallback_to_direct: bool,
    /// Paths shorter than this are not worth drawing. Default `1e-6`.
    pub min_path_length: f64,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            fallback_to_direct: false,
            min_path_length: 1e-6,
        }
    }
}

/// A stitched polyline between two anchors, following the network.
///
/// The first and last points are the anchors' base points on their
/// reference pairs; perpendicular offsets are applied by the offset field
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    pub points: Vec<Point2>,
    /// Interior vertex indices where the path turns sharply.
    pub sharp_turns: Vec<usize>,
}

impl ResolvedPath {
    fn from_points(points: Vec<Point2>) -> Self {
        let sharp_turns = joint::sharp_turn_indices(&points);
        Self {
            points,
            sharp_turns,
        }
    }

    #[must_use]
    pub fn arc_length(&self) -> f64 {
        arc_length(&self.points)
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint_points(&self.points)
    }
}

/// Stitches the network path between two resolved anchors.
///
/// The path starts at `a`'s base point and ends at `b`'s. Anchors on the
/// same segment are served by a single trim; anchors on different
/// segments go through the route solver, trying both traversal
/// orientations at each end and keeping the cheapest of the four
/// combinations.
///
/// # Errors
///
/// Returns [`PathError::Unsolvable`] when the anchors sit on disconnected
/// components and `config.fallback_to_direct` is off, and
/// [`GeometryError::Degenerate`] when both anchors collapse onto the same
/// point.
pub fn stitch_between(
    registry: &SegmentRegistry,
    a: &Anchor,
    b: &Anchor,
    config: &StitchConfig,
) -> Result<ResolvedPath> {
    stitch_with_routes(registry, a, b, config, None)
}

/// [`stitch_between`] with an optional warm route table consulted before
/// any single-pair solve.
pub fn stitch_with_routes(
    registry: &SegmentRegistry,
    a: &Anchor,
    b: &Anchor,
    config: &StitchConfig,
    routes: Option<&RouteTable>,
) -> Result<ResolvedPath> {
    let (Some(a_seg), Some(b_seg)) = (a.pair.segment(), b.pair.segment()) else {
        // At least one free-point anchor: a straight connector is the
        // only sensible path.
        return direct_connector(a, b);
    };

    if a_seg.key == b_seg.key {
        return stitch_same_segment(a, b);
    }

    let Some(route) = best_route(registry, a_seg, b_seg, routes) else {
        if config.fallback_to_direct {
            debug!("no route between anchors, bridging directly");
            return direct_connector(a, b);
        }
        return Err(PathError::Unsolvable.into());
    };
    debug!(
        segments = route.path.len(),
        weight = route.total_weight,
        "route solved"
    );

    let n = route.path.len();
    let (a_pair, fa) = oriented_to(&a.pair, a.fraction, route.path[0]);
    let (b_pair, fb) = oriented_to(&b.pair, b.fraction, route.path[n - 1]);
    let slot_a = a_pair.slot().unwrap_or(0);
    let slot_b = b_pair.slot().unwrap_or(0);

    let mut runs: Vec<Vec<Point2>> = Vec::with_capacity(n);
    runs.push(a_pair.slice(fa, 1.0));
    for (i, seg) in route.path.iter().enumerate().take(n - 1).skip(1) {
        // Intermediate segments inherit the candidate slot of the nearer
        // end anchor; the handoff happens at the route midpoint. Segments
        // missing that boundary fall back to their centerline.
        let slot = if i <= (n - 1) / 2 { slot_a } else { slot_b };
        let pair = ReferencePair::from_slot(registry, *seg, slot)
            .or_else(|| ReferencePair::centerline(registry, *seg));
        if let Some(pair) = pair {
            runs.push(pair.points().to_vec());
        }
    }
    runs.push(b_pair.slice(0.0, fb));

    finish(joint::stitch_runs(&runs)?)
}

/// Splits a lone anchor's reference pair toward an external point.
///
/// Used while only one anchor exists and the cursor roams: the returned
/// path runs from the anchor's base point to whichever end of the pair
/// lies toward the cursor.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] when the pair has no extent on
/// either side of the anchor.
pub fn split_toward(anchor: &Anchor, cursor: &Point2) -> Result<ResolvedPath> {
    let end_fwd = anchor.pair.point_at(1.0);
    let end_bwd = anchor.pair.point_at(0.0);
    let (mut back, front) = anchor.pair.split(anchor.fraction);
    // Both halves must start at the anchor's base point.
    back.reverse();

    let (toward, away) = if (cursor - end_fwd).norm() <= (cursor - end_bwd).norm() {
        (front, back)
    } else {
        (back, front)
    };

    if crate::math::polyline_2d::dedup_consecutive(&toward).len() >= 2 {
        return finish(toward);
    }
    // Anchor sits at the chosen end: the other half is the only path.
    finish(away)
}

// ── internals ─────────────────────────────────────────────────────────

/// Cheapest of the four orientation combinations between two segments.
/// Combination order is fixed, so equal-weight ties are deterministic.
fn best_route(
    registry: &SegmentRegistry,
    a_seg: DirectedSegment,
    b_seg: DirectedSegment,
    routes: Option<&RouteTable>,
) -> Option<Route<DirectedSegment>> {
    let combos = [
        (a_seg, b_seg),
        (a_seg, b_seg.reverse()),
        (a_seg.reverse(), b_seg),
        (a_seg.reverse(), b_seg.reverse()),
    ];

    let mut best: Option<Route<DirectedSegment>> = None;
    for (source, goal) in combos {
        let candidate = match routes.and_then(|table| table.get(&(source, goal))) {
            Some(route) => Some(route.clone()),
            None => route::solve(registry, source, goal),
        };
        if let Some(route) = candidate {
            if best
                .as_ref()
                .is_none_or(|b| route.total_weight < b.total_weight)
            {
                best = Some(route);
            }
        }
    }
    best
}

/// Both anchors on one segment: a single trim of a shared reference pair.
fn stitch_same_segment(a: &Anchor, b: &Anchor) -> Result<ResolvedPath> {
    let run = if a.pair.kind() == b.pair.kind() {
        // Same slot: express b's fraction in a's orientation and trim.
        let same_dir = match (a.pair.segment(), b.pair.segment()) {
            (Some(sa), Some(sb)) => sa.reversed == sb.reversed,
            _ => true,
        };
        let fb = if same_dir { b.fraction } else { 1.0 - b.fraction };
        a.pair.slice(a.fraction, fb)
    } else {
        // Different slots on one segment: the first anchor's slot carries
        // the whole trim; b is projected onto it.
        let fb = a.pair.closest_fraction(&b.base_point());
        a.pair.slice(a.fraction, fb)
    };
    finish(run)
}

/// Reorients a pair (and its fraction) to match a route-end traversal
/// direction.
fn oriented_to(pair: &ReferencePair, fraction: f64, target: DirectedSegment) -> (ReferencePair, f64) {
    match pair.segment() {
        Some(seg) if seg.reversed != target.reversed => (pair.reversed(), 1.0 - fraction),
        _ => (pair.clone(), fraction),
    }
}

fn direct_connector(a: &Anchor, b: &Anchor) -> Result<ResolvedPath> {
    finish(vec![a.base_point(), b.base_point()])
}

fn finish(points: Vec<Point2>) -> Result<ResolvedPath> {
    let points = crate::math::polyline_2d::dedup_consecutive(&points);
    if points.len() < 2 {
        return Err(GeometryError::Degenerate(
            "anchors resolve to a single point".to_owned(),
        )
        .into());
    }
    Ok(ResolvedPath::from_points(points))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::anchor::resolver::Anchor;
    use crate::error::WaylineError;
    use crate::math::{points_coincide, Vector2};
    use crate::network::{BoundarySide, SegmentRecord};

    fn collinear_pair() -> (SegmentRegistry, DirectedSegment, DirectedSegment) {
        let mut reg = SegmentRegistry::new();
        let s1 = reg.add_bare_segment(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let s2 = reg.add_bare_segment(Point2::new(10.0, 0.0), Point2::new(20.0, 0.0));
        (
            reg,
            DirectedSegment::forward(s1),
            DirectedSegment::forward(s2),
        )
    }

    fn centerline_anchor(reg: &SegmentRegistry, seg: DirectedSegment, fraction: f64) -> Anchor {
        let pair = ReferencePair::centerline(reg, seg).unwrap();
        Anchor::new(pair, fraction, Vector2::zeros())
    }

    #[test]
    fn collinear_route_passes_through_shared_endpoint() {
        let (reg, s1, s2) = collinear_pair();
        let a = centerline_anchor(&reg, s1, 0.2);
        let b = centerline_anchor(&reg, s2, 0.8);
        let path = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();

        let expected = [
            Point2::new(2.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(18.0, 0.0),
        ];
        assert_eq!(path.points.len(), expected.len());
        for (got, want) in path.points.iter().zip(expected.iter()) {
            assert!(points_coincide(got, want), "got {got:?}, want {want:?}");
        }
        assert!(path.sharp_turns.is_empty());
    }

    #[test]
    fn same_segment_same_slot_is_single_trim() {
        let (reg, s1, _) = collinear_pair();
        let a = centerline_anchor(&reg, s1, 0.2);
        let b = centerline_anchor(&reg, s1, 0.7);
        let path = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();
        assert_eq!(path.points.len(), 2);
        assert!(points_coincide(&path.points[0], &Point2::new(2.0, 0.0)));
        assert!(points_coincide(&path.points[1], &Point2::new(7.0, 0.0)));
    }

    #[test]
    fn same_segment_reverse_order_runs_backwards() {
        let (reg, s1, _) = collinear_pair();
        let a = centerline_anchor(&reg, s1, 0.8);
        let b = centerline_anchor(&reg, s1, 0.2);
        let path = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();
        assert!(points_coincide(&path.points[0], &Point2::new(8.0, 0.0)));
        assert!(points_coincide(&path.points[1], &Point2::new(2.0, 0.0)));
    }

    #[test]
    fn same_segment_opposite_boundaries_use_first_anchor_slot() {
        let mut reg = SegmentRegistry::new();
        let key = reg.add_segment(SegmentRecord {
            a: Point2::new(0.0, 0.0),
            b: Point2::new(10.0, 0.0),
            boundaries: [
                vec![Point2::new(0.0, 2.0), Point2::new(10.0, 2.0)],
                vec![Point2::new(0.0, -2.0), Point2::new(10.0, -2.0)],
            ],
        });
        let seg = DirectedSegment::forward(key);
        let a = Anchor::new(
            ReferencePair::edge(&reg, seg, BoundarySide::Ccw).unwrap(),
            0.2,
            Vector2::zeros(),
        );
        let b = Anchor::new(
            ReferencePair::edge(&reg, seg, BoundarySide::Cw).unwrap(),
            0.8,
            Vector2::zeros(),
        );
        let path = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();
        // The whole trim rides a's boundary; b projects onto it.
        assert!(points_coincide(&path.points[0], &Point2::new(2.0, 2.0)));
        assert!(points_coincide(
            &path.points[path.points.len() - 1],
            &Point2::new(8.0, 2.0)
        ));
    }

    #[test]
    fn route_normalizes_goal_orientation() {
        let mut reg = SegmentRegistry::new();
        let s1 = reg.add_bare_segment(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        // Natural direction pointing back toward the junction.
        let s2 = reg.add_bare_segment(Point2::new(20.0, 0.0), Point2::new(10.0, 0.0));
        let a = centerline_anchor(&reg, DirectedSegment::forward(s1), 0.2);
        let b = centerline_anchor(&reg, DirectedSegment::forward(s2), 0.8);
        let path = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();

        assert!(points_coincide(&path.points[0], &Point2::new(2.0, 0.0)));
        assert!(points_coincide(
            &path.points[path.points.len() - 1],
            &Point2::new(12.0, 0.0)
        ));
    }

    #[test]
    fn boundary_slot_carries_into_intermediate_segments() {
        let mut reg = SegmentRegistry::new();
        let mut keys = Vec::new();
        for i in 0..3 {
            let x0 = f64::from(i) * 10.0;
            let x1 = x0 + 10.0;
            keys.push(reg.add_segment(SegmentRecord {
                a: Point2::new(x0, 0.0),
                b: Point2::new(x1, 0.0),
                boundaries: [
                    vec![Point2::new(x0, 2.0), Point2::new(x1, 2.0)],
                    vec![Point2::new(x0, -2.0), Point2::new(x1, -2.0)],
                ],
            }));
        }
        let a = Anchor::new(
            ReferencePair::edge(&reg, DirectedSegment::forward(keys[0]), BoundarySide::Ccw)
                .unwrap(),
            0.5,
            Vector2::zeros(),
        );
        let b = Anchor::new(
            ReferencePair::edge(&reg, DirectedSegment::forward(keys[2]), BoundarySide::Ccw)
                .unwrap(),
            0.5,
            Vector2::zeros(),
        );
        let path = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();

        // Every point stays on the y = 2 boundary line: the slot carries
        // through the middle segment with no handoff dip.
        assert!(path.points.iter().all(|p| (p.y - 2.0).abs() < 1e-9));
        assert!(points_coincide(&path.points[0], &Point2::new(5.0, 2.0)));
        assert!(points_coincide(
            &path.points[path.points.len() - 1],
            &Point2::new(25.0, 2.0)
        ));
    }

    #[test]
    fn stitch_is_direction_symmetric() {
        let (reg, s1, s2) = collinear_pair();
        let a = centerline_anchor(&reg, s1, 0.2);
        let b = centerline_anchor(&reg, s2, 0.8);
        let fwd = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();
        let bwd = stitch_between(&reg, &b, &a, &StitchConfig::default()).unwrap();
        assert_eq!(fwd.points.len(), bwd.points.len());
        for (p, q) in fwd.points.iter().zip(bwd.points.iter().rev()) {
            assert!(points_coincide(p, q));
        }
    }

    #[test]
    fn disconnected_without_fallback_is_unsolvable() {
        let mut reg = SegmentRegistry::new();
        let s1 = reg.add_bare_segment(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let s2 = reg.add_bare_segment(Point2::new(50.0, 50.0), Point2::new(60.0, 50.0));
        let a = centerline_anchor(&reg, DirectedSegment::forward(s1), 0.5);
        let b = centerline_anchor(&reg, DirectedSegment::forward(s2), 0.5);
        let err = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap_err();
        assert!(matches!(err, WaylineError::Path(PathError::Unsolvable)));
    }

    #[test]
    fn disconnected_with_fallback_bridges_directly() {
        let mut reg = SegmentRegistry::new();
        let s1 = reg.add_bare_segment(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let s2 = reg.add_bare_segment(Point2::new(50.0, 50.0), Point2::new(60.0, 50.0));
        let a = centerline_anchor(&reg, DirectedSegment::forward(s1), 0.5);
        let b = centerline_anchor(&reg, DirectedSegment::forward(s2), 0.5);
        let config = StitchConfig {
            fallback_to_direct: true,
            ..StitchConfig::default()
        };
        let path = stitch_between(&reg, &a, &b, &config).unwrap();
        assert_eq!(path.points.len(), 2);
        assert!(points_coincide(&path.points[0], &Point2::new(5.0, 0.0)));
        assert!(points_coincide(&path.points[1], &Point2::new(55.0, 50.0)));
    }

    #[test]
    fn free_point_anchor_connects_directly() {
        let (reg, s1, _) = collinear_pair();
        let a = centerline_anchor(&reg, s1, 0.5);
        let b = Anchor::new(
            ReferencePair::free_point(Point2::new(5.0, 7.0)),
            0.0,
            Vector2::zeros(),
        );
        let path = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();
        assert_eq!(path.points.len(), 2);
        assert!(points_coincide(&path.points[1], &Point2::new(5.0, 7.0)));
    }

    #[test]
    fn coincident_anchors_are_degenerate() {
        let (reg, s1, _) = collinear_pair();
        let a = centerline_anchor(&reg, s1, 0.5);
        let b = centerline_anchor(&reg, s1, 0.5);
        let err = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap_err();
        assert!(matches!(err, WaylineError::Geometry(_)));
    }

    #[test]
    fn warm_route_table_is_honored() {
        let (reg, s1, s2) = collinear_pair();
        let a = centerline_anchor(&reg, s1, 0.2);
        let b = centerline_anchor(&reg, s2, 0.8);
        let table = route::solve_all(&reg, &[s1, s1.reverse(), s2, s2.reverse()]);
        let warm = stitch_with_routes(&reg, &a, &b, &StitchConfig::default(), Some(&table)).unwrap();
        let cold = stitch_between(&reg, &a, &b, &StitchConfig::default()).unwrap();
        assert_eq!(warm, cold);
    }

    #[test]
    fn split_toward_follows_cursor_side() {
        let (reg, s1, _) = collinear_pair();
        let anchor = centerline_anchor(&reg, s1, 0.5);

        let fwd = split_toward(&anchor, &Point2::new(9.0, 1.0)).unwrap();
        assert!(points_coincide(&fwd.points[0], &Point2::new(5.0, 0.0)));
        assert!(points_coincide(&fwd.points[1], &Point2::new(10.0, 0.0)));

        let bwd = split_toward(&anchor, &Point2::new(1.0, 0.0)).unwrap();
        assert!(points_coincide(&bwd.points[1], &Point2::new(0.0, 0.0)));
    }

    #[test]
    fn split_toward_at_pair_end_uses_other_half() {
        let (reg, s1, _) = collinear_pair();
        let anchor = centerline_anchor(&reg, s1, 1.0);
        // Cursor beyond the forward end, but that half has no extent.
        let path = split_toward(&anchor, &Point2::new(15.0, 0.0)).unwrap();
        assert!(points_coincide(&path.points[0], &Point2::new(10.0, 0.0)));
        assert!(points_coincide(&path.points[1], &Point2::new(0.0, 0.0)));
    }
}
