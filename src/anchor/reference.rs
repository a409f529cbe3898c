use crate::cache::{Fingerprint, FingerprintBuilder};
use crate::math::distance_2d::{closest_fraction_on_polyline, point_to_polyline_dist};
use crate::math::polyline_2d::{point_at_fraction, slice_by_fractions};
use crate::math::Point2;
use crate::network::{BoundarySide, DirectedSegment, SegmentRegistry};

/// What a reference pair stands for on its home segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    /// The segment's own centerline.
    Centerline,
    /// One boundary run, identified by its side in the segment's natural
    /// frame (slot index is direction-independent).
    Edge(BoundarySide),
    /// Degenerate single-point pair (node selection, free points).
    Point,
}

impl PairKind {
    /// Candidate slot index: centerline = 0, ccw edge = 1, cw edge = 2.
    /// Degenerate pairs have no slot.
    #[must_use]
    pub fn slot_index(self) -> Option<usize> {
        match self {
            Self::Centerline => Some(0),
            Self::Edge(side) => Some(side.slot() + 1),
            Self::Point => None,
        }
    }
}

/// The unifying abstraction every downstream algorithm consumes: an
/// oriented point run standing for a centerline, a boundary edge, or a
/// single point.
///
/// A pair owns its points, so segments and boundaries are structurally
/// interchangeable once resolved. Reversal is a value-level relabeling;
/// the underlying network records are never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePair {
    segment: Option<DirectedSegment>,
    kind: PairKind,
    points: Vec<Point2>,
}

impl ReferencePair {
    /// Centerline pair for a directed segment.
    #[must_use]
    pub fn centerline(registry: &SegmentRegistry, seg: DirectedSegment) -> Option<Self> {
        let (tail, head) = registry.directed_endpoints(seg)?;
        Some(Self {
            segment: Some(seg),
            kind: PairKind::Centerline,
            points: vec![tail, head],
        })
    }

    /// Boundary-run pair on `side` (natural frame) of a directed segment.
    ///
    /// Returns `None` when that side has no boundary. The run is oriented
    /// along the traversal direction.
    #[must_use]
    pub fn edge(registry: &SegmentRegistry, seg: DirectedSegment, side: BoundarySide) -> Option<Self> {
        let record = registry.record(seg.key)?;
        let run = record.boundary(side)?;
        let mut points: Vec<Point2> = run.to_vec();
        if seg.reversed {
            points.reverse();
        }
        Some(Self {
            segment: Some(seg),
            kind: PairKind::Edge(side),
            points,
        })
    }

    /// Pair for a candidate slot index (0 = centerline, 1 = ccw edge,
    /// 2 = cw edge).
    #[must_use]
    pub fn from_slot(registry: &SegmentRegistry, seg: DirectedSegment, slot: usize) -> Option<Self> {
        match slot {
            0 => Self::centerline(registry, seg),
            1 => Self::edge(registry, seg, BoundarySide::Ccw),
            2 => Self::edge(registry, seg, BoundarySide::Cw),
            _ => None,
        }
    }

    /// Degenerate single-point pair.
    #[must_use]
    pub fn free_point(point: Point2) -> Self {
        Self {
            segment: None,
            kind: PairKind::Point,
            points: vec![point],
        }
    }

    #[must_use]
    pub fn kind(&self) -> PairKind {
        self.kind
    }

    #[must_use]
    pub fn segment(&self) -> Option<DirectedSegment> {
        self.segment
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// The same pair traversed the other way (logical relabeling).
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            segment: self.segment.map(DirectedSegment::reverse),
            kind: self.kind,
            points,
        }
    }

    /// Point at arc-length fraction `f ∈ [0, 1]` along the run.
    #[must_use]
    pub fn point_at(&self, f: f64) -> Point2 {
        point_at_fraction(&self.points, f)
    }

    /// Arc-length fraction of the closest point on the run to `p`.
    #[must_use]
    pub fn closest_fraction(&self, p: &Point2) -> f64 {
        closest_fraction_on_polyline(p, &self.points)
    }

    /// Minimum distance from `p` to the run.
    #[must_use]
    pub fn distance_to(&self, p: &Point2) -> f64 {
        point_to_polyline_dist(p, &self.points)
    }

    /// Sub-run between two arc-length fractions. `f0 > f1` yields the
    /// reversed slice, so the result always starts at `f0`'s point.
    #[must_use]
    pub fn slice(&self, f0: f64, f1: f64) -> Vec<Point2> {
        slice_by_fractions(&self.points, f0, f1)
    }

    /// Splits the run at a fraction into its two halves, both oriented
    /// along the run.
    #[must_use]
    pub fn split(&self, f: f64) -> (Vec<Point2>, Vec<Point2>) {
        (self.slice(0.0, f), self.slice(f, 1.0))
    }

    /// Candidate slot of this pair, see [`PairKind::slot_index`].
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        self.kind.slot_index()
    }

    /// True when `other` resolves to the same underlying reference:
    /// the same segment and the same slot, regardless of traversal
    /// direction. Degenerate pairs never match.
    #[must_use]
    pub fn same_reference(&self, other: &Self) -> bool {
        match (self.segment, other.segment) {
            (Some(a), Some(b)) => a.key == b.key && self.kind == other.kind,
            _ => false,
        }
    }

    /// Content fingerprint of the oriented run.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut fp = FingerprintBuilder::new();
        fp.write_u64(self.kind.slot_index().map_or(u64::MAX, |s| s as u64));
        fp.write_points(&self.points);
        fp.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::network::SegmentRecord;

    fn registry_with_boundaries() -> (SegmentRegistry, DirectedSegment) {
        let mut reg = SegmentRegistry::new();
        let key = reg.add_segment(SegmentRecord {
            a: Point2::new(0.0, 0.0),
            b: Point2::new(10.0, 0.0),
            boundaries: [
                vec![Point2::new(0.0, 2.0), Point2::new(10.0, 2.0)],
                vec![Point2::new(0.0, -2.0), Point2::new(10.0, -2.0)],
            ],
        });
        (reg, DirectedSegment::forward(key))
    }

    #[test]
    fn centerline_pair_follows_direction() {
        let (reg, seg) = registry_with_boundaries();
        let fwd = ReferencePair::centerline(&reg, seg).unwrap();
        assert_eq!(fwd.points()[0], Point2::new(0.0, 0.0));

        let bwd = ReferencePair::centerline(&reg, seg.reverse()).unwrap();
        assert_eq!(bwd.points()[0], Point2::new(10.0, 0.0));
    }

    #[test]
    fn edge_pair_orients_run_to_traversal() {
        let (reg, seg) = registry_with_boundaries();
        let rev = ReferencePair::edge(&reg, seg.reverse(), BoundarySide::Ccw).unwrap();
        assert_eq!(rev.points()[0], Point2::new(10.0, 2.0));
        assert_eq!(rev.points()[1], Point2::new(0.0, 2.0));
    }

    #[test]
    fn missing_boundary_yields_none() {
        let mut reg = SegmentRegistry::new();
        let key = reg.add_bare_segment(Point2::new(0.0, 0.0), Point2::new(5.0, 0.0));
        let seg = DirectedSegment::forward(key);
        assert!(ReferencePair::edge(&reg, seg, BoundarySide::Ccw).is_none());
        assert!(ReferencePair::from_slot(&reg, seg, 1).is_none());
        assert!(ReferencePair::from_slot(&reg, seg, 0).is_some());
    }

    #[test]
    fn slot_indices() {
        assert_eq!(PairKind::Centerline.slot_index(), Some(0));
        assert_eq!(PairKind::Edge(BoundarySide::Ccw).slot_index(), Some(1));
        assert_eq!(PairKind::Edge(BoundarySide::Cw).slot_index(), Some(2));
        assert_eq!(PairKind::Point.slot_index(), None);
    }

    #[test]
    fn reversed_is_logical_relabel() {
        let (reg, seg) = registry_with_boundaries();
        let pair = ReferencePair::centerline(&reg, seg).unwrap();
        let rev = pair.reversed();
        assert_eq!(rev.segment().unwrap(), seg.reverse());
        assert_eq!(rev.points()[0], pair.points()[1]);
        // Round-trip restores the original value.
        assert_eq!(rev.reversed(), pair);
    }

    #[test]
    fn same_reference_ignores_direction_but_not_slot() {
        let (reg, seg) = registry_with_boundaries();
        let center = ReferencePair::centerline(&reg, seg).unwrap();
        let center_rev = ReferencePair::centerline(&reg, seg.reverse()).unwrap();
        let edge = ReferencePair::edge(&reg, seg, BoundarySide::Ccw).unwrap();

        assert!(center.same_reference(&center_rev));
        assert!(!center.same_reference(&edge));
        assert!(!center.same_reference(&ReferencePair::free_point(Point2::new(0.0, 0.0))));
    }

    #[test]
    fn fraction_and_distance() {
        let (reg, seg) = registry_with_boundaries();
        let pair = ReferencePair::centerline(&reg, seg).unwrap();
        let cursor = Point2::new(2.5, 1.5);
        assert!((pair.closest_fraction(&cursor) - 0.25).abs() < 1e-9);
        assert!((pair.distance_to(&cursor) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn split_halves_meet_at_the_cut() {
        let (reg, seg) = registry_with_boundaries();
        let pair = ReferencePair::centerline(&reg, seg).unwrap();
        let (back, front) = pair.split(0.3);
        assert!((back[back.len() - 1].x - 3.0).abs() < 1e-9);
        assert!((front[0].x - 3.0).abs() < 1e-9);
        assert_eq!(back[0], pair.points()[0]);
        assert_eq!(front[front.len() - 1], pair.points()[1]);
    }

    #[test]
    fn slice_matches_fraction_points() {
        let (reg, seg) = registry_with_boundaries();
        let pair = ReferencePair::centerline(&reg, seg).unwrap();
        let run = pair.slice(0.2, 0.8);
        assert_eq!(run.len(), 2);
        assert!((run[0].x - 2.0).abs() < 1e-9);
        assert!((run[1].x - 8.0).abs() < 1e-9);
    }
}
