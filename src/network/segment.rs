use crate::cache::{Fingerprint, FingerprintBuilder};
use crate::math::Point2;

slotmap::new_key_type! {
    /// Unique identifier for a segment in the registry.
    pub struct SegmentKey;
}

/// Which side of a segment a boundary run lies on, relative to the
/// segment's natural a→b direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySide {
    /// Counter-clockwise (left) side.
    Ccw,
    /// Clockwise (right) side.
    Cw,
}

impl BoundarySide {
    /// Storage slot of this side in [`SegmentRecord::boundaries`].
    #[must_use]
    pub fn slot(self) -> usize {
        match self {
            Self::Ccw => 0,
            Self::Cw => 1,
        }
    }

    /// The side a traversal against the natural direction sees.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Ccw => Self::Cw,
            Self::Cw => Self::Ccw,
        }
    }
}

/// Data associated with one network segment: a directed centerline piece
/// plus up to two boundary runs (curbs, rails) attached to its sides.
///
/// Records are read-only to the engine; the network-editing collaborator
/// owns mutation.
#[derive(Debug, Clone)]
pub struct SegmentRecord {
    /// Start of the centerline (natural direction tail).
    pub a: Point2,
    /// End of the centerline (natural direction head).
    pub b: Point2,
    /// Boundary runs by side slot: `[ccw, cw]`. An empty run means the
    /// segment has no boundary on that side.
    pub boundaries: [Vec<Point2>; 2],
}

impl SegmentRecord {
    /// Creates a bare centerline record with no boundaries.
    #[must_use]
    pub fn bare(a: Point2, b: Point2) -> Self {
        Self {
            a,
            b,
            boundaries: [Vec::new(), Vec::new()],
        }
    }

    /// Centerline length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.b - self.a).norm()
    }

    /// Centerline endpoints in traversal order.
    #[must_use]
    pub fn oriented_endpoints(&self, reversed: bool) -> (Point2, Point2) {
        if reversed {
            (self.b, self.a)
        } else {
            (self.a, self.b)
        }
    }

    /// Boundary run on `side`, or `None` when that side has no boundary.
    #[must_use]
    pub fn boundary(&self, side: BoundarySide) -> Option<&[Point2]> {
        let run = &self.boundaries[side.slot()];
        if run.is_empty() {
            None
        } else {
            Some(run)
        }
    }

    /// Stable identity: a content hash of the ordered endpoints.
    ///
    /// The reverse traversal hashes differently, matching the rule that a
    /// reverse segment is a distinct logical value.
    #[must_use]
    pub fn fingerprint(&self, reversed: bool) -> Fingerprint {
        let (tail, head) = self.oriented_endpoints(reversed);
        let mut fp = FingerprintBuilder::new();
        fp.write_point(&tail);
        fp.write_point(&head);
        fp.finish()
    }
}

/// A segment traversed in a specific direction.
///
/// The reverse of a segment is the same record relabeled, not a new
/// object; the pair `(key, reversed)` is the node type of the route graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectedSegment {
    pub key: SegmentKey,
    pub reversed: bool,
}

impl DirectedSegment {
    #[must_use]
    pub fn forward(key: SegmentKey) -> Self {
        Self {
            key,
            reversed: false,
        }
    }

    /// The same segment traversed the other way.
    #[must_use]
    pub fn reverse(self) -> Self {
        Self {
            key: self.key,
            reversed: !self.reversed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_depends_on_direction() {
        let rec = SegmentRecord::bare(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        assert_ne!(rec.fingerprint(false), rec.fingerprint(true));
    }

    #[test]
    fn fingerprint_is_content_based() {
        let rec1 = SegmentRecord::bare(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let rec2 = SegmentRecord::bare(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        assert_eq!(rec1.fingerprint(false), rec2.fingerprint(false));
    }

    #[test]
    fn oriented_endpoints_swap_on_reverse() {
        let rec = SegmentRecord::bare(Point2::new(1.0, 2.0), Point2::new(3.0, 4.0));
        let (tail, head) = rec.oriented_endpoints(true);
        assert_eq!(tail, rec.b);
        assert_eq!(head, rec.a);
    }

    #[test]
    fn empty_boundary_is_none() {
        let rec = SegmentRecord::bare(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        assert!(rec.boundary(BoundarySide::Ccw).is_none());
        assert!(rec.boundary(BoundarySide::Cw).is_none());
    }

    #[test]
    fn side_flip_round_trips() {
        assert_eq!(BoundarySide::Ccw.flipped(), BoundarySide::Cw);
        assert_eq!(BoundarySide::Ccw.flipped().flipped(), BoundarySide::Ccw);
    }
}
