use std::cell::Cell;

use ahash::{AHashMap, AHashSet};
use rstar::primitives::{GeomWithData, Line};
use rstar::RTree;
use slotmap::SlotMap;

use crate::math::{points_coincide, Point2};

use super::segment::{DirectedSegment, SegmentKey, SegmentRecord};

type IndexedLine = GeomWithData<Line<[f64; 2]>, SegmentKey>;

/// Endpoint bucket size for connectivity lookups. Coarser than the
/// geometric tolerance; candidates are verified with an exact coincidence
/// check.
const BUCKET: f64 = 1e-6;

/// In-memory graph of network segments with spatial and connectivity
/// queries.
///
/// The registry is populated once by the network-owning collaborator and
/// is read-only to the engine. All queries are side-effect free and
/// return `None`/empty on a miss — "nothing near the cursor" is a normal
/// state, not an error.
#[derive(Debug, Default)]
pub struct SegmentRegistry {
    segments: SlotMap<SegmentKey, SegmentRecord>,
    index: RTree<IndexedLine>,
    endpoint_buckets: AHashMap<(i64, i64), Vec<SegmentKey>>,
    nearest_queries: Cell<u64>,
}

impl SegmentRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a segment and returns its key.
    pub fn add_segment(&mut self, record: SegmentRecord) -> SegmentKey {
        let line = Line::new([record.a.x, record.a.y], [record.b.x, record.b.y]);
        let a = record.a;
        let b = record.b;
        let key = self.segments.insert(record);
        self.index.insert(GeomWithData::new(line, key));
        self.endpoint_buckets.entry(bucket_of(&a)).or_default().push(key);
        self.endpoint_buckets.entry(bucket_of(&b)).or_default().push(key);
        key
    }

    /// Convenience: inserts a bare centerline segment.
    pub fn add_bare_segment(&mut self, a: Point2, b: Point2) -> SegmentKey {
        self.add_segment(SegmentRecord::bare(a, b))
    }

    /// Returns the segment nearest to `point`, or `None` for an empty
    /// network.
    #[must_use]
    pub fn nearest_segment(&self, point: &Point2) -> Option<SegmentKey> {
        self.nearest_queries.set(self.nearest_queries.get() + 1);
        self.index
            .nearest_neighbor(&[point.x, point.y])
            .map(|geom| geom.data)
    }

    /// Returns the record for `key`, or `None` for a stale key.
    #[must_use]
    pub fn record(&self, key: SegmentKey) -> Option<&SegmentRecord> {
        self.segments.get(key)
    }

    /// Boundary runs of a segment, ordered deterministically:
    /// counter-clockwise side first, clockwise side second, relative to
    /// the segment's natural direction. Empty runs mean no boundary.
    #[must_use]
    pub fn boundaries_of(&self, key: SegmentKey) -> Option<&[Vec<Point2>; 2]> {
        self.segments.get(key).map(|rec| &rec.boundaries)
    }

    /// Centerline endpoints of a directed segment, in traversal order.
    #[must_use]
    pub fn directed_endpoints(&self, seg: DirectedSegment) -> Option<(Point2, Point2)> {
        self.segments
            .get(seg.key)
            .map(|rec| rec.oriented_endpoints(seg.reversed))
    }

    /// Successors of a directed segment: every directed segment whose
    /// traversal starts where this one ends. The immediate reverse of
    /// `seg` itself is excluded (no in-place U-turns).
    #[must_use]
    pub fn neighbors(&self, seg: DirectedSegment) -> Vec<DirectedSegment> {
        let Some((_, head)) = self.directed_endpoints(seg) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let (bx, by) = bucket_of(&head);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(keys) = self.endpoint_buckets.get(&(bx + dx, by + dy)) else {
                    continue;
                };
                for &key in keys {
                    if key == seg.key {
                        continue;
                    }
                    let Some(rec) = self.segments.get(key) else {
                        continue;
                    };
                    if points_coincide(&rec.a, &head) {
                        out.push(DirectedSegment {
                            key,
                            reversed: false,
                        });
                    }
                    if points_coincide(&rec.b, &head) {
                        out.push(DirectedSegment {
                            key,
                            reversed: true,
                        });
                    }
                }
            }
        }
        out
    }

    /// Whether two segments belong to the same connected network,
    /// following shared endpoints in both directions. Stale keys are
    /// never connected to anything.
    #[must_use]
    pub fn same_network(&self, a: SegmentKey, b: SegmentKey) -> bool {
        if !self.segments.contains_key(a) || !self.segments.contains_key(b) {
            return false;
        }
        if a == b {
            return true;
        }
        let mut seen: AHashSet<SegmentKey> = AHashSet::new();
        seen.insert(a);
        let start = DirectedSegment::forward(a);
        let mut frontier = vec![start, start.reverse()];
        while let Some(seg) = frontier.pop() {
            for next in self.neighbors(seg) {
                if next.key == b {
                    return true;
                }
                if seen.insert(next.key) {
                    frontier.push(next);
                    frontier.push(next.reverse());
                }
            }
        }
        false
    }

    /// Route-graph edge weight: the centerline length of the segment
    /// being entered. Always non-negative.
    #[must_use]
    pub fn weight(&self, _from: DirectedSegment, to: DirectedSegment) -> f64 {
        self.segments.get(to.key).map_or(f64::INFINITY, SegmentRecord::length)
    }

    /// Number of segments in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Call-count probe: how many nearest-segment queries have run.
    /// Used by cache-idempotence tests to observe recomputation.
    #[must_use]
    pub fn nearest_queries(&self) -> u64 {
        self.nearest_queries.get()
    }
}

impl crate::route::RouteGraph for SegmentRegistry {
    type Node = DirectedSegment;

    fn neighbors(&self, node: DirectedSegment) -> Vec<DirectedSegment> {
        Self::neighbors(self, node)
    }

    fn weight(&self, from: DirectedSegment, to: DirectedSegment) -> f64 {
        Self::weight(self, from, to)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn bucket_of(p: &Point2) -> (i64, i64) {
    ((p.x / BUCKET).round() as i64, (p.y / BUCKET).round() as i64)
}
