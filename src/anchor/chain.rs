use crate::cache::{Fingerprint, FingerprintBuilder};
use crate::math::Point2;
use crate::network::SegmentKey;

use super::resolver::Anchor;

/// An ordered sequence of anchors plus an optional trailing run of
/// unassociated free points.
///
/// The chain is an immutable value: `append`, `finalize_last`, `retract`
/// and `push_free_point` are pure functions returning a new chain, never
/// mutating in place. Invariant: at most the *last* anchor is
/// non-finalized; everything earlier is immutable and its contribution to
/// the path is served from cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorChain {
    anchors: Vec<Anchor>,
    free_points: Vec<Point2>,
}

impl AnchorChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    #[must_use]
    pub fn free_points(&self) -> &[Point2] {
        &self.free_points
    }

    #[must_use]
    pub fn last(&self) -> Option<&Anchor> {
        self.anchors.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// The segment the chain is anchored to, used as the resolution scope
    /// hint that keeps a chain from jumping networks mid-draw.
    #[must_use]
    pub fn home_segment(&self) -> Option<SegmentKey> {
        self.anchors
            .first()
            .and_then(|a| a.pair.segment())
            .map(|seg| seg.key)
    }

    /// Returns a new chain with `anchor` appended.
    ///
    /// Replacement rules, in order:
    /// 1. A non-finalized last anchor is always superseded (it is the
    ///    live cursor anchor being re-resolved this frame).
    /// 2. An anchor resolving to the same reference pair as the finalized
    ///    last anchor replaces it — dedup-by-reference-pair — unless
    ///    `locked` requests an explicit extension.
    /// 3. Otherwise the anchor extends the chain.
    #[must_use]
    pub fn append(&self, anchor: Anchor, locked: bool) -> Self {
        let mut anchors = self.anchors.clone();
        match anchors.last() {
            Some(last) if !last.finalized => {
                anchors.pop();
            }
            Some(last) if !locked && last.pair.same_reference(&anchor.pair) => {
                anchors.pop();
            }
            _ => {}
        }
        anchors.push(anchor);
        Self {
            anchors,
            free_points: self.free_points.clone(),
        }
    }

    /// Returns a new chain with the last anchor finalized (click commit).
    #[must_use]
    pub fn finalize_last(&self) -> Self {
        let mut anchors = self.anchors.clone();
        if let Some(last) = anchors.pop() {
            anchors.push(last.finalized());
        }
        Self {
            anchors,
            free_points: self.free_points.clone(),
        }
    }

    /// Returns a new chain with the last anchor removed (escape).
    #[must_use]
    pub fn retract(&self) -> Self {
        let mut anchors = self.anchors.clone();
        anchors.pop();
        Self {
            anchors,
            free_points: self.free_points.clone(),
        }
    }

    /// Returns a new chain with an off-network free point appended to the
    /// trailing run.
    #[must_use]
    pub fn push_free_point(&self, point: Point2) -> Self {
        let mut free_points = self.free_points.clone();
        free_points.push(point);
        Self {
            anchors: self.anchors.clone(),
            free_points,
        }
    }

    /// Content fingerprint over every anchor and free point.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut fp = FingerprintBuilder::new();
        fp.write_u64(self.anchors.len() as u64);
        for anchor in &self.anchors {
            fp.write_u64(anchor.fingerprint());
        }
        fp.write_points(&self.free_points);
        fp.finish()
    }
}
