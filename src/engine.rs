//! Interactive facade over resolution, stitching, offsetting and
//! composition.
//!
//! The engine owns the memoization layers. Every expensive stage is
//! keyed by a content fingerprint of its inputs, so a drag of the live
//! anchor recomputes only the final subpath while the finalized prefix
//! is served from cache.

use tracing::debug;

use crate::anchor::chain::AnchorChain;
use crate::anchor::resolver::{self, Anchor, ResolverConfig};
use crate::cache::{Fingerprint, FingerprintBuilder, MemoCache};
use crate::error::{GeometryError, Result};
use crate::math::polyline_2d::dedup_consecutive;
use crate::math::Point2;
use crate::network::{SegmentKey, SegmentRegistry};
use crate::offset::{compose, OffsetField, PointSetFamily};
use crate::path::{joint, split_toward, stitch_with_routes, ResolvedPath, RouteTable, StitchConfig};
use crate::route;

/// Engine-wide behavior flags, one sub-config per stage.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,
    pub stitch: StitchConfig,
}

/// The interactive offset-path engine.
///
/// Construction takes a populated [`SegmentRegistry`]; the engine never
/// mutates the network. All chain operations are pure, so callers hold
/// whatever chain history they need for undo.
#[derive(Debug)]
pub struct OffsetEngine {
    registry: SegmentRegistry,
    config: EngineConfig,
    subpaths: MemoCache<ResolvedPath>,
    fields: MemoCache<OffsetField>,
    families: MemoCache<PointSetFamily>,
    routes: RouteTable,
    stitch_count: u64,
}

impl OffsetEngine {
    #[must_use]
    pub fn new(registry: SegmentRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            subpaths: MemoCache::new(),
            fields: MemoCache::new(),
            families: MemoCache::new(),
            routes: RouteTable::new(),
            stitch_count: 0,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }

    /// Resolves a cursor position into an anchor under the engine's
    /// resolver config.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::ConfigError`] from the resolver.
    pub fn resolve_anchor(
        &self,
        cursor: &Point2,
        scope: Option<SegmentKey>,
        locked: Option<&Anchor>,
    ) -> Result<Option<Anchor>> {
        resolver::resolve(
            &self.registry,
            cursor,
            scope,
            locked.map(|a| &a.pair),
            &self.config.resolver,
        )
    }

    /// Commits a pick into a new chain state.
    ///
    /// A resolvable cursor appends (or replaces, per the chain's rules) a
    /// finalized anchor. Once a chain is anchored, its home segment's
    /// network is preferred: a pick resolving onto a disconnected network
    /// is re-resolved against the home segment instead, unless
    /// `allow_network_switch` is set. An unresolvable cursor becomes a
    /// free point when the resolver config allows them, and is otherwise
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::ConfigError`] from the resolver.
    pub fn commit_pick(
        &self,
        chain: &AnchorChain,
        cursor: &Point2,
        locked: Option<&Anchor>,
    ) -> Result<AnchorChain> {
        let mut resolved = self.resolve_anchor(cursor, None, locked)?;
        if !self.config.resolver.allow_network_switch {
            if let Some(home) = chain.home_segment() {
                let off_home = resolved
                    .as_ref()
                    .and_then(|a| a.pair.segment())
                    .is_some_and(|seg| !self.registry.same_network(home, seg.key));
                if off_home {
                    resolved = self.resolve_anchor(cursor, Some(home), locked)?;
                }
            }
        }
        match resolved {
            Some(anchor) => Ok(chain
                .append(anchor.finalized(), locked.is_some())),
            None if self.config.resolver.allow_free_points => Ok(chain.push_free_point(*cursor)),
            None => Ok(chain.clone()),
        }
    }

    /// Batch-solves routes between the finalized anchors' segments so
    /// later stitches hit the warm table instead of re-running the
    /// solver. A no-op below three finalized anchors, where single-pair
    /// solves are cheaper than the batch.
    pub fn warm_routes(&mut self, chain: &AnchorChain) {
        let nodes: Vec<_> = chain
            .anchors()
            .iter()
            .filter(|a| a.finalized)
            .filter_map(|a| a.pair.segment())
            .flat_map(|seg| [seg, seg.reverse()])
            .collect();
        if nodes.len() < 6 {
            return;
        }
        let solved = route::solve_all(&self.registry, &nodes);
        debug!(routes = solved.len(), "route table warmed");
        self.routes.extend(solved);
    }

    /// Stitches the full path for a chain of at least two anchors.
    ///
    /// Per-anchor-pair subpaths are memoized by the pair's content
    /// fingerprint; only pairs whose anchors actually changed are
    /// recomputed. Trailing free points extend the path with straight
    /// connectors.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for chains of fewer than two
    /// anchors and propagates stitching failures.
    pub fn resolve_path(&mut self, chain: &AnchorChain) -> Result<ResolvedPath> {
        let anchors = chain.anchors();
        if anchors.len() < 2 {
            return Err(GeometryError::Degenerate(
                "a path needs at least two anchors".to_owned(),
            )
            .into());
        }

        let registry = &self.registry;
        let stitch_config = &self.config.stitch;
        let routes = &self.routes;
        let mut computed = 0_u64;

        let mut points: Vec<Point2> = Vec::new();
        for pair in anchors.windows(2) {
            let key = pair_fingerprint(&pair[0], &pair[1]);
            let subpath = self.subpaths.try_get_or_insert_with(key, || {
                computed += 1;
                stitch_with_routes(registry, &pair[0], &pair[1], stitch_config, Some(routes))
            })?;
            points.extend_from_slice(&subpath.points);
        }
        points.extend_from_slice(chain.free_points());
        self.stitch_count += computed;

        let points = dedup_consecutive(&points);
        let sharp_turns = joint::sharp_turn_indices(&points);
        debug!(
            vertices = points.len(),
            recomputed = computed,
            "path resolved"
        );
        Ok(ResolvedPath {
            points,
            sharp_turns,
        })
    }

    /// Path preview for any chain state: a lone anchor splits its
    /// reference pair toward the cursor, two or more anchors stitch
    /// normally.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for an empty chain.
    pub fn preview_path(&mut self, chain: &AnchorChain, cursor: &Point2) -> Result<ResolvedPath> {
        match chain.anchors() {
            [] => Err(GeometryError::Degenerate("empty chain".to_owned()).into()),
            [only] => split_toward(only, cursor),
            _ => self.resolve_path(chain),
        }
    }

    /// The offset field for a chain's path, interpolating the first
    /// anchor's offset into the last anchor's.
    ///
    /// # Errors
    ///
    /// Propagates path resolution and field computation failures.
    pub fn offset_field(&mut self, chain: &AnchorChain) -> Result<(ResolvedPath, OffsetField)> {
        let path = self.resolve_path(chain)?;
        let anchors = chain.anchors();
        // resolve_path guarantees at least two anchors.
        let start = anchors[0].offset;
        let end = anchors[anchors.len() - 1].offset;

        let mut key = FingerprintBuilder::new();
        key.write_u64(path.fingerprint());
        key.write_vector(&start);
        key.write_vector(&end);
        let field = self
            .fields
            .try_get_or_insert_with(key.finish(), || OffsetField::compute(&path, &start, &end))?
            .clone();
        Ok((path, field))
    }

    /// The drawn curve itself: path vertices displaced by the offset
    /// field.
    ///
    /// # Errors
    ///
    /// Propagates path resolution and field computation failures.
    pub fn offset_curve(&mut self, chain: &AnchorChain) -> Result<Vec<Point2>> {
        let (path, field) = self.offset_field(chain)?;
        Ok(field.apply(&path))
    }

    /// Named parallel point sets for a chain under a signed-distance
    /// schema.
    ///
    /// # Errors
    ///
    /// Propagates path, field, and composition failures.
    pub fn point_sets(
        &mut self,
        chain: &AnchorChain,
        schema: &[(String, f64)],
    ) -> Result<PointSetFamily> {
        let (path, field) = self.offset_field(chain)?;

        let mut key = FingerprintBuilder::new();
        key.write_u64(path.fingerprint());
        key.write_u64(fingerprint_field(&field));
        key.write_u64(schema.len() as u64);
        for (name, distance) in schema {
            key.write_str(name);
            key.write_f64(*distance);
        }
        let family = self
            .families
            .try_get_or_insert_with(key.finish(), || compose(&path, &field, schema))?
            .clone();
        Ok(family)
    }

    /// Whether the chain currently yields a path worth drawing: two or
    /// more anchors, a solvable path, and an arc length above the
    /// configured minimum.
    pub fn is_drawable(&mut self, chain: &AnchorChain) -> bool {
        if chain.len() < 2 {
            return false;
        }
        self.resolve_path(chain)
            .is_ok_and(|path| path.arc_length() >= self.config.stitch.min_path_length)
    }

    /// Probe: how many anchor-pair subpaths have been stitched from
    /// scratch. Cache hits do not advance it.
    #[must_use]
    pub fn path_computations(&self) -> u64 {
        self.stitch_count
    }

    /// Drops every memoized result, forcing recomputation. Needed after
    /// the caller rebuilds the network.
    pub fn clear_caches(&mut self) {
        self.subpaths.clear();
        self.fields.clear();
        self.families.clear();
        self.routes.clear();
    }
}

fn pair_fingerprint(a: &Anchor, b: &Anchor) -> Fingerprint {
    let mut fp = FingerprintBuilder::new();
    fp.write_u64(a.fingerprint());
    fp.write_u64(b.fingerprint());
    fp.finish()
}

fn fingerprint_field(field: &OffsetField) -> Fingerprint {
    let mut fp = FingerprintBuilder::new();
    fp.write_u64(field.offsets().len() as u64);
    for off in field.offsets() {
        fp.write_vector(off);
    }
    fp.finish()
}
