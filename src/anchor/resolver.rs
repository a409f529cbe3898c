use crate::cache::{Fingerprint, FingerprintBuilder};
use crate::error::{ConfigError, Result};
use crate::math::{Point2, Vector2};
use crate::network::{DirectedSegment, SegmentKey, SegmentRegistry};

use super::reference::ReferencePair;

/// A user-picked position resolved against the network: a reference pair,
/// a fraction along it, and a perpendicular offset from it.
///
/// While `finalized` is `false` the anchor tracks the live cursor and is
/// replaced frame by frame; once finalized its fields are immutable and
/// its contribution to the path is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub pair: ReferencePair,
    /// Arc-length fraction in `[0, 1]` along the reference pair.
    pub fraction: f64,
    /// Vector from the on-pair point to the picked position.
    pub offset: Vector2,
    pub finalized: bool,
}

impl Anchor {
    #[must_use]
    pub fn new(pair: ReferencePair, fraction: f64, offset: Vector2) -> Self {
        Self {
            pair,
            fraction,
            offset,
            finalized: false,
        }
    }

    /// The point on the reference pair itself.
    #[must_use]
    pub fn base_point(&self) -> Point2 {
        self.pair.point_at(self.fraction)
    }

    /// The exact picked position: base point plus perpendicular offset.
    #[must_use]
    pub fn position(&self) -> Point2 {
        self.base_point() + self.offset
    }

    /// Marks the anchor immutable.
    #[must_use]
    pub fn finalized(mut self) -> Self {
        self.finalized = true;
        self
    }

    /// Replaces the live offset (numeric entry, directional nudge).
    /// Only valid on the non-finalized anchor.
    #[must_use]
    pub fn with_offset(mut self, offset: Vector2) -> Self {
        debug_assert!(!self.finalized, "finalized anchors are immutable");
        self.offset = offset;
        self
    }

    /// Replaces the live fraction. Only valid on the non-finalized anchor.
    #[must_use]
    pub fn with_fraction(mut self, fraction: f64) -> Self {
        debug_assert!(!self.finalized, "finalized anchors are immutable");
        self.fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Content fingerprint of everything that affects this anchor's
    /// contribution to a resolved path.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut fp = FingerprintBuilder::new();
        fp.write_u64(self.pair.fingerprint());
        fp.write_f64(self.fraction);
        fp.write_vector(&self.offset);
        fp.finish()
    }
}

/// Per-tool behavior flags for anchor resolution.
///
/// A plain value object passed into [`resolve`]; every flag has a
/// documented default.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Only boundary edges are eligible; the centerline is excluded.
    /// Default `false`.
    pub edges_only: bool,
    /// Only the centerline is eligible; boundaries are excluded.
    /// Default `false`.
    pub centerline_only: bool,
    /// Permit free points off the network (consumed by the chain layer).
    /// Default `false`.
    pub allow_free_points: bool,
    /// Permit a chain to continue on a network disconnected from its
    /// home segment (consumed by the engine's pick commit). Default
    /// `false`: picks off the home network fall back to the home
    /// segment, and land nowhere when it is out of reach.
    pub allow_network_switch: bool,
    /// Maximum cursor distance for a hover to resolve. Default `5.0`.
    pub hover_radius: f64,
    /// Keep the perpendicular cursor offset; when `false` the offset is
    /// snapped to zero. Default `true`.
    pub offset_allowed: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            edges_only: false,
            centerline_only: false,
            allow_free_points: false,
            allow_network_switch: false,
            hover_radius: 5.0,
            offset_allowed: true,
        }
    }
}

/// Resolves a raw cursor position into an [`Anchor`].
///
/// `scope` restricts resolution to one segment (preventing topology jumps
/// while a chain is underway); `locked` forces the same candidate slot as
/// a previous anchor (drag / modifier hold).
///
/// `Ok(None)` — nothing eligible near the cursor this frame — is a
/// normal, frequent outcome, not an error.
///
/// # Errors
///
/// Returns [`ConfigError::Unsupported`] when the flags are contradictory
/// or demand candidates the hovered segment cannot supply (for example
/// `edges_only` over a segment with no boundaries).
pub fn resolve(
    registry: &SegmentRegistry,
    cursor: &Point2,
    scope: Option<SegmentKey>,
    locked: Option<&ReferencePair>,
    config: &ResolverConfig,
) -> Result<Option<Anchor>> {
    if config.edges_only && config.centerline_only {
        return Err(ConfigError::Unsupported(
            "edges_only and centerline_only are mutually exclusive".to_owned(),
        )
        .into());
    }

    let Some(key) = scope.or_else(|| registry.nearest_segment(cursor)) else {
        return Ok(None);
    };
    let seg = DirectedSegment::forward(key);

    let mut candidates: Vec<ReferencePair> = Vec::with_capacity(3);
    if !config.edges_only {
        candidates.extend(ReferencePair::centerline(registry, seg));
    }
    if !config.centerline_only {
        candidates.extend(ReferencePair::from_slot(registry, seg, 1));
        candidates.extend(ReferencePair::from_slot(registry, seg, 2));
    }

    if candidates.is_empty() {
        if config.edges_only {
            return Err(ConfigError::Unsupported(
                "edge-only selection over a segment with no boundaries".to_owned(),
            )
            .into());
        }
        return Ok(None);
    }

    let chosen = match locked.and_then(ReferencePair::slot) {
        // Drag lock: force the same slot as the previous anchor instead
        // of the nearest candidate. No matching slot on this segment
        // means no valid anchor this frame.
        Some(slot) => {
            let Some(pair) = candidates
                .into_iter()
                .find(|c| c.slot() == Some(slot))
            else {
                return Ok(None);
            };
            pair
        }
        None => {
            let Some(pair) = candidates.into_iter().min_by(|a, b| {
                a.distance_to(cursor).total_cmp(&b.distance_to(cursor))
            }) else {
                return Ok(None);
            };
            pair
        }
    };

    let fraction = chosen.closest_fraction(cursor);
    let base = chosen.point_at(fraction);
    let offset = cursor - base;

    if offset.norm() > config.hover_radius {
        return Ok(None);
    }

    let offset = if config.offset_allowed {
        offset
    } else {
        Vector2::zeros()
    };

    Ok(Some(Anchor::new(chosen, fraction, offset)))
}
