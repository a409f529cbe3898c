use crate::error::{GeometryError, InvariantError, Result};
use crate::math::polyline_2d::{cumulative_fractions, left_normal, segment_direction};
use crate::math::{points_coincide, Point2, Vector2, TOLERANCE};
use crate::path::ResolvedPath;

/// Corner displacements are capped at this multiple of the nominal
/// offset magnitude.
const MITER_LIMIT: f64 = 4.0;

/// Per-vertex perpendicular displacements along a resolved path.
///
/// The field interpolates the start anchor's offset into the end
/// anchor's by arc-length fraction. The rotation side is fixed once from
/// the first anchor and never flips mid-path. Extreme vertices carry the
/// anchors' own offsets exactly, bit for bit.
///
/// What interpolates monotonically is the perpendicular distance to the
/// path legs. At the path's recorded sharp turns the basis is
/// miter-scaled (capped at four times the nominal magnitude) to hold
/// that distance to both legs, so the offset *vector* norm may locally
/// exceed the interpolated value there.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetField {
    offsets: Vec<Vector2>,
    /// Perpendicular per vertex, sign-resolved; unit length except at
    /// the path's sharp turns, where it is miter-scaled. Shared by every
    /// curve derived at a signed distance from the path.
    basis: Vec<Vector2>,
    rotation_sign: f64,
}

impl OffsetField {
    /// Computes the field for a path between two anchor offsets.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::DuplicatePoints`] if the path carries
    /// consecutive duplicate vertices, [`InvariantError::ZeroOffsetBasis`]
    /// if the path reverses onto itself at a vertex, and
    /// [`GeometryError::Degenerate`] for paths of fewer than two points.
    pub fn compute(
        path: &ResolvedPath,
        start_offset: &Vector2,
        end_offset: &Vector2,
    ) -> Result<Self> {
        let points = &path.points;
        let n = points.len();
        if n < 2 {
            return Err(GeometryError::Degenerate(
                "offset field needs at least two path points".to_owned(),
            )
            .into());
        }
        for (i, w) in points.windows(2).enumerate() {
            if points_coincide(&w[0], &w[1]) {
                return Err(InvariantError::DuplicatePoints(i + 1).into());
            }
        }

        let first_dir = segment_direction(&points[0], &points[1])?;
        let last_dir = segment_direction(&points[n - 2], &points[n - 1])?;
        let rotation_sign = rotation_sign(&first_dir, start_offset)
            .or_else(|| rotation_sign(&last_dir, end_offset))
            .unwrap_or(1.0);

        let mut basis = Vec::with_capacity(n);
        basis.push(left_normal(&first_dir) * rotation_sign);
        for i in 1..n - 1 {
            let d_in = segment_direction(&points[i - 1], &points[i])?;
            let d_out = segment_direction(&points[i], &points[i + 1])?;
            let avg = d_in + d_out;
            let len = avg.norm();
            if len < TOLERANCE {
                // The path doubles back on itself: no perpendicular exists.
                return Err(InvariantError::ZeroOffsetBasis(i).into());
            }
            // Half the sum of two unit vectors is cos of the half-angle
            // between them; scaling by its inverse keeps the displaced
            // vertex at constant distance from both legs. Shallow joints
            // skip the scaling and take the plain bisector normal.
            let scale = if path.sharp_turns.contains(&i) {
                let cos_half = len / 2.0;
                (1.0 / cos_half).min(MITER_LIMIT)
            } else {
                1.0
            };
            basis.push(left_normal(&(avg / len)) * rotation_sign * scale);
        }
        basis.push(left_normal(&last_dir) * rotation_sign);

        let l1 = start_offset.norm();
        let l2 = end_offset.norm();
        let fractions = cumulative_fractions(points);

        let mut offsets = Vec::with_capacity(n);
        offsets.push(*start_offset);
        for i in 1..n - 1 {
            let magnitude = l1 + (l2 - l1) * fractions[i];
            offsets.push(basis[i] * magnitude);
        }
        offsets.push(*end_offset);

        Ok(Self {
            offsets,
            basis,
            rotation_sign,
        })
    }

    /// Displaces every path vertex by its offset: the center curve.
    #[must_use]
    pub fn apply(&self, path: &ResolvedPath) -> Vec<Point2> {
        path.points
            .iter()
            .zip(self.offsets.iter())
            .map(|(p, off)| p + off)
            .collect()
    }

    #[must_use]
    pub fn offsets(&self) -> &[Vector2] {
        &self.offsets
    }

    #[must_use]
    pub fn basis(&self) -> &[Vector2] {
        &self.basis
    }

    /// `+1.0` when the field sits on the left of the path direction,
    /// `-1.0` on the right.
    #[must_use]
    pub fn rotation_sign(&self) -> f64 {
        self.rotation_sign
    }
}

/// Side of the path an offset vector points to, relative to a direction.
/// `None` when the offset is too small to tell.
fn rotation_sign(dir: &Vector2, offset: &Vector2) -> Option<f64> {
    if offset.norm() < TOLERANCE {
        return None;
    }
    let cross = dir.x * offset.y - dir.y * offset.x;
    Some(if cross >= 0.0 { 1.0 } else { -1.0 })
}
