use ahash::AHashMap;

use crate::error::{ConfigError, Result};
use crate::math::polyline_2d::turn_angle;
use crate::math::Point2;
use crate::path::ResolvedPath;

use super::field::OffsetField;

/// A family of parallel point sets derived from one offset curve.
///
/// Every set has exactly as many vertices as the path, displaced along
/// the shared per-vertex basis, so sets never drift out of step with one
/// another.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSetFamily {
    /// Name of the reference curve the others were derived from, `None`
    /// for an empty schema.
    pub reference: Option<String>,
    pub sets: AHashMap<String, Vec<Point2>>,
}

/// Derives named parallel curves from a path, its offset field, and a
/// schema of `(name, signed distance)` entries.
///
/// Positive distances displace along the field basis, negative against
/// it. The reference curve is the entry furthest toward the inside of
/// the path's dominant turn; ties go to the larger magnitude, then the
/// lexicographically smaller name. All other curves are derived from the
/// reference by displacing along the same basis, so shared vertices stay
/// shared.
///
/// # Errors
///
/// Returns [`ConfigError::Unsupported`] for schemas with duplicate names.
pub fn compose(
    path: &ResolvedPath,
    field: &OffsetField,
    schema: &[(String, f64)],
) -> Result<PointSetFamily> {
    if schema.is_empty() {
        return Ok(PointSetFamily {
            reference: None,
            sets: AHashMap::new(),
        });
    }
    for (i, (name, _)) in schema.iter().enumerate() {
        if schema[..i].iter().any(|(other, _)| other == name) {
            return Err(ConfigError::Unsupported(format!(
                "duplicate point-set name {name:?}"
            ))
            .into());
        }
    }

    let center = field.apply(path);
    let basis = field.basis();

    let inner_sign = inner_distance_sign(path, field);
    // Unwrap-free: the schema is non-empty and the ranking is total.
    let mut reference = &schema[0];
    for entry in &schema[1..] {
        if ranks_higher(entry, reference, inner_sign) {
            reference = entry;
        }
    }

    let reference_points: Vec<Point2> = center
        .iter()
        .zip(basis.iter())
        .map(|(p, b)| p + b * reference.1)
        .collect();

    let mut sets = AHashMap::with_capacity(schema.len());
    for (name, distance) in schema {
        let delta = distance - reference.1;
        let points = reference_points
            .iter()
            .zip(basis.iter())
            .map(|(p, b)| p + b * delta)
            .collect();
        sets.insert(name.clone(), points);
    }

    Ok(PointSetFamily {
        reference: Some(reference.0.clone()),
        sets,
    })
}

/// Sign of schema distances pointing toward the inside of the path's
/// dominant turn. Straight paths count as left-turning.
fn inner_distance_sign(path: &ResolvedPath, field: &OffsetField) -> f64 {
    let points = &path.points;
    let turn_sum: f64 = (1..points.len().saturating_sub(1))
        .map(|i| turn_angle(&points[i - 1], &points[i], &points[i + 1]))
        .sum();
    let turn_side = if turn_sum >= 0.0 { 1.0 } else { -1.0 };
    turn_side * field.rotation_sign()
}

/// Reference-curve ranking: furthest inside, then largest magnitude,
/// then smallest name.
fn ranks_higher(entry: &(String, f64), best: &(String, f64), inner_sign: f64) -> bool {
    let a = entry.1 * inner_sign;
    let b = best.1 * inner_sign;
    if (a - b).abs() > f64::EPSILON {
        return a > b;
    }
    let ma = entry.1.abs();
    let mb = best.1.abs();
    if (ma - mb).abs() > f64::EPSILON {
        return ma > mb;
    }
    entry.0 < best.0
}
