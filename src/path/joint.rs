use crate::error::{InvariantError, Result};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::polyline_2d::{dedup_consecutive, turn_angle};
use crate::math::{points_coincide, Point2};

/// Direction changes above ~30° (joint interior angle below ~150°) count
/// as sharp.
const SHARP_TURN_RAD: f64 = std::f64::consts::FRAC_PI_6;

/// Chains a sequence of point runs into one gap-free polyline.
///
/// Consecutive runs that share an exact endpoint are concatenated without
/// duplicating the shared point. Runs that do not meet are joined at the
/// line-line intersection of their facing end segments when that
/// intersection falls within both segments (trimming an inward crossing),
/// otherwise by a direct connector between the nearest endpoints.
///
/// The result never contains two consecutive points equal within
/// tolerance.
///
/// # Errors
///
/// Returns [`InvariantError::DuplicatePoints`] if deduplication fails to
/// hold — a programming error, not a data condition.
pub fn stitch_runs(runs: &[Vec<Point2>]) -> Result<Vec<Point2>> {
    let mut points: Vec<Point2> = Vec::new();

    for run in runs {
        if run.is_empty() {
            continue;
        }
        if points.is_empty() {
            points.extend_from_slice(run);
            continue;
        }
        join_runs(&mut points, run);
    }

    let points = dedup_consecutive(&points);
    verify_no_duplicates(&points)?;
    Ok(points)
}

/// Appends `next` to `points`, smoothing the joint between them.
fn join_runs(points: &mut Vec<Point2>, next: &[Point2]) {
    let prev_end = points[points.len() - 1];
    let next_start = next[0];

    if points_coincide(&prev_end, &next_start) {
        points.extend_from_slice(&next[1..]);
        return;
    }

    // Gap between the runs: try to close it where the facing end
    // segments cross. An intersection outside either segment would
    // extend the path instead of closing it, so only bounded hits count.
    if points.len() >= 2 && next.len() >= 2 {
        let p0 = points[points.len() - 2];
        let p1 = prev_end;
        if let Some((corner, _, _)) = segment_segment_intersect_2d(&p0, &p1, &next_start, &next[1])
        {
            points.pop();
            if !points.last().is_some_and(|p| points_coincide(p, &corner)) {
                points.push(corner);
            }
            points.extend_from_slice(&next[1..]);
            return;
        }
    }

    // Direct connector: keep both endpoints; the straight segment between
    // them closes the gap.
    points.extend_from_slice(next);
}

/// Indices of interior vertices where the path turns sharply.
#[must_use]
pub fn sharp_turn_indices(points: &[Point2]) -> Vec<usize> {
    let mut sharp = Vec::new();
    for i in 1..points.len().saturating_sub(1) {
        let angle = turn_angle(&points[i - 1], &points[i], &points[i + 1]);
        if angle.abs() > SHARP_TURN_RAD {
            sharp.push(i);
        }
    }
    sharp
}

fn verify_no_duplicates(points: &[Point2]) -> Result<()> {
    for (i, w) in points.windows(2).enumerate() {
        if points_coincide(&w[0], &w[1]) {
            return Err(InvariantError::DuplicatePoints(i + 1).into());
        }
    }
    Ok(())
}
