//! Interpolation engine for repairing invalidated field values
//!
//! Fills missing values in an ordered series from their nearest valid
//! neighbors. Row order must represent acquisition order. The engine is
//! deterministic: output depends only on the input series (and time axis),
//! never on randomness or the wall clock.
//!
//! Boundary policy: a gap with a valid neighbor on only one side copies that
//! neighbor's value (flat extrapolation). A series with no valid value at all
//! is returned unchanged; the caller decides whether that is fatal.

/// How gap positions are weighted when averaging the two neighbors
#[derive(Debug, Clone, Copy)]
pub enum InterpolationKind<'a> {
    /// Weight by row-position distance
    Linear,
    /// Weight by elapsed real time. Positions where the axis itself is
    /// missing fall back to row-position weighting.
    TimeWeighted { seconds: &'a [Option<f64>] },
}

/// Fill missing values in a series from neighboring valid values.
///
/// A missing value between two valid neighbors becomes their average,
/// weighted by distance along the interpolation axis. Leading and trailing
/// gaps copy the single available neighbor.
pub fn interpolate(series: &[Option<f64>], kind: InterpolationKind) -> Vec<Option<f64>> {
    let len = series.len();
    let mut filled: Vec<Option<f64>> = series.to_vec();

    // Nearest valid index at or before / at or after each position
    let mut prev_valid: Vec<Option<usize>> = vec![None; len];
    let mut next_valid: Vec<Option<usize>> = vec![None; len];

    let mut last = None;
    for i in 0..len {
        if series[i].is_some() {
            last = Some(i);
        }
        prev_valid[i] = last;
    }
    last = None;
    for i in (0..len).rev() {
        if series[i].is_some() {
            last = Some(i);
        }
        next_valid[i] = last;
    }

    for i in 0..len {
        if series[i].is_some() {
            continue;
        }
        filled[i] = match (prev_valid[i], next_valid[i]) {
            (Some(p), Some(n)) => Some(weighted_between(series, &kind, p, i, n)),
            (Some(p), None) => series[p],
            (None, Some(n)) => series[n],
            (None, None) => None,
        };
    }

    filled
}

/// Indices of positions still missing in a series
pub fn missing_indices(series: &[Option<f64>]) -> Vec<usize> {
    series
        .iter()
        .enumerate()
        .filter_map(|(index, value)| value.is_none().then_some(index))
        .collect()
}

fn weighted_between(
    series: &[Option<f64>],
    kind: &InterpolationKind,
    p: usize,
    i: usize,
    n: usize,
) -> f64 {
    let vp = series[p].unwrap_or_default();
    let vn = series[n].unwrap_or_default();

    let (ax_p, ax_i, ax_n) = axis_values(kind, p, i, n);
    let span = ax_n - ax_p;
    if span <= 0.0 {
        // Degenerate axis; split the difference
        return (vp + vn) / 2.0;
    }
    vp + (vn - vp) * (ax_i - ax_p) / span
}

fn axis_values(kind: &InterpolationKind, p: usize, i: usize, n: usize) -> (f64, f64, f64) {
    match kind {
        InterpolationKind::Linear => (p as f64, i as f64, n as f64),
        InterpolationKind::TimeWeighted { seconds } => {
            match (seconds[p], seconds[i], seconds[n]) {
                (Some(sp), Some(si), Some(sn)) => (sp, si, sn),
                // Axis has its own gaps; degrade to positional weighting
                _ => (p as f64, i as f64, n as f64),
            }
        }
    }
}
