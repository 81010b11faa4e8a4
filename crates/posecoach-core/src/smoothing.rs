//! Smoothing and gap-imputation for `Option<f64>`-gapped time series
//!.
//!
//! Adapted from the moving-average/median helpers used for camera-keyframe
//! smoothing, generalized to tolerate missing samples: a gap never
//! contaminates a neighboring valid run.

/// Apply a symmetric moving-average filter of the given window width to a
/// gapped series. Only present samples are smoothed: a gap at index `i`
/// (`data[i].is_none()`) is left as `None` and stays `None` in the output,
/// so gap-filling is exclusively `impute_gaps`'s job. At a present index,
/// the average is taken over the `Some` values within `[i-pad, i+pad]`.
///
/// Window should be odd; an even window is widened by one to stay symmetric.
pub fn moving_average_gapped(data: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if data.is_empty() || window <= 1 {
        return data.to_vec();
    }
    let window = if window % 2 == 0 { window + 1 } else { window };
    let pad = window / 2;

    (0..data.len())
        .map(|i| {
            data[i]?;
            let start = i.saturating_sub(pad);
            let end = (i + pad + 1).min(data.len());
            let slice = &data[start..end];
            let (sum, count) = slice
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 {
                None
            } else {
                Some(sum / count as f64)
            }
        })
        .collect()
}

/// Linearly interpolate gaps of length ≤ `max_gap` samples bounded by two
/// present values. Gaps at the series boundary (no present value on one
/// side) and gaps longer than `max_gap` are left as `None`.
pub fn impute_gaps(data: &[Option<f64>], max_gap: usize) -> Vec<Option<f64>> {
    let mut out = data.to_vec();
    let n = out.len();
    let mut i = 0;
    while i < n {
        if out[i].is_some() {
            i += 1;
            continue;
        }
        let gap_start = i;
        let mut j = i;
        while j < n && out[j].is_none() {
            j += 1;
        }
        let gap_len = j - gap_start;
        let left = if gap_start > 0 { out[gap_start - 1] } else { None };
        let right = if j < n { out[j] } else { None };

        if gap_len <= max_gap {
            if let (Some(lv), Some(rv)) = (left, right) {
                for (k, slot) in out[gap_start..j].iter_mut().enumerate() {
                    let t = (k + 1) as f64 / (gap_len + 1) as f64;
                    *slot = Some(lv + (rv - lv) * t);
                }
            }
        }
        i = j;
    }
    out
}

/// Mean of the present values, ignoring gaps. `0.0` for an all-missing slice.
pub fn mean_present(values: &[Option<f64>]) -> f64 {
    let (sum, count) = values.iter().flatten().fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_leaves_gaps_as_none() {
        let data = vec![Some(1.0), None, Some(3.0), Some(5.0), None];
        let smoothed = moving_average_gapped(&data, 3);
        // Gaps are left for impute_gaps to fill, not silently averaged over.
        assert_eq!(smoothed[1], None);
        assert_eq!(smoothed[4], None);
        // index 0's window is [0,1] = {1.0} (index 1 is a gap) -> 1.0
        assert!((smoothed[0].unwrap() - 1.0).abs() < 1e-9);
        // index 2's window is [1,3] = {3.0, 5.0} (index 1 is a gap) -> 4.0
        assert!((smoothed[2].unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn impute_fills_short_gap_only() {
        let data = vec![Some(0.0), None, None, Some(6.0), None, None, None, None, Some(100.0)];
        let out = impute_gaps(&data, 3);
        assert_eq!(out[1], Some(2.0));
        assert_eq!(out[2], Some(4.0));
        // gap of length 4 exceeds max_gap=3, left untouched
        assert_eq!(out[4], None);
        assert_eq!(out[7], None);
    }

    #[test]
    fn leading_gap_with_no_left_neighbor_stays_missing() {
        let data = vec![None, None, Some(1.0)];
        let out = impute_gaps(&data, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
    }

    #[test]
    fn all_missing_mean_is_zero() {
        assert_eq!(mean_present(&[None, None]), 0.0);
    }
}
