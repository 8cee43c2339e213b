//! Small numeric helpers shared by the cross-sectional stages.

/// Division that yields `None` instead of dividing by zero or a
/// non-finite denominator. This is the single implementation of the
/// guarded-division policy: a ratio with an empty denominator is null,
/// never a crash.
#[must_use]
pub fn guarded_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Guarded percentage ratio: numerator / denominator × 100.
#[must_use]
pub fn guarded_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    guarded_div(numerator, denominator).map(|v| v * 100.0)
}

/// Median of a slice of values. Non-finite values are ignored; an empty
/// (or all-non-finite) slice has no median.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.partial_cmp(b).expect("finite values compare"));
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

/// Percentile ranks (0–100) for a cross-section of values.
///
/// Ranks are ordinal over a *stable* sort of the values, so exact ties are
/// broken by input position; this keeps the whole pipeline deterministic
/// for a given input snapshot. With a single value the rank is 50.
#[must_use]
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![50.0];
    }
    let mut order: Vec<usize> = (0..n).collect();
    // sort_by is stable: equal values keep input order
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut ranks = vec![0.0; n];
    for (position, &idx) in order.iter().enumerate() {
        ranks[idx] = position as f64 / (n - 1) as f64 * 100.0;
    }
    ranks
}

/// Mean over the present values; `None` when nothing is present.
#[must_use]
pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_is_null() {
        assert_eq!(guarded_div(1.0, 0.0), None);
        assert_eq!(guarded_div(1.0, f64::NAN), None);
        assert_eq!(guarded_div(3.0, 2.0), Some(1.5));
        assert_eq!(guarded_ratio(80.0, 100.0), Some(80.0));
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[f64::NAN]), None);
    }

    #[test]
    fn percentile_ranks_span_zero_to_hundred() {
        let ranks = percentile_ranks(&[10.0, 30.0, 20.0]);
        assert_eq!(ranks, vec![0.0, 100.0, 50.0]);
        assert_eq!(percentile_ranks(&[42.0]), vec![50.0]);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranks = percentile_ranks(&[5.0, 5.0, 5.0]);
        assert_eq!(ranks, vec![0.0, 50.0, 100.0]);
        // Deterministic: same input, same output
        assert_eq!(ranks, percentile_ranks(&[5.0, 5.0, 5.0]));
    }

    #[test]
    fn mean_skips_missing() {
        assert_eq!(mean_present(&[Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean_present(&[None, None]), None);
    }
}
