//! Order statistics and moments over pixel samples.

use std::cmp::Ordering;

/// Collect the finite values of `values`, sorted ascending.
pub fn sorted_finite<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut out: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Percentile `p` (0..=100) of an ascending slice, linearly interpolating
/// between the two closest ranks.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Arithmetic mean and population standard deviation (divisor `n`).
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    Some((mean, variance.sqrt()))
}

/// Smallest and largest finite value, if any.
pub fn finite_min_max<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&sorted, 50.0).unwrap(), 2.5);
        assert_relative_eq!(percentile(&sorted, 25.0).unwrap(), 1.75);
        assert_relative_eq!(percentile(&sorted, 75.0).unwrap(), 3.25);
        assert_relative_eq!(percentile(&sorted, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&sorted, 100.0).unwrap(), 4.0);
        assert!(percentile(&[], 50.0).is_none());
    }

    #[test]
    fn population_std() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(mean, 5.0);
        assert_relative_eq!(std, 2.0);
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let sorted = sorted_finite([3.0, f64::NAN, 1.0, f64::INFINITY]);
        assert_eq!(sorted, vec![1.0, 3.0]);
        assert_eq!(finite_min_max([f64::NAN, -2.0, 8.0]), Some((-2.0, 8.0)));
        assert_eq!(finite_min_max([f64::NAN]), None);
    }
}
