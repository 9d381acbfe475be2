//! Vector utility functions: arange_with_endpoint(), sort_unique(), max_gap()

/// Returns the values `start, start + step, ...` below `stop`, with `stop`
/// appended when one more step lands exactly on it.
///
/// `arange_with_endpoint(0., 10., 2.5)` gives `[0, 2.5, 5, 7.5, 10]`, while
/// `arange_with_endpoint(0., 10., 3.)` gives `[0, 3, 6, 9]`.
/// If `start == stop` the result is `[start]`. A step that never reaches
/// `stop` (zero, wrong sign, NaN) gives an empty vector.
pub fn arange_with_endpoint(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if start == stop {
        return vec![start];
    }

    let count = ((stop - start) / step).ceil();
    if !count.is_finite() || count <= 0.0 {
        return Vec::new();
    }

    let mut values: Vec<f64> = (0..count as usize)
        .map(|i| start + i as f64 * step)
        .collect();

    if let Some(&last) = values.last()
        && last + step == stop
    {
        values.push(stop);
    }

    values
}

/// Returns a sorted copy of `values` where entries closer than `tol` to
/// their predecessor are dropped.
pub fn sort_unique(values: &[f64], tol: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup_by(|b, a| (*b - *a).abs() <= tol);
    sorted
}

/// Largest distance between neighbours of an ascending sequence.
///
/// Returns `None` when there are fewer than 2 values.
pub fn max_gap(sorted: &[f64]) -> Option<f64> {
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .max_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arange_quarter_steps() {
        let v = arange_with_endpoint(0., 10., 2.5);
        assert_eq!(v, vec![0., 2.5, 5., 7.5, 10.]);
    }

    #[test]
    fn test_arange_single_value() {
        assert_eq!(arange_with_endpoint(5., 5., 1.), vec![5.]);
        // Step is irrelevant when the interval is empty
        assert_eq!(arange_with_endpoint(5., 5., 0.), vec![5.]);
    }

    #[test]
    fn test_arange_endpoint_not_reached() {
        assert_eq!(arange_with_endpoint(0., 10., 3.), vec![0., 3., 6., 9.]);
    }

    #[test]
    fn test_arange_negative_start() {
        let v = arange_with_endpoint(-1., 3., 1.);
        assert_eq!(v, vec![-1., 0., 1., 2., 3.]);
    }

    #[test]
    fn test_arange_bad_step() {
        assert!(arange_with_endpoint(0., 10., 0.).is_empty());
        assert!(arange_with_endpoint(0., 10., -1.).is_empty());
        assert!(arange_with_endpoint(0., 10., f64::NAN).is_empty());
    }

    #[test]
    fn test_arange_fine_step_bounds() {
        let v = arange_with_endpoint(64., 137., 0.1);
        assert!(v.len() >= 730);
        assert_eq!(v[0], 64.);
        assert!((v[v.len() - 1] - 137.).abs() < 1e-9);
        assert!(v.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_sort_unique() {
        let v = sort_unique(&[3., 1., 2., 1. + 1e-12, 3.], 1e-9);
        assert_eq!(v, vec![1., 2., 3.]);
        assert!(sort_unique(&[], 1e-9).is_empty());
    }

    #[test]
    fn test_max_gap() {
        assert_eq!(max_gap(&[0., 1., 3., 3.5]), Some(2.));
        assert_eq!(max_gap(&[1.]), None);
    }
}
