//! Univariate feature scores against a target

use ndarray::ArrayView1;

/// Replace NaN with 0 and +inf with `f64::MAX`
pub(crate) fn sanitize(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else if score == f64::INFINITY {
        f64::MAX
    } else {
        score.max(0.0)
    }
}

fn mean_std(x: ArrayView1<f64>) -> (f64, f64) {
    let n = x.len() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = x.sum() / n;
    let var = x.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Pearson correlation, 0 when either side is constant
pub(crate) fn correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let (x_mean, x_std) = mean_std(x);
    let (y_mean, y_std) = mean_std(y);
    if x_std <= 0.0 || y_std <= 0.0 {
        return 0.0;
    }

    let covariance = x
        .iter()
        .zip(y.iter())
        .map(|(&a, &b)| (a - x_mean) * (b - y_mean))
        .sum::<f64>()
        / x.len() as f64;
    (covariance / (x_std * y_std)).clamp(-1.0, 1.0)
}

/// Equal-width discretization into `n_bins` buckets
fn discretize(x: ArrayView1<f64>, n_bins: usize) -> Vec<usize> {
    let min_val = x.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_val = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let range = max_val - min_val;
    if range <= 0.0 {
        return vec![0; x.len()];
    }

    let bin_width = range / n_bins as f64;
    x.iter()
        .map(|&v| (((v - min_val) / bin_width) as usize).min(n_bins - 1))
        .collect()
}

/// Histogram estimate of mutual information.
///
/// With `discrete_target` the target values are class codes and are used as
/// bins directly.
pub(crate) fn mutual_information(x: ArrayView1<f64>, y: ArrayView1<f64>, discrete_target: bool) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let n_bins = (n.sqrt() as usize).clamp(2, 20);
    let x_bins = discretize(x, n_bins);
    let y_bins: Vec<usize> = if discrete_target {
        class_codes(y)
    } else {
        discretize(y, n_bins)
    };

    let n_x = n_categories(&x_bins);
    let n_y = n_categories(&y_bins);
    let mut joint_counts = vec![0usize; n_x * n_y];
    let mut x_counts = vec![0usize; n_x];
    let mut y_counts = vec![0usize; n_y];

    for (&xb, &yb) in x_bins.iter().zip(y_bins.iter()) {
        joint_counts[xb * n_y + yb] += 1;
        x_counts[xb] += 1;
        y_counts[yb] += 1;
    }

    let mut mi = 0.0;
    for (idx, &count) in joint_counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let p_xy = count as f64 / n;
        let p_x = x_counts[idx / n_y] as f64 / n;
        let p_y = y_counts[idx % n_y] as f64 / n;
        mi += p_xy * (p_xy / (p_x * p_y)).ln();
    }

    mi.max(0.0)
}

/// One-way ANOVA F statistic of `x` grouped by class code `y`
pub(crate) fn anova_f(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len();
    let labels = class_codes(y);
    let mut counts = vec![0usize; n_categories(&labels)];
    let mut sums = vec![0.0; counts.len()];
    for (&v, &label) in x.iter().zip(labels.iter()) {
        counts[label] += 1;
        sums[label] += v;
    }

    let k = counts.iter().filter(|&&c| c > 0).count();
    if k < 2 || n <= k {
        return 0.0;
    }

    let means: Vec<f64> = counts
        .iter()
        .zip(&sums)
        .map(|(&count, &sum)| if count > 0 { sum / count as f64 } else { 0.0 })
        .collect();
    let grand_mean = x.sum() / n as f64;
    let ssb: f64 = counts
        .iter()
        .zip(&means)
        .map(|(&count, &mean)| count as f64 * (mean - grand_mean).powi(2))
        .sum();
    let ssw: f64 = x
        .iter()
        .zip(labels.iter())
        .map(|(&v, &label)| (v - means[label]).powi(2))
        .sum();

    if ssw <= f64::EPSILON {
        // Classes perfectly separated
        return if ssb > 0.0 { f64::MAX } else { 0.0 };
    }

    (ssb / (k - 1) as f64) / (ssw / (n - k) as f64)
}

/// Univariate regression F statistic, `r² / (1 - r²) * (n - 2)`
pub(crate) fn f_regression(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len();
    if n < 3 {
        return 0.0;
    }
    let r2 = correlation(x, y).powi(2);
    if r2 >= 1.0 {
        return f64::MAX;
    }
    r2 / (1.0 - r2) * (n - 2) as f64
}

/// Chi-squared statistic of non-negative `x` summed per class code `y`
pub(crate) fn chi2(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    let labels = class_codes(y);
    let mut observed = vec![0.0; n_categories(&labels)];
    let mut class_counts = vec![0usize; observed.len()];
    for (&v, &label) in x.iter().zip(labels.iter()) {
        observed[label] += v;
        class_counts[label] += 1;
    }

    let total = x.sum();
    class_counts
        .iter()
        .zip(&observed)
        .map(|(&count, &obs)| {
            let expected = count as f64 / n * total;
            if expected > 0.0 {
                (obs - expected).powi(2) / expected
            } else {
                0.0
            }
        })
        .sum()
}

/// Class codes of an encoded target; codes are dense non-negative integers
fn class_codes(y: ArrayView1<f64>) -> Vec<usize> {
    y.iter().map(|&v| v as usize).collect()
}

/// Size of a dense code range `0..=max`
fn n_categories(codes: &[usize]) -> usize {
    codes.iter().copied().max().map_or(0, |m| m + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_correlation() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![2.0, 4.0, 6.0, 8.0];
        assert!((correlation(x.view(), y.view()) - 1.0).abs() < 1e-12);

        let constant = array![1.0, 1.0, 1.0, 1.0];
        assert_eq!(correlation(constant.view(), y.view()), 0.0);
    }

    #[test]
    fn test_mutual_information_prefers_informative() {
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let informative = array![0.1, 0.2, 0.1, 0.3, 5.0, 5.2, 5.1, 5.3];
        let noise = array![1.0, 5.0, 1.0, 5.0, 1.0, 5.0, 1.0, 5.0];

        let good = mutual_information(informative.view(), y.view(), true);
        let bad = mutual_information(noise.view(), y.view(), true);
        assert!(good > bad);
        assert!(bad.abs() < 1e-12);
    }

    #[test]
    fn test_anova_f() {
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let x = array![1.0, 2.0, 3.0, 11.0, 12.0, 13.0];
        let f = anova_f(x.view(), y.view());
        // ssb = 150, ssw = 4
        assert!((f - 150.0).abs() < 1e-9);

        let separated = array![1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        assert_eq!(anova_f(separated.view(), y.view()), f64::MAX);
    }

    #[test]
    fn test_chi2() {
        let y = array![0.0, 0.0, 1.0, 1.0];
        let x = array![1.0, 1.0, 0.0, 0.0];
        // observed [2, 0], expected [1, 1]
        assert!((chi2(x.view(), y.view()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), f64::MAX);
        assert_eq!(sanitize(2.5), 2.5);
    }
}
