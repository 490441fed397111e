//! Correlation and distribution statistics for the analysis pipelines.
//!
//! Pearson and Spearman coefficients are computed directly; p-values come
//! from statrs distributions (Student's t for correlations, the standard
//! normal for permutation Z-scores).

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// A correlation coefficient with its two-sided p-value.
///
/// Degenerate input (fewer than 2 paired observations, or a constant
/// series) yields NaN for both fields rather than an error, so downstream
/// tables degrade gracefully.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub coefficient: f64,
    pub p_value: f64,
}

impl Correlation {
    fn undefined() -> Self {
        Self {
            coefficient: f64::NAN,
            p_value: f64::NAN,
        }
    }
}

/// Pearson product-moment correlation with a two-sided p-value from the
/// t transform `t = r * sqrt((n-2) / (1-r^2))` on n-2 degrees of freedom.
pub fn pearson(x: &[f64], y: &[f64]) -> Correlation {
    if x.len() != y.len() || x.len() < 2 {
        return Correlation::undefined();
    }

    let n = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return Correlation::undefined();
    }

    let r = cov / denom;
    Correlation {
        coefficient: r,
        p_value: two_sided_p(r, x.len()),
    }
}

/// Spearman rank correlation: average-rank both series, then Pearson on
/// the ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Correlation {
    if x.len() != y.len() || x.len() < 2 {
        return Correlation::undefined();
    }
    let rx = average_rank(x);
    let ry = average_rank(y);
    pearson(&rx, &ry)
}

/// Two-sided p-value for a correlation coefficient on n observations.
fn two_sided_p(r: f64, n: usize) -> f64 {
    if n < 3 {
        return f64::NAN;
    }
    let df = (n - 2) as f64;
    let one_minus_r2 = 1.0 - r * r;
    if one_minus_r2 <= 0.0 {
        // Perfectly monotone input saturates the t statistic.
        return 0.0;
    }
    let t = r * (df / one_minus_r2).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * dist.sf(t.abs()),
        Err(_) => f64::NAN,
    }
}

/// Assign average ranks (ties share the mean of their would-be ranks),
/// 1-based, matching the conventional Spearman treatment.
pub fn average_rank(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }

    let mut indexed: Vec<(f64, usize)> = data.iter().copied().enumerate().map(|(i, v)| (v, i)).collect();
    indexed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        // Find the end of the tie group.
        let mut j = i + 1;
        while j < n && indexed[j].0.total_cmp(&indexed[i].0).is_eq() {
            j += 1;
        }

        // Ranks in the group are (i+1)..=(j), 1-based.
        let group_len = (j - i) as f64;
        let sum: f64 = (i + 1..=j).map(|r| r as f64).sum();
        let rank_val = sum / group_len;

        for k in i..j {
            ranks[indexed[k].1] = rank_val;
        }

        i = j;
    }

    ranks
}

/// Arithmetic mean. Empty input yields NaN.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (Bessel-corrected, n-1 denominator).
/// Fewer than 2 observations yields NaN.
pub fn sample_std(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    let ss: f64 = data.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (data.len() - 1) as f64).sqrt()
}

/// One-sided survival function of the standard normal, `P(Z > z)`.
/// Uses the distribution's survival function directly; `1 - cdf` loses
/// all precision once the CDF rounds to 1 in the far tail.
pub fn normal_sf(z: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.sf(z),
        Err(_) => f64::NAN,
    }
}
