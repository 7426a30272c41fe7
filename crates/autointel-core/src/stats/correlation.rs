use polars::prelude::{DataFrame, PolarsResult};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::{Data, OrderStatistics, RankTieBreaker};

use crate::frame::{numeric_column, Variable};
use crate::settings::{AnalysisThresholds, StrengthBands};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    None,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl Strength {
    pub fn from_coefficient(r: f64, bands: &StrengthBands) -> Self {
        let magnitude = r.abs();
        if magnitude >= bands.very_strong {
            Strength::VeryStrong
        } else if magnitude >= bands.strong {
            Strength::Strong
        } else if magnitude >= bands.moderate {
            Strength::Moderate
        } else if magnitude >= bands.weak {
            Strength::Weak
        } else {
            Strength::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strength::None => "none",
            Strength::Weak => "weak",
            Strength::Moderate => "moderate",
            Strength::Strong => "strong",
            Strength::VeryStrong => "very strong",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub slice: String,
    pub variable_a: String,
    pub variable_b: String,
    /// Pearson r.
    pub coefficient: f64,
    pub p_value: f64,
    /// Pearson r over average-tie ranks; picks up monotonic non-linear relationships.
    #[serde(default)]
    pub spearman: f64,
    #[serde(default)]
    pub spearman_p_value: f64,
    /// Pearson p-value below the significance level.
    #[serde(default)]
    pub significant: bool,
    pub sample_size: usize,
    pub strength: Strength,
}

impl CorrelationResult {
    pub fn pair_label(&self) -> String {
        format!("{}-{}", self.variable_a, self.variable_b)
    }
}

/// Pearson r, or `None` when either side has zero variance or fewer than two points.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// 1-based ranks in input order; tied values share their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    Data::new(values.to_vec()).ranks(RankTieBreaker::Average)
}

/// Spearman rho, or `None` under the same conditions as [`pearson`].
pub fn spearman(xs: &[f64], ys: &[f64]) -> Option<f64> {
    pearson(&average_ranks(xs), &average_ranks(ys))
}

/// Two-tailed p-value for H0: r = 0, Student's t with n - 2 degrees of freedom.
pub fn p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    let denom = 1.0 - r * r;
    if denom <= f64::EPSILON {
        return 0.0;
    }
    let dof = (n - 2) as f64;
    let t = r * (dof / denom).sqrt();
    match StudentsT::new(0.0, 1.0, dof) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Correlates two value lists already aligned row by row, keeping pairwise-complete rows.
pub fn correlate_values(
    slice: &str,
    label_a: &str,
    label_b: &str,
    a: &[Option<f64>],
    b: &[Option<f64>],
    thresholds: &AnalysisThresholds,
) -> Result<CorrelationResult, String> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .unzip();
    let n = xs.len();

    if n < thresholds.min_paired_observations {
        return Err(format!(
            "insufficient data: {label_a}-{label_b} ({slice}, {n} paired observations)"
        ));
    }
    let Some(r) = pearson(&xs, &ys) else {
        return Err(format!(
            "undefined correlation: {label_a}-{label_b} ({slice}, zero variance)"
        ));
    };

    // Ranks of a varying series vary too, so rho exists whenever r does.
    let rho = spearman(&xs, &ys).unwrap_or(0.0);
    let p = p_value(r, n);

    Ok(CorrelationResult {
        slice: slice.to_string(),
        variable_a: label_a.to_string(),
        variable_b: label_b.to_string(),
        coefficient: r,
        p_value: p,
        spearman: rho,
        spearman_p_value: p_value(rho, n),
        significant: p < thresholds.significance_level,
        sample_size: n,
        strength: Strength::from_coefficient(r, &thresholds.strength),
    })
}

/// Correlates every pair over `frame`. Pairs without enough data become warnings.
pub fn correlate(
    frame: &DataFrame,
    slice: &str,
    pairs: &[(Variable, Variable)],
    thresholds: &AnalysisThresholds,
) -> PolarsResult<(Vec<CorrelationResult>, Vec<String>)> {
    let mut results = Vec::new();
    let mut warnings = Vec::new();

    for (a, b) in pairs {
        let left = numeric_column(frame, *a)?;
        let right = numeric_column(frame, *b)?;
        match correlate_values(slice, a.label(), b.label(), &left, &right, thresholds) {
            Ok(result) => results.push(result),
            Err(warning) => warnings.push(warning),
        }
    }

    Ok((results, warnings))
}
