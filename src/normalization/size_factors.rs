//! Size factor estimation using the median of ratios method

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::counts::cpm;
use crate::error::{ReportError, Result};

/// Scaling applied to produce the per-sample normalized columns of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMethod {
    /// Standard median of ratios (DESeq2 default)
    #[default]
    Ratio,
    /// Median of ratios with geometric means over positive values only
    PosCounts,
    /// Counts per million of the column total
    Cpm,
}

impl FromStr for NormalizationMethod {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ratio" => Ok(NormalizationMethod::Ratio),
            "poscounts" => Ok(NormalizationMethod::PosCounts),
            "cpm" => Ok(NormalizationMethod::Cpm),
            other => Err(ReportError::InvalidParameter {
                reason: format!(
                    "Unknown normalization method '{}'. Use 'ratio', 'poscounts' or 'cpm'.",
                    other
                ),
            }),
        }
    }
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NormalizationMethod::Ratio => "ratio",
            NormalizationMethod::PosCounts => "poscounts",
            NormalizationMethod::Cpm => "cpm",
        };
        write!(f, "{}", name)
    }
}

/// Normalize each column of `values` with the chosen method
pub fn normalized_values(
    values: ArrayView2<f64>,
    method: NormalizationMethod,
) -> Result<Array2<f64>> {
    let size_factors = match method {
        NormalizationMethod::Ratio => estimate_size_factors_ratio(values)?,
        NormalizationMethod::PosCounts => estimate_size_factors_poscounts(values)?,
        NormalizationMethod::Cpm => return Ok(cpm(values)),
    };

    let mut normalized = values.to_owned();
    for (mut col, &sf) in normalized.axis_iter_mut(Axis(1)).zip(size_factors.iter()) {
        col.mapv_inplace(|x| x / sf);
    }
    Ok(normalized)
}

/// Estimate size factors with the given median-of-ratios variant
pub fn estimate_size_factors(
    values: ArrayView2<f64>,
    method: NormalizationMethod,
) -> Result<Array1<f64>> {
    match method {
        NormalizationMethod::Ratio => estimate_size_factors_ratio(values),
        NormalizationMethod::PosCounts => estimate_size_factors_poscounts(values),
        NormalizationMethod::Cpm => Err(ReportError::InvalidParameter {
            reason: "CPM scaling has no size factors".to_string(),
        }),
    }
}

fn median(mut xs: Vec<f64>) -> f64 {
    xs.sort_by(|a, b| a.total_cmp(b));
    let n = xs.len();
    if n % 2 == 0 {
        (xs[n / 2 - 1] + xs[n / 2]) / 2.0
    } else {
        xs[n / 2]
    }
}

/// Per-sample median of value / reference over genes with a usable reference
fn ratios_to_reference(
    values: ArrayView2<f64>,
    reference: &[(usize, f64)],
    fallback: Option<f64>,
) -> Result<Array1<f64>> {
    let n_samples = values.ncols();
    let mut size_factors = Array1::zeros(n_samples);

    for j in 0..n_samples {
        let ratios: Vec<f64> = reference
            .iter()
            .filter_map(|&(i, geo_mean)| {
                let v = values[[i, j]];
                if v > 0.0 && geo_mean > 0.0 {
                    Some(v / geo_mean)
                } else {
                    None
                }
            })
            .collect();

        size_factors[j] = if ratios.is_empty() {
            fallback.ok_or_else(|| ReportError::SizeFactorFailed {
                reason: format!("No valid ratios for sample {}", j),
            })?
        } else {
            median(ratios)
        };
    }

    if size_factors.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(ReportError::SizeFactorFailed {
            reason: "Invalid size factors computed".to_string(),
        });
    }

    Ok(size_factors)
}

fn check_not_empty(values: ArrayView2<f64>) -> Result<()> {
    let (n_genes, n_samples) = values.dim();
    if n_genes == 0 || n_samples == 0 {
        return Err(ReportError::EmptyData {
            reason: "Expression matrix is empty".to_string(),
        });
    }
    Ok(())
}

/// Standard median of ratios method
fn estimate_size_factors_ratio(values: ArrayView2<f64>) -> Result<Array1<f64>> {
    check_not_empty(values)?;
    let n_samples = values.ncols() as f64;

    // Genes with a zero anywhere have no geometric mean
    let reference: Vec<(usize, f64)> = values
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| row.iter().all(|&x| x > 0.0))
        .map(|(i, row)| {
            let log_sum: f64 = row.iter().map(|&x| x.ln()).sum();
            (i, (log_sum / n_samples).exp())
        })
        .collect();

    if reference.is_empty() {
        return Err(ReportError::SizeFactorFailed {
            reason: "No genes with all non-zero values found; try 'poscounts' or 'cpm'"
                .to_string(),
        });
    }

    ratios_to_reference(values, &reference, None)
}

/// Geometric means over positive values, divided by the total sample count
fn estimate_size_factors_poscounts(values: ArrayView2<f64>) -> Result<Array1<f64>> {
    check_not_empty(values)?;
    let n_samples = values.ncols() as f64;

    let reference: Vec<(usize, f64)> = values
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&x| x > 0.0))
        .map(|(i, row)| {
            let log_sum: f64 = row.iter().filter(|&&x| x > 0.0).map(|&x| x.ln()).sum();
            (i, (log_sum / n_samples).exp())
        })
        .collect();

    if reference.is_empty() {
        return Err(ReportError::SizeFactorFailed {
            reason: "No genes with positive values found".to_string(),
        });
    }

    let mut size_factors = ratios_to_reference(values, &reference, Some(1.0))?;

    // Re-center so the geometric mean of size factors is 1
    let log_mean = size_factors.iter().map(|&x| x.ln()).sum::<f64>() / n_samples;
    let center = log_mean.exp();
    size_factors.mapv_inplace(|x| x / center);

    Ok(size_factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn depth_scaled() -> Array2<f64> {
        // s2 and s4 sequenced at twice the depth of s1 and s3
        array![
            [100.0, 200.0, 80.0, 160.0],
            [500.0, 1000.0, 400.0, 800.0],
            [50.0, 100.0, 40.0, 80.0],
            [200.0, 400.0, 160.0, 320.0]
        ]
    }

    #[test]
    fn test_size_factor_estimation() {
        let values = depth_scaled();
        let sf = estimate_size_factors(values.view(), NormalizationMethod::Ratio).unwrap();

        assert_eq!(sf.len(), 4);
        assert!(sf.iter().all(|&x| x > 0.0));
        assert!((sf[1] / sf[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_values_remove_depth() {
        let values = depth_scaled();
        let norm = normalized_values(values.view(), NormalizationMethod::Ratio).unwrap();

        let gene1: Vec<f64> = norm.row(0).to_vec();
        let mean = gene1.iter().sum::<f64>() / 4.0;
        for val in gene1 {
            assert!((val - mean).abs() / mean < 0.15);
        }
        assert!((norm[[0, 0]] - norm[[0, 1]]).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_fails_when_every_gene_has_a_zero() {
        let values = array![[0.0, 5.0], [3.0, 0.0]];
        assert!(matches!(
            normalized_values(values.view(), NormalizationMethod::Ratio),
            Err(ReportError::SizeFactorFailed { .. })
        ));
        let pos = normalized_values(values.view(), NormalizationMethod::PosCounts).unwrap();
        assert!(pos.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            "poscounts".parse::<NormalizationMethod>().unwrap(),
            NormalizationMethod::PosCounts
        );
        assert!("iterate".parse::<NormalizationMethod>().is_err());
    }
}
