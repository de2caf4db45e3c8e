//! Library-size scaled abundance
//!
//! CPM (counts per million) divides each sample by its own total, so genes
//! can be compared across samples sequenced at different depths.

use ndarray::{Array2, ArrayView2, Axis};

/// Column sums of the matrix (library sizes)
pub fn library_sizes(values: ArrayView2<f64>) -> Vec<f64> {
    values.axis_iter(Axis(1)).map(|col| col.sum()).collect()
}

/// Counts per million: value * 1e6 / library size
///
/// Library sizes are floored at 1 so an all-zero sample yields zeros.
pub fn cpm(values: ArrayView2<f64>) -> Array2<f64> {
    let lib_sizes = library_sizes(values);
    let mut result = values.to_owned();
    for (mut col, &lib_size) in result.axis_iter_mut(Axis(1)).zip(lib_sizes.iter()) {
        let lib_size = lib_size.max(1.0);
        col.mapv_inplace(|x| x * 1e6 / lib_size);
    }
    result
}

/// Mean CPM of each gene across all samples, in row order
pub fn average_cpm(values: ArrayView2<f64>) -> Vec<f64> {
    let scaled = cpm(values);
    match scaled.mean_axis(Axis(1)) {
        Some(means) => means.to_vec(),
        // No samples
        None => vec![0.0; scaled.nrows()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cpm_scales_by_library_size() {
        let values = array![[100.0, 200.0], [300.0, 600.0]];
        let result = cpm(values.view());

        // colSums = [400, 800]
        assert!((result[[0, 0]] - 250_000.0).abs() < 1e-6);
        assert!((result[[0, 1]] - 250_000.0).abs() < 1e-6);
        assert!((result[[1, 0]] - 750_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_cpm_zero_library() {
        let values = array![[0.0, 5.0], [0.0, 5.0]];
        let result = cpm(values.view());
        assert_eq!(result[[0, 0]], 0.0);
        assert!((result[[0, 1]] - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_cpm_not_skewed_by_depth() {
        // Second sample is the first at ten times the depth
        let values = array![[10.0, 100.0], [90.0, 900.0]];
        let avg = average_cpm(values.view());
        assert!((avg[0] - 100_000.0).abs() < 1e-6);
        assert!((avg[1] - 900_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_cpm_without_samples() {
        let values: Array2<f64> = Array2::zeros((3, 0));
        assert_eq!(average_cpm(values.view()), vec![0.0; 3]);
    }
}
