//! Column statistics used to put clustering features on a common footing.
use statrs::statistics::Statistics;
use tracing::debug;

/// Standardise each column of `rows` to zero mean and unit (population) variance.
///
/// Columns with zero variance are only centred, matching the usual scaler convention.
pub(crate) fn standardise_columns(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(width) = rows.first().map(Vec::len) else {
        return vec![];
    };

    let (means, scales): (Vec<f64>, Vec<f64>) = (0..width)
        .map(|col| {
            let mean = rows.iter().map(|row| row[col]).mean();
            let std_dev = rows.iter().map(|row| row[col]).population_std_dev();
            if std_dev > 0. && std_dev.is_finite() {
                (mean, std_dev)
            } else {
                debug!("feature column {col} has zero variance, centring only");
                (mean, 1.)
            }
        })
        .unzip();

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(means.iter().zip(scales.iter()))
                .map(|(value, (mean, scale))| (value - mean) / scale)
                .collect()
        })
        .collect()
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Mean of the elementwise squared differences between two equally-shaped tables.
pub(crate) fn mean_squared_error(actual: &[Vec<f64>], reconstructed: &[Vec<f64>]) -> f64 {
    let count: usize = actual.iter().map(Vec::len).sum();
    if count == 0 {
        return 0.;
    }
    actual
        .iter()
        .zip(reconstructed)
        .map(|(a, r)| squared_distance(a, r))
        .sum::<f64>()
        / count as f64
}
