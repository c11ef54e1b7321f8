//! Median/IQR feature scaling, insensitive to the outliers the forest is looking for.

use crate::stats;
use ndarray::{Array1, Array2, ArrayView2, Axis};

#[derive(Debug, Clone)]
pub struct RobustScaler {
    center: Array1<f64>,
    scale: Array1<f64>,
}

impl RobustScaler {
    /// Per column: median as centre, Q3 − Q1 as scale (1 when the IQR is zero).
    pub fn fit(x: ArrayView2<'_, f64>) -> Self {
        let mut center = Array1::zeros(x.ncols());
        let mut scale = Array1::ones(x.ncols());
        for (j, col) in x.axis_iter(Axis(1)).enumerate() {
            let values = col.to_vec();
            let q1 = stats::quantile(&values, 0.25).unwrap_or(0.0);
            let q3 = stats::quantile(&values, 0.75).unwrap_or(0.0);
            center[j] = stats::quantile(&values, 0.5).unwrap_or(0.0);
            let iqr = q3 - q1;
            scale[j] = if iqr == 0.0 { 1.0 } else { iqr };
        }
        Self { center, scale }
    }

    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        (&x - &self.center) / &self.scale
    }

    pub fn fit_transform(x: ArrayView2<'_, f64>) -> Array2<f64> {
        Self::fit(x).transform(x)
    }
}
