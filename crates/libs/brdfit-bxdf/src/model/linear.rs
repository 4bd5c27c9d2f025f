//! Linear kernel-driven models.

use crate::kernel::{li_sparse_reciprocal_at, KernelParams, VolumetricKernel};
use base::geometry::{AngleTuple, Geometry};
use nalgebra::DMatrix;

/// Returns the kernel values (K_vol, K_geo) of one observation.
#[inline]
pub fn kernels_at(kernel: VolumetricKernel, row: &AngleTuple, params: &KernelParams) -> (f64, f64) {
    (kernel.eval_at(row, params), li_sparse_reciprocal_at(row, params))
}

/// Builds the n×3 design matrix with columns [1, K_vol, K_geo].
pub fn design_matrix(kernel: VolumetricKernel, geometry: &Geometry, params: &KernelParams) -> DMatrix<f64> {
    let mut design = DMatrix::zeros(geometry.len(), 3);
    for (i, row) in geometry.iter().enumerate() {
        let (k_vol, k_geo) = kernels_at(kernel, &row, params);
        design[(i, 0)] = 1.0;
        design[(i, 1)] = k_vol;
        design[(i, 2)] = k_geo;
    }
    design
}
