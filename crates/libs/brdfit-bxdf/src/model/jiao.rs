//! Jiao-2016 hotspot-corrected kernel model.

use crate::kernel::{li_sparse_reciprocal_at, volumetric_component, KernelParams, Trig};
use base::{geometry::AngleTuple, math::sqr};
use std::f64::consts::FRAC_PI_2;

/// Kernel model `f0 + f1·K_geo + f2·K_vol` whose volumetric kernel carries
/// the hotspot term `1 + C1·exp(−ξ/C2)`, ξ being the phase angle in degrees.
///
/// The volumetric kernel is offset by π/2, not the π/4 of Ross-Thick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Jiao2016 {
    /// Isotropic weight.
    pub f0: f64,
    /// Geometric kernel weight.
    pub f1: f64,
    /// Volumetric kernel weight.
    pub f2: f64,
    /// Hotspot amplitude.
    pub c1: f64,
    /// Hotspot width in degrees.
    pub c2: f64,
}

impl Jiao2016 {
    /// Creates the model from (f0, f1, f2, C1, C2).
    pub fn from_params(params: &[f64]) -> Self {
        Self {
            f0: params[0],
            f1: params[1],
            f2: params[2],
            c1: params[3],
            c2: params[4],
        }
    }

    /// Returns (X, ξ in degrees, exp(−ξ/C2)).
    fn hotspot_terms(&self, row: &AngleTuple) -> (f64, f64, f64) {
        let (x, phase) = volumetric_component(&Trig::new(row));
        let phase_deg = phase.to_degrees();
        (x, phase_deg, (-phase_deg / self.c2).exp())
    }

    /// Hotspot-corrected volumetric kernel.
    pub fn volumetric_kernel(&self, row: &AngleTuple) -> f64 {
        let (x, _, e) = self.hotspot_terms(row);
        (1.0 + self.c1 * e) * x - FRAC_PI_2
    }

    /// Predicted reflectance.
    pub fn eval(&self, row: &AngleTuple, params: &KernelParams) -> f64 {
        let k_geo = li_sparse_reciprocal_at(row, params);
        self.f0 + self.f1 * k_geo + self.f2 * self.volumetric_kernel(row)
    }

    /// Partial derivatives with respect to (f0, f1, f2, C1, C2).
    pub fn pd(&self, row: &AngleTuple, params: &KernelParams, out: &mut [f64]) {
        let (x, phase_deg, e) = self.hotspot_terms(row);
        out[0] = 1.0;
        out[1] = li_sparse_reciprocal_at(row, params);
        out[2] = (1.0 + self.c1 * e) * x - FRAC_PI_2;
        out[3] = self.f2 * x * e;
        out[4] = self.f2 * x * self.c1 * e * phase_deg / sqr(self.c2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ross_thick_at;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn derivatives_match_finite_differences() {
        let params = [0.05, 0.01, 0.1, 0.6, 12.0];
        let kp = KernelParams::default();
        for row in [
            AngleTuple::new(30.0, 10.0, 100.0, 150.0),
            AngleTuple::new(40.0, 20.0, 120.0, 170.0),
            AngleTuple::new(25.0, 30.0, 95.0, 100.0),
        ] {
            let mut pd = [0.0; 5];
            Jiao2016::from_params(&params).pd(&row, &kp, &mut pd);
            for i in 0..5 {
                let step = 1e-6 * (1.0 + params[i].abs());
                let (mut hi, mut lo) = (params, params);
                hi[i] += step;
                lo[i] -= step;
                let numeric = (Jiao2016::from_params(&hi).eval(&row, &kp)
                    - Jiao2016::from_params(&lo).eval(&row, &kp))
                    / (2.0 * step);
                assert_relative_eq!(pd[i], numeric, epsilon = 1e-7, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn zero_amplitude_is_offset_ross_thick() {
        let row = AngleTuple::new(35.0, 15.0, 110.0, 160.0);
        let model = Jiao2016::from_params(&[0.0, 0.0, 1.0, 0.0, 5.0]);
        assert_relative_eq!(
            model.volumetric_kernel(&row),
            ross_thick_at(&row) - FRAC_PI_4,
            epsilon = 1e-15
        );
    }

    #[test]
    fn volumetric_kernel_closed_form() {
        // sza = 30°, vza = 10°, raa = 50°.
        let (ts, tv, raa) = (30f64.to_radians(), 10f64.to_radians(), 50f64.to_radians());
        let cos_xi = ts.cos() * tv.cos() + ts.sin() * tv.sin() * raa.cos();
        let xi = cos_xi.acos();
        let (c1, c2) = (0.6, 12.0);
        let expected = (1.0 + c1 * (-xi.to_degrees() / c2).exp())
            * ((FRAC_PI_2 - xi) * xi.cos() + xi.sin())
            / (ts.cos() + tv.cos())
            - FRAC_PI_2;
        let row = AngleTuple::new(30.0, 10.0, 100.0, 150.0);
        let model = Jiao2016::from_params(&[0.0, 0.0, 1.0, c1, c2]);
        assert_relative_eq!(model.volumetric_kernel(&row), expected, epsilon = 1e-12);
        assert_relative_eq!(model.volumetric_kernel(&row), -0.725209, epsilon = 1e-6);
    }
}
