//! Li-Sparse-Reciprocal geometric-optical kernel.

use super::{KernelParams, Trig};
use base::{
    geometry::{AngleTuple, Geometry},
    math::{rcp_f64, safe_acos, sqr},
};
use std::f64::consts::PI;

/// Evaluates the Li-Sparse-Reciprocal kernel for one observation.
///
/// The zenith angles are first replaced by their equivalent angles
/// `θ' = atan(b/r · tan θ)`; the phase term uses the true zenith angles.
/// The cosine of the overlap angle `t` is clamped to [-1, 1] before `acos`.
pub fn li_sparse_reciprocal_at(row: &AngleTuple, params: &KernelParams) -> f64 {
    let trig = Trig::new(row);
    let theta_s = (params.b2h * trig.tan_s).atan();
    let theta_v = (params.b2h * trig.tan_v).atan();
    let (tan_s, sec_s) = (theta_s.tan(), rcp_f64(theta_s.cos()));
    let (tan_v, sec_v) = (theta_v.tan(), rcp_f64(theta_v.cos()));

    let dist = (sqr(tan_s) + sqr(tan_v) - 2.0 * tan_s * tan_v * trig.cos_raa)
        .max(0.0)
        .sqrt();
    let sec_sum = sec_s + sec_v;
    let cos_t = params.h2r * (sqr(dist) + sqr(tan_s * tan_v * trig.sin_raa)).sqrt() / sec_sum;
    let t = safe_acos(cos_t);
    let overlap = (t - t.sin() * t.cos()) * sec_sum / PI;

    overlap - sec_s - sec_v + 0.5 * (1.0 + trig.cos_phase()) * sec_s * sec_v
}

/// Evaluates the Li-Sparse-Reciprocal kernel for every observation.
pub fn li_sparse_reciprocal(geometry: &Geometry, params: &KernelParams) -> Box<[f64]> {
    geometry
        .iter()
        .map(|row| li_sparse_reciprocal_at(&row, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    #[test]
    fn nadir_is_zero() {
        let row = AngleTuple::new(0.0, 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(
            li_sparse_reciprocal_at(&row, &KernelParams::default()),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn overlap_cosine_is_clamped() {
        // sza = vza = 60°, raa = 180°: the raw cos t is √3 > 1.
        let row = AngleTuple::new(60.0, 60.0, 0.0, 180.0);
        let k = li_sparse_reciprocal_at(&row, &KernelParams::default());
        assert!(k.is_finite());
        assert_relative_eq!(k, -3.0, epsilon = 1e-9);
    }

    #[test]
    fn whole_geometry_matches_rows() {
        let geometry = Geometry::from_rows(&[
            AngleTuple::new(30.0, 10.0, 100.0, 150.0),
            AngleTuple::new(45.0, 30.0, 0.0, 0.0),
        ]);
        let params = KernelParams::default();
        let k = li_sparse_reciprocal(&geometry, &params);
        assert_eq!(k[0], li_sparse_reciprocal_at(&geometry.row(0), &params));
        assert_eq!(k[1], li_sparse_reciprocal_at(&geometry.row(1), &params));
    }

    proptest! {
        #[test]
        fn finite_below_grazing(
            sza in 0.0f64..=89.0,
            vza in 0.0f64..=89.0,
            saa in 0.0f64..360.0,
            vaa in 0.0f64..360.0,
        ) {
            let row = AngleTuple::new(sza, vza, saa, vaa);
            prop_assert!(li_sparse_reciprocal_at(&row, &KernelParams::default()).is_finite());
        }

        #[test]
        fn reciprocal(
            sza in 0.0f64..=89.0,
            vza in 0.0f64..=89.0,
            saa in 0.0f64..360.0,
            vaa in 0.0f64..360.0,
        ) {
            let params = KernelParams::default();
            let row = AngleTuple::new(sza, vza, saa, vaa);
            let a = li_sparse_reciprocal_at(&row, &params);
            let b = li_sparse_reciprocal_at(&row.swapped(), &params);
            prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()));
        }

        #[test]
        fn finite_near_overlap_clamp(
            theta in 0.0f64..=89.0,
            eps in -1e-6f64..1e-6,
        ) {
            // Equal zenith angles in opposite azimuths push cos t against and
            // past the clamp.
            let row = AngleTuple::new(theta, theta + eps.abs(), 0.0, 180.0 + eps);
            prop_assert!(li_sparse_reciprocal_at(&row, &KernelParams::default()).is_finite());
        }
    }
}
