//! Rahman-Pinty-Verstraete (RPV) parametric model.

use crate::kernel::Trig;
use base::math::{rcp_f64, safe_acos, sqr};
use std::fmt::Debug;

/// Exponential hotspot sharpening `1 + C1·exp(−g/C2)` of the improved RPV
/// model, with the phase angle g in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hotspot {
    /// Amplitude C1.
    pub c1: f64,
    /// Angular width C2 in degrees.
    pub c2: f64,
}

/// RPV model.
///
/// Without [`Hotspot`] this is the original three-parameter model; with it,
/// the improved five-parameter one.
#[derive(Copy, Clone, PartialEq)]
pub struct Rpv {
    /// Amplitude ρ.
    pub rho: f64,
    /// Minnaert exponent k.
    pub k: f64,
    /// Henyey-Greenstein asymmetry Θ.
    pub theta: f64,
    /// Hotspot sharpening, improved model only.
    pub hotspot: Option<Hotspot>,
}

impl Debug for Rpv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.hotspot {
            Some(Hotspot { c1, c2 }) => write!(
                f,
                "RPV {{ ρ: {}, k: {}, Θ: {}, C1: {}, C2: {} }}",
                self.rho, self.k, self.theta, c1, c2
            ),
            None => write!(
                f,
                "RPV {{ ρ: {}, k: {}, Θ: {} }}",
                self.rho, self.k, self.theta
            ),
        }
    }
}

/// Intermediate terms shared by the evaluation and the derivatives.
struct Terms {
    /// Minnaert factor M.
    m: f64,
    /// Henyey-Greenstein phase function F.
    f: f64,
    /// Hotspot function H.
    big_h: f64,
    /// Geometric factor G.
    g: f64,
    /// Cosine of the phase angle.
    cos_g: f64,
    /// Phase angle in degrees.
    g_deg: f64,
    /// Sharpening factor h, 1 for the original model.
    h: f64,
    /// exp(−g/C2), 0 for the original model.
    e: f64,
    /// ln(cos θs·cos θv·(cos θs + cos θv)).
    ln_m: f64,
}

impl Rpv {
    /// Creates the original model (ρ, k, Θ) or, with five values, the
    /// improved model (ρ, k, Θ, C1, C2).
    pub fn from_params(params: &[f64]) -> Self {
        Self {
            rho: params[0],
            k: params[1],
            theta: params[2],
            hotspot: (params.len() == 5).then(|| Hotspot {
                c1: params[3],
                c2: params[4],
            }),
        }
    }

    fn terms(&self, trig: &Trig) -> Terms {
        let g = (sqr(trig.tan_s) + sqr(trig.tan_v) - 2.0 * trig.tan_s * trig.tan_v * trig.cos_raa)
            .max(0.0)
            .sqrt();
        let cos_g = trig.cos_phase();
        let g_deg = safe_acos(cos_g).to_degrees();
        let (h, e) = match self.hotspot {
            Some(Hotspot { c1, c2 }) => {
                let e = (-g_deg / c2).exp();
                (1.0 + c1 * e, e)
            },
            None => (1.0, 0.0),
        };
        let big_h = 1.0 + (1.0 - self.rho) * rcp_f64(1.0 + g) * h;
        let f = (1.0 - sqr(self.theta))
            / (1.0 + 2.0 * self.theta * cos_g + sqr(self.theta)).powf(1.5);
        let cos_prod = trig.cos_s * trig.cos_v * (trig.cos_s + trig.cos_v);
        Terms {
            m: cos_prod.powf(self.k - 1.0),
            f,
            big_h,
            g,
            cos_g,
            g_deg,
            h,
            e,
            ln_m: cos_prod.ln(),
        }
    }

    /// Predicted reflectance ρ·M·F·H.
    pub fn eval(&self, trig: &Trig) -> f64 {
        let t = self.terms(trig);
        self.rho * t.m * t.f * t.big_h
    }

    /// Partial derivatives with respect to (ρ, k, Θ[, C1, C2]).
    ///
    /// `out` receives 3 values for the original model and 5 for the improved
    /// one.
    pub fn pd(&self, trig: &Trig, out: &mut [f64]) {
        let t = self.terms(trig);
        let value = self.rho * t.m * t.f * t.big_h;
        let rcp_1g = rcp_f64(1.0 + t.g);
        let denom = 1.0 + 2.0 * self.theta * t.cos_g + sqr(self.theta);
        let df_dtheta = -2.0 * self.theta / denom.powf(1.5)
            - 1.5 * (1.0 - sqr(self.theta)) * (2.0 * t.cos_g + 2.0 * self.theta)
                / denom.powf(2.5);

        out[0] = t.m * t.f * (t.big_h - self.rho * t.h * rcp_1g);
        out[1] = value * t.ln_m;
        out[2] = self.rho * t.m * t.big_h * df_dtheta;
        if let Some(Hotspot { c1, c2 }) = self.hotspot {
            let dh = self.rho * t.m * t.f * (1.0 - self.rho) * rcp_1g;
            out[3] = dh * t.e;
            out[4] = dh * c1 * t.e * t.g_deg / sqr(c2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use base::geometry::AngleTuple;

    fn finite_difference(params: &[f64], trig: &Trig, i: usize) -> f64 {
        let step = 1e-6 * (1.0 + params[i].abs());
        let mut hi = params.to_vec();
        let mut lo = params.to_vec();
        hi[i] += step;
        lo[i] -= step;
        (Rpv::from_params(&hi).eval(trig) - Rpv::from_params(&lo).eval(trig)) / (2.0 * step)
    }

    fn check_derivatives(params: &[f64]) {
        let rows = [
            AngleTuple::new(30.0, 10.0, 100.0, 150.0),
            AngleTuple::new(45.0, 35.0, 0.0, 180.0),
            AngleTuple::new(20.0, 50.0, 60.0, 70.0),
        ];
        let model = Rpv::from_params(params);
        for row in &rows {
            let trig = Trig::new(row);
            let mut pd = vec![0.0; params.len()];
            model.pd(&trig, &mut pd);
            for (i, analytic) in pd.iter().enumerate() {
                let numeric = finite_difference(params, &trig, i);
                assert_relative_eq!(*analytic, numeric, epsilon = 1e-7, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn original_derivatives_match_finite_differences() {
        check_derivatives(&[0.1, 0.7, -0.2]);
    }

    #[test]
    fn improved_derivatives_match_finite_differences() {
        check_derivatives(&[0.1, 0.7, -0.2, 0.8, 15.0]);
    }

    #[test]
    fn improved_reduces_to_original_without_hotspot_amplitude() {
        let trig = Trig::new(&AngleTuple::new(35.0, 15.0, 110.0, 160.0));
        let original = Rpv::from_params(&[0.05, 0.8, -0.1]);
        let improved = Rpv::from_params(&[0.05, 0.8, -0.1, 0.0, 10.0]);
        assert_relative_eq!(original.eval(&trig), improved.eval(&trig), epsilon = 1e-15);
    }

    #[test]
    fn nadir_value() {
        // G = 0, g = 0, M = 2^(k-1), F = (1 - Θ²)/(1 + Θ)³, H = 2 - ρ.
        let trig = Trig::new(&AngleTuple::new(0.0, 0.0, 0.0, 0.0));
        let (rho, k, theta) = (0.2, 0.6, -0.1);
        let expected = rho * 2f64.powf(k - 1.0) * (1.0 - theta * theta)
            / (1.0 + theta).powi(3)
            * (2.0 - rho);
        assert_relative_eq!(Rpv::from_params(&[rho, k, theta]).eval(&trig), expected, epsilon = 1e-12);
    }
}
