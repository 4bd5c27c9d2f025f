//! Geometry-only scattering kernels.
//!
//! A kernel maps the illumination/viewing geometry of an observation to a
//! scalar. Kernels are evaluated in two forms: per observation (`*_at`),
//! which is what the models use inside the solvers, and over a whole
//! [`Geometry`], which returns one value per observation in input order.
//!
//! The slice forms (`*_slices`) take the four angle arrays separately and
//! reject arrays of different lengths with [`FitError::Shape`].

mod geo;
mod vol;

pub use geo::{li_sparse_reciprocal, li_sparse_reciprocal_at};
pub use vol::{maignan, maignan_at, ross_thick, ross_thick_at, volumetric_component};

use base::{
    deg,
    error::FitError,
    geometry::{AngleTuple, Geometry},
    math::safe_acos,
    units::Degrees,
};
use serde::{Deserialize, Serialize};

/// Structural constants of the kernels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelParams {
    /// Crown shape ratio b/r of the Li-Sparse kernel.
    pub b2h: f64,
    /// Crown height-to-radius ratio h/b of the Li-Sparse kernel.
    pub h2r: f64,
    /// Characteristic hotspot width ξ0 of the Maignan kernel.
    pub hotspot_width: Degrees,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            b2h: 1.0,
            h2r: 2.0,
            hotspot_width: deg!(1.5),
        }
    }
}

impl KernelParams {
    /// Checks that the constants are positive and finite.
    ///
    /// A zero hotspot width makes the Maignan hotspot factor 0/0 at the
    /// hotspot.
    pub fn validate(&self) -> Result<(), FitError> {
        let positive = [
            ("b2h", self.b2h),
            ("h2r", self.h2r),
            ("hotspot_width", self.hotspot_width.value()),
        ];
        match positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            Some((name, value)) => Err(FitError::InvalidConfig(format!(
                "kernel constant {name} must be positive and finite, got {value}"
            ))),
            None => Ok(()),
        }
    }
}

/// Trigonometric terms of one observation, shared by the kernels and the
/// parametric models.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Trig {
    /// cos θs.
    pub cos_s: f64,
    /// sin θs.
    pub sin_s: f64,
    /// tan θs.
    pub tan_s: f64,
    /// cos θv.
    pub cos_v: f64,
    /// sin θv.
    pub sin_v: f64,
    /// tan θv.
    pub tan_v: f64,
    /// Cosine of the relative azimuth.
    pub cos_raa: f64,
    /// Sine of the relative azimuth.
    pub sin_raa: f64,
}

impl Trig {
    /// Computes the terms from the angles of an observation.
    pub fn new(row: &AngleTuple) -> Self {
        let (sin_s, cos_s) = row.sza.to_radians().sin_cos();
        let (sin_v, cos_v) = row.vza.to_radians().sin_cos();
        let (sin_raa, cos_raa) = row.relative_azimuth().sin_cos();
        Self {
            cos_s,
            sin_s,
            tan_s: row.sza.to_radians().tan(),
            cos_v,
            sin_v,
            tan_v: row.vza.to_radians().tan(),
            cos_raa,
            sin_raa,
        }
    }

    /// Cosine of the phase angle between the illumination and the viewing
    /// directions.
    #[inline]
    pub fn cos_phase(&self) -> f64 { self.cos_s * self.cos_v + self.sin_s * self.sin_v * self.cos_raa }

    /// Phase angle in radians.
    #[inline]
    pub fn phase(&self) -> f64 { safe_acos(self.cos_phase()) }
}

/// Volumetric scattering kernels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumetricKernel {
    /// Ross-Thick kernel.
    RossThick,
    /// Ross-Thick kernel with the Maignan-2004 hotspot correction.
    Maignan,
}

impl VolumetricKernel {
    /// Name of the kernel.
    pub const fn name(&self) -> &'static str {
        match self {
            VolumetricKernel::RossThick => "Ross-Thick",
            VolumetricKernel::Maignan => "Maignan",
        }
    }

    /// Evaluates the kernel for one observation.
    pub fn eval_at(&self, row: &AngleTuple, params: &KernelParams) -> f64 {
        match self {
            VolumetricKernel::RossThick => ross_thick_at(row),
            VolumetricKernel::Maignan => maignan_at(row, params),
        }
    }

    /// Evaluates the kernel for every observation of the geometry.
    pub fn eval(&self, geometry: &Geometry, params: &KernelParams) -> Box<[f64]> {
        geometry.iter().map(|row| self.eval_at(&row, params)).collect()
    }
}

fn geometry_from_slices(
    sza: &[f64],
    vza: &[f64],
    saa: &[f64],
    vaa: &[f64],
) -> Result<Geometry, FitError> {
    Geometry::new(sza.to_vec(), vza.to_vec(), saa.to_vec(), vaa.to_vec())
}

/// Li-Sparse-Reciprocal kernel over four angle arrays in degrees.
pub fn li_sparse_reciprocal_slices(
    sza: &[f64],
    vza: &[f64],
    saa: &[f64],
    vaa: &[f64],
    params: &KernelParams,
) -> Result<Box<[f64]>, FitError> {
    let geometry = geometry_from_slices(sza, vza, saa, vaa)?;
    Ok(li_sparse_reciprocal(&geometry, params))
}

/// Ross-Thick kernel over four angle arrays in degrees.
pub fn ross_thick_slices(
    sza: &[f64],
    vza: &[f64],
    saa: &[f64],
    vaa: &[f64],
) -> Result<Box<[f64]>, FitError> {
    let geometry = geometry_from_slices(sza, vza, saa, vaa)?;
    Ok(ross_thick(&geometry))
}

/// Maignan kernel over four angle arrays in degrees.
pub fn maignan_slices(
    sza: &[f64],
    vza: &[f64],
    saa: &[f64],
    vaa: &[f64],
    params: &KernelParams,
) -> Result<Box<[f64]>, FitError> {
    let geometry = geometry_from_slices(sza, vza, saa, vaa)?;
    Ok(maignan(&geometry, params))
}
