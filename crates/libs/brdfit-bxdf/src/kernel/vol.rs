//! Volumetric scattering kernels.

use super::{KernelParams, Trig};
use base::{
    geometry::{AngleTuple, Geometry},
    math::rcp_f64,
};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Returns the single-scattering term `X = [(π/2 − ξ)·cos ξ + sin ξ] / (cos θs +
/// cos θv)` of the Ross-Thick kernel together with the phase angle ξ in
/// radians.
///
/// The kernels differ only in how they scale `X` before removing the π/4
/// offset.
#[inline]
pub fn volumetric_component(trig: &Trig) -> (f64, f64) {
    let phase = trig.phase();
    let x = ((FRAC_PI_2 - phase) * phase.cos() + phase.sin()) / (trig.cos_s + trig.cos_v);
    (x, phase)
}

/// Evaluates the Ross-Thick kernel for one observation.
pub fn ross_thick_at(row: &AngleTuple) -> f64 {
    let (x, _) = volumetric_component(&Trig::new(row));
    x - FRAC_PI_4
}

/// Evaluates the Ross-Thick kernel for every observation.
pub fn ross_thick(geometry: &Geometry) -> Box<[f64]> {
    geometry.iter().map(|row| ross_thick_at(&row)).collect()
}

/// Hotspot factor `1 + 1/(1 + ξ/ξ0)` of the Maignan kernel, in (1, 2].
#[inline]
fn hotspot_factor(phase: f64, width: f64) -> f64 { 1.0 + rcp_f64(1.0 + phase / width) }

/// Evaluates the Maignan-2004 kernel for one observation.
///
/// The Ross-Thick single-scattering term is brightened by a factor that
/// equals 2 at the hotspot and decays to 1 as the phase angle grows past
/// the hotspot width.
pub fn maignan_at(row: &AngleTuple, params: &KernelParams) -> f64 {
    let (x, phase) = volumetric_component(&Trig::new(row));
    x * hotspot_factor(phase, params.hotspot_width.as_radians_f64()) - FRAC_PI_4
}

/// Evaluates the Maignan-2004 kernel for every observation.
pub fn maignan(geometry: &Geometry, params: &KernelParams) -> Box<[f64]> {
    geometry.iter().map(|row| maignan_at(&row, params)).collect()
}
