//! BRDF kernels, models and fitting for directional surface reflectance.
//!
//! The crate is organised bottom-up:
//!
//! - [`kernel`]: geometry-only scattering kernels (Li-Sparse-Reciprocal,
//!   Ross-Thick, Maignan-2004).
//! - [`model`]: the five reflectance models built on top of them.
//! - [`fitting`]: parameter estimation (Levenberg-Marquardt or ordinary least
//!   squares, depending on the model) and goodness-of-fit statistics.
#![warn(missing_docs)]

pub mod fitting;
pub mod kernel;
pub mod model;
