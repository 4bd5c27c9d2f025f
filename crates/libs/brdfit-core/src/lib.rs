//! # brdfit-core
//! Core library for brdfit.
//! Contains the angle units, the observation data model, the error types and
//! the tabular ingestion shared by the fitting library and the binaries.
#![warn(missing_docs)]

use std::fmt::{Debug, Display, Formatter};

pub mod error;
pub mod geometry;
pub mod math;
pub mod units;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "io")]
pub mod io;

/// Spectral band of a reflectance measurement.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    /// Red band.
    #[cfg_attr(feature = "cli", clap(name = "red"))]
    Red,
    /// Near-infrared band.
    #[cfg_attr(feature = "cli", clap(name = "nir"))]
    Nir,
}

impl Band {
    /// All bands in the order they are fitted.
    pub const ALL: [Band; 2] = [Band::Red, Band::Nir];

    /// Returns the band name as it appears in the input table.
    pub const fn name(&self) -> &'static str {
        match self {
            Band::Red => "RED",
            Band::Nir => "NIR",
        }
    }
}

impl Display for Band {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.name()) }
}
