//! Observation geometry and datasets.
//!
//! A dataset is kept as parallel arrays (struct of arrays): index `i` of every
//! angle array and every reflectance array refers to the same observation.
//! Constructors check the lengths so that the alignment holds for the whole
//! pipeline.

use crate::{error::FitError, units::Degrees, Band};

/// One directional reflectance record.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Observation {
    /// Solar zenith angle θs.
    pub solar_zenith: Degrees,
    /// View zenith angle θv.
    pub view_zenith: Degrees,
    /// Solar azimuth angle φs.
    pub solar_azimuth: Degrees,
    /// View azimuth angle φv.
    pub view_azimuth: Degrees,
    /// Reflectance in the red band.
    pub red: f64,
    /// Reflectance in the near-infrared band.
    pub nir: f64,
}

/// Angles of a single observation, in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AngleTuple {
    /// Solar zenith angle θs in degrees.
    pub sza: f64,
    /// View zenith angle θv in degrees.
    pub vza: f64,
    /// Solar azimuth angle φs in degrees.
    pub saa: f64,
    /// View azimuth angle φv in degrees.
    pub vaa: f64,
}

impl AngleTuple {
    /// Creates a new angle tuple from angles in degrees.
    pub const fn new(sza: f64, vza: f64, saa: f64, vaa: f64) -> Self {
        Self { sza, vza, saa, vaa }
    }

    /// Swaps the illumination and the viewing directions.
    pub const fn swapped(&self) -> Self {
        Self {
            sza: self.vza,
            vza: self.sza,
            saa: self.vaa,
            vaa: self.saa,
        }
    }

    /// Relative azimuth φv − φs in radians.
    #[inline]
    pub fn relative_azimuth(&self) -> f64 { relative_azimuth(self.saa, self.vaa) }
}

/// Relative azimuth in radians between the view and the solar azimuth given
/// in degrees.
///
/// All kernels and models derive the relative azimuth through this function
/// so that the value is bit-identical across call sites.
#[inline]
pub fn relative_azimuth(saa: f64, vaa: f64) -> f64 { vaa.to_radians() - saa.to_radians() }

/// The n×4 geometry matrix [θs, θv, φs, φv], in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    sza: Box<[f64]>,
    vza: Box<[f64]>,
    saa: Box<[f64]>,
    vaa: Box<[f64]>,
}

impl Geometry {
    /// Creates the geometry from four angle arrays in degrees.
    ///
    /// Returns [`FitError::Shape`] if the arrays do not have the same length.
    pub fn new(
        sza: impl Into<Box<[f64]>>,
        vza: impl Into<Box<[f64]>>,
        saa: impl Into<Box<[f64]>>,
        vaa: impl Into<Box<[f64]>>,
    ) -> Result<Self, FitError> {
        let (sza, vza, saa, vaa) = (sza.into(), vza.into(), saa.into(), vaa.into());
        let n = sza.len();
        FitError::check_len("view zenith", n, vza.len())?;
        FitError::check_len("solar azimuth", n, saa.len())?;
        FitError::check_len("view azimuth", n, vaa.len())?;
        Ok(Self { sza, vza, saa, vaa })
    }

    /// Creates the geometry from rows of angles.
    pub fn from_rows(rows: &[AngleTuple]) -> Self {
        let mut sza = Vec::with_capacity(rows.len());
        let mut vza = Vec::with_capacity(rows.len());
        let mut saa = Vec::with_capacity(rows.len());
        let mut vaa = Vec::with_capacity(rows.len());
        for row in rows {
            sza.push(row.sza);
            vza.push(row.vza);
            saa.push(row.saa);
            vaa.push(row.vaa);
        }
        Self {
            sza: sza.into(),
            vza: vza.into(),
            saa: saa.into(),
            vaa: vaa.into(),
        }
    }

    /// Number of observations.
    pub fn len(&self) -> usize { self.sza.len() }

    /// Whether the geometry contains no observation.
    pub fn is_empty(&self) -> bool { self.sza.is_empty() }

    /// Solar zenith angles in degrees.
    pub fn solar_zenith(&self) -> &[f64] { &self.sza }

    /// View zenith angles in degrees.
    pub fn view_zenith(&self) -> &[f64] { &self.vza }

    /// Solar azimuth angles in degrees.
    pub fn solar_azimuth(&self) -> &[f64] { &self.saa }

    /// View azimuth angles in degrees.
    pub fn view_azimuth(&self) -> &[f64] { &self.vaa }

    /// Returns the angles of the `i`-th observation.
    pub fn row(&self, i: usize) -> AngleTuple {
        AngleTuple::new(self.sza[i], self.vza[i], self.saa[i], self.vaa[i])
    }

    /// Iterates over the observations' angles in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = AngleTuple> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    /// Whether all angles are finite numbers.
    pub fn is_finite(&self) -> bool {
        [&self.sza, &self.vza, &self.saa, &self.vaa]
            .iter()
            .all(|xs| xs.iter().all(|x| x.is_finite()))
    }
}

/// Observation geometry together with the reflectance of both bands.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    geometry: Geometry,
    red: Box<[f64]>,
    nir: Box<[f64]>,
}

impl Dataset {
    /// Creates a dataset, checking that the reflectance arrays are aligned
    /// with the geometry.
    pub fn new(
        geometry: Geometry,
        red: impl Into<Box<[f64]>>,
        nir: impl Into<Box<[f64]>>,
    ) -> Result<Self, FitError> {
        let (red, nir) = (red.into(), nir.into());
        FitError::check_len("RED reflectance", geometry.len(), red.len())?;
        FitError::check_len("NIR reflectance", geometry.len(), nir.len())?;
        Ok(Self { geometry, red, nir })
    }

    /// Creates a dataset from a sequence of observations.
    pub fn from_observations(observations: &[Observation]) -> Self {
        let rows = observations
            .iter()
            .map(|o| {
                AngleTuple::new(
                    o.solar_zenith.value(),
                    o.view_zenith.value(),
                    o.solar_azimuth.value(),
                    o.view_azimuth.value(),
                )
            })
            .collect::<Vec<_>>();
        Self {
            geometry: Geometry::from_rows(&rows),
            red: observations.iter().map(|o| o.red).collect(),
            nir: observations.iter().map(|o| o.nir).collect(),
        }
    }

    /// Returns the observation geometry.
    pub fn geometry(&self) -> &Geometry { &self.geometry }

    /// Returns the reflectance of the given band.
    pub fn band(&self, band: Band) -> &[f64] {
        match band {
            Band::Red => &self.red,
            Band::Nir => &self.nir,
        }
    }

    /// Replaces the reflectance of the given band.
    pub fn set_band(&mut self, band: Band, values: impl Into<Box<[f64]>>) -> Result<(), FitError> {
        let values = values.into();
        FitError::check_len(band.name(), self.len(), values.len())?;
        match band {
            Band::Red => self.red = values,
            Band::Nir => self.nir = values,
        }
        Ok(())
    }

    /// Number of observations.
    pub fn len(&self) -> usize { self.geometry.len() }

    /// Whether the dataset contains no observation.
    pub fn is_empty(&self) -> bool { self.geometry.is_empty() }
}
