//! Reading observation tables.
//!
//! The input is a CSV file with a header row naming the columns. Only the
//! columns listed in [`ColumnMap`] are read; any other column is ignored.
//! Empty cells are read as NaN, so a gap only fails the fits that use it.

use crate::{
    error::ReadDatasetError,
    geometry::{Dataset, Geometry},
};
use serde::{Deserialize, Serialize};
use std::{io::Read, path::Path};

/// Header names of the columns holding each quantity.
///
/// The mapping is by meaning: whatever the column is called, the one named
/// in `view_zenith` is read as the view zenith angle. The default header
/// for it is `SAZ`, which in other data sources often abbreviates a
/// *solar azimuth*; override it when the input follows that convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    /// Solar zenith angle in degrees.
    pub solar_zenith: String,
    /// View zenith angle in degrees.
    pub view_zenith: String,
    /// Solar azimuth angle in degrees.
    pub solar_azimuth: String,
    /// View azimuth angle in degrees.
    pub view_azimuth: String,
    /// Red band reflectance.
    pub red: String,
    /// Near-infrared band reflectance.
    pub nir: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            solar_zenith: String::from("SOZ"),
            view_zenith: String::from("SAZ"),
            solar_azimuth: String::from("SOA"),
            view_azimuth: String::from("SAA"),
            red: String::from("RED"),
            nir: String::from("NIR"),
        }
    }
}

impl ColumnMap {
    /// Column names in the order [θs, θv, φs, φv, red, nir].
    fn names(&self) -> [&str; 6] {
        [
            self.solar_zenith.as_str(),
            self.view_zenith.as_str(),
            self.solar_azimuth.as_str(),
            self.view_azimuth.as_str(),
            self.red.as_str(),
            self.nir.as_str(),
        ]
    }
}

/// Reads an observation table from a CSV file.
pub fn read_dataset(path: &Path, columns: &ColumnMap) -> Result<Dataset, ReadDatasetError> {
    log::debug!("Reading observations from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_dataset_from_reader(file, columns)
}

/// Reads an observation table from any reader producing CSV text.
pub fn read_dataset_from_reader<R: Read>(
    reader: R,
    columns: &ColumnMap,
) -> Result<Dataset, ReadDatasetError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let header = rdr.headers()?.clone();
    let names = columns.names();
    let mut indices = [0usize; 6];
    for (idx, name) in indices.iter_mut().zip(names.iter()) {
        *idx = header
            .iter()
            .position(|h| h == *name)
            .ok_or_else(|| ReadDatasetError::MissingColumn(name.to_string()))?;
    }
    log::info!(
        "Column '{}' is read as the view zenith angle",
        columns.view_zenith
    );

    let mut values: [Vec<f64>; 6] = Default::default();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        for ((idx, name), column) in indices.iter().zip(names.iter()).zip(values.iter_mut()) {
            let raw = record.get(*idx).unwrap_or("");
            let value = if raw.is_empty() {
                f64::NAN
            } else {
                raw.parse::<f64>().map_err(|_| ReadDatasetError::Parse {
                    row,
                    column: name.to_string(),
                    value: raw.to_string(),
                })?
            };
            column.push(value);
        }
    }
    if values[0].is_empty() {
        return Err(ReadDatasetError::Empty);
    }

    if values[1].iter().any(|vza| vza.abs() > 90.0) {
        log::warn!(
            "Column '{}' read as view zenith holds values beyond 90°, it may contain azimuth \
             angles; check the column mapping",
            columns.view_zenith
        );
    }

    let [sza, vza, saa, vaa, red, nir] = values;
    log::debug!("Read {} observations", sza.len());
    let geometry = Geometry::new(sza, vza, saa, vaa)?;
    Ok(Dataset::new(geometry, red, nir)?)
}
