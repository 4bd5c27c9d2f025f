use base::{error::BrdfitError, io::ColumnMap};
use bxdf::fitting::FitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory and in
/// the user configuration directory.
pub const CONFIG_FILE_NAME: &str = "brdfit.toml";

/// Configuration of a fitting run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header names of the input columns.
    pub columns: ColumnMap,
    /// Fitting options.
    pub fitting: FitOptions,
}

impl Config {
    /// Load [`Config`] from a .toml file.
    pub fn load(path: &Path) -> Result<Self, BrdfitError> {
        let string = std::fs::read_to_string(path).map_err(|err| {
            BrdfitError::from_io_error(
                err,
                format!("Failed to read configuration file: {}", path.display()),
            )
        })?;
        let config = Self::from_toml_str(&string).map_err(|err| {
            BrdfitError::new(
                format!("Failed to parse configuration file: {}", path.display()),
                Some(err),
            )
        })?;
        log::info!("    - Configuration file: {}", path.display());
        log::info!("    - Columns: {:?}", config.columns);
        log::info!("    - Evaluation budget: {}", config.fitting.max_evaluations);
        log::info!("    - Kernel constants: {:?}", config.fitting.kernel);
        Ok(config)
    }

    /// Parses and validates a configuration.
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config: Config = toml::from_str(s)?;
        config.fitting.validate()?;
        Ok(config)
    }

    /// Loads the configuration.
    ///
    /// The explicitly given file is used if any. Otherwise `brdfit.toml` is
    /// looked up in the current working directory, then in `brdfit/` inside
    /// the user configuration directory:
    ///
    /// + On *nix system: "$XDG_CONFIG_HOME" or "$HOME/.config"
    ///
    /// + On windows system: `%APPDATA%`
    ///
    /// + On macos system: "$HOME/Library/Application Support"
    ///
    /// Without any file the defaults are used.
    pub fn load_config(filepath: Option<&Path>) -> Result<Self, BrdfitError> {
        log::info!("Loading configurations...");
        if let Some(path) = filepath {
            return Self::load(path);
        }
        match Self::candidates().into_iter().find(|path| path.is_file()) {
            Some(path) => Self::load(&path),
            None => {
                log::info!("    - No configuration file found, using defaults");
                Ok(Self::default())
            },
        }
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(mut dir) = dirs::config_dir() {
            dir.push("brdfit");
            dir.push(CONFIG_FILE_NAME);
            candidates.push(dir);
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bxdf::model::BrdfModel;

    #[test]
    fn full_configuration() {
        let config = Config::from_toml_str(
            r#"
            [columns]
            view_zenith = "VZA"

            [fitting]
            max_evaluations = 2000

            [fitting.kernel]
            b2h = 1.0
            h2r = 2.0

            [fitting.models.Improved_RPV]
            initial = [0.1, 0.8, -0.1, 1.0, 10.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.columns.view_zenith, "VZA");
        assert_eq!(config.columns.solar_zenith, "SOZ");
        assert_eq!(config.fitting.max_evaluations, 2000);
        assert_eq!(
            config.fitting.nllsq_config(BrdfModel::ImprovedRpv).initial,
            vec![0.1, 0.8, -0.1, 1.0, 10.0]
        );
    }

    #[test]
    fn empty_configuration_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(Config::from_toml_str("[fitting.models.Walthall]\ninitial = [1.0]").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load_config(Some(Path::new("/nonexistent/brdfit.toml"))).unwrap_err();
        assert!(err.message().starts_with("Failed to read configuration file"));
    }
}
