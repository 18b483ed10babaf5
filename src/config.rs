//! Engine configuration and its loader.
//!
//! Every section has documented defaults and a `validate()` that fails fast.
//! A config file only needs the fields it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, ConfigError};
use crate::offline::OfflineConfig;
use crate::posterior::{PriorConfig, UpdateConfig};
use crate::stopping::StoppingConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub prior: PriorConfig,
    pub likelihood: UpdateConfig,
    pub stopping: StoppingConfig,
    pub offline: OfflineConfig,
    /// Weight the D-optimal score by posterior uncertainty when selecting.
    pub use_bayesian_selection: bool,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prior.validate()?;
        self.likelihood.validate()?;
        self.stopping.validate()?;
        self.offline.validate()?;
        Ok(())
    }

    /// Read a JSON config; missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: EngineConfig = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}

pub(crate) fn validate_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::OutOfRange {
            field,
            requirement: "finite and > 0",
            value,
        });
    }
    Ok(())
}

pub(crate) fn validate_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            requirement: "within [0, 1]",
            value,
        });
    }
    Ok(())
}

pub(crate) fn validate_nonzero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositive { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"stopping": {{"min_vignettes": 3, "max_vignettes": 9}}, "use_bayesian_selection": true}}"#
        )
        .unwrap();
        let cfg = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.stopping.min_vignettes, 3);
        assert_eq!(cfg.stopping.max_vignettes, 9);
        assert_eq!(cfg.stopping.det_threshold, StoppingConfig::default().det_threshold);
        assert!(cfg.use_bayesian_selection);
        assert_eq!(cfg.prior, PriorConfig::default());
    }

    #[test]
    fn invalid_file_fails_fast() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"prior": {{"variance": 0.0}}}}"#).unwrap();
        let err = EngineConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Config(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn rejects_zero_max_vignettes() {
        let mut cfg = EngineConfig::default();
        cfg.stopping.min_vignettes = 0;
        cfg.stopping.max_vignettes = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                field: "stopping.max_vignettes"
            })
        );
    }
}
