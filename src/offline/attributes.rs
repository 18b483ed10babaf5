//! Attribute specifications for the profile generator.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::read_json;
use crate::error::{CatalogError, ConfigError};
use crate::features::attr;

static BINARY_LEVELS: [f64; 2] = [0.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Numeric levels taken verbatim from `levels`.
    Ordinal,
    Binary,
    /// Present/absent encoding, same {0, 1} levels as binary.
    Categorical,
}

/// Which way an attribute improves a job, for profile-level dominance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
    /// Taste-dependent; ignored by the dominance filter.
    #[default]
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttributeKind,
    #[serde(default)]
    pub levels: Vec<f64>,
    #[serde(default)]
    pub direction: Direction,
}

impl AttributeSpec {
    pub fn ordinal(name: &str, levels: &[f64], direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            kind: AttributeKind::Ordinal,
            levels: levels.to_vec(),
            direction,
        }
    }

    pub fn binary(name: &str, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            kind: AttributeKind::Binary,
            levels: BINARY_LEVELS.to_vec(),
            direction,
        }
    }

    /// Levels the generator enumerates.
    pub fn effective_levels(&self) -> &[f64] {
        match self.kind {
            AttributeKind::Ordinal => self.levels.as_slice(),
            AttributeKind::Binary | AttributeKind::Categorical => &BINARY_LEVELS[..],
        }
    }
}

/// The bundled job-attribute design.
///
/// Every attribute is `Neutral` for profile-level dominance: across a full
/// factorial any monotone attribute would collapse to its best level.
/// Dominated pairs are screened later on encoded features.
pub fn default_attribute_specs() -> Vec<AttributeSpec> {
    use Direction::Neutral;
    vec![
        AttributeSpec::ordinal(attr::WAGE, &[3000.0, 4000.0, 5000.0], Neutral),
        AttributeSpec::binary(attr::PHYSICAL_DEMAND, Neutral),
        AttributeSpec::binary(attr::REMOTE_WORK, Neutral),
        AttributeSpec::binary(attr::CAREER_GROWTH, Neutral),
        AttributeSpec::binary(attr::FLEXIBILITY, Neutral),
        AttributeSpec::ordinal(attr::COMMUTE_TIME, &[15.0, 30.0, 45.0, 60.0], Neutral),
        AttributeSpec::binary(attr::JOB_SECURITY, Neutral),
        AttributeSpec::binary(attr::TASK_VARIETY, Neutral),
        AttributeSpec::binary(attr::SOCIAL_INTERACTION, Neutral),
        AttributeSpec::binary(attr::COMPANY_VALUES, Neutral),
    ]
}

pub fn validate_specs(specs: &[AttributeSpec]) -> Result<(), ConfigError> {
    if specs.is_empty() {
        return Err(ConfigError::EmptyAttributes);
    }
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(ConfigError::DuplicateAttribute {
                name: spec.name.clone(),
            });
        }
        match spec.kind {
            AttributeKind::Ordinal => {
                if spec.levels.is_empty() {
                    return Err(ConfigError::EmptyLevels {
                        name: spec.name.clone(),
                    });
                }
                if let Some(bad) = spec.levels.iter().find(|v| !v.is_finite()) {
                    return Err(ConfigError::OutOfRange {
                        field: "attribute.levels",
                        requirement: "finite",
                        value: *bad,
                    });
                }
            }
            AttributeKind::Binary | AttributeKind::Categorical => {
                if !spec.levels.is_empty() && spec.levels.as_slice() != BINARY_LEVELS.as_slice() {
                    return Err(ConfigError::InvalidBinaryLevels {
                        name: spec.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Load a JSON list of attribute specifications and validate it.
pub fn load_attribute_specs(path: impl AsRef<Path>) -> Result<Vec<AttributeSpec>, CatalogError> {
    let specs: Vec<AttributeSpec> = read_json(path.as_ref())?;
    validate_specs(&specs)?;
    Ok(specs)
}

/// Stable blake3 fingerprint of an attribute specification.
pub fn attribute_fingerprint(specs: &[AttributeSpec]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (idx, spec) in specs.iter().enumerate() {
        if idx > 0 {
            hasher.update(b"\n");
        }
        let levels: Vec<String> = spec
            .effective_levels()
            .iter()
            .map(|v| format!("{v}"))
            .collect();
        hasher.update(
            format!(
                "{}|{:?}|{}|{:?}",
                spec.name,
                spec.kind,
                levels.join(","),
                spec.direction
            )
            .as_bytes(),
        );
    }
    hasher.finalize().to_hex().to_string()
}
