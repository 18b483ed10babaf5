//! Persisted vignette catalogs.
//!
//! Three read-only lists (`static_vignettes_beginning`, `static_vignettes_end`,
//! `adaptive_library`) plus a manifest recording how they were built. Only
//! each option's `attributes` map feeds the numeric core.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, EngineError};
use crate::features::{encode_profile, JobProfile};
use crate::likelihood::{Choice, Contrast};

pub const BEGINNING_FILE: &str = "static_vignettes_beginning.json";
pub const END_FILE: &str = "static_vignettes_end.json";
pub const LIBRARY_FILE: &str = "adaptive_library.json";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VignetteOption {
    pub option_id: String,
    pub attributes: JobProfile,
}

impl VignetteOption {
    pub fn new(option_id: impl Into<String>, attributes: JobProfile) -> Self {
        Self {
            option_id: option_id.into(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vignette {
    pub vignette_id: String,
    #[serde(default)]
    pub category: String,
    pub options: Vec<VignetteOption>,
}

impl Vignette {
    pub fn pair(
        vignette_id: impl Into<String>,
        category: impl Into<String>,
        a: JobProfile,
        b: JobProfile,
    ) -> Self {
        Self {
            vignette_id: vignette_id.into(),
            category: category.into(),
            options: vec![VignetteOption::new("A", a), VignetteOption::new("B", b)],
        }
    }

    fn check_pair(&self) -> Result<(&VignetteOption, &VignetteOption), EngineError> {
        match self.options.as_slice() {
            [a, b] => Ok((a, b)),
            other => Err(EngineError::InvalidVignette {
                vignette_id: self.vignette_id.clone(),
                count: other.len(),
            }),
        }
    }

    /// Encode both options; fails unless there are exactly two.
    pub fn contrast(&self) -> Result<Contrast, EngineError> {
        let (a, b) = self.check_pair()?;
        Ok(Contrast::new(
            encode_profile(&a.attributes),
            encode_profile(&b.attributes),
        ))
    }

    /// Map a chosen option id onto A (first option) or B (second option).
    pub fn resolve_choice(&self, option_id: &str) -> Result<Choice, EngineError> {
        let (a, b) = self.check_pair()?;
        if a.option_id == option_id {
            Ok(Choice::A)
        } else if b.option_id == option_id {
            Ok(Choice::B)
        } else {
            Err(EngineError::UnknownOption {
                vignette_id: self.vignette_id.clone(),
                option_id: option_id.to_string(),
            })
        }
    }

    pub fn option(&self, choice: Choice) -> Option<&VignetteOption> {
        match choice {
            Choice::A => self.options.first(),
            Choice::B => self.options.get(1),
        }
    }
}

/// Provenance of a catalog build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub generated_at: DateTime<Utc>,
    /// blake3 over the attribute specification the catalogs were built from.
    pub attribute_fingerprint: String,
    /// Present when the build drew from `StdRng::seed_from_u64(seed)`.
    #[serde(default)]
    pub seed: Option<u64>,
    pub prior_variance: f64,
    pub num_beginning: usize,
    pub num_end: usize,
    pub num_library: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VignetteCatalogs {
    pub static_vignettes_beginning: Vec<Vignette>,
    pub static_vignettes_end: Vec<Vignette>,
    pub adaptive_library: Vec<Vignette>,
    pub manifest: CatalogManifest,
}

impl VignetteCatalogs {
    /// Write the three catalogs and the manifest into `dir` (created if needed).
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<(), CatalogError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| CatalogError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        write_json(&dir.join(BEGINNING_FILE), &self.static_vignettes_beginning)?;
        write_json(&dir.join(END_FILE), &self.static_vignettes_end)?;
        write_json(&dir.join(LIBRARY_FILE), &self.adaptive_library)?;
        write_json(&dir.join(MANIFEST_FILE), &self.manifest)?;
        Ok(())
    }

    pub fn read_dir(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        Ok(Self {
            static_vignettes_beginning: read_json(&dir.join(BEGINNING_FILE))?,
            static_vignettes_end: read_json(&dir.join(END_FILE))?,
            adaptive_library: read_json(&dir.join(LIBRARY_FILE))?,
            manifest: read_json(&dir.join(MANIFEST_FILE))?,
        })
    }

    pub fn total(&self) -> usize {
        self.static_vignettes_beginning.len()
            + self.static_vignettes_end.len()
            + self.adaptive_library.len()
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CatalogError> {
    let raw = serde_json::to_string_pretty(value)?;
    std::fs::write(path, raw).map_err(|source| CatalogError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
