//! Full-factorial profile enumeration.

use crate::error::ConfigError;
use crate::features::JobProfile;

use super::attributes::{validate_specs, AttributeSpec};

/// Number of profiles the specification enumerates (Π levels).
pub fn profile_count(specs: &[AttributeSpec]) -> u128 {
    specs
        .iter()
        .map(|s| s.effective_levels().len() as u128)
        .product()
}

/// Cartesian product over every attribute's levels. The first attribute
/// varies slowest.
pub fn generate_profiles(
    specs: &[AttributeSpec],
    max_profiles: usize,
) -> Result<Vec<JobProfile>, ConfigError> {
    validate_specs(specs)?;
    let count = profile_count(specs);
    if count > max_profiles as u128 {
        return Err(ConfigError::TooManyProfiles {
            count,
            limit: max_profiles,
        });
    }

    let levels: Vec<&[f64]> = specs.iter().map(|s| s.effective_levels()).collect();
    let mut cursor = vec![0usize; specs.len()];
    let mut out = Vec::with_capacity(count as usize);

    loop {
        out.push(
            specs
                .iter()
                .enumerate()
                .map(|(a, spec)| (spec.name.clone(), levels[a][cursor[a]]))
                .collect::<JobProfile>(),
        );

        // Odometer increment from the last attribute.
        let mut pos = specs.len();
        loop {
            if pos == 0 {
                return Ok(out);
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < levels[pos].len() {
                break;
            }
            cursor[pos] = 0;
        }
    }
}
