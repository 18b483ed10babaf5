use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use elicit_harness::features::attr;
use elicit_harness::offline::attributes::{
    default_attribute_specs, load_attribute_specs, AttributeSpec, Direction,
};
use elicit_harness::offline::dominance::{pareto_frontier, profile_dominates};
use elicit_harness::offline::profiles::{generate_profiles, profile_count};
use elicit_harness::offline::screening::{
    attribute_cancellation, wage_ratio_exceeds, PairScreen, RejectReason,
};
use elicit_harness::{
    build_catalogs, build_catalogs_seeded, encode_profile, CatalogError, ConfigError, JobProfile,
    OfflineConfig, PriorConfig, VignetteCatalogs,
};

fn job(wage: f64, commute: f64) -> JobProfile {
    JobProfile::default()
        .with(attr::WAGE, wage)
        .with(attr::COMMUTE_TIME, commute)
}

fn directional_specs() -> Vec<AttributeSpec> {
    vec![
        AttributeSpec::ordinal(attr::WAGE, &[3000.0, 4000.0, 5000.0], Direction::HigherIsBetter),
        AttributeSpec::ordinal(attr::COMMUTE_TIME, &[15.0, 30.0, 60.0], Direction::LowerIsBetter),
    ]
}

#[test]
fn crafted_four_profiles_leave_three_on_the_frontier() {
    let profiles = vec![
        job(5000.0, 60.0),
        job(3000.0, 15.0),
        job(4000.0, 30.0),
        job(3000.0, 60.0),
    ];
    let frontier = pareto_frontier(&profiles, &directional_specs());
    assert_eq!(frontier.len(), 3);
    assert!(!frontier.contains(&job(3000.0, 60.0)));
    for a in &frontier {
        for b in &frontier {
            assert!(!profile_dominates(a, b, &directional_specs()));
        }
    }
}

#[test]
fn directional_factorial_keeps_only_trade_offs() {
    let specs = directional_specs();
    let all = generate_profiles(&specs, 100).unwrap();
    assert_eq!(all.len() as u128, profile_count(&specs));
    assert_eq!(all.len(), 9);
    // Only (5000, 15) survives: it is best on both attributes.
    let frontier = pareto_frontier(&all, &specs);
    assert_eq!(frontier, vec![job(5000.0, 15.0)]);
}

#[test]
fn wage_gap_boundary() {
    assert!(!wage_ratio_exceeds(1.67, 1.0, 1.67));
    assert!(wage_ratio_exceeds(1.68, 1.0, 1.67));

    let screen = PairScreen {
        max_wage_ratio: 1.67,
        quasi_dominance_dims: 5,
        cancellation_threshold: None,
    };
    let a = JobProfile::default()
        .with(attr::WAGE, 5100.0)
        .with(attr::REMOTE_WORK, 0.0);
    let b = JobProfile::default()
        .with(attr::WAGE, 3000.0)
        .with(attr::REMOTE_WORK, 1.0);
    assert_eq!(
        screen.check(&a, &b, &encode_profile(&a), &encode_profile(&b)),
        Some(RejectReason::WageGap)
    );
    let a = a.with(attr::WAGE, 5000.0);
    assert_eq!(screen.check(&a, &b, &encode_profile(&a), &encode_profile(&b)), None);
}

#[test]
fn mixed_work_environment_contrast_is_not_cancellation() {
    let a = JobProfile::default()
        .with(attr::PHYSICAL_DEMAND, 0.0)
        .with(attr::REMOTE_WORK, 1.0)
        .with(attr::COMMUTE_TIME, 60.0);
    let b = JobProfile::default()
        .with(attr::PHYSICAL_DEMAND, 1.0)
        .with(attr::REMOTE_WORK, 0.0)
        .with(attr::COMMUTE_TIME, 15.0);
    assert_eq!(attribute_cancellation(&a, &b, 0.15), None);
}

fn small_config() -> OfflineConfig {
    OfflineConfig {
        num_static: 4,
        num_beginning: 2,
        static_sample_size: 3_000,
        num_library: 8,
        library_sample_size: 1_000,
        seed: 2024,
        ..OfflineConfig::default()
    }
}

#[test]
fn default_design_builds_and_round_trips_through_disk() {
    let specs = default_attribute_specs();
    let (catalogs, report) =
        build_catalogs_seeded(&specs, &PriorConfig::default(), &small_config()).unwrap();
    assert_eq!(report.profiles_generated, 3072);
    assert!(report.is_complete(&small_config()));
    assert!(report.warnings.is_empty());
    assert_eq!(report.static_rounds.len(), 4);
    assert_eq!(report.library_rounds.len(), 8);

    let ids: HashSet<&str> = catalogs
        .static_vignettes_beginning
        .iter()
        .chain(&catalogs.static_vignettes_end)
        .chain(&catalogs.adaptive_library)
        .map(|v| v.vignette_id.as_str())
        .collect();
    assert_eq!(ids.len(), catalogs.total());

    let dir = tempdir().unwrap();
    catalogs.write_dir(dir.path()).unwrap();
    let loaded = VignetteCatalogs::read_dir(dir.path()).unwrap();
    assert_eq!(loaded, catalogs);
    assert_eq!(loaded.manifest.seed, Some(2024));
    assert_eq!(loaded.manifest.num_library, 8);
}

#[test]
fn injected_rng_build_records_no_seed() {
    let mut rng = StdRng::seed_from_u64(4);
    let (catalogs, _) = build_catalogs(
        &default_attribute_specs(),
        &PriorConfig::default(),
        &small_config(),
        &mut rng,
    )
    .unwrap();
    assert_eq!(catalogs.manifest.seed, None);
    assert_eq!(catalogs.static_vignettes_beginning.len(), 2);
}

#[test]
fn exhausted_library_returns_partial_catalog_with_warning() {
    let specs = vec![
        AttributeSpec::ordinal(attr::WAGE, &[3000.0, 4000.0], Direction::Neutral),
        AttributeSpec::binary(attr::REMOTE_WORK, Direction::Neutral),
    ];
    let cfg = OfflineConfig {
        num_static: 1,
        num_beginning: 1,
        num_library: 5,
        max_attempts: 2,
        ..small_config()
    };
    let (catalogs, report) =
        build_catalogs_seeded(&specs, &PriorConfig::default(), &cfg).unwrap();
    // (3000, remote) vs (4000, on-site) is the only admissible trade-off.
    assert_eq!(catalogs.static_vignettes_beginning.len(), 1);
    assert!(catalogs.adaptive_library.is_empty());
    assert!(!report.is_complete(&cfg));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(catalogs.manifest.warnings, report.warnings);
}

#[test]
fn invalid_attribute_file_fails_fast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("attributes.json");
    std::fs::write(&path, "[]").unwrap();
    let err = load_attribute_specs(&path).unwrap_err();
    assert!(matches!(err, CatalogError::Config(ConfigError::EmptyAttributes)));

    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(
        load_attribute_specs(&path),
        Err(CatalogError::Parse { .. })
    ));
}
