//! End-to-end tests: import reference files into a store, load the table,
//! and run ranges, classifications and assessments against it.

use std::path::PathBuf;

use growthwatch::{
    ChildProfile, Config, Gender, GrowthAssessor, GrowthClassifier, GrowthStatus, ImportOutcome,
    LinearEstimator, RangeCalculator, ReferenceStore,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn populated_store(dir: &tempfile::TempDir) -> ReferenceStore {
    let mut store = ReferenceStore::open(dir.path().join("data").join("reference.db")).unwrap();
    store
        .import_file(Gender::Male, fixture("hfa_boys_sample.txt"))
        .unwrap();
    store
        .import_file(Gender::Female, fixture("hfa_girls_sample.csv"))
        .unwrap();
    store
}

#[test]
fn test_import_and_load_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(&dir);

    let stats = store.stats().unwrap();
    assert_eq!(stats.male_rows, 15);
    assert_eq!(stats.female_rows, 15);
    assert_eq!(stats.sources, 2);
    assert!(stats.last_import.is_some());

    let table = store.load_table().unwrap();
    assert_eq!(table.len(), 30);
    assert_eq!(table.month_range(Gender::Male), Some((61, 228)));
    assert_eq!(table.supported_age_years(Gender::Female), Some((6, 19)));
}

#[test]
fn test_reimport_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = populated_store(&dir);

    let outcome = store
        .import_file(Gender::Male, fixture("hfa_boys_sample.txt"))
        .unwrap();
    assert!(matches!(outcome, ImportOutcome::Skipped { .. }));
    assert_eq!(store.count(Gender::Male).unwrap(), 15);
}

#[test]
fn test_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = {
        let store = populated_store(&dir);
        store.path().to_path_buf()
    };

    let reopened = ReferenceStore::open(&path).unwrap();
    assert_eq!(reopened.count(Gender::Male).unwrap(), 15);
    assert_eq!(reopened.sources(Some(Gender::Female)).unwrap().len(), 1);
}

#[test]
fn test_classify_from_stored_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(&dir);
    let calculator = RangeCalculator::new(store.load_table().unwrap());
    let classifier = GrowthClassifier::new(&calculator);

    let normal = classifier.classify(140.0, 10, Gender::Male).unwrap();
    assert_eq!(normal.status, GrowthStatus::Normal);

    let under = classifier.classify(120.0, 10, Gender::Male).unwrap();
    assert_eq!(under.status, GrowthStatus::Undergrowth);

    let over = classifier.classify(160.0, 10, Gender::Male).unwrap();
    assert_eq!(over.status, GrowthStatus::Overgrowth);

    let too_young = classifier.classify(100.0, 5, Gender::Female).unwrap();
    assert_eq!(too_young.status, GrowthStatus::OutOfRange);
}

#[test]
fn test_deleting_a_month_makes_that_age_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(&dir);

    assert!(store.delete_month(Gender::Male, 120).unwrap());
    let calculator = RangeCalculator::new(store.load_table().unwrap());

    assert_eq!(calculator.expected_range(10, Gender::Male).unwrap(), None);
    assert!(calculator.expected_range(10, Gender::Female).unwrap().is_some());
}

#[test]
fn test_assess_with_configured_estimator() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(&dir);
    let config = Config::default();

    let calculator =
        RangeCalculator::with_z_score(store.load_table().unwrap(), config.growth.z_score).unwrap();
    let assessor = GrowthAssessor::new(&calculator, &config.estimator)
        .with_horizon(config.growth.horizon_years);

    let profile = ChildProfile {
        age_years: 10,
        gender: Gender::Male,
        height_cm: 135.0,
        weight_kg: 30.0,
    };
    let assessment = assessor.assess(&profile).unwrap();

    // Default estimator: current height + 5 cm, classified at the current age.
    assert!((assessment.predicted_height - 140.0).abs() < 1e-9);
    assert_eq!(assessment.target_age_years, 10);
    assert_eq!(assessment.verdict.status, GrowthStatus::Normal);
    assert!((assessment.verdict.lower.unwrap() - 124.74).abs() < 1e-9);
}

#[test]
fn test_assess_with_closure_estimator() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(&dir);
    let calculator = RangeCalculator::new(store.load_table().unwrap());

    let stunted = |_: &growthwatch::EstimatorInput| 110.0;
    let assessor = GrowthAssessor::new(&calculator, &stunted);

    let profile = ChildProfile {
        age_years: 9,
        gender: Gender::Male,
        height_cm: 120.0,
        weight_kg: 25.0,
    };
    let assessment = assessor.assess(&profile).unwrap();
    assert_eq!(assessment.verdict.status, GrowthStatus::Undergrowth);
    assert!(assessment.verdict.status.is_abnormal());
}

#[test]
fn test_assess_rejects_out_of_limit_profile() {
    let calculator = RangeCalculator::new(growthwatch::ReferenceTable::default());
    let estimator = LinearEstimator::default();
    let assessor = GrowthAssessor::new(&calculator, &estimator);

    let profile = ChildProfile {
        age_years: 10,
        gender: Gender::Female,
        height_cm: 30.0,
        weight_kg: 25.0,
    };
    let err = assessor.assess(&profile).unwrap_err();
    assert!(err.is_invalid_input());
}
