use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use dropout_risk::app::pipeline::Predictor;
use dropout_risk::config::AppConfig;
use dropout_risk::domain::{
    ClassifyError, ErrorClass, ModelLoadError, OutcomeLabel, PredictError, RawInput, RawValue, StartupError,
    ValidationError,
};
use dropout_risk::encode::{NumericTransform, encode};
use dropout_risk::io::artifact::{ARTIFACT_FORMAT_VERSION, ModelArtifact, write_artifact_json};
use dropout_risk::io::batch::read_batch;
use dropout_risk::io::dataset::{DtypeManifest, ReferenceDataset};
use dropout_risk::io::export::write_results;
use dropout_risk::models::{DecisionTree, Estimator, LogisticModel, RandomForest, TreeNode};
use dropout_risk::schema::{self, FeatureSelection, Schema};
use dropout_risk::validate::validate;

const DATASET: &str = "\
Age at enrollment,Gender,Admission grade,Debtor,Target
19,Male,150.0,0,Graduate
23,Female,127.3,1,Dropout
31,Male,118.5,0,Enrolled
20,Female,142.1,0,Graduate
";

const DTYPES: &str = r#"{
    "Gender": {"type": "category", "levels": ["Male", "Female"]},
    "Debtor": {"type": "category", "levels": ["0", "1"]}
}"#;

struct Fixture {
    _dir: TempDir,
    config: AppConfig,
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Young students graduate; otherwise debtors drop out.
fn forest() -> RandomForest {
    RandomForest {
        trees: vec![DecisionTree {
            nodes: vec![
                TreeNode::Numeric {
                    feature: 0,
                    threshold: 20.0,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    probabilities: vec![0.1, 0.2, 0.7],
                },
                TreeNode::Categorical {
                    feature: 3,
                    left_codes: vec![1],
                    left: 3,
                    right: 4,
                },
                TreeNode::Leaf {
                    probabilities: vec![0.8, 0.1, 0.1],
                },
                TreeNode::Leaf {
                    probabilities: vec![0.2, 0.5, 0.3],
                },
            ],
        }],
        feature_importances: Some(vec![0.5, 0.05, 0.15, 0.3]),
    }
}

fn artifact(estimator: Estimator, n_features: usize, classes: Vec<i64>) -> ModelArtifact {
    ModelArtifact {
        format_version: ARTIFACT_FORMAT_VERSION,
        taxonomy_version: "v1".to_string(),
        n_features,
        feature_names: None,
        categorical_levels: HashMap::new(),
        preprocessing: HashMap::new(),
        classes,
        outcome_labels: BTreeMap::new(),
        estimator,
    }
}

fn fixture_with(model: &ModelArtifact) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = write(dir.path(), "cleaned_data_new.csv", DATASET);
    let dtypes_path = write(dir.path(), "dtypes.json", DTYPES);
    let model_path = dir.path().join("dropout_model.json");
    write_artifact_json(&model_path, model).unwrap();

    let config = AppConfig {
        dataset_path,
        dtypes_path: Some(dtypes_path),
        model_path,
        ..AppConfig::default()
    };
    Fixture { _dir: dir, config }
}

fn predictor() -> Predictor {
    let fx = fixture_with(&artifact(Estimator::RandomForest(forest()), 4, vec![0, 1, 2]));
    Predictor::load(&fx.config).unwrap()
}

fn student() -> RawInput {
    RawInput::new()
        .with("Age at enrollment", 19.0)
        .with("Gender", "Male")
        .with("Admission grade", 150.0)
        .with("Debtor", "0")
}

#[test]
fn loads_schema_from_dataset_and_manifest() {
    let p = predictor();
    let names: Vec<&str> = p.schema().names().collect();
    assert_eq!(names, ["Age at enrollment", "Gender", "Admission grade", "Debtor"]);

    let age = p.schema().feature("Age at enrollment").unwrap();
    assert_eq!(age.default_value(), Some(RawValue::Number(23.25)));
    assert_eq!(
        p.schema().feature("Gender").unwrap().levels(),
        Some(["Male".to_string(), "Female".to_string()].as_slice())
    );
}

#[test]
fn valid_student_is_encoded_unchanged_and_classified() {
    let p = predictor();
    let raw = student();

    let record = validate(&raw, p.schema()).unwrap();
    let encoded = encode(&record, p.schema(), p.adapter().encoding()).unwrap();
    assert_eq!(encoded.get("Age at enrollment"), Some(19.0));
    assert_eq!(encoded.get("Gender"), Some(0.0));
    assert_eq!(encoded.get("Admission grade"), Some(150.0));

    let outcome = p.predict(&raw).unwrap();
    assert_eq!(outcome.label, OutcomeLabel::Graduate);
    assert_eq!(outcome.raw.label, 2);
    assert_eq!(outcome.taxonomy_version, "v1");
}

#[test]
fn unknown_category_is_rejected_as_invalid_input() {
    let p = predictor();
    let raw = student().with("Gender", "Unknown");

    let err = p.predict(&raw).unwrap_err();
    assert_eq!(
        err,
        PredictError::Validation(ValidationError::InvalidCategory("Gender".into(), "Unknown".into()))
    );
    assert_eq!(err.class(), ErrorClass::InvalidInput);
}

#[test]
fn missing_feature_is_rejected() {
    let p = predictor();
    let mut raw = student();
    raw.remove("Debtor");

    let err = p.predict(&raw).unwrap_err();
    assert_eq!(err, PredictError::Validation(ValidationError::MissingFeature("Debtor".into())));
}

#[test]
fn feature_count_mismatch_stops_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = (0..13).map(|i| format!("f{i}")).collect::<Vec<_>>().join(",");
    csv.push_str(",Target\n");
    for row in 0..3 {
        let cells: Vec<String> = (0..13).map(|i| (i + row).to_string()).collect();
        csv.push_str(&cells.join(","));
        csv.push_str(",Dropout\n");
    }
    let dataset_path = write(dir.path(), "wide.csv", &csv);

    let single_leaf = RandomForest {
        trees: vec![DecisionTree {
            nodes: vec![TreeNode::Leaf {
                probabilities: vec![0.2, 0.3, 0.5],
            }],
        }],
        feature_importances: None,
    };
    let model_path = dir.path().join("model.json");
    write_artifact_json(&model_path, &artifact(Estimator::RandomForest(single_leaf), 14, vec![0, 1, 2])).unwrap();

    let config = AppConfig {
        dataset_path,
        model_path,
        ..AppConfig::default()
    };
    match Predictor::load(&config) {
        Err(StartupError::Model(ModelLoadError::FeatureCountMismatch { expected, found })) => {
            assert_eq!((expected, found), (14, 13));
        }
        other => panic!("expected a feature count mismatch, got {other:?}"),
    }
}

#[test]
fn unmapped_model_label_is_drift() {
    let always_five = RandomForest {
        trees: vec![DecisionTree {
            nodes: vec![TreeNode::Leaf {
                probabilities: vec![0.1, 0.1, 0.8],
            }],
        }],
        feature_importances: None,
    };
    let fx = fixture_with(&artifact(Estimator::RandomForest(always_five), 4, vec![0, 1, 5]));
    let p = Predictor::load(&fx.config).unwrap();

    let err = p.predict(&student()).unwrap_err();
    assert_eq!(err, PredictError::Classify(ClassifyError::UnknownOutcomeLabel(5)));
    assert!(err.is_drift());
}

#[test]
fn missing_model_file_stops_startup() {
    let mut fx = fixture_with(&artifact(Estimator::RandomForest(forest()), 4, vec![0, 1, 2]));
    fx.config.model_path = fx.config.model_path.with_file_name("absent.json");
    assert!(matches!(
        Predictor::load(&fx.config),
        Err(StartupError::Model(ModelLoadError::Missing(_)))
    ));
}

#[test]
fn feature_order_mismatch_stops_startup() {
    let mut model = artifact(Estimator::RandomForest(forest()), 4, vec![0, 1, 2]);
    model.feature_names = Some(vec![
        "Age at enrollment".into(),
        "Admission grade".into(),
        "Gender".into(),
        "Debtor".into(),
    ]);
    let fx = fixture_with(&model);
    assert!(matches!(
        Predictor::load(&fx.config),
        Err(StartupError::Model(ModelLoadError::FeatureOrderMismatch { position: 1, .. }))
    ));
}

#[test]
fn encoded_columns_follow_schema_order_for_any_key_order() {
    let p = predictor();
    let mut rng = StdRng::seed_from_u64(7);
    let expected: Vec<String> = p.schema().names().map(str::to_string).collect();

    for _ in 0..50 {
        let mut entries: Vec<(String, RawValue)> = vec![
            ("Age at enrollment".into(), RawValue::from(rng.gen_range(17.0..70.0_f64))),
            ("Gender".into(), ["Male", "Female"][rng.gen_range(0..2)].into()),
            ("Admission grade".into(), RawValue::from(rng.gen_range(95.0..190.0_f64))),
            ("Debtor".into(), ["0", "1"][rng.gen_range(0..2)].into()),
        ];
        // Shuffle insertion order.
        for i in (1..entries.len()).rev() {
            entries.swap(i, rng.gen_range(0..=i));
        }
        let raw: RawInput = entries.into_iter().collect();

        let record = validate(&raw, p.schema()).unwrap();
        let encoded = encode(&record, p.schema(), p.adapter().encoding()).unwrap();
        assert_eq!(encoded.columns(), expected.as_slice());
        assert_eq!(encoded.len(), p.adapter().info().n_features);

        let first = p.predict(&raw).unwrap();
        let second = p.predict(&raw).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn numeric_values_outside_observed_range_are_accepted() {
    let p = predictor();
    let raw = student().with("Age at enrollment", 99.0).with("Admission grade", -4.0);
    let outcome = p.predict(&raw).unwrap();
    assert_eq!(outcome.label, OutcomeLabel::Enrolled);
}

#[test]
fn form_defaults_produce_a_prediction() {
    let p = predictor();
    let defaults = p.schema().default_input();
    assert_eq!(defaults.len(), p.schema().len());
    // Mean age 23.25 with first Debtor level "0".
    assert_eq!(p.predict(&defaults).unwrap().label, OutcomeLabel::Enrolled);
}

#[test]
fn debtor_over_twenty_is_dropout() {
    let p = predictor();
    let raw = student().with("Age at enrollment", "24").with("Debtor", "1");
    assert_eq!(p.predict(&raw).unwrap().label, OutcomeLabel::Dropout);
}

#[test]
fn level_unknown_to_the_model_is_drift() {
    let mut model = artifact(Estimator::RandomForest(forest()), 4, vec![0, 1, 2]);
    model
        .categorical_levels
        .insert("Gender".to_string(), vec!["Male".to_string()]);
    let fx = fixture_with(&model);
    let p = Predictor::load(&fx.config).unwrap();

    let err = p.predict(&student().with("Gender", "Female")).unwrap_err();
    assert!(err.is_drift(), "unexpected {err:?}");
    assert!(p.predict(&student()).is_ok());
}

#[test]
fn logistic_model_with_preprocessing() {
    let logistic = LogisticModel {
        coefficients: vec![
            vec![0.0, 0.0, 0.0, 2.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ],
        intercepts: vec![0.0, 0.0, 0.0],
    };
    let mut model = artifact(Estimator::Logistic(logistic), 4, vec![0, 1, 2]);
    model.preprocessing.insert(
        "Admission grade".to_string(),
        NumericTransform::Standardize {
            mean: 130.0,
            scale: 10.0,
        },
    );
    let fx = fixture_with(&model);
    let p = Predictor::load(&fx.config).unwrap();

    // Grade 150 standardizes to 2.0, favouring Graduate.
    assert_eq!(p.predict(&student()).unwrap().label, OutcomeLabel::Graduate);
    // Grade 130 standardizes to 0.0; debtor code 1 favours Dropout.
    let raw = student().with("Admission grade", 130.0).with("Debtor", "1");
    assert_eq!(p.predict(&raw).unwrap().label, OutcomeLabel::Dropout);

    let ranking = p.adapter().feature_importances().unwrap();
    assert_eq!(ranking[0].feature, "Debtor");
}

#[test]
fn importances_are_ranked_descending() {
    let p = predictor();
    let ranking = p.adapter().feature_importances().unwrap();
    let names: Vec<&str> = ranking.iter().map(|f| f.feature.as_str()).collect();
    assert_eq!(names, ["Age at enrollment", "Debtor", "Admission grade", "Gender"]);
}

#[test]
fn batch_results_keep_row_order_and_export() {
    let p = predictor();
    let batch = "\
Age at enrollment,Gender,Admission grade,Debtor
19,Male,150,0
24,Female,120,1
22,Other,130,0
";
    let rows = read_batch(batch.as_bytes()).unwrap();
    let inputs: Vec<RawInput> = rows.iter().map(|r| r.input.clone()).collect();
    let results = p.predict_batch(&inputs);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().label, OutcomeLabel::Graduate);
    assert_eq!(results[1].as_ref().unwrap().label, OutcomeLabel::Dropout);
    assert_eq!(results[2].as_ref().unwrap_err().class(), ErrorClass::InvalidInput);

    let mut out = Vec::new();
    write_results(&mut out, &rows, &results, &p.adapter().info().classes).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("line,scored_at,outcome,raw_label,score,p_0,p_1,p_2"));
    assert!(lines[3].contains("invalid_input"));
}

#[test]
fn explicit_feature_selection_builds_a_narrower_schema() {
    let dtypes = DtypeManifest::from_json_str(DTYPES).unwrap();
    let dataset = ReferenceDataset::from_reader(DATASET.as_bytes(), &dtypes).unwrap();
    let schema: Schema = schema::build(
        &dataset,
        &FeatureSelection::Explicit(vec!["Debtor".into(), "Age at enrollment".into()]),
    )
    .unwrap();
    let names: Vec<&str> = schema.names().collect();
    assert_eq!(names, ["Debtor", "Age at enrollment"]);
}

#[test]
fn json_boolean_for_a_numeric_feature_names_the_feature() {
    let p = predictor();
    let raw = RawInput::from_json(
        r#"{"Age at enrollment": true, "Gender": "Male", "Admission grade": 150, "Debtor": "0"}"#,
    )
    .unwrap();
    let err = p.predict(&raw).unwrap_err();
    assert_eq!(err, PredictError::Validation(ValidationError::TypeMismatch("Age at enrollment".into())));
}

#[test]
fn malformed_numeric_cell_stops_startup() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = write(
        dir.path(),
        "bad.csv",
        "Age at enrollment,Debtor,Target\n19,0,Graduate\nabc,1,Dropout\n",
    );
    let dtypes_path = write(
        dir.path(),
        "dtypes.json",
        r#"{"Age at enrollment": {"type": "int"}, "Debtor": {"type": "category", "levels": ["0", "1"]}}"#,
    );
    let config = AppConfig {
        dataset_path,
        dtypes_path: Some(dtypes_path),
        model_path: dir.path().join("unused.json"),
        ..AppConfig::default()
    };
    assert!(matches!(
        Predictor::load(&config),
        Err(StartupError::Schema(dropout_risk::domain::SchemaBuildError::Malformed(_)))
    ));
}
