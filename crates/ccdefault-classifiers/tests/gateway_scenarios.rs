use std::sync::Arc;

use ccdefault_classifiers::config::{ModelConfig, ModelType};
use ccdefault_classifiers::data_handling::LabeledDataset;
use ccdefault_classifiers::gateway::{InferenceGateway, Verdict};
use ccdefault_classifiers::models::{ClassifierState, TrainedModel};
use ccdefault_classifiers::pipeline::train_interactive_model;
use ccdefault_classifiers::schema::{
    ApplicantProfile, Education, Gender, MaritalStatus, Record, Schema, AGE, BILL_AMT1,
    EDUCATION, LIMIT_BAL, MARRIAGE, PAY_AMT1, SEX,
};
use ccdefault_classifiers::PipelineError;

fn profile(education: Education) -> ApplicantProfile {
    ApplicantProfile {
        gender: Gender::Male,
        education,
        marital_status: MaritalStatus::Married,
        age: 30.0,
        credit_limit: 5000.0,
        bill_amount: 2000.0,
        payment_amount: 2500.0,
    }
}

fn training_set(educations: &[Education], label: impl Fn(usize) -> u8) -> LabeledDataset {
    let genders = [Gender::Male, Gender::Female];
    let statuses = [MaritalStatus::Married, MaritalStatus::Single, MaritalStatus::Others];
    let mut records = Vec::new();
    let mut labels = Vec::new();
    for i in 0..60 {
        let p = ApplicantProfile {
            gender: genders[i % 2],
            education: educations[i % educations.len()],
            marital_status: statuses[i % 3],
            age: 20.0 + i as f64,
            credit_limit: 1000.0 * (i + 1) as f64,
            bill_amount: 100.0 * i as f64,
            payment_amount: 50.0 * i as f64,
        };
        records.push(Record::from(&p));
        labels.push(label(i));
    }
    LabeledDataset::new(records, labels).unwrap()
}

fn small_forest() -> ModelConfig {
    let mut config = ModelConfig::new(ModelType::ensemble());
    if let ModelType::Ensemble { n_trees, .. } = &mut config.model_type {
        *n_trees = 10;
    }
    config
}

#[test]
fn category_unseen_at_fit_time_is_rejected() {
    let dataset = training_set(&[Education::GraduateSchool, Education::University], |i| {
        u8::from(i % 3 == 0)
    });
    let gateway = train_interactive_model(&dataset, &small_forest()).unwrap();

    let err = gateway
        .predict_profile(&profile(Education::HighSchool))
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::UnknownCategory {
            field: EDUCATION.to_string(),
            value: "High School".to_string(),
        }
    );
}

#[test]
fn always_negative_model_answers_no_default() {
    let dataset = training_set(&[Education::University, Education::GraduateSchool], |_| 0);
    for config in [small_forest(), ModelConfig::default()] {
        let gateway = train_interactive_model(&dataset, &config).unwrap();
        for _ in 0..3 {
            let verdict = gateway.predict_profile(&profile(Education::University)).unwrap();
            assert_eq!(verdict, Verdict::NoDefault);
            assert_eq!(verdict.to_string(), "No Default");
        }
    }
}

#[test]
fn missing_form_field_is_a_schema_mismatch() {
    let dataset = training_set(&[Education::University], |i| u8::from(i % 2 == 0));
    let gateway = train_interactive_model(&dataset, &small_forest()).unwrap();

    let incomplete = Record::new()
        .with_category(SEX, "Male")
        .with_category(EDUCATION, "University")
        .with_category(MARRIAGE, "Married")
        .with_number(AGE, 30.0)
        .with_number(LIMIT_BAL, 5000.0)
        .with_number(BILL_AMT1, 2000.0);
    match gateway.predict_single(&incomplete) {
        Err(PipelineError::SchemaMismatch { field, .. }) => assert_eq!(field, PAY_AMT1),
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}

#[test]
fn gateway_needs_a_reduced_schema_model() {
    let dataset = training_set(&[Education::University], |i| u8::from(i % 2 == 0));
    let reduced = TrainedModel::fit(&dataset, Schema::Reduced, &small_forest()).unwrap();
    assert!(InferenceGateway::new(Arc::new(reduced)).is_ok());

    let state = ClassifierState::new(small_forest(), Schema::Full);
    assert_eq!(
        InferenceGateway::from_state(&state).unwrap_err(),
        PipelineError::NotFitted
    );
}

#[test]
fn gateway_is_shared_across_threads() {
    let dataset = training_set(&[Education::University, Education::HighSchool], |i| {
        u8::from(i < 20)
    });
    let gateway = train_interactive_model(&dataset, &small_forest()).unwrap();
    let expected = gateway.predict_profile(&profile(Education::University)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gateway = gateway.clone();
            std::thread::spawn(move || gateway.predict_profile(&profile(Education::University)))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), expected);
    }
}
