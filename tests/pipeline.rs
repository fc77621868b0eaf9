// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tpclassifier::features::VectorizerStrategy;
use tpclassifier::models::{ConstantClassifier, MultinomialNb};
use tpclassifier::{ClassifierError, DocumentClassifier, FeatureConfig, Label, PipelineStage, SourceFormat};

const WORM: [&str; 10] = [
    "daf-2 mutants show extended lifespan in the worm",
    "the nematode worm ages slowly when insulin signalling drops",
    "lifespan of worm strains carrying daf mutations",
    "worm dauer formation depends on daf genes",
    "aging worm populations under dietary restriction",
    "longevity assays of mutant worm lines",
    "daf-16 drives lifespan extension in the worm",
    "neuronal signals regulate worm lifespan",
    "the worm germline shortens lifespan",
    "heat shock factor extends worm longevity",
];

const YEAST: [&str; 10] = [
    "budding yeast grows in glucose rich medium",
    "yeast cell cycle arrest in minimal medium",
    "sporulation of diploid yeast on acetate medium",
    "glucose repression in budding yeast",
    "yeast cell wall stress on rich medium",
    "mating type switching in budding yeast",
    "yeast growth on galactose medium",
    "respiration of yeast cells in glycerol medium",
    "budding yeast chromosome segregation",
    "yeast colonies on agar medium",
];

fn cas(text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><xmi:XMI><cas:Sofa xmi:id="1" sofaString="{}"/></xmi:XMI>"#,
        text
    )
}

fn write_cas_corpus(dir: &Path, docs: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for (i, text) in docs.iter().enumerate() {
        let file = File::create(dir.join(format!("paper_{:02}.tpcas.gz", i))).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(cas(text).as_bytes()).unwrap();
        encoder.finish().unwrap();
    }
}

#[test]
fn test_end_to_end_on_compressed_cas() {
    let dir = tempfile::tempdir().unwrap();
    let worm = dir.path().join("worm");
    let yeast = dir.path().join("yeast");
    write_cas_corpus(&worm, &WORM);
    write_cas_corpus(&yeast, &YEAST);
    // Not a CAS file, must be ignored
    fs::write(worm.join("notes.txt"), "worm notes").unwrap();

    let mut classifier = DocumentClassifier::with_seed(42);
    assert_eq!(
        classifier
            .add_labeled_documents(&worm, false, SourceFormat::CasXml, Label(1))
            .unwrap(),
        10
    );
    classifier
        .add_labeled_documents(&yeast, false, SourceFormat::CasXml, Label(0))
        .unwrap();
    assert_eq!(classifier.store().dataset().len(), 20);

    classifier.split(0.8).unwrap();
    assert_eq!(classifier.store().training().len(), 16);
    assert_eq!(classifier.store().test().len(), 4);

    // File names repeat across corpora, so compare (label, name) pairs
    let key = |d: &tpclassifier::DocumentRecord| (d.label, d.filename.clone());
    let training: HashSet<_> = classifier.store().training().documents().iter().map(key).collect();
    let test: HashSet<_> = classifier.store().test().documents().iter().map(key).collect();
    assert!(training.is_disjoint(&test));
    assert_eq!(training.len() + test.len(), 20);

    let config = FeatureConfig {
        strategy: VectorizerStrategy::Tfidf,
        top_n_features: Some(20),
        ..Default::default()
    };
    classifier.extract_features(&config).unwrap();
    assert_eq!(classifier.stage(), PipelineStage::Extracted);
    assert_eq!(classifier.n_features(), Some(20));

    classifier.train(Box::new(MultinomialNb::default()), false).unwrap();
    let results = classifier.evaluate(true, false).unwrap();
    assert!(results.accuracy > 0.9);
    assert_eq!(results.roc.fpr.len(), results.roc.tpr.len());
    assert_eq!(results.roc.fpr.len(), results.roc.thresholds.len());

    let predictions = classifier
        .predict_directory(&yeast, SourceFormat::CasXml, false)
        .unwrap();
    assert_eq!(predictions.len(), 10);
    let yeast_calls = predictions.iter().filter(|p| p.label == Label(0)).count();
    assert!(yeast_calls >= 8, "only {} yeast documents recognised", yeast_calls);
}

#[test]
fn test_always_positive_classifier_on_test_subset() {
    let dir = tempfile::tempdir().unwrap();
    let worm = dir.path().join("worm");
    let yeast = dir.path().join("yeast");
    write_cas_corpus(&worm, &WORM);
    write_cas_corpus(&yeast, &YEAST);

    let mut classifier = DocumentClassifier::with_seed(3);
    classifier
        .add_labeled_documents(&worm, false, SourceFormat::CasXml, Label(1))
        .unwrap();
    classifier
        .add_labeled_documents(&yeast, false, SourceFormat::CasXml, Label(0))
        .unwrap();
    classifier.split(0.5).unwrap();
    classifier.extract_features(&FeatureConfig::default()).unwrap();
    classifier.train(Box::new(ConstantClassifier::default()), false).unwrap();

    let results = classifier.evaluate(false, false).unwrap();
    let test_labels = classifier.store().test().labels();
    let positives = test_labels.iter().filter(|l| **l == Label(1)).count();
    let share = positives as f64 / test_labels.len() as f64;

    assert!((results.accuracy - share).abs() < 1e-6);
    assert!((results.precision - share).abs() < 1e-6);
    if positives > 0 {
        assert!((results.recall - 1.0).abs() < 1e-6);
    }
}

#[test]
fn test_stop_word_only_corpus_fails_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("a.txt"), "the and of").unwrap();
    fs::write(docs.join("b.txt"), "is it was").unwrap();

    let mut classifier = DocumentClassifier::with_seed(0);
    classifier
        .add_labeled_documents(&docs, false, SourceFormat::Txt, Label(1))
        .unwrap();
    classifier.split(1.0).unwrap();

    let err = classifier.extract_features(&FeatureConfig::default()).unwrap_err();
    assert!(matches!(err, ClassifierError::EmptyVocabulary(_)));
    assert_eq!(classifier.stage(), PipelineStage::Empty);
}
