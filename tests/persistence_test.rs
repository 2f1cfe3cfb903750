use std::sync::Arc;

use tempfile::Builder;

use nutriclass::config::EngineConfig;
use nutriclass::ml::{IntentClassifier, ModelRecord};
use nutriclass::repository::model_store::DEFAULT_MODEL_NAME;
use nutriclass::repository::{
    IntentSample, MemoryEventLog, MemoryTrainingData, ModelStore, StorageModelStore,
};
use nutriclass::training::TrainingManager;

const PROBES: [&str; 6] = [
    "hello",
    "what protein should I eat",
    "calculate my bmi",
    "protein shake after workout",
    "",
    "12345 !!!",
];

fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.text.min_word_freq = 1;
    config.network.seed = Some(5);
    config.training.min_training_examples = 6;
    config
}

fn data() -> Arc<MemoryTrainingData> {
    let samples = [
        ("greeting", "hi"),
        ("greeting", "hello there"),
        ("protein_question", "how much protein do I need"),
        ("protein_question", "best protein sources"),
        ("bmi_help", "calculate my bmi"),
        ("bmi_help", "is my bmi healthy"),
    ]
    .into_iter()
    .map(|(intent, text)| IntentSample {
        intent: intent.to_string(),
        text: text.to_string(),
    });
    Arc::new(MemoryTrainingData::from_samples(samples).unwrap())
}

fn manager(data: Arc<MemoryTrainingData>, store: Arc<dyn ModelStore>) -> TrainingManager {
    TrainingManager::new(&config(), data, store, Arc::new(MemoryEventLog::default())).unwrap()
}

#[test]
fn test_round_trip_through_model_directory() {
    let dir = Builder::new().prefix("nutriclass_model").tempdir().unwrap();
    let data = data();

    let trainer = manager(
        Arc::clone(&data),
        Arc::new(StorageModelStore::open_dir(dir.path()).unwrap()),
    );
    trainer.train_model(200, true).unwrap();
    assert!(dir.path().join(DEFAULT_MODEL_NAME).is_file());

    // A new store over the same directory stands in for a restarted process.
    let restored = manager(
        data,
        Arc::new(StorageModelStore::open_dir(dir.path()).unwrap()),
    );
    assert!(restored.initialize());

    for probe in PROBES {
        let a = trainer.get_enhanced_prediction(probe, true);
        let b = restored.get_enhanced_prediction(probe, true);
        let (a, b) = (a.neural_prediction.unwrap(), b.neural_prediction.unwrap());
        assert_eq!(a.intent_id, b.intent_id, "probe {probe:?}");
        assert!((a.confidence - b.confidence).abs() < 1e-12, "probe {probe:?}");
    }

    assert_eq!(
        restored.classifier().model_state(),
        trainer.classifier().model_state()
    );
}

#[test]
fn test_corrupt_record_degrades_to_not_ready() {
    let dir = Builder::new().prefix("nutriclass_corrupt").tempdir().unwrap();
    let store = Arc::new(StorageModelStore::open_dir(dir.path()).unwrap());

    let trainer = manager(data(), store.clone());
    trainer.train_model(20, true).unwrap();

    let path = dir.path().join(DEFAULT_MODEL_NAME);
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 10;
    bytes[last] ^= 0x5a;
    std::fs::write(&path, &bytes).unwrap();

    let restored = manager(data(), store);
    assert!(!restored.initialize());
    assert!(!restored.is_ready());

    let answer = restored.get_enhanced_prediction("hello", true);
    assert!(answer.fallback_used);
    assert!(answer.neural_prediction.is_none());
}

#[test]
fn test_stray_temp_file_is_ignored() {
    let dir = Builder::new().prefix("nutriclass_tmp").tempdir().unwrap();
    let store = Arc::new(StorageModelStore::open_dir(dir.path()).unwrap());

    let trainer = manager(data(), store.clone());
    trainer.train_model(20, true).unwrap();

    // A crash mid-write leaves only the temp file behind.
    std::fs::write(
        dir.path().join(format!("{DEFAULT_MODEL_NAME}.tmp")),
        b"half a reco",
    )
    .unwrap();

    let restored = manager(data(), store);
    assert!(restored.initialize());
}

#[test]
fn test_saved_record_is_versioned() {
    let store = Arc::new(StorageModelStore::in_memory());
    let mut classifier =
        IntentClassifier::new(&config(), data(), store.clone() as Arc<dyn ModelStore>).unwrap();
    classifier.train_model(10).unwrap();
    classifier.save_model().unwrap();

    let bytes = store.read_latest().unwrap().unwrap();
    let record = ModelRecord::decode(&bytes).unwrap();
    assert_eq!(record.format_version, nutriclass::ml::FORMAT_VERSION);
    assert!(record.state.trained);
    assert_eq!(record.state.index_to_intent.len(), 3);
    assert_eq!(
        record.state.vocabulary_fingerprint,
        classifier.vocabulary_fingerprint()
    );
}
