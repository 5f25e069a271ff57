use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use failure::ResultExt;
use log::{debug, info};

use super::classifier_bank::ClassifierBank;
use super::featurizer::Featurizer;
use super::registry::{ClassifierData, ClassifierRegistry};
use super::trainer::{check_inverse_regularisation, train_classifiers, TrainingReport};
use super::training_data::{training_examples_from_parts, TrainingExample};
use super::{ClassifierBankState, DialogueActParser};
use crate::configurations::DaiClassifierConfig;
use crate::dialogue_act::{DialogueAct, DialogueActConfusionNetwork, DialogueActItem};
use crate::errors::*;
use crate::models::{DaiClassifierModel, ModelVersion, ProcessingUnitMetadata};
use crate::resources::SharedResources;
use crate::utils::{extract_zip_archive, ExampleId, FeatureName};
use crate::utterance::{Utterance, UtteranceNBList};

const MODEL_FILENAME: &str = "dai_classifier.json";
const METADATA_FILENAME: &str = "metadata.json";

/// Dialogue act item classifier made of one logistic regression per item
///
/// Training goes through `extract_classifiers`, `prune_classifiers`,
/// `gen_classifiers_data` and `train`. The trained bank is shared and replaced as a
/// whole, so a previously trained or loaded bank keeps serving `parse` while a new
/// training pipeline is prepared.
pub struct LogRegDaiClassifier {
    config: DaiClassifierConfig,
    featurizer: Featurizer,
    state: ClassifierBankState,
    registry: Option<ClassifierRegistry>,
    classifiers_data: Option<BTreeMap<DialogueActItem, ClassifierData>>,
    bank: Option<Arc<ClassifierBank>>,
}

impl LogRegDaiClassifier {
    pub fn new(config: DaiClassifierConfig, shared_resources: Arc<SharedResources>) -> Result<Self> {
        config.validate()?;
        let featurizer = Featurizer::new(config.featurizer.clone(), shared_resources);
        Ok(Self {
            config,
            featurizer,
            state: ClassifierBankState::Empty,
            registry: None,
            classifiers_data: None,
            bank: None,
        })
    }

    pub fn config(&self) -> &DaiClassifierConfig {
        &self.config
    }

    pub fn state(&self) -> ClassifierBankState {
        self.state
    }

    /// Keys currently registered for training, empty when nothing was extracted
    pub fn classifier_keys(&self) -> Vec<DialogueActItem> {
        self.registry
            .as_ref()
            .map(|registry| registry.keys())
            .unwrap_or_else(Vec::new)
    }

    pub fn feature_vocabulary(&self) -> Vec<FeatureName> {
        self.registry
            .as_ref()
            .map(|registry| registry.feature_vocabulary())
            .unwrap_or_else(Vec::new)
    }

    /// Keys of the bank used by `parse`
    pub fn trained_keys(&self) -> Vec<DialogueActItem> {
        self.bank
            .as_ref()
            .map(|bank| bank.keys())
            .unwrap_or_else(Vec::new)
    }
}

impl LogRegDaiClassifier {
    pub fn extract_classifiers(&mut self, examples: &HashMap<ExampleId, TrainingExample>) {
        info!("Extracting classifiers from {} examples ...", examples.len());
        let registry = ClassifierRegistry::extract(examples, &self.featurizer);
        info!(
            "{} classifiers extracted from {} examples, {} distinct features",
            registry.keys().len(),
            registry.nb_examples(),
            registry.feature_vocabulary().len()
        );
        for key in registry.keys() {
            if let Some(item_examples) = registry.item_examples(&key) {
                debug!(
                    "'{}': {} positives, {} negatives",
                    key,
                    item_examples.positives.len(),
                    item_examples.negatives.len()
                );
            }
        }
        self.registry = Some(registry);
        self.classifiers_data = None;
        self.state = ClassifierBankState::Extracted;
    }

    pub fn extract_classifiers_from_parts(
        &mut self,
        dialogue_acts: &HashMap<ExampleId, DialogueAct>,
        utterances: &HashMap<ExampleId, Utterance>,
    ) -> Result<()> {
        let examples = training_examples_from_parts(dialogue_acts, utterances)?;
        self.extract_classifiers(&examples);
        Ok(())
    }

    pub fn prune_classifiers(&mut self, min_classifier_count: usize) -> Result<()> {
        let registry = match self.registry.as_mut() {
            Some(registry) => registry,
            None => return Err(SluError::Configuration(
                "classifiers must be extracted before being pruned".to_string()
            ).into()),
        };
        registry.prune(min_classifier_count);
        info!(
            "{} classifiers left after pruning with min count {}",
            registry.keys().len(),
            min_classifier_count
        );
        self.classifiers_data = None;
        self.state = ClassifierBankState::Pruned;
        Ok(())
    }

    pub fn gen_classifiers_data(
        &mut self,
        min_pos_feature_count: usize,
        min_neg_feature_count: usize,
    ) -> Result<()> {
        let registry = match self.registry.as_ref() {
            Some(registry) if self.state >= ClassifierBankState::Pruned => registry,
            _ => return Err(SluError::Configuration(
                "classifiers must be pruned before generating their data".to_string()
            ).into()),
        };
        info!("Generating classifiers data ...");
        let classifiers_data =
            registry.gen_classifiers_data(min_pos_feature_count, min_neg_feature_count);
        info!("Data generated for {} classifiers", classifiers_data.len());
        self.classifiers_data = Some(classifiers_data);
        self.state = ClassifierBankState::FeatureReady;
        Ok(())
    }

    pub fn train(&mut self, inverse_regularisation: f64) -> Result<TrainingReport> {
        self.train_cancellable(inverse_regularisation, &AtomicBool::new(false))
    }

    /// Trains the classifiers until `cancel` is raised
    ///
    /// The classifiers fitted before the cancellation make up the new bank. A cancelled key
    /// keeps its classifier from the previous bank when there is one.
    pub fn train_cancellable(
        &mut self,
        inverse_regularisation: f64,
        cancel: &AtomicBool,
    ) -> Result<TrainingReport> {
        check_inverse_regularisation(inverse_regularisation)?;
        let classifiers_data = match self.classifiers_data.as_ref() {
            Some(data) if self.state >= ClassifierBankState::FeatureReady => data,
            _ => return Err(SluError::Configuration(
                "classifiers data must be generated before training".to_string()
            ).into()),
        };
        let (mut classifiers, report) = train_classifiers(
            classifiers_data,
            inverse_regularisation,
            &self.config.training,
            cancel,
        )?;
        if let Some(previous_bank) = self.bank.as_ref() {
            for key in &report.cancelled_keys {
                if let Some(classifier) = previous_bank.get(key) {
                    classifiers.insert(key.clone(), classifier.clone());
                }
            }
        }
        self.bank = Some(Arc::new(ClassifierBank::new(classifiers)));
        self.state = ClassifierBankState::Trained;
        Ok(report)
    }
}

impl DialogueActParser for LogRegDaiClassifier {
    fn parse(&self, nblist: &UtteranceNBList) -> Result<DialogueActConfusionNetwork> {
        let bank = match self.bank.as_ref() {
            Some(bank) => bank,
            None if self.state == ClassifierBankState::Empty => {
                return Err(SluError::Configuration(
                    "the classifier must be trained or loaded before parsing".to_string()
                ).into())
            }
            None => return Ok(DialogueActConfusionNetwork::new()),
        };

        let weights = nblist.weights(self.config.nbest_normalisation);
        let mut confnet = DialogueActConfusionNetwork::new();
        for ((_, utterance), weight) in nblist.iter().zip(weights.into_iter()) {
            let features = self.featurizer.transform(utterance);
            debug!("Features of '{}': {:?}", utterance, features);
            for (key, probability) in bank.predict_all(&features)? {
                confnet.add_merge(key.clone(), weight * probability);
            }
        }
        if self.config.confnet_prune_threshold > 0.0 {
            confnet.prune(self.config.confnet_prune_threshold);
        }
        Ok(confnet)
    }
}

impl LogRegDaiClassifier {
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bank = match self.bank.as_ref() {
            Some(bank) => bank,
            None => return Err(SluError::Configuration(
                "only a trained classifier can be persisted".to_string()
            ).into()),
        };
        fs::create_dir_all(&path)
            .with_context(|_| format!("Could not create model directory {:?}", path.as_ref()))?;

        let metadata_path = path.as_ref().join(METADATA_FILENAME);
        let metadata_file = fs::File::create(&metadata_path)
            .with_context(|_| format!("Could not create metadata file {:?}", metadata_path))?;
        serde_json::to_writer(metadata_file, &ProcessingUnitMetadata::LogRegDaiClassifier)?;

        let model = DaiClassifierModel {
            model_version: crate::MODEL_VERSION.to_string(),
            config: self.config.clone(),
            category_types: self.featurizer.category_types(),
            classifiers: bank.to_models(),
        };
        let model_path = path.as_ref().join(MODEL_FILENAME);
        let model_file = fs::File::create(&model_path)
            .with_context(|_| format!("Could not create model file {:?}", model_path))?;
        serde_json::to_writer(model_file, &model)
            .with_context(|_| format!("Could not serialize model {:?}", model_path))?;
        info!("Dai classifier persisted in {:?}", path.as_ref());
        Ok(())
    }

    pub fn from_path<P: AsRef<Path>>(path: P, shared_resources: Arc<SharedResources>) -> Result<Self> {
        info!("Loading dai classifier ({:?}) ...", path.as_ref());
        let model_path = path.as_ref().join(MODEL_FILENAME);
        check_model_version(&model_path)?;
        let model_file = fs::File::open(&model_path)
            .with_context(|_| SluError::ModelLoad(model_path.to_string_lossy().to_string()))?;
        let model: DaiClassifierModel = serde_json::from_reader(model_file)
            .with_context(|_| format!("Invalid dai classifier file {:?}", model_path))?;

        let database_types = shared_resources.category_label_database.category_types();
        if let Some(missing) = model
            .category_types
            .iter()
            .find(|category_type| !database_types.contains(category_type))
        {
            return Err(SluError::IncompatibleModel(format!(
                "category type '{}' is missing from the category label database",
                missing
            ))
            .into());
        }

        let mut classifier = Self::new(model.config, shared_resources)?;
        let bank = ClassifierBank::from_models(model.classifiers)?;
        info!("Dai classifier loaded with {} classifiers", bank.len());
        classifier.bank = Some(Arc::new(bank));
        classifier.state = ClassifierBankState::Trained;
        Ok(classifier)
    }

    pub fn from_zip<R: io::Read + io::Seek>(
        reader: R,
        shared_resources: Arc<SharedResources>,
    ) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("temp_dir_dai_classifier_")
            .tempdir()?;
        let model_dir_path = extract_zip_archive(reader, temp_dir.path())?;
        Self::from_path(model_dir_path, shared_resources)
    }
}

fn check_model_version<P: AsRef<Path>>(path: P) -> Result<()> {
    let model_file = fs::File::open(&path)
        .with_context(|_| SluError::ModelLoad(path.as_ref().to_string_lossy().to_string()))?;
    let model_version: ModelVersion = serde_json::from_reader(model_file)
        .with_context(|_| format!("Missing model version in {:?}", path.as_ref()))?;
    if model_version.model_version != crate::MODEL_VERSION {
        return Err(SluError::WrongModelVersion {
            model: model_version.model_version,
            runner: crate::MODEL_VERSION
        }.into());
    }
    Ok(())
}
