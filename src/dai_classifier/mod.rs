mod classifier_bank;
mod featurizer;
mod log_reg_dai_classifier;
mod logreg;
mod registry;
mod trainer;
mod training_data;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use failure::ResultExt;

pub use self::classifier_bank::{ClassifierBank, ItemClassifier};
pub use self::featurizer::{FeatureVector, Featurizer};
pub use self::log_reg_dai_classifier::LogRegDaiClassifier;
pub use self::trainer::TrainingReport;
pub use self::training_data::{
    load_training_examples, training_examples_from_parts, TrainingExample, TrainingExamples,
};
use crate::dialogue_act::DialogueActConfusionNetwork;
use crate::errors::*;
use crate::models::ProcessingUnitMetadata;
use crate::resources::SharedResources;
use crate::utterance::{Utterance, UtteranceNBList};

/// Stages of the training pipeline, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClassifierBankState {
    Empty,
    Extracted,
    Pruned,
    FeatureReady,
    Trained,
}

pub trait DialogueActParser: Send + Sync {
    fn parse(&self, nblist: &UtteranceNBList) -> Result<DialogueActConfusionNetwork>;

    fn parse_1_best(&self, utterance: &Utterance) -> Result<DialogueActConfusionNetwork> {
        self.parse(&UtteranceNBList::from(utterance.clone()))
    }
}

/// Loads the parser persisted in `path`, its kind is read from the `metadata.json` file
pub fn build_dialogue_act_parser<P: AsRef<Path>>(
    path: P,
    shared_resources: Arc<SharedResources>,
) -> Result<Box<dyn DialogueActParser>> {
    let metadata_path = path.as_ref().join("metadata.json");
    let metadata_file = fs::File::open(&metadata_path)
        .with_context(|_| format!("Could not open metadata file {:?}", metadata_path))?;
    let metadata: ProcessingUnitMetadata = serde_json::from_reader(metadata_file)
        .with_context(|_| format!("Could not deserialize json metadata {:?}", metadata_path))?;
    match metadata {
        ProcessingUnitMetadata::LogRegDaiClassifier => Ok(Box::new(
            LogRegDaiClassifier::from_path(path, shared_resources)?,
        ) as _),
    }
}
