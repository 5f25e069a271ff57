pub mod configurations;
pub mod dai_classifier;
pub mod dialogue_act;
pub mod errors;
pub mod models;
pub mod resources;
#[cfg(test)]
mod testutils;
mod utils;
pub mod utterance;

pub const MODEL_VERSION: &str = "0.1.0";

pub use crate::configurations::{DaiClassifierConfig, FeaturizerConfig, TrainingConfig};
pub use crate::dai_classifier::{
    build_dialogue_act_parser, load_training_examples, training_examples_from_parts,
    ClassifierBankState, DialogueActParser, LogRegDaiClassifier, TrainingExample,
    TrainingExamples, TrainingReport,
};
pub use crate::dialogue_act::{DialogueAct, DialogueActConfusionNetwork, DialogueActItem};
pub use crate::errors::*;
pub use crate::models::*;
pub use crate::resources::category_label_database::{
    CategoryLabelDatabase, CategoryMatch, InMemoryCategoryLabelDatabase,
};
pub use crate::resources::loading::load_shared_resources;
pub use crate::resources::SharedResources;
pub use crate::utterance::{NBestNormalisation, Probability, Utterance, UtteranceNBList};
