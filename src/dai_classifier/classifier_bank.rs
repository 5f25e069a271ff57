use std::collections::{BTreeMap, HashMap};

use failure::{bail, ResultExt};
use ndarray::prelude::*;

use super::featurizer::FeatureVector;
use super::logreg::BinaryLogisticRegression;
use crate::dialogue_act::DialogueActItem;
use crate::errors::*;
use crate::models::ItemClassifierModel;
use crate::utils::FeatureName;
use crate::utterance::Probability;

/// Binary classifier of a single dialogue act item over its own vocabulary
#[derive(Debug, Clone)]
pub struct ItemClassifier {
    vocabulary: Vec<FeatureName>,
    feature_index: HashMap<FeatureName, usize>,
    logreg: BinaryLogisticRegression,
}

impl ItemClassifier {
    pub fn new(vocabulary: Vec<FeatureName>, intercept: f32, coeffs: Array1<f32>) -> Result<Self> {
        if vocabulary.len() != coeffs.len() {
            bail!(
                "Vocabulary has {} features but {} coefficients were provided",
                vocabulary.len(),
                coeffs.len()
            );
        }
        let feature_index = vocabulary
            .iter()
            .enumerate()
            .map(|(index, feature)| (feature.clone(), index))
            .collect();
        Ok(Self {
            vocabulary,
            feature_index,
            logreg: BinaryLogisticRegression::new(intercept, coeffs)?,
        })
    }

    pub fn vocabulary(&self) -> &[FeatureName] {
        &self.vocabulary
    }

    pub fn intercept(&self) -> f32 {
        self.logreg.intercept()
    }

    /// Dense features following the classifier vocabulary, unknown features are ignored
    pub fn vectorize(&self, features: &FeatureVector) -> Array1<f32> {
        let mut vector = Array1::<f32>::zeros(self.vocabulary.len());
        for (name, value) in features.iter() {
            if let Some(index) = self.feature_index.get(name) {
                vector[*index] = *value;
            }
        }
        vector
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Probability> {
        self.logreg.run(&self.vectorize(features).view())
    }

    pub fn to_model(&self, dai: &DialogueActItem) -> ItemClassifierModel {
        ItemClassifierModel {
            dai: dai.to_string(),
            vocabulary: self.vocabulary.clone(),
            intercept: self.logreg.intercept(),
            coeffs: self.logreg.coefficients().to_vec(),
        }
    }

    pub fn from_model(model: ItemClassifierModel) -> Result<(DialogueActItem, Self)> {
        let dai = model
            .dai
            .parse::<DialogueActItem>()
            .with_context(|_| format!("Invalid persisted dialogue act item '{}'", model.dai))?;
        let classifier = Self::new(
            model.vocabulary,
            model.intercept,
            Array1::from(model.coeffs),
        )
        .with_context(|_| format!("Invalid persisted classifier of '{}'", dai))?;
        Ok((dai, classifier))
    }
}

/// Immutable set of trained item classifiers, ordered by key
#[derive(Debug, Default)]
pub struct ClassifierBank {
    classifiers: BTreeMap<DialogueActItem, ItemClassifier>,
}

impl ClassifierBank {
    pub fn new(classifiers: BTreeMap<DialogueActItem, ItemClassifier>) -> Self {
        Self { classifiers }
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    pub fn keys(&self) -> Vec<DialogueActItem> {
        self.classifiers.keys().cloned().collect()
    }

    pub fn get(&self, key: &DialogueActItem) -> Option<&ItemClassifier> {
        self.classifiers.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DialogueActItem, &ItemClassifier)> {
        self.classifiers.iter()
    }

    /// Probability of every key given the features of a single hypothesis
    pub fn predict_all(&self, features: &FeatureVector) -> Result<Vec<(&DialogueActItem, Probability)>> {
        self.classifiers
            .iter()
            .map(|(key, classifier)| classifier.predict(features).map(|proba| (key, proba)))
            .collect()
    }

    pub fn to_models(&self) -> Vec<ItemClassifierModel> {
        self.classifiers
            .iter()
            .map(|(key, classifier)| classifier.to_model(key))
            .collect()
    }

    pub fn from_models(models: Vec<ItemClassifierModel>) -> Result<Self> {
        let classifiers = models
            .into_iter()
            .map(ItemClassifier::from_model)
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self::new(classifiers))
    }
}
