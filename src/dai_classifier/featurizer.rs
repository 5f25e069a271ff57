use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use itertools::Itertools;

use crate::configurations::FeaturizerConfig;
use crate::resources::SharedResources;
use crate::utils::FeatureName;
use crate::utterance::Utterance;

/// Sparse features of an utterance, absent features have a zero value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    features: BTreeMap<FeatureName, f32>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: FeatureName) {
        *self.features.entry(name).or_insert(0.0) += 1.0;
    }

    pub fn set(&mut self, name: FeatureName, value: f32) {
        if value == 0.0 {
            self.features.remove(&name);
        } else {
            self.features.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> f32 {
        self.features.get(name).cloned().unwrap_or(0.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<FeatureName, f32> {
        self.features.iter()
    }

    pub fn names(&self) -> btree_map::Keys<FeatureName, f32> {
        self.features.keys()
    }
}

pub struct Featurizer {
    config: FeaturizerConfig,
    shared_resources: Arc<SharedResources>,
}

impl Featurizer {
    pub fn new(config: FeaturizerConfig, shared_resources: Arc<SharedResources>) -> Self {
        Self {
            config,
            shared_resources,
        }
    }

    pub fn config(&self) -> &FeaturizerConfig {
        &self.config
    }

    pub fn category_types(&self) -> Vec<String> {
        self.shared_resources
            .category_label_database
            .category_types()
    }

    pub fn transform(&self, utterance: &Utterance) -> FeatureVector {
        let mut features = FeatureVector::new();
        for order in 1..=self.config.ngram_order {
            for ngram in utterance.ngrams(order) {
                features.increment(get_ngram_feature_name(&ngram));
            }
        }

        if self.config.use_category_features {
            let category_types = self
                .shared_resources
                .category_label_database
                .find_matches(utterance)
                .into_iter()
                .map(|category_match| category_match.category_type)
                .unique();
            for category_type in category_types {
                features.set(get_category_feature_name(&category_type), 1.0);
            }
        }
        features
    }
}

fn get_ngram_feature_name(ngram: &str) -> FeatureName {
    format!("ngram:{}", ngram)
}

fn get_category_feature_name(category_type: &str) -> FeatureName {
    format!("category:{}", category_type)
}
