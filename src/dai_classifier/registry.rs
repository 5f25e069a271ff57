use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;
use log::debug;
use ndarray::prelude::*;

use super::featurizer::{FeatureVector, Featurizer};
use super::training_data::TrainingExample;
use crate::dialogue_act::DialogueActItem;
use crate::utils::{ExampleId, FeatureName};

/// Featurized training example with its set of labels
#[derive(Debug, Clone)]
pub struct ExtractedExample {
    pub id: ExampleId,
    pub features: FeatureVector,
    pub labels: BTreeSet<DialogueActItem>,
}

/// Indices of the registry examples used as positives and negatives of a key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemExamples {
    pub positives: Vec<usize>,
    pub negatives: Vec<usize>,
}

/// Design matrix of a single binary classification problem
///
/// Columns follow `vocabulary`, rows follow the key's positives then negatives.
#[derive(Debug, Clone)]
pub struct ClassifierData {
    pub vocabulary: Vec<FeatureName>,
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
}

impl ClassifierData {
    pub fn nb_positives(&self) -> usize {
        self.labels.iter().filter(|label| **label > 0.5).count()
    }

    pub fn nb_negatives(&self) -> usize {
        self.labels.len() - self.nb_positives()
    }

    /// Positive rows having at least one non zero feature
    pub fn nb_usable_positives(&self) -> usize {
        self.features
            .outer_iter()
            .zip(self.labels.iter())
            .filter(|(row, label)| **label > 0.5 && row.iter().any(|value| *value != 0.0))
            .count()
    }
}

#[derive(Debug, Default)]
pub struct ClassifierRegistry {
    examples: Vec<ExtractedExample>,
    classifiers: BTreeMap<DialogueActItem, ItemExamples>,
}

impl ClassifierRegistry {
    pub fn extract(examples: &HashMap<ExampleId, TrainingExample>, featurizer: &Featurizer) -> Self {
        let extracted_examples: Vec<ExtractedExample> = examples
            .iter()
            .sorted_by(|(id_a, _), (id_b, _)| id_a.cmp(id_b))
            .map(|(id, example)| ExtractedExample {
                id: id.clone(),
                features: featurizer.transform(&example.utterance),
                labels: example.dialogue_act.iter().cloned().collect(),
            })
            .collect();

        let keys: BTreeSet<DialogueActItem> = extracted_examples
            .iter()
            .flat_map(|example| example.labels.iter().cloned())
            .collect();

        let classifiers = keys
            .into_iter()
            .map(|key| {
                let (positives, negatives): (Vec<usize>, Vec<usize>) = (0..extracted_examples
                    .len())
                    .partition(|index| extracted_examples[*index].labels.contains(&key));
                (
                    key,
                    ItemExamples {
                        positives,
                        negatives,
                    },
                )
            })
            .collect();

        Self {
            examples: extracted_examples,
            classifiers,
        }
    }

    /// Drops the keys having fewer than `min_classifier_count` positive examples
    pub fn prune(&mut self, min_classifier_count: usize) {
        let before = self.classifiers.len();
        self.classifiers.retain(|key, item_examples| {
            let keep = item_examples.positives.len() >= min_classifier_count;
            if !keep {
                debug!(
                    "Pruning '{}' with {} positive examples",
                    key,
                    item_examples.positives.len()
                );
            }
            keep
        });
        debug!(
            "Pruned {} classifiers out of {}",
            before - self.classifiers.len(),
            before
        );
    }

    pub fn nb_examples(&self) -> usize {
        self.examples.len()
    }

    pub fn keys(&self) -> Vec<DialogueActItem> {
        self.classifiers.keys().cloned().collect()
    }

    pub fn item_examples(&self, key: &DialogueActItem) -> Option<&ItemExamples> {
        self.classifiers.get(key)
    }

    /// All the features seen during extraction, sorted
    pub fn feature_vocabulary(&self) -> Vec<FeatureName> {
        self.examples
            .iter()
            .flat_map(|example| example.features.names().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Builds one design matrix per key
    ///
    /// A feature is kept in the key's vocabulary unless its support is both
    /// below `min_pos_feature_count` among positives and below
    /// `min_neg_feature_count` among negatives.
    pub fn gen_classifiers_data(
        &self,
        min_pos_feature_count: usize,
        min_neg_feature_count: usize,
    ) -> BTreeMap<DialogueActItem, ClassifierData> {
        self.classifiers
            .iter()
            .map(|(key, item_examples)| {
                let pos_support = self.feature_support(&item_examples.positives);
                let neg_support = self.feature_support(&item_examples.negatives);
                let vocabulary: Vec<FeatureName> = pos_support
                    .keys()
                    .chain(neg_support.keys())
                    .unique()
                    .filter(|feature| {
                        pos_support.get(*feature).cloned().unwrap_or(0) >= min_pos_feature_count
                            || neg_support.get(*feature).cloned().unwrap_or(0)
                                >= min_neg_feature_count
                    })
                    .sorted()
                    .map(|feature| feature.to_string())
                    .collect();

                let rows: Vec<(usize, f64)> = item_examples
                    .positives
                    .iter()
                    .map(|index| (*index, 1.0))
                    .chain(item_examples.negatives.iter().map(|index| (*index, 0.0)))
                    .collect();

                let mut features = Array2::<f64>::zeros((rows.len(), vocabulary.len()));
                for (row, (example_index, _)) in rows.iter().enumerate() {
                    let example_features = &self.examples[*example_index].features;
                    for (column, feature) in vocabulary.iter().enumerate() {
                        features[[row, column]] = example_features.get(feature) as f64;
                    }
                }
                let labels: Array1<f64> = rows.iter().map(|(_, label)| *label).collect();

                debug!(
                    "Classifier data of '{}': {} examples, {} features",
                    key,
                    rows.len(),
                    vocabulary.len()
                );
                (
                    key.clone(),
                    ClassifierData {
                        vocabulary,
                        features,
                        labels,
                    },
                )
            })
            .collect()
    }

    fn feature_support(&self, example_indices: &[usize]) -> BTreeMap<&FeatureName, usize> {
        let mut support = BTreeMap::new();
        for index in example_indices {
            for feature in self.examples[*index].features.names() {
                *support.entry(feature).or_insert(0) += 1;
            }
        }
        support
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utterance::Utterance;
    use crate::testutils::{alex_featurizer, alex_training_examples};

    fn item(repr: &str) -> DialogueActItem {
        repr.parse().unwrap()
    }

    #[test]
    fn extract_registers_positives_and_negatives() {
        // Given
        let examples = alex_training_examples();

        // When
        let registry = ClassifierRegistry::extract(&examples, &alex_featurizer());

        // Then
        let expected_keys = vec![
            item("inform(task=connection)"),
            item("inform(task=weather)"),
            item("inform(time=now)"),
        ];
        assert_eq!(expected_keys, registry.keys());
        assert_eq!(4, registry.nb_examples());

        // examples are sorted by id: "1", "2", "3", "4"
        let weather = registry.item_examples(&item("inform(task=weather)")).unwrap();
        assert_eq!(vec![0, 2], weather.positives);
        assert_eq!(vec![1, 3], weather.negatives);
        let now = registry.item_examples(&item("inform(time=now)")).unwrap();
        assert_eq!(vec![1], now.positives);
        assert_eq!(vec![0, 2, 3], now.negatives);
    }

    #[test]
    fn negatives_do_not_contain_examples_labeled_with_the_key() {
        // Given
        let mut examples = alex_training_examples();
        examples.insert(
            "5".to_string(),
            TrainingExample::new(
                Utterance::new("pocasi hned"),
                "inform(task=weather)&inform(time=now)".parse().unwrap(),
            ),
        );

        // When
        let registry = ClassifierRegistry::extract(&examples, &alex_featurizer());

        // Then
        for key in registry.keys() {
            let item_examples = registry.item_examples(&key).unwrap();
            assert_eq!(
                registry.nb_examples(),
                item_examples.positives.len() + item_examples.negatives.len()
            );
            for index in &item_examples.negatives {
                assert!(!registry.examples[*index].labels.contains(&key));
            }
        }
        let now = registry.item_examples(&item("inform(time=now)")).unwrap();
        assert_eq!(vec![1, 4], now.positives);
    }

    #[test]
    fn prune_drops_rare_keys() {
        // Given
        let mut registry =
            ClassifierRegistry::extract(&alex_training_examples(), &alex_featurizer());

        // When
        registry.prune(2);

        // Then
        assert_eq!(vec![item("inform(task=weather)")], registry.keys());
    }

    #[test]
    fn feature_vocabulary_contains_all_extracted_features() {
        // Given
        let registry = ClassifierRegistry::extract(&alex_training_examples(), &alex_featurizer());

        // When
        let vocabulary = registry.feature_vocabulary();

        // Then
        assert!(vocabulary.contains(&"ngram:pocasi".to_string()));
        assert!(vocabulary.contains(&"ngram:jak bude".to_string()));
        assert!(vocabulary.contains(&"category:time".to_string()));
        let mut sorted_vocabulary = vocabulary.clone();
        sorted_vocabulary.sort();
        assert_eq!(sorted_vocabulary, vocabulary);
    }

    #[test]
    fn gen_classifiers_data_builds_design_matrices() {
        // Given
        let registry = ClassifierRegistry::extract(&alex_training_examples(), &alex_featurizer());

        // When
        let data = registry.gen_classifiers_data(0, 0);

        // Then
        let weather_data = &data[&item("inform(task=weather)")];
        assert_eq!(array![1.0, 1.0, 0.0, 0.0], weather_data.labels);
        assert_eq!(
            (4, weather_data.vocabulary.len()),
            weather_data.features.dim()
        );
        assert_eq!(registry.feature_vocabulary(), weather_data.vocabulary);
        let pocasi_column = weather_data
            .vocabulary
            .iter()
            .position(|feature| feature == "ngram:pocasi")
            .unwrap();
        assert_eq!(array![5.0, 0.0, 0.0, 0.0], weather_data.features.column(pocasi_column));
        assert_eq!(2, weather_data.nb_positives());
        assert_eq!(2, weather_data.nb_negatives());
        assert_eq!(2, weather_data.nb_usable_positives());
    }

    #[test]
    fn gen_classifiers_data_discards_features_below_both_thresholds() {
        // Given
        let registry = ClassifierRegistry::extract(&alex_training_examples(), &alex_featurizer());

        // When
        let data = registry.gen_classifiers_data(2, 4);

        // Then
        // only "category:task" is seen in both weather positives
        let weather_data = &data[&item("inform(task=weather)")];
        assert_eq!(vec!["category:task".to_string()], weather_data.vocabulary);
        assert_eq!(array![[1.0], [1.0], [0.0], [0.0]], weather_data.features);

        // a single positive never reaches the positive threshold
        let now_data = &data[&item("inform(time=now)")];
        assert!(now_data.vocabulary.is_empty());
        assert_eq!(0, now_data.nb_usable_positives());
    }

    #[test]
    fn gen_classifiers_data_keeps_features_reaching_either_threshold() {
        // Given
        let registry = ClassifierRegistry::extract(&alex_training_examples(), &alex_featurizer());

        // When
        let data = registry.gen_classifiers_data(100, 2);

        // Then
        // "category:task" appears in the "pocasi" and "jak bude" negatives of time=now
        let now_data = &data[&item("inform(time=now)")];
        assert_eq!(vec!["category:task".to_string()], now_data.vocabulary);
    }
}
