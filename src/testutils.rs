use std::sync::Arc;

use crate::configurations::DaiClassifierConfig;
use crate::dai_classifier::{
    Featurizer, LogRegDaiClassifier, TrainingExample, TrainingExamples,
};
use crate::resources::category_label_database::InMemoryCategoryLabelDatabase;
use crate::resources::SharedResources;
use crate::utterance::Utterance;

pub fn epsilon_eq(a: f32, b: f32, epsilon: f32) -> bool {
    let diff = a - b;
    diff < epsilon && diff > -epsilon
}

#[derive(Default)]
pub struct SharedResourcesBuilder {
    category_label_database: InMemoryCategoryLabelDatabase,
}

impl SharedResourcesBuilder {
    pub fn category_surface_form(mut self, category_type: &str, value: &str, form: &str) -> Self {
        self.category_label_database
            .add_surface_form(category_type, value, form);
        self
    }

    pub fn build(self) -> SharedResources {
        SharedResources {
            category_label_database: Arc::new(self.category_label_database),
        }
    }
}

/// Category database of the Czech public transport and weather domain
pub fn alex_shared_resources() -> Arc<SharedResources> {
    let surface_forms = vec![
        ("task", "find_connection", "najít spojení"),
        ("task", "find_connection", "najít spoj"),
        ("task", "find_connection", "zjistit spojení"),
        ("task", "find_connection", "zjistit spoj"),
        ("task", "find_connection", "hledám spojení"),
        ("task", "find_connection", "spojení"),
        ("task", "find_connection", "spoj"),
        ("task", "find_platform", "najít nástupiště"),
        ("task", "find_platform", "zjistit nástupiště"),
        ("task", "weather", "pocasi"),
        ("task", "weather", "jak bude"),
        ("number", "1", "jednu"),
        ("time", "now", "nyní"),
        ("time", "now", "teď"),
        ("time", "now", "teďka"),
        ("time", "now", "hned"),
        ("time", "now", "nejbližší"),
        ("time", "now", "v tuto chvíli"),
        ("time", "now", "co nejdřív"),
    ];
    let builder = surface_forms.into_iter().fold(
        SharedResourcesBuilder::default(),
        |builder, (category_type, value, form)| {
            builder.category_surface_form(category_type, value, form)
        },
    );
    Arc::new(builder.build())
}

pub fn alex_featurizer() -> Featurizer {
    Featurizer::new(
        DaiClassifierConfig::default().featurizer,
        alex_shared_resources(),
    )
}

pub fn alex_training_examples() -> TrainingExamples {
    vec![
        ("1", "pocasi pocasi pocasi pocasi pocasi", "inform(task=weather)"),
        ("2", "hned ted nyni hned ted nyni", "inform(time=now)"),
        ("3", "jak bude jak bude jak bude jak bude", "inform(task=weather)"),
        ("4", "kdy a odkat mi to jede", "inform(task=connection)"),
    ]
    .into_iter()
    .map(|(id, text, dialogue_act)| {
        (
            id.to_string(),
            TrainingExample::new(Utterance::new(text), dialogue_act.parse().unwrap()),
        )
    })
    .collect()
}

pub fn alex_classifier() -> LogRegDaiClassifier {
    LogRegDaiClassifier::new(DaiClassifierConfig::default(), alex_shared_resources()).unwrap()
}

pub fn trained_alex_classifier() -> LogRegDaiClassifier {
    trained_alex_classifier_with_config(DaiClassifierConfig::default())
}

pub fn trained_alex_classifier_with_config(config: DaiClassifierConfig) -> LogRegDaiClassifier {
    let mut classifier = LogRegDaiClassifier::new(config, alex_shared_resources()).unwrap();
    classifier.extract_classifiers(&alex_training_examples());
    classifier.prune_classifiers(0).unwrap();
    classifier.gen_classifiers_data(0, 0).unwrap();
    classifier.train(10.0).unwrap();
    classifier
}
