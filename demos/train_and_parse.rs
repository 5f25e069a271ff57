extern crate clap;
extern crate env_logger;
extern crate serde_json;
extern crate slu_dai_lib;

use std::fs::File;
use std::io;
use std::io::Write;
use std::sync::Arc;

use clap::{App, Arg};
use slu_dai_lib::{
    load_training_examples, DaiClassifierConfig, DialogueActParser, InMemoryCategoryLabelDatabase,
    LogRegDaiClassifier, SharedResources, Utterance, UtteranceNBList,
};

fn parse_hypothesis(hypothesis: &str) -> (f32, Utterance) {
    let mut parts = hypothesis.splitn(2, ':');
    let probability = parts
        .next()
        .and_then(|p| p.trim().parse::<f32>().ok())
        .expect("hypotheses must be formatted as 'probability:text'");
    let text = parts
        .next()
        .expect("hypotheses must be formatted as 'probability:text'");
    (probability, Utterance::new(text))
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp_nanos()
        .init();

    let matches = App::new("slu-dai-train-and-parse")
        .about("Trains a dialogue act item classifier and parses n-best lists with it")
        .arg(
            Arg::with_name("TRAINING_DATA")
                .required(true)
                .takes_value(true)
                .index(1)
                .help("path to the json training examples"),
        )
        .arg(
            Arg::with_name("HYPOTHESES")
                .multiple(true)
                .index(2)
                .help("n-best hypotheses formatted as 'probability:text', interactive mode when absent"),
        )
        .arg(
            Arg::with_name("categories")
                .short("d")
                .long("categories")
                .takes_value(true)
                .help("path to the json category label database"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .help("path to the json classifier configuration"),
        )
        .arg(
            Arg::with_name("inverse_regularisation")
                .short("c")
                .long("inverse-regularisation")
                .takes_value(true)
                .help("inverse of the L2 regularisation strength"),
        )
        .arg(
            Arg::with_name("min_classifier_count")
                .long("min-classifier-count")
                .takes_value(true)
                .default_value("0")
                .help("minimum number of positive examples of a trained dialogue act item"),
        )
        .arg(
            Arg::with_name("min_pos_feature_count")
                .long("min-pos-feature-count")
                .takes_value(true)
                .default_value("0")
                .help("minimum number of positive examples supporting a kept feature"),
        )
        .arg(
            Arg::with_name("min_neg_feature_count")
                .long("min-neg-feature-count")
                .takes_value(true)
                .default_value("0")
                .help("minimum number of negative examples supporting a kept feature"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .help("directory where the trained classifier is persisted"),
        )
        .get_matches();

    let config = matches
        .value_of("config")
        .map(|path| DaiClassifierConfig::from_path(path).unwrap())
        .unwrap_or_default();
    let category_label_database = matches
        .value_of("categories")
        .map(|path| InMemoryCategoryLabelDatabase::from_reader(File::open(path).unwrap()).unwrap())
        .unwrap_or_default();
    let inverse_regularisation = matches
        .value_of("inverse_regularisation")
        .map(|v| v.parse::<f64>().unwrap())
        .unwrap_or(10.0);
    let count_arg = |name: &str| {
        matches
            .value_of(name)
            .map(|v| v.parse::<usize>().unwrap())
            .unwrap_or(0)
    };
    let min_classifier_count = count_arg("min_classifier_count");
    let min_pos_feature_count = count_arg("min_pos_feature_count");
    let min_neg_feature_count = count_arg("min_neg_feature_count");
    let shared_resources = Arc::new(SharedResources {
        category_label_database: Arc::new(category_label_database),
    });

    println!("\nTraining the dai classifier...");
    let examples = load_training_examples(matches.value_of("TRAINING_DATA").unwrap()).unwrap();
    let mut classifier = LogRegDaiClassifier::new(config, shared_resources).unwrap();
    classifier.extract_classifiers(&examples);
    classifier.prune_classifiers(min_classifier_count).unwrap();
    classifier
        .gen_classifiers_data(min_pos_feature_count, min_neg_feature_count)
        .unwrap();
    let report = classifier.train(inverse_regularisation).unwrap();
    println!(
        "{} classifiers trained, {} skipped",
        report.trained_keys.len(),
        report.skipped_keys.len()
    );
    if let Some(output) = matches.value_of("output") {
        classifier.persist(output).unwrap();
    }

    if let Some(hypotheses) = matches.values_of("HYPOTHESES") {
        let mut nblist = UtteranceNBList::new();
        for (probability, utterance) in hypotheses.map(parse_hypothesis) {
            nblist.add(probability, utterance).unwrap();
        }
        let confnet = classifier.parse(&nblist).unwrap();
        println!("{}", serde_json::to_string_pretty(&confnet).unwrap());
        return;
    }

    loop {
        print!("> ");
        io::stdout().flush().unwrap();
        let mut query = String::new();
        io::stdin().read_line(&mut query).unwrap();
        let confnet = classifier
            .parse_1_best(&Utterance::new(query.trim()))
            .unwrap();
        println!("{}", serde_json::to_string_pretty(&confnet).unwrap());
    }
}
