use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use failure::ResultExt;
use log::info;
use serde::Deserialize;

use crate::dialogue_act::DialogueAct;
use crate::errors::*;
use crate::utils::ExampleId;
use crate::utterance::Utterance;

/// An utterance annotated with the dialogue act it realizes
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub utterance: Utterance,
    pub dialogue_act: DialogueAct,
}

impl TrainingExample {
    pub fn new(utterance: Utterance, dialogue_act: DialogueAct) -> Self {
        Self {
            utterance,
            dialogue_act,
        }
    }
}

pub type TrainingExamples = HashMap<ExampleId, TrainingExample>;

/// Pairs the dialogue acts and utterances sharing the same example id
pub fn training_examples_from_parts(
    dialogue_acts: &HashMap<ExampleId, DialogueAct>,
    utterances: &HashMap<ExampleId, Utterance>,
) -> Result<TrainingExamples> {
    if let Some(id) = dialogue_acts.keys().find(|id| !utterances.contains_key(*id)) {
        return Err(SluError::MalformedInput(format!(
            "example '{}' has a dialogue act but no utterance",
            id
        ))
        .into());
    }
    if let Some(id) = utterances.keys().find(|id| !dialogue_acts.contains_key(*id)) {
        return Err(SluError::MalformedInput(format!(
            "example '{}' has an utterance but no dialogue act",
            id
        ))
        .into());
    }
    Ok(dialogue_acts
        .iter()
        .map(|(id, dialogue_act)| {
            (
                id.clone(),
                TrainingExample::new(utterances[id].clone(), dialogue_act.clone()),
            )
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct TrainingExampleModel {
    utterance: String,
    dialogue_act: String,
}

/// Reads a json object mapping example ids to `{"utterance": .., "dialogue_act": ..}`
pub fn load_training_examples<P: AsRef<Path>>(path: P) -> Result<TrainingExamples> {
    info!("Loading training examples ({:?}) ...", path.as_ref());
    let file = File::open(&path).with_context(|_| {
        SluError::ModelLoad(path.as_ref().to_string_lossy().to_string())
    })?;
    let models: BTreeMap<ExampleId, TrainingExampleModel> = serde_json::from_reader(file)
        .with_context(|_| "Cannot deserialize training examples json data")?;
    let examples = models
        .into_iter()
        .map(|(id, model)| {
            let dialogue_act = model
                .dialogue_act
                .parse::<DialogueAct>()
                .with_context(|_| format!("Invalid dialogue act of example '{}'", id))?;
            Ok((
                id,
                TrainingExample::new(Utterance::new(&model.utterance), dialogue_act),
            ))
        })
        .collect::<Result<TrainingExamples>>()?;
    info!("{} training examples loaded", examples.len());
    Ok(examples)
}
