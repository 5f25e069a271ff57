use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::dialogue_act::{DialogueAct, DialogueActItem};
use crate::utterance::Probability;

/// Belief over dialogue act items, each item being scored independently of the others
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DialogueActConfusionNetwork {
    items: BTreeMap<DialogueActItem, Probability>,
}

impl DialogueActConfusionNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the probability of the item, clamped to [0, 1]
    pub fn add(&mut self, item: DialogueActItem, probability: Probability) {
        self.items.insert(item, clamp_probability(probability));
    }

    /// Adds the probability to the current one of the item
    pub fn add_merge(&mut self, item: DialogueActItem, probability: Probability) {
        let entry = self.items.entry(item).or_insert(0.0);
        *entry = clamp_probability(*entry + probability);
    }

    pub fn get_prob(&self, item: &DialogueActItem) -> Probability {
        self.items.get(item).cloned().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DialogueActItem, &Probability)> {
        self.items.iter()
    }

    /// Items by decreasing probability
    pub fn sorted_items(&self) -> Vec<(&DialogueActItem, Probability)> {
        let mut items: Vec<_> = self.items.iter().map(|(dai, p)| (dai, *p)).collect();
        items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(::std::cmp::Ordering::Equal));
        items
    }

    /// Removes the items whose probability is below the threshold
    pub fn prune(&mut self, threshold: Probability) {
        self.items.retain(|_, p| *p >= threshold);
    }

    /// The dialogue act made of all items more likely present than not, `null()` when there
    /// is none
    pub fn get_best_da(&self) -> DialogueAct {
        let best: DialogueAct = self
            .sorted_items()
            .into_iter()
            .filter(|(_, p)| *p > 0.5)
            .map(|(dai, _)| dai.clone())
            .collect();
        if best.is_empty() {
            vec![DialogueActItem::null()].into_iter().collect()
        } else {
            best
        }
    }
}

fn clamp_probability(probability: Probability) -> Probability {
    if probability.is_nan() {
        0.0
    } else {
        probability.max(0.0).min(1.0)
    }
}

impl fmt::Display for DialogueActConfusionNetwork {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (dai, probability) in self.sorted_items() {
            writeln!(f, "{:.3} {}", probability, dai)?;
        }
        Ok(())
    }
}
