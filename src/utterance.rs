use std::convert::TryFrom;
use std::fmt;
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

use crate::errors::*;

pub type Probability = f32;

/// A sequence of normalized tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utterance {
    tokens: Vec<String>,
}

impl Utterance {
    /// Splits the text on whitespace and lowercases every token
    pub fn new(text: &str) -> Self {
        text.split_whitespace().map(|t| t.to_lowercase()).collect()
    }

    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns true when `phrase` occurs as a contiguous token sequence
    pub fn contains_phrase<S: AsRef<str>>(&self, phrase: &[S]) -> bool {
        if phrase.is_empty() || phrase.len() > self.tokens.len() {
            return false;
        }
        self.tokens.windows(phrase.len()).any(|window| {
            window
                .iter()
                .zip(phrase.iter())
                .all(|(token, other)| token == other.as_ref())
        })
    }

    /// All n-grams of length `n`, joined with a single space
    pub fn ngrams(&self, n: usize) -> Vec<String> {
        if n == 0 || n > self.tokens.len() {
            return vec![];
        }
        self.tokens.windows(n).map(|window| window.join(" ")).collect()
    }
}

impl FromIterator<String> for Utterance {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

/// How the hypothesis probabilities of an n-best list are turned into merge weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NBestNormalisation {
    /// Weights are rescaled to sum to 1, uniform when all probabilities are zero
    SumToOne,
    /// Probabilities are used as is
    Raw,
}

impl Default for NBestNormalisation {
    fn default() -> Self {
        NBestNormalisation::SumToOne
    }
}

/// Probability weighted alternative recognitions of a single input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UtteranceNBListModel")]
pub struct UtteranceNBList {
    hypotheses: Vec<(Probability, Utterance)>,
}

#[derive(Deserialize)]
struct UtteranceNBListModel {
    hypotheses: Vec<(Probability, Utterance)>,
}

impl TryFrom<UtteranceNBListModel> for UtteranceNBList {
    type Error = failure::Error;

    fn try_from(model: UtteranceNBListModel) -> Result<Self> {
        let mut nblist = Self::new();
        for (probability, utterance) in model.hypotheses {
            nblist.add(probability, utterance)?;
        }
        Ok(nblist)
    }
}

impl UtteranceNBList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, probability: Probability, utterance: Utterance) -> Result<()> {
        if !probability.is_finite() || probability < 0.0 {
            return Err(SluError::MalformedInput(format!(
                "invalid probability {} for hypothesis '{}'",
                probability, utterance
            ))
            .into());
        }
        self.hypotheses.push((probability, utterance));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Probability, Utterance)> {
        self.hypotheses.iter()
    }

    pub fn total_probability(&self) -> f64 {
        self.hypotheses.iter().map(|(p, _)| f64::from(*p)).sum()
    }

    /// Most probable hypothesis, the first one wins ties
    pub fn best(&self) -> Option<&Utterance> {
        self.hypotheses
            .iter()
            .fold(None, |best: Option<&(Probability, Utterance)>, hyp| match best {
                Some(b) if b.0 >= hyp.0 => Some(b),
                _ => Some(hyp),
            })
            .map(|(_, utterance)| utterance)
    }

    pub fn weights(&self, normalisation: NBestNormalisation) -> Vec<Probability> {
        match normalisation {
            NBestNormalisation::Raw => self.hypotheses.iter().map(|(p, _)| *p).collect(),
            NBestNormalisation::SumToOne => {
                let total = self.total_probability();
                if total > 0.0 {
                    self.hypotheses
                        .iter()
                        .map(|(p, _)| (f64::from(*p) / total) as Probability)
                        .collect()
                } else {
                    let uniform = 1.0 / self.hypotheses.len() as Probability;
                    vec![uniform; self.hypotheses.len()]
                }
            }
        }
    }
}

impl From<Utterance> for UtteranceNBList {
    fn from(utterance: Utterance) -> Self {
        Self {
            hypotheses: vec![(1.0, utterance)],
        }
    }
}
