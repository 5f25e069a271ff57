use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::iter::FromIterator;

use failure::ResultExt;
use serde::Deserialize;

use crate::errors::*;
use crate::utterance::Utterance;

pub type CategoryType = String;
pub type CategoryValue = String;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CategoryMatch {
    pub category_type: CategoryType,
    pub value: CategoryValue,
    pub start: usize,
    pub end: usize,
}

/// Lexicon of surface forms, grouped by category type and category value
pub trait CategoryLabelDatabase: Send + Sync {
    fn category_types(&self) -> Vec<CategoryType>;

    /// All the surface forms found in the utterance, as contiguous token sequences
    fn find_matches(&self, utterance: &Utterance) -> Vec<CategoryMatch>;
}

#[derive(Debug, Clone, PartialEq)]
struct SurfaceForm {
    value: CategoryValue,
    tokens: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryCategoryLabelDatabase {
    surface_forms: BTreeMap<CategoryType, Vec<SurfaceForm>>,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct CategoryLabelDatabaseModel {
    database: BTreeMap<CategoryType, BTreeMap<CategoryValue, Vec<String>>>,
}

impl InMemoryCategoryLabelDatabase {
    /// Reads a json object of the form `{ category_type: { value: [surface forms] } }`
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let model: CategoryLabelDatabaseModel = serde_json::from_reader(reader)
            .with_context(|_| "Cannot deserialize category label database json data")?;
        Ok(model
            .database
            .into_iter()
            .flat_map(|(category_type, values)| {
                values.into_iter().flat_map(move |(value, forms)| {
                    let category_type = category_type.clone();
                    forms
                        .into_iter()
                        .map(move |form| (category_type.clone(), value.clone(), form))
                })
            })
            .collect())
    }

    pub fn add_surface_form(&mut self, category_type: &str, value: &str, surface_form: &str) {
        let tokens = Utterance::new(surface_form).tokens().to_vec();
        if tokens.is_empty() {
            return;
        }
        let forms = self
            .surface_forms
            .entry(category_type.to_string())
            .or_insert_with(|| vec![]);
        let form = SurfaceForm {
            value: value.to_string(),
            tokens,
        };
        if !forms.contains(&form) {
            forms.push(form);
        }
    }
}

impl FromIterator<(CategoryType, CategoryValue, String)> for InMemoryCategoryLabelDatabase {
    fn from_iter<T: IntoIterator<Item = (CategoryType, CategoryValue, String)>>(iter: T) -> Self {
        let mut database = Self::default();
        for (category_type, value, surface_form) in iter {
            database.add_surface_form(&category_type, &value, &surface_form);
        }
        database
    }
}

impl CategoryLabelDatabase for InMemoryCategoryLabelDatabase {
    fn category_types(&self) -> Vec<CategoryType> {
        self.surface_forms.keys().cloned().collect()
    }

    fn find_matches(&self, utterance: &Utterance) -> Vec<CategoryMatch> {
        let tokens = utterance.tokens();
        let mut matches = BTreeSet::new();
        for (category_type, forms) in self.surface_forms.iter() {
            for form in forms {
                let length = form.tokens.len();
                if length > tokens.len() {
                    continue;
                }
                for start in 0..=tokens.len() - length {
                    if tokens[start..start + length] == form.tokens[..] {
                        matches.insert(CategoryMatch {
                            category_type: category_type.clone(),
                            value: form.value.clone(),
                            start,
                            end: start + length,
                        });
                    }
                }
            }
        }
        matches.into_iter().collect()
    }
}
