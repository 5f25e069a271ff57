use std::fmt;
use std::iter::FromIterator;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::errors::*;

lazy_static! {
    static ref DAI_REGEX: Regex =
        Regex::new(r"^\s*([A-Za-z_][\w-]*)\s*\((.*)\)\s*$").unwrap();
    static ref SLOT_NAME_REGEX: Regex = Regex::new(r"^[\w.-]+$").unwrap();
}

const RESERVED_VALUE_CHARS: &[char] = &['(', ')', '=', '&', ',', '\'', '"'];

/// A single `act(slot=value)` unit, used as classifier key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogueActItem {
    dialogue_act_type: String,
    name: Option<String>,
    value: Option<String>,
}

impl DialogueActItem {
    pub fn new<S: Into<String>>(
        dialogue_act_type: S,
        name: Option<String>,
        value: Option<String>,
    ) -> Result<Self> {
        let dialogue_act_type = dialogue_act_type.into();
        if dialogue_act_type.trim().is_empty() {
            return Err(SluError::MalformedInput(
                "dialogue act type must not be empty".to_string()
            ).into());
        }
        if value.is_some() && name.is_none() {
            return Err(SluError::MalformedInput(format!(
                "dialogue act item '{}' has a value but no slot",
                dialogue_act_type
            ))
            .into());
        }
        Ok(Self {
            dialogue_act_type,
            name,
            value,
        })
    }

    pub fn dialogue_act_type(&self) -> &str {
        &self.dialogue_act_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|n| n.as_ref())
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_ref().map(|v| v.as_ref())
    }

    pub(crate) fn null() -> Self {
        Self {
            dialogue_act_type: "null".to_string(),
            name: None,
            value: None,
        }
    }
}

impl FromStr for DialogueActItem {
    type Err = failure::Error;

    fn from_str(s: &str) -> Result<Self> {
        let captures = DAI_REGEX.captures(s).ok_or_else(|| {
            SluError::MalformedInput(format!("invalid dialogue act item '{}'", s))
        })?;
        let dialogue_act_type = captures[1].to_string();
        let arguments = captures[2].trim();
        if arguments.is_empty() {
            return Self::new(dialogue_act_type, None, None);
        }

        let (name, value) = match arguments.find('=') {
            Some(idx) => (
                arguments[..idx].trim(),
                Some(unquote(arguments[idx + 1..].trim())?),
            ),
            None => (arguments, None),
        };
        if !SLOT_NAME_REGEX.is_match(name) {
            return Err(SluError::MalformedInput(format!(
                "invalid slot name '{}' in dialogue act item '{}'",
                name, s
            ))
            .into());
        }
        Self::new(dialogue_act_type, Some(name.to_string()), value)
    }
}

fn unquote(value: &str) -> Result<String> {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    let unquoted = if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    };
    if unquoted.contains(|c| c == '"' || c == '\'') && !quoted {
        return Err(SluError::MalformedInput(format!(
            "unbalanced quotes in value {}",
            value
        ))
        .into());
    }
    if unquoted.contains('"') {
        return Err(SluError::MalformedInput(format!(
            "nested quotes in value {}",
            value
        ))
        .into());
    }
    Ok(unquoted.to_string())
}

impl fmt::Display for DialogueActItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.dialogue_act_type)?;
        if let Some(name) = self.name.as_ref() {
            write!(f, "{}", name)?;
            if let Some(value) = self.value.as_ref() {
                let needs_quotes = value.is_empty()
                    || value.contains(char::is_whitespace)
                    || value.contains(RESERVED_VALUE_CHARS);
                if needs_quotes {
                    write!(f, "=\"{}\"", value)?;
                } else {
                    write!(f, "={}", value)?;
                }
            }
        }
        write!(f, ")")
    }
}

impl Serialize for DialogueActItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DialogueActItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Duplicate free set of dialogue act items, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DialogueAct {
    items: Vec<DialogueActItem>,
}

impl DialogueAct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the item was already present
    pub fn push(&mut self, item: DialogueActItem) -> bool {
        if self.items.contains(&item) {
            false
        } else {
            self.items.push(item);
            true
        }
    }

    pub fn contains(&self, item: &DialogueActItem) -> bool {
        self.items.contains(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DialogueActItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<DialogueActItem> for DialogueAct {
    fn from_iter<T: IntoIterator<Item = DialogueActItem>>(iter: T) -> Self {
        let mut dialogue_act = DialogueAct::new();
        for item in iter {
            dialogue_act.push(item);
        }
        dialogue_act
    }
}

impl<'a> IntoIterator for &'a DialogueAct {
    type Item = &'a DialogueActItem;
    type IntoIter = ::std::slice::Iter<'a, DialogueActItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromStr for DialogueAct {
    type Err = failure::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(SluError::MalformedInput("empty dialogue act".to_string()).into());
        }
        split_items(s)?
            .into_iter()
            .map(|dai| dai.parse::<DialogueActItem>())
            .collect()
    }
}

/// Splits on `&` separators that are neither quoted nor inside parentheses
fn split_items(s: &str) -> Result<Vec<&str>> {
    let mut items = vec![];
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => (),
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    SluError::MalformedInput(format!("unbalanced parentheses in '{}'", s))
                })?
            }
            (None, '&') if depth == 0 => {
                items.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => (),
        }
    }
    if quote.is_some() || depth != 0 {
        return Err(SluError::MalformedInput(format!(
            "unterminated dialogue act '{}'",
            s
        ))
        .into());
    }
    items.push(&s[start..]);
    Ok(items)
}

impl fmt::Display for DialogueAct {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let items: Vec<String> = self.items.iter().map(|dai| dai.to_string()).collect();
        write!(f, "{}", items.join("&"))
    }
}
