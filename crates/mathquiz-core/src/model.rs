//! Core data model types for mathquiz.
//!
//! These are the fundamental types the whole system uses to represent the
//! curriculum, generated question sets and a learner's answers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a question or statement inside a generated question set.
pub type ItemId = u32;

/// A single curriculum unit, the unit of progression gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Globally unique lesson id (e.g. "l1.1").
    pub id: String,
    /// Display title, also used as the topic sent to the question generator.
    pub title: String,
    /// Id of the chapter this lesson belongs to.
    pub chapter_id: String,
}

/// An ordered group of lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Quiz mode chosen by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Timed, progress-affecting, sequentially unlocked.
    Assessment,
    /// Untimed, never persisted, everything unlocked.
    Practice,
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Assessment => write!(f, "assessment"),
            QuizMode::Practice => write!(f, "practice"),
        }
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assessment" | "exam" => Ok(QuizMode::Assessment),
            "practice" | "free" => Ok(QuizMode::Practice),
            other => Err(format!("unknown quiz mode: {other}")),
        }
    }
}

/// Part A: single-choice question with four options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceItem {
    pub id: ItemId,
    #[serde(alias = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(alias = "correctAnswerIndex")]
    pub correct_option_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One true/false statement of a Part B item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub id: ItemId,
    #[serde(alias = "statement")]
    pub text: String,
    pub is_true: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Part B: a stem followed by statements judged true or false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueFalseItem {
    pub id: ItemId,
    pub stem: String,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// Part C: short free-text answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortAnswerItem {
    pub id: ItemId,
    #[serde(alias = "question")]
    pub prompt: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A generated three-part question set. Read-only input to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    #[serde(default)]
    pub topic: String,
    #[serde(default, alias = "part1")]
    pub part_a: Vec<MultipleChoiceItem>,
    #[serde(default, alias = "part2")]
    pub part_b: Vec<TrueFalseItem>,
    #[serde(default, alias = "part3")]
    pub part_c: Vec<ShortAnswerItem>,
}

impl QuestionSet {
    pub fn choice_item(&self, id: ItemId) -> Option<&MultipleChoiceItem> {
        self.part_a.iter().find(|q| q.id == id)
    }

    pub fn statement(&self, item: ItemId, statement: ItemId) -> Option<&Statement> {
        self.part_b
            .iter()
            .find(|q| q.id == item)
            .and_then(|q| q.statements.iter().find(|s| s.id == statement))
    }

    pub fn short_item(&self, id: ItemId) -> Option<&ShortAnswerItem> {
        self.part_c.iter().find(|q| q.id == id)
    }

    /// Total number of Part B statements across all stems.
    pub fn statement_count(&self) -> usize {
        self.part_b.iter().map(|q| q.statements.len()).sum()
    }

    /// Whether the set contains the item addressed by `key`.
    pub fn contains(&self, key: ItemKey) -> bool {
        match key {
            ItemKey::Choice(id) => self.choice_item(id).is_some(),
            ItemKey::Statement { item, statement } => self.statement(item, statement).is_some(),
            ItemKey::Short(id) => self.short_item(id).is_some(),
        }
    }
}

/// The three quiz parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Part {
    A,
    B,
    C,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::A => write!(f, "A"),
            Part::B => write!(f, "B"),
            Part::C => write!(f, "C"),
        }
    }
}

/// Addresses one answerable unit: a Part A item, one Part B statement,
/// or a Part C item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKey {
    Choice(ItemId),
    Statement { item: ItemId, statement: ItemId },
    Short(ItemId),
}

impl ItemKey {
    pub fn part(&self) -> Part {
        match self {
            ItemKey::Choice(_) => Part::A,
            ItemKey::Statement { .. } => Part::B,
            ItemKey::Short(_) => Part::C,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Choice(id) => write!(f, "A{id}"),
            ItemKey::Statement { item, statement } => write!(f, "B{item}.{statement}"),
            ItemKey::Short(id) => write!(f, "C{id}"),
        }
    }
}

impl FromStr for ItemKey {
    type Err = String;

    /// Parse the display form: `A3`, `B1.2`, `C4` (part letter is
    /// case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("invalid item key: {s:?} (expected e.g. A3, B1.2, C4)");
        let mut chars = s.chars();
        let part = chars.next().ok_or_else(invalid)?;
        let rest = chars.as_str();
        let id = |text: &str| text.parse::<ItemId>().map_err(|_| invalid());
        match part.to_ascii_uppercase() {
            'A' => Ok(ItemKey::Choice(id(rest)?)),
            'C' => Ok(ItemKey::Short(id(rest)?)),
            'B' => {
                let (item, statement) = rest.split_once('.').ok_or_else(invalid)?;
                Ok(ItemKey::Statement {
                    item: id(item)?,
                    statement: id(statement)?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// A single answer submitted by the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Choice { item: ItemId, option: usize },
    Statement { item: ItemId, statement: ItemId, value: bool },
    Short { item: ItemId, text: String },
}

impl Answer {
    pub fn key(&self) -> ItemKey {
        match self {
            Answer::Choice { item, .. } => ItemKey::Choice(*item),
            Answer::Statement {
                item, statement, ..
            } => ItemKey::Statement {
                item: *item,
                statement: *statement,
            },
            Answer::Short { item, .. } => ItemKey::Short(*item),
        }
    }
}

/// All answers recorded so far, one map per part.
///
/// Serialized as JSON objects keyed by item id; Part B is nested by item
/// then statement id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSheet {
    #[serde(default)]
    pub choices: BTreeMap<ItemId, usize>,
    #[serde(default)]
    pub statements: BTreeMap<ItemId, BTreeMap<ItemId, bool>>,
    #[serde(default)]
    pub short: BTreeMap<ItemId, String>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an answer, overwriting any previous value for the same item.
    pub fn set(&mut self, answer: Answer) {
        match answer {
            Answer::Choice { item, option } => {
                self.choices.insert(item, option);
            }
            Answer::Statement {
                item,
                statement,
                value,
            } => {
                self.statements.entry(item).or_default().insert(statement, value);
            }
            Answer::Short { item, text } => {
                self.short.insert(item, text);
            }
        }
    }

    pub fn choice(&self, item: ItemId) -> Option<usize> {
        self.choices.get(&item).copied()
    }

    pub fn statement(&self, item: ItemId, statement: ItemId) -> Option<bool> {
        self.statements
            .get(&item)
            .and_then(|s| s.get(&statement))
            .copied()
    }

    pub fn short(&self, item: ItemId) -> Option<&str> {
        self.short.get(&item).map(String::as_str)
    }

    /// Whether a non-empty answer exists for `key`.
    pub fn is_answered(&self, key: ItemKey) -> bool {
        match key {
            ItemKey::Choice(id) => self.choices.contains_key(&id),
            ItemKey::Statement { item, statement } => self.statement(item, statement).is_some(),
            ItemKey::Short(id) => self.short(id).is_some_and(|t| !t.trim().is_empty()),
        }
    }

    /// Number of answered units across all parts.
    pub fn answered_count(&self) -> usize {
        self.choices.len()
            + self.statements.values().map(|s| s.len()).sum::<usize>()
            + self.short.values().filter(|t| !t.trim().is_empty()).count()
    }

    /// Iterate every recorded answer as an [`Answer`].
    pub fn answers(&self) -> impl Iterator<Item = Answer> + '_ {
        let choices = self.choices.iter().map(|(&item, &option)| Answer::Choice { item, option });
        let statements = self.statements.iter().flat_map(|(&item, values)| {
            values.iter().map(move |(&statement, &value)| Answer::Statement {
                item,
                statement,
                value,
            })
        });
        let short = self.short.iter().map(|(&item, text)| Answer::Short {
            item,
            text: text.clone(),
        });
        choices.chain(statements).chain(short)
    }
}
