//! Curriculum index.
//!
//! Loads the chapter → lesson graph from TOML and precomputes the global
//! lesson order so adjacency lookups are O(1).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::CurriculumError;
use crate::model::{Chapter, Lesson};

/// The curriculum bundled with the crate.
const BUNDLED_CURRICULUM: &str = include_str!("../data/curriculum.toml");

/// Intermediate TOML structure for curriculum files.
#[derive(Debug, Deserialize)]
struct TomlCurriculum {
    #[serde(default)]
    chapters: Vec<TomlChapter>,
}

#[derive(Debug, Deserialize)]
struct TomlChapter {
    id: String,
    title: String,
    #[serde(default)]
    lessons: Vec<TomlLesson>,
}

#[derive(Debug, Deserialize)]
struct TomlLesson {
    id: String,
    title: String,
    #[serde(default)]
    chapter_id: Option<String>,
}

/// Ordered chapters plus an index over the flattened lesson sequence.
#[derive(Debug, Clone)]
pub struct Curriculum {
    chapters: Vec<Chapter>,
    order: Vec<String>,
    /// lesson id → (position in `order`, chapter index, lesson index)
    index: HashMap<String, (usize, usize, usize)>,
}

impl Curriculum {
    /// Build an index over `chapters`, rejecting duplicate ids.
    pub fn new(chapters: Vec<Chapter>) -> Result<Self, CurriculumError> {
        let mut order = Vec::new();
        let mut index = HashMap::new();

        for (ci, chapter) in chapters.iter().enumerate() {
            for (li, lesson) in chapter.lessons.iter().enumerate() {
                if lesson.chapter_id != chapter.id {
                    return Err(CurriculumError::ChapterMismatch {
                        lesson: lesson.id.clone(),
                        declared: lesson.chapter_id.clone(),
                        actual: chapter.id.clone(),
                    });
                }
                if index
                    .insert(lesson.id.clone(), (order.len(), ci, li))
                    .is_some()
                {
                    return Err(CurriculumError::DuplicateLesson(lesson.id.clone()));
                }
                order.push(lesson.id.clone());
            }
        }

        if order.is_empty() {
            return Err(CurriculumError::Empty);
        }

        Ok(Self {
            chapters,
            order,
            index,
        })
    }

    /// The Grade 6 curriculum shipped with mathquiz.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_CURRICULUM, Path::new("<bundled>"))
    }

    /// Load a curriculum from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read curriculum file: {}", path.display()))?;
        Self::from_toml_str(&content, path)
    }

    /// Parse a TOML string into a `Curriculum` (useful for testing).
    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self> {
        let parsed: TomlCurriculum = toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

        let chapters = parsed
            .chapters
            .into_iter()
            .map(|c| {
                let lessons = c
                    .lessons
                    .into_iter()
                    .map(|l| Lesson {
                        id: l.id,
                        title: l.title,
                        chapter_id: l.chapter_id.unwrap_or_else(|| c.id.clone()),
                    })
                    .collect();
                Chapter {
                    id: c.id,
                    title: c.title,
                    lessons,
                }
            })
            .collect();

        Self::new(chapters)
            .with_context(|| format!("invalid curriculum: {}", source_path.display()))
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Lesson ids in canonical global order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The first lesson of the curriculum, which is never locked.
    pub fn first(&self) -> &Lesson {
        // `new` guarantees `order` is non-empty and fully indexed.
        let (_, ci, li) = self.index[&self.order[0]];
        &self.chapters[ci].lessons[li]
    }

    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.index
            .get(lesson_id)
            .map(|&(_, ci, li)| &self.chapters[ci].lessons[li])
    }

    pub fn contains(&self, lesson_id: &str) -> bool {
        self.index.contains_key(lesson_id)
    }

    /// The lesson immediately before `lesson_id` in global order, or `None`
    /// for the first lesson.
    pub fn previous_of(&self, lesson_id: &str) -> Result<Option<&Lesson>, CurriculumError> {
        let &(pos, _, _) = self
            .index
            .get(lesson_id)
            .ok_or_else(|| CurriculumError::NotFound(lesson_id.to_string()))?;
        Ok(pos
            .checked_sub(1)
            .and_then(|prev| self.lesson(&self.order[prev])))
    }

    /// The lesson immediately after `lesson_id`, or `None` for the last one.
    pub fn next_of(&self, lesson_id: &str) -> Result<Option<&Lesson>, CurriculumError> {
        let &(pos, _, _) = self
            .index
            .get(lesson_id)
            .ok_or_else(|| CurriculumError::NotFound(lesson_id.to_string()))?;
        Ok(self.order.get(pos + 1).and_then(|id| self.lesson(id)))
    }
}
