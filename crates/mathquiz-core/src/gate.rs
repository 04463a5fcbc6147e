//! Progression gate: which lessons a learner may start.
//!
//! A pure view over the curriculum and the progress store. It holds only
//! borrows, so every query reflects the store's current contents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::curriculum::Curriculum;
use crate::model::{Lesson, QuizMode};
use crate::progress::{is_passing, ProgressStore};

/// Accessibility of a lesson for the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonStatus {
    Locked,
    Unlocked,
    Passed,
    Failed,
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonStatus::Locked => write!(f, "locked"),
            LessonStatus::Unlocked => write!(f, "unlocked"),
            LessonStatus::Passed => write!(f, "passed"),
            LessonStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressionGate<'a> {
    curriculum: &'a Curriculum,
    progress: &'a ProgressStore,
}

impl<'a> ProgressionGate<'a> {
    pub fn new(curriculum: &'a Curriculum, progress: &'a ProgressStore) -> Self {
        Self {
            curriculum,
            progress,
        }
    }

    /// The lesson that must be passed before `lesson_id` opens in
    /// assessment mode, if any. Unknown lessons have no predecessor.
    pub fn blocking_lesson(&self, lesson_id: &str) -> Option<&'a Lesson> {
        let previous = match self.curriculum.previous_of(lesson_id) {
            Ok(previous) => previous?,
            Err(e) => {
                tracing::debug!("{e}; treating as unlocked");
                return None;
            }
        };
        let passed = self.progress.get(&previous.id).is_some_and(is_passing);
        (!passed).then_some(previous)
    }

    pub fn is_locked(&self, lesson_id: &str, mode: QuizMode) -> bool {
        match mode {
            QuizMode::Practice => false,
            QuizMode::Assessment => self.blocking_lesson(lesson_id).is_some(),
        }
    }

    pub fn status(&self, lesson_id: &str, mode: QuizMode) -> LessonStatus {
        if mode == QuizMode::Practice {
            return LessonStatus::Unlocked;
        }
        if self.is_locked(lesson_id, mode) {
            return LessonStatus::Locked;
        }
        match self.progress.get(lesson_id) {
            None => LessonStatus::Unlocked,
            Some(score) if is_passing(score) => LessonStatus::Passed,
            Some(_) => LessonStatus::Failed,
        }
    }

    /// Status of every lesson in curriculum order.
    pub fn statuses(&self, mode: QuizMode) -> Vec<(&'a Lesson, LessonStatus)> {
        self.curriculum
            .chapters()
            .iter()
            .flat_map(|c| c.lessons.iter())
            .map(|l| (l, self.status(&l.id, mode)))
            .collect()
    }
}
