//! mathquiz-core — Curriculum, progress, scoring, and quiz sessions.
//!
//! This crate holds the rules of the quiz: which lessons exist and in what
//! order, how answers are scored, when a lesson unlocks, and how a single
//! attempt moves from answering to submission. Network collaborators live
//! in `mathquiz-providers` behind the traits in [`traits`].

pub mod curriculum;
pub mod driver;
pub mod error;
pub mod gate;
pub mod launch;
pub mod model;
pub mod progress;
pub mod report;
pub mod scoring;
pub mod session;
pub mod traits;
pub mod validate;
