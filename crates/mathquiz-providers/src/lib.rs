//! mathquiz-providers — Question generation and score reporting backends.
//!
//! Implements the `QuestionGenerator` and `ReportSender` traits from
//! `mathquiz-core` over Gemini, a local JSON file, and EmailJS.

pub mod config;
pub mod emailjs;
pub mod error;
pub mod file;
pub mod gemini;
pub mod mock;

pub use config::{
    create_generator, create_reporter, load_config, load_config_from, GeneratorConfig,
    MathquizConfig, ReportConfig,
};
pub use error::ReportError;
