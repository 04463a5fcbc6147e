//! Configuration and collaborator factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mathquiz_core::launch::LaunchConfig;
use mathquiz_core::progress::DEFAULT_PROGRESS_FILE;
use mathquiz_core::report::StudentInfo;
use mathquiz_core::session::ASSESSMENT_DURATION_SECS;
use mathquiz_core::traits::{QuestionGenerator, ReportSender, DEFAULT_SUBJECT};

use crate::emailjs::EmailJsSender;
use crate::file::FileGenerator;
use crate::gemini::GeminiGenerator;

/// Environment variable that overrides the Gemini API key.
pub const GEMINI_KEY_ENV: &str = "MATHQUIZ_GEMINI_KEY";

/// Where question sets come from.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratorConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    File {
        path: PathBuf,
    },
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorConfig::Gemini {
                api_key: _,
                model,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
            GeneratorConfig::File { path } => {
                f.debug_struct("File").field("path", path).finish()
            }
        }
    }
}

/// Where score reports are delivered.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReportConfig {
    EmailJs {
        service_id: String,
        template_id: String,
        public_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportConfig::EmailJs {
                service_id,
                template_id,
                public_key: _,
                base_url,
            } => f
                .debug_struct("EmailJs")
                .field("service_id", service_id)
                .field("template_id", template_id)
                .field("public_key", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// Top-level mathquiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MathquizConfig {
    /// Curriculum label sent with every lesson title.
    #[serde(default = "default_subject")]
    pub subject: String,
    /// File holding the best score per lesson.
    #[serde(default = "default_progress_path")]
    pub progress_path: PathBuf,
    /// Custom curriculum TOML; the bundled curriculum is used when unset.
    #[serde(default)]
    pub curriculum_path: Option<PathBuf>,
    /// Assessment time limit.
    #[serde(default = "default_duration")]
    pub assessment_duration_secs: u32,
    /// Max retries on generator errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
    #[serde(default)]
    pub report: Option<ReportConfig>,
    /// Identity included in score reports.
    #[serde(default)]
    pub student: StudentInfo,
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}
fn default_progress_path() -> PathBuf {
    PathBuf::from(DEFAULT_PROGRESS_FILE)
}
fn default_duration() -> u32 {
    ASSESSMENT_DURATION_SECS
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}

impl Default for MathquizConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            progress_path: default_progress_path(),
            curriculum_path: None,
            assessment_duration_secs: default_duration(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            generator: None,
            report: None,
            student: StudentInfo::default(),
        }
    }
}

impl MathquizConfig {
    /// Settings for the lesson launcher.
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            subject: self.subject.clone(),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            assessment_duration_secs: self.assessment_duration_secs,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        // Substituted text is never rescanned.
        from = start + value.len();
    }
    result
}

fn resolve_generator_config(config: &GeneratorConfig) -> GeneratorConfig {
    match config {
        GeneratorConfig::Gemini {
            api_key,
            model,
            base_url,
        } => GeneratorConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            model: model.as_deref().map(resolve_env_vars),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
        GeneratorConfig::File { path } => GeneratorConfig::File {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
    }
}

fn resolve_report_config(config: &ReportConfig) -> ReportConfig {
    match config {
        ReportConfig::EmailJs {
            service_id,
            template_id,
            public_key,
            base_url,
        } => ReportConfig::EmailJs {
            service_id: resolve_env_vars(service_id),
            template_id: resolve_env_vars(template_id),
            public_key: resolve_env_vars(public_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `mathquiz.toml` in the current directory
/// 2. `~/.config/mathquiz/config.toml`
///
/// Environment variable override: `MATHQUIZ_GEMINI_KEY`.
pub fn load_config() -> Result<MathquizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MathquizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("mathquiz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => MathquizConfig::default(),
    };

    Ok(apply_env(config, std::env::var(GEMINI_KEY_ENV).ok()))
}

/// Parse a config document without consulting the environment.
pub fn parse_config(content: &str) -> Result<MathquizConfig> {
    Ok(toml::from_str::<MathquizConfig>(content)?)
}

/// Apply the key override, then resolve `${VAR}` references.
fn apply_env(mut config: MathquizConfig, gemini_key: Option<String>) -> MathquizConfig {
    if let Some(key) = gemini_key {
        match &mut config.generator {
            Some(GeneratorConfig::Gemini { api_key, .. }) => *api_key = key,
            Some(GeneratorConfig::File { .. }) => {}
            None => {
                config.generator = Some(GeneratorConfig::Gemini {
                    api_key: key,
                    model: None,
                    base_url: None,
                })
            }
        }
    }

    config.subject = resolve_env_vars(&config.subject);
    config.generator = config.generator.as_ref().map(resolve_generator_config);
    config.report = config.report.as_ref().map(resolve_report_config);
    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("mathquiz"))
}

/// Create a question generator from its configuration.
pub fn create_generator(config: &GeneratorConfig) -> Result<Arc<dyn QuestionGenerator>> {
    match config {
        GeneratorConfig::Gemini {
            api_key,
            model,
            base_url,
        } => {
            if api_key.trim().is_empty() {
                anyhow::bail!("Gemini API key is empty; set {GEMINI_KEY_ENV} or generator.api_key");
            }
            Ok(Arc::new(GeminiGenerator::new(
                api_key,
                model.clone(),
                base_url.clone(),
            )?))
        }
        GeneratorConfig::File { path } => Ok(Arc::new(FileGenerator::open(path)?)),
    }
}

/// Create a report sender from its configuration.
pub fn create_reporter(config: &ReportConfig) -> Result<Arc<dyn ReportSender>> {
    match config {
        ReportConfig::EmailJs {
            service_id,
            template_id,
            public_key,
            base_url,
        } => Ok(Arc::new(EmailJsSender::new(
            service_id,
            template_id,
            public_key,
            base_url.clone(),
        )?)),
    }
}
