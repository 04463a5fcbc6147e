//! mathquiz CLI — timed, gated Grade-6 math assessments in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mathquiz_core::model::QuizMode;

mod commands;
mod display;
mod input;

#[derive(Parser)]
#[command(name = "mathquiz", version, about = "Grade-6 math quizzes with lesson progression")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List lessons with their status and best score
    Lessons {
        /// Quiz mode: assessment or practice
        #[arg(long, default_value = "assessment")]
        mode: QuizMode,

        /// Progress file (overrides config)
        #[arg(long)]
        progress: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Take a quiz for one lesson
    Take {
        /// Lesson id (e.g. "l1.1")
        #[arg(long)]
        lesson: String,

        /// Quiz mode: assessment or practice
        #[arg(long, default_value = "assessment")]
        mode: QuizMode,

        /// Answer sheet JSON; answers on stdin when omitted
        #[arg(long)]
        answers: Option<PathBuf>,

        /// Email the final score using the configured reporter
        #[arg(long)]
        send_report: bool,

        /// Progress file (overrides config)
        #[arg(long)]
        progress: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score an answer sheet against a question set offline
    Score {
        /// Question set JSON
        #[arg(long)]
        questions: PathBuf,

        /// Answer sheet JSON
        #[arg(long)]
        answers: PathBuf,
    },

    /// Check a question set for structural problems
    Validate {
        /// Question set JSON
        #[arg(long)]
        questions: PathBuf,
    },

    /// Create a starter config and sample question set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mathquiz=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lessons {
            mode,
            progress,
            config,
        } => commands::lessons::execute(mode, progress, config),
        Commands::Take {
            lesson,
            mode,
            answers,
            send_report,
            progress,
            config,
        } => {
            commands::take::execute(commands::take::TakeArgs {
                lesson,
                mode,
                answers,
                send_report,
                progress,
                config,
            })
            .await
        }
        Commands::Score { questions, answers } => commands::score::execute(questions, answers),
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
