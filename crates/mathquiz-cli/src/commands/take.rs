//! The `mathquiz take` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use mathquiz_core::driver::{SessionDriver, SessionHandle};
use mathquiz_core::error::SessionError;
use mathquiz_core::launch::LessonLauncher;
use mathquiz_core::model::{AnswerSheet, QuestionSet, QuizMode};
use mathquiz_core::report::{format_score, share_message, ScoreReport};
use mathquiz_core::session::{format_remaining, SessionState, SubmitTrigger};
use mathquiz_providers::{create_generator, create_reporter, load_config_from};

use super::{load_curriculum, open_progress, read_answer_sheet};
use crate::display;
use crate::input::{self, Input};

pub struct TakeArgs {
    pub lesson: String,
    pub mode: QuizMode,
    pub answers: Option<PathBuf>,
    pub send_report: bool,
    pub progress: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: TakeArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let curriculum = load_curriculum(&config)?;
    let mut progress = open_progress(&config, args.progress.clone());

    let sheet = args.answers.as_deref().map(read_answer_sheet).transpose()?;

    let generator_config = config.generator.as_ref().context(
        "no question generator configured; add a [generator] table to mathquiz.toml or set MATHQUIZ_GEMINI_KEY",
    )?;
    let generator = create_generator(generator_config)?;
    let reporter = if args.send_report {
        let report_config = config
            .report
            .as_ref()
            .context("--send-report needs a [report] table in the config")?;
        Some(create_reporter(report_config)?)
    } else {
        None
    };

    let launcher = LessonLauncher::new(generator, config.launch_config());
    let session = match launcher
        .start(&curriculum, &progress, &args.lesson, args.mode)
        .await
    {
        Ok(session) => session,
        Err(e) if e.is_retryable() => {
            return Err(anyhow::Error::new(e).context("could not prepare the quiz; try again later"))
        }
        Err(e) => return Err(e.into()),
    };

    let title = curriculum
        .lesson(&args.lesson)
        .map(|l| l.title.clone())
        .unwrap_or_else(|| args.lesson.clone());
    let questions = session.questions().clone();
    match session.remaining_secs() {
        Some(secs) => println!(
            "{title} [{}] - time limit {}",
            args.mode,
            format_remaining(secs)
        ),
        None => println!("{title} [{}]", args.mode),
    }

    let (driver, handle) = SessionDriver::new(session, args.lesson.clone());
    let mode = args.mode;
    let client = async move {
        match sheet {
            Some(sheet) => submit_sheet(&handle, sheet).await,
            None => interactive(&handle, &questions, mode).await,
        }
    };
    let (exit, outcome) = tokio::join!(driver.run(&mut progress), client);
    outcome?;

    let Some(result) = exit.session.result().cloned() else {
        println!("Left without submitting; nothing was saved.");
        return Ok(());
    };

    match result.trigger {
        SubmitTrigger::Manual => println!("\nSubmitted."),
        SubmitTrigger::TimerExpired => println!("\nTime is up! Your answers were submitted."),
    }
    display::print_breakdown(&result.score);
    display::print_review(&exit.session.all_feedback());

    match exit.commit {
        Some(Ok(true)) => println!("\nNew best score saved."),
        Some(Ok(false)) => println!(
            "\nBest score for this lesson stays {}.",
            progress
                .get(&args.lesson)
                .map(format_score)
                .unwrap_or_else(|| "-".into())
        ),
        Some(Err(e)) => eprintln!("\nWarning: could not save progress: {e}"),
        None => println!("\nPractice mode: progress is not saved."),
    }

    if mode == QuizMode::Assessment && result.score.passed() {
        match curriculum.next_of(&args.lesson)? {
            Some(next) => println!("Next lesson unlocked: {} {}", next.id, next.title),
            None => println!("You have completed the whole curriculum!"),
        }
    }

    println!("\nShare: {}", share_message(result.score.total, &title));

    if let Some(reporter) = reporter {
        let report = ScoreReport::new(config.student.clone(), result.score.total, &title);
        match reporter.send_report(&report).await {
            Ok(ack) => println!("Report sent via {} ({}).", reporter.name(), ack.status),
            Err(e) => eprintln!("Warning: failed to send report: {e:#}"),
        }
    }

    Ok(())
}

/// Record a prepared answer sheet and submit it.
async fn submit_sheet(handle: &SessionHandle, sheet: AnswerSheet) -> Result<()> {
    for answer in sheet.answers() {
        if let Err(e) = handle.record_answer(answer).await {
            eprintln!("Skipped answer: {e}");
        }
    }
    match handle.request_submit().await {
        Ok(()) => {
            handle.confirm_submit().await?;
        }
        // The clock got there first.
        Err(SessionError::InvalidTransition {
            state: SessionState::Submitted,
            ..
        }) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Lines from stdin on a plain thread, so a pending read never holds up
/// shutdown.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

enum Next {
    Line(Option<String>),
    TimeUp,
}

async fn next_line(lines: &mut mpsc::Receiver<String>, handle: &SessionHandle) -> Next {
    print!("> ");
    let _ = std::io::stdout().flush();
    tokio::select! {
        line = lines.recv() => Next::Line(line),
        _ = handle.wait_submitted() => Next::TimeUp,
    }
}

async fn interactive(handle: &SessionHandle, questions: &QuestionSet, mode: QuizMode) -> Result<()> {
    let mut lines = stdin_lines();
    let mut answers = AnswerSheet::new();
    let mut instant = mode == QuizMode::Practice;
    let total = questions.part_a.len() + questions.statement_count() + questions.part_c.len();

    display::print_questions(questions, &answers);
    println!("\n{}", input::HELP);

    loop {
        let line = match next_line(&mut lines, handle).await {
            Next::Line(Some(line)) => line,
            Next::Line(None) => {
                println!();
                return Ok(());
            }
            Next::TimeUp => return Ok(()),
        };

        let parsed = match input::parse_input(&line) {
            Ok(parsed) => parsed,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match parsed {
            Input::Answer(answer) => {
                let key = answer.key();
                match handle.record_answer(answer.clone()).await {
                    Ok(()) => {
                        answers.set(answer);
                        if instant && answers.is_answered(key) {
                            display::print_feedback(&handle.reveal(key).await?);
                        } else {
                            println!("Saved {key}.");
                        }
                    }
                    Err(e) => println!("Rejected: {e}"),
                }
            }
            Input::Reveal(key) => match handle.reveal(key).await {
                Ok(feedback) => display::print_feedback(&feedback),
                Err(e) => println!("{e}"),
            },
            Input::InstantFeedback(enabled) => match handle.set_instant_feedback(enabled).await {
                Ok(()) => {
                    instant = enabled;
                    println!("Instant feedback {}.", if enabled { "on" } else { "off" });
                }
                Err(e) => println!("{e}"),
            },
            Input::Show => display::print_questions(questions, &answers),
            Input::Status => {
                let snapshot = handle.snapshot().await?;
                let time = snapshot
                    .remaining_secs
                    .map(format_remaining)
                    .unwrap_or_else(|| "no limit".into());
                let score = snapshot
                    .score
                    .map(|s| format!(" | score so far {}/10", format_score(s.total)))
                    .unwrap_or_default();
                println!("Answered {}/{total} | time left {time}{score}", snapshot.answered);
            }
            Input::Submit => {
                if let Err(e) = handle.request_submit().await {
                    println!("{e}");
                    continue;
                }
                let snapshot = handle.snapshot().await?;
                let time = snapshot
                    .remaining_secs
                    .map(|s| format!(" {} left.", format_remaining(s)))
                    .unwrap_or_default();
                println!(
                    "Submit now? Answered {}/{total}.{time} [y/N]",
                    snapshot.answered
                );
                match next_line(&mut lines, handle).await {
                    Next::TimeUp => return Ok(()),
                    Next::Line(Some(reply)) if input::is_yes(&reply) => {
                        handle.confirm_submit().await?;
                        return Ok(());
                    }
                    Next::Line(reply) => {
                        match handle.cancel_submit().await {
                            Ok(()) => println!("Back to the quiz."),
                            Err(e) => println!("{e}"),
                        }
                        if reply.is_none() {
                            return Ok(());
                        }
                    }
                }
            }
            Input::Help => println!("{}", input::HELP),
            Input::Quit => return Ok(()),
        }
    }
}
