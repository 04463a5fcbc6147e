//! Terminal rendering of questions, feedback and scores.

use comfy_table::{Cell, Table};

use mathquiz_core::model::{AnswerSheet, QuestionSet};
use mathquiz_core::report::format_score;
use mathquiz_core::scoring::{ScoreBreakdown, MAX_SCORE, PART_A_POINTS, PART_B_POINTS, PART_C_POINTS};
use mathquiz_core::session::{option_letter, ItemFeedback};

pub fn print_questions(set: &QuestionSet, answers: &AnswerSheet) {
    println!("== {} ==", set.topic);

    if !set.part_a.is_empty() {
        println!("\nPHẦN A. Trắc nghiệm");
        for q in &set.part_a {
            println!("A{}. {}", q.id, q.prompt);
            for (i, option) in q.options.iter().enumerate() {
                let mark = if answers.choice(q.id) == Some(i) { '*' } else { ' ' };
                println!("   {mark} {}. {option}", option_letter(i));
            }
        }
    }

    if !set.part_b.is_empty() {
        println!("\nPHẦN B. Đúng / Sai");
        for q in &set.part_b {
            println!("B{}. {}", q.id, q.stem);
            for s in &q.statements {
                let mark = match answers.statement(q.id, s.id) {
                    Some(true) => "[Đ]",
                    Some(false) => "[S]",
                    None => "[ ]",
                };
                println!("   {mark} B{}.{} {}", q.id, s.id, s.text);
            }
        }
    }

    if !set.part_c.is_empty() {
        println!("\nPHẦN C. Trả lời ngắn");
        for q in &set.part_c {
            match answers.short(q.id) {
                Some(text) if !text.trim().is_empty() => {
                    println!("C{}. {}  -> {text}", q.id, q.prompt)
                }
                _ => println!("C{}. {}", q.id, q.prompt),
            }
        }
    }
}

pub fn print_feedback(feedback: &ItemFeedback) {
    let verdict = if feedback.correct {
        "correct"
    } else if feedback.answered {
        "wrong"
    } else {
        "unanswered"
    };
    println!("{}: {verdict} (answer: {})", feedback.key, feedback.expected);
    if let Some(explanation) = &feedback.explanation {
        println!("   {explanation}");
    }
}

pub fn print_breakdown(score: &ScoreBreakdown) {
    let mut table = Table::new();
    table.set_header(vec!["Part", "Score", "Max"]);
    for (part, got, max) in [
        ("A. Trắc nghiệm", score.part_a, PART_A_POINTS),
        ("B. Đúng / Sai", score.part_b, PART_B_POINTS),
        ("C. Trả lời ngắn", score.part_c, PART_C_POINTS),
        ("Total", score.total, MAX_SCORE),
    ] {
        table.add_row(vec![
            Cell::new(part),
            Cell::new(format_score(got)),
            Cell::new(format_score(max)),
        ]);
    }
    println!("{table}");
    println!(
        "Correct: {}/{}  Score: {}/10 ({})",
        score.correct,
        score.possible,
        format_score(score.total),
        if score.passed() { "PASSED" } else { "NOT PASSED" }
    );
}

/// Wrong or unanswered items, in question order.
pub fn print_review(feedback: &[ItemFeedback]) {
    let missed: Vec<&ItemFeedback> = feedback.iter().filter(|f| !f.correct).collect();
    if missed.is_empty() {
        return;
    }
    println!("\nReview:");
    for item in missed {
        print_feedback(item);
    }
}

