//! Parsing of interactive quiz commands typed on stdin.

use mathquiz_core::model::{Answer, ItemKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Answer(Answer),
    Reveal(ItemKey),
    InstantFeedback(bool),
    Show,
    Status,
    Submit,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  a <n> <A-D>        answer Part A item n
  b <n>.<s> <d|s>    judge Part B statement s of item n (d = Đúng / true, s = Sai / false)
  c <n> <text>       answer Part C item n
  reveal <key>       show one item's result, e.g. reveal A3 (practice)
  feedback on|off    toggle instant feedback (practice)
  show               print the questions and your answers
  status             remaining time, answered count, live score
  submit             submit the quiz (asks for confirmation)
  quit               leave without submitting";

/// Parse one line. Returns a user-facing message on failure.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map(|(c, r)| (c, r.trim()))
        .unwrap_or((line, ""));

    match command.to_lowercase().as_str() {
        "a" => {
            let (item, option) = two_args(rest, "a <n> <A-D>")?;
            Ok(Input::Answer(Answer::Choice {
                item: parse_id(item)?,
                option: parse_option(option)?,
            }))
        }
        "b" => {
            let (key, value) = two_args(rest, "b <n>.<s> <d|s>")?;
            let (item, statement) = key
                .split_once('.')
                .ok_or_else(|| format!("expected <item>.<statement>, got {key:?}"))?;
            Ok(Input::Answer(Answer::Statement {
                item: parse_id(item)?,
                statement: parse_id(statement)?,
                value: parse_judgement(value)?,
            }))
        }
        "c" => {
            let (item, text) = two_args(rest, "c <n> <text>")?;
            Ok(Input::Answer(Answer::Short {
                item: parse_id(item)?,
                text: text.to_string(),
            }))
        }
        "reveal" => Ok(Input::Reveal(rest.parse::<ItemKey>()?)),
        "feedback" => match rest.to_lowercase().as_str() {
            "on" => Ok(Input::InstantFeedback(true)),
            "off" => Ok(Input::InstantFeedback(false)),
            _ => Err("usage: feedback on|off".into()),
        },
        "show" => Ok(Input::Show),
        "status" => Ok(Input::Status),
        "submit" => Ok(Input::Submit),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        "" => Err("type `help` for commands".into()),
        other => Err(format!("unknown command {other:?}; type `help`")),
    }
}

/// Whether a confirmation prompt answer means yes.
pub fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes" | "có" | "co")
}

fn two_args<'a>(rest: &'a str, usage: &str) -> Result<(&'a str, &'a str), String> {
    rest.split_once(char::is_whitespace)
        .map(|(a, b)| (a, b.trim()))
        .filter(|(_, b)| !b.is_empty())
        .ok_or_else(|| format!("usage: {usage}"))
}

fn parse_id(text: &str) -> Result<u32, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("invalid item number {text:?}"))
}

fn parse_option(text: &str) -> Result<usize, String> {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Ok((c.to_ascii_uppercase() as u8 - b'A') as usize)
        }
        _ => Err(format!("invalid option {text:?}; use a letter A-D")),
    }
}

fn parse_judgement(text: &str) -> Result<bool, String> {
    match text.trim().to_lowercase().as_str() {
        "d" | "đ" | "đúng" | "dung" | "t" | "true" => Ok(true),
        "s" | "sai" | "f" | "false" => Ok(false),
        other => Err(format!("invalid judgement {other:?}; use d (Đúng) or s (Sai)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answers() {
        assert_eq!(
            parse_input("a 3 c").unwrap(),
            Input::Answer(Answer::Choice { item: 3, option: 2 })
        );
        assert_eq!(
            parse_input("B 1.2 Đúng").unwrap(),
            Input::Answer(Answer::Statement {
                item: 1,
                statement: 2,
                value: true
            })
        );
        assert_eq!(
            parse_input("c 4   3/4 m").unwrap(),
            Input::Answer(Answer::Short {
                item: 4,
                text: "3/4 m".into()
            })
        );
    }

    #[test]
    fn parses_session_commands() {
        assert_eq!(parse_input("reveal b2.3").unwrap(), Input::Reveal(ItemKey::Statement { item: 2, statement: 3 }));
        assert_eq!(parse_input("feedback OFF").unwrap(), Input::InstantFeedback(false));
        assert_eq!(parse_input(" submit ").unwrap(), Input::Submit);
        assert_eq!(parse_input("exit").unwrap(), Input::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_input("a 3").is_err());
        assert!(parse_input("a x b").is_err());
        assert!(parse_input("a 1 bb").is_err());
        assert!(parse_input("b 1 d").is_err());
        assert!(parse_input("b 1.1 maybe").is_err());
        assert!(parse_input("c 2").is_err());
        assert!(parse_input("jump").is_err());
        assert!(parse_input("").is_err());
    }

    #[test]
    fn confirmation() {
        assert!(is_yes("Y"));
        assert!(is_yes(" có "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}
