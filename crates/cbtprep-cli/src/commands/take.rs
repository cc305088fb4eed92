//! The `cbtprep take` command: an interactive exam on stdin.
//!
//! Input lines and timer ticks are fed to the controller one at a time from
//! a single `select!` loop. Closing stdin abandons the exam.

use std::fmt::Write as _;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use cbtprep_core::review::{ChosenAnswer, ReviewItem};
use cbtprep_core::timer::format_clock;
use cbtprep_core::{ControllerEvent, ExamController, ExamSession, Question, Step, Submission};

pub async fn execute(
    bank: Option<String>,
    seed: Option<u64>,
    review: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::config(config_path)?;
    let pool = super::load_pool(&config, bank.as_deref()).await?;
    let store = super::open_store(&config.data_dir);

    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let mut controller =
        ExamController::new(Arc::new(pool), config.exam.clone(), store.clone(), store)
            .with_history_prefix(config.history_prefix.clone())
            .with_ticks(tick_tx);

    let Some(user) = controller.restore_user()? else {
        bail!("not logged in; run `cbtprep login --name <NAME> --department <DEPT>` first");
    };
    let name = user.display_name.clone();

    let session = match seed {
        Some(seed) => controller.start_exam_with(&mut StdRng::seed_from_u64(seed))?,
        None => controller.start_exam()?,
    };
    println!(
        "Welcome, {name}. {} questions, {} on the clock. Type h for help.\n",
        session.len(),
        format_clock(session.remaining_secs())
    );
    print!("{}", question_view(session));

    let mut lines = stdin_lines();
    let submission = loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line.transpose()? else {
                    controller.retake();
                    println!("\nInput closed. Exam abandoned, no result recorded.");
                    return Ok(());
                };
                match handle_line(&mut controller, &line)? {
                    Flow::Continue => {}
                    Flow::Quit => {
                        controller.retake();
                        println!("Exam abandoned, no result recorded.");
                        return Ok(());
                    }
                    Flow::Submitted(submission) => break submission,
                }
            }
            Some(tick) = tick_rx.recv() => {
                match controller.on_tick(tick)? {
                    Some(ControllerEvent::LowTime { remaining_secs }) => {
                        println!("\n*** {} left ***", format_clock(remaining_secs));
                    }
                    Some(ControllerEvent::AutoSubmitted(submission)) => {
                        println!("\nTime is up. Your answers were submitted.");
                        break submission;
                    }
                    None => {}
                }
            }
        }
    };

    print!("{}", result_view(&submission));
    if let Some(err) = &submission.persist_error {
        eprintln!("Warning: result not saved to history: {err}");
    }
    if review {
        print!("{}", review_view(&controller.review()?));
    }

    Ok(())
}

/// Stdin lines, read on a plain thread. A read that is still pending when
/// the exam ends (e.g. after a timeout) must not hold up process exit.
fn stdin_lines() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(String),
    Next,
    Previous,
    /// 1-based question number.
    GoTo(usize),
    Flag,
    List,
    Help,
    Submit,
    Quit,
    Empty,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let input = match line {
        "" => Input::Empty,
        "n" => Input::Next,
        "p" => Input::Previous,
        "f" => Input::Flag,
        "l" => Input::List,
        "h" | "?" => Input::Help,
        "s" => Input::Submit,
        "q" => Input::Quit,
        _ => match line.strip_prefix("g ") {
            Some(rest) => match rest.trim().parse::<usize>() {
                Ok(number) if number > 0 => Input::GoTo(number),
                _ => return Err("usage: g <question number>".into()),
            },
            None if line == "g" => return Err("usage: g <question number>".into()),
            None => Input::Answer(line.to_string()),
        },
    };
    Ok(input)
}

enum Flow {
    Continue,
    Quit,
    Submitted(Submission),
}

fn handle_line(controller: &mut ExamController, line: &str) -> Result<Flow> {
    let input = match parse_input(line) {
        Ok(input) => input,
        Err(usage) => {
            println!("{usage}");
            return Ok(Flow::Continue);
        }
    };
    tracing::debug!(?input, "input");

    let Some(session) = controller.session() else {
        bail!("no exam in progress");
    };
    let before = session.current_index();

    match input {
        Input::Empty => {}
        Input::Answer(raw) => {
            let key = resolve_key(session.current_question(), &raw);
            match controller.select_answer(&key) {
                Ok(()) => println!("Answer {key} recorded."),
                Err(e) => println!("{e}"),
            }
        }
        Input::Next => match controller.next()? {
            Step::Moved(_) => show(controller),
            Step::Complete => println!("This is the last question. Type s to submit."),
        },
        Input::Previous => {
            if controller.previous()? == before {
                println!("Already at the first question.");
            } else {
                show(controller);
            }
        }
        Input::GoTo(number) => match controller.go_to(number - 1) {
            Ok(()) => show(controller),
            Err(_) => println!("No question {number}; the exam has {}.", session_len(controller)),
        },
        Input::Flag => {
            let flagged = controller.toggle_current_flag()?;
            let verb = if flagged { "Flagged" } else { "Unflagged" };
            println!("{verb} question {}.", before + 1);
        }
        Input::List => {
            if let Some(session) = controller.session() {
                print!("{}", grid_view(session));
            }
        }
        Input::Help => print!("{HELP}"),
        Input::Submit => {
            let unanswered = controller.session().map_or(0, ExamSession::unanswered_count);
            if unanswered > 0 {
                println!("{unanswered} unanswered question(s) will be marked wrong.");
            }
            return Ok(Flow::Submitted(controller.submit()?));
        }
        Input::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Accept `b` for an option keyed `B`.
fn resolve_key(question: &Question, raw: &str) -> String {
    if question.has_option(raw) {
        raw.to_string()
    } else {
        raw.to_uppercase()
    }
}

fn show(controller: &ExamController) {
    if let Some(session) = controller.session() {
        print!("{}", question_view(session));
    }
}

fn session_len(controller: &ExamController) -> usize {
    controller.session().map_or(0, ExamSession::len)
}

const HELP: &str = "\
Commands:
  <key>       answer the current question (e.g. A)
  n / p       next / previous question
  g <number>  go to a question
  f           flag or unflag the current question
  l           list all questions
  s           submit
  q           quit without saving
";

fn question_view(session: &ExamSession) -> String {
    let index = session.current_index();
    let question = session.current_question();
    let mut out = String::new();

    let flag = if session.is_flagged(index) { " [flagged]" } else { "" };
    let low = if session.countdown().is_low() { " (low)" } else { "" };
    let _ = writeln!(
        out,
        "Question {} of {}{flag}    Time left {}{low}",
        index + 1,
        session.len(),
        format_clock(session.remaining_secs())
    );
    let _ = writeln!(out, "{}", question.text);
    for (key, text) in &question.options {
        let _ = writeln!(out, "  {key}) {text}");
    }
    match session.answer(index) {
        Some(key) => {
            let _ = writeln!(out, "Your answer: {key}");
        }
        None => {
            let _ = writeln!(out, "Not answered");
        }
    }
    out
}

/// Compact overview: `>` current, `*` answered, `?` flagged.
fn grid_view(session: &ExamSession) -> String {
    let mut out = String::new();
    for (i, cell) in session.grid().iter().enumerate() {
        let current = if cell.current { '>' } else { ' ' };
        let answered = if cell.answered { '*' } else { ' ' };
        let flagged = if cell.flagged { '?' } else { ' ' };
        let _ = write!(out, "{current}{:>2}{answered}{flagged}", i + 1);
        out.push(if (i + 1) % 10 == 0 { '\n' } else { ' ' });
    }
    if session.len() % 10 != 0 {
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "Answered {}/{}, flagged {}",
        session.answered_count(),
        session.len(),
        session.flagged().len()
    );
    out
}

fn result_view(submission: &Submission) -> String {
    let record = &submission.record;
    format!(
        "\nScore: {}/{} ({}%)\n{}\n",
        record.correct_count,
        record.total(),
        record.percentage,
        submission.verdict
    )
}

fn review_view(items: &[ReviewItem]) -> String {
    let mut out = String::from("\nReview\n");
    for item in items {
        let mark = if item.is_correct { "correct" } else { "wrong" };
        let _ = writeln!(out, "\n{}. {} [{mark}]", item.number, item.question);
        match &item.chosen {
            ChosenAnswer::Chosen(choice) => {
                let _ = writeln!(out, "   Your answer:    {}) {}", choice.key, choice.text);
            }
            ChosenAnswer::NotAnswered => {
                let _ = writeln!(out, "   Your answer:    (not answered)");
            }
        }
        let _ = writeln!(
            out,
            "   Correct answer: {}) {}",
            item.correct.key, item.correct.text
        );
        let _ = writeln!(out, "   {}", item.explanation);
    }
    out
}
