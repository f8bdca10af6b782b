use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDateTime;
use colored::{ColoredString, Colorize};
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tracing_subscriber::EnvFilter;

use docent_application::{
    AskOutcome, ChallengeEngine, ChallengeOutcome, ChallengePhase, Workbench,
};
use docent_core::challenge::ChallengeResult;
use docent_core::grade::{Emphasis, Grade};
use docent_core::message::Message;
use docent_core::ports::UploadService;
use docent_core::session::SessionId;
use docent_interaction::BackendClient;

/// Starter questions shown by `/suggest` for a freshly opened document.
const SUGGESTED_QUESTIONS: [&str; 5] = [
    "What is the main objective of this document?",
    "What are the key findings or conclusions?",
    "What methodology was used?",
    "What are the limitations mentioned?",
    "What future research is suggested?",
];

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: [
                "/open",
                "/ask",
                "/suggest",
                "/clear",
                "/challenge",
                "/answer",
                "/regenerate",
                "/summary",
                "/history",
                "/select",
                "/remove",
                "/new",
                "/help",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = Arc::new(BackendClient::from_env());
    let workbench = Workbench::new(client.clone(), client.clone());

    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== docent ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Backend: {}", client.config().base_url).bright_black()
    );
    println!(
        "{}",
        "Type '/open <file>' to upload a document, '/help' for commands, or 'quit' to exit."
            .bright_black()
    );
    println!();

    loop {
        let prompt = prompt_for(&workbench).await;
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                dispatch(&workbench, client.as_ref(), trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

/// Prompt shows the open document so it is obvious what questions go to.
async fn prompt_for(workbench: &Workbench) -> String {
    match workbench.active().await {
        Some(selection) => format!("{} >> ", selection.document.filename),
        None => "docent >> ".to_string(),
    }
}

async fn dispatch(workbench: &Workbench, client: &BackendClient, input: &str) {
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    match command {
        "/open" => open_document(workbench, client, rest).await,
        "/ask" => ask(workbench, rest).await,
        "/suggest" => print_suggestions(),
        "/clear" => clear_conversation(workbench).await,
        "/challenge" => show_challenge(workbench).await,
        "/answer" => answer(workbench, rest).await,
        "/regenerate" => regenerate(workbench).await,
        "/summary" => show_summary(workbench).await,
        "/history" => show_history(workbench).await,
        "/select" => select_entry(workbench, rest).await,
        "/remove" => remove_entry(workbench, rest).await,
        "/new" => {
            workbench.start_new().await;
            println!(
                "{}",
                "Back to upload. Previous documents stay in '/history'.".green()
            );
        }
        "/help" => print_help(),
        _ if command.starts_with('/') => {
            println!(
                "{}",
                "Unknown command. Type '/help' for the list.".bright_black()
            );
        }
        // Bare text is a question for the open document.
        _ => ask(workbench, input).await,
    }
}

fn is_supported_document(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".pdf") || lower.ends_with(".txt")
}

/// Upload timestamps arrive as raw ISO text; render them short, and fall
/// back to the raw string when they do not parse.
fn format_upload_time(upload_time: &str) -> String {
    NaiveDateTime::parse_from_str(upload_time, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|parsed| parsed.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| upload_time.to_string())
}

fn emphasized(text: &str, emphasis: Emphasis) -> ColoredString {
    match emphasis {
        Emphasis::Success => text.green(),
        Emphasis::Warning => text.yellow(),
        Emphasis::Error => text.red(),
        Emphasis::Info => text.blue(),
    }
}

async fn open_document(workbench: &Workbench, client: &BackendClient, raw_path: &str) {
    if raw_path.is_empty() {
        println!("{}", "Usage: /open <path to .pdf or .txt>".yellow());
        return;
    }
    let path = Path::new(raw_path);
    let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
        println!("{}", format!("Not a usable file path: {}", raw_path).red());
        return;
    };
    if !is_supported_document(filename) {
        println!(
            "{}",
            "Only PDF (.pdf) and text (.txt) files are supported.".yellow()
        );
        return;
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!(
                "{}",
                format!("Could not read {}: {}", path.display(), e).red()
            );
            return;
        }
    };

    println!(
        "{}",
        format!("Uploading {} and generating a summary...", filename).bright_black()
    );
    match client.upload(filename, bytes).await {
        Ok(document) => {
            let summary = document.summary.clone();
            let uploaded_at = format_upload_time(&document.upload_time);
            let session_id = workbench.document_uploaded(document).await;
            println!(
                "{}",
                format!("Opened as session {} ({})", session_id, uploaded_at).green()
            );
            println!();
            println!("{}", "Summary".bold());
            for line in summary.lines() {
                println!("  {}", line);
            }
            println!();
            println!(
                "{}",
                "Ask away ('/suggest' for ideas), or take the quiz with '/challenge'.".bright_black()
            );
        }
        Err(e) => println!("{}", format!("Upload failed: {}", e).red()),
    }
}

async fn ask(workbench: &Workbench, question: &str) {
    let Some(session) = workbench.active_session().await else {
        println!("{}", "No document open. Use '/open <file>' first.".yellow());
        return;
    };
    if question.is_empty() {
        println!("{}", "Usage: /ask <question>".yellow());
        return;
    }

    println!("{}", "Thinking...".bright_black());
    match session.conversation().ask(question).await {
        AskOutcome::Answered => {
            if let Some(Message::Assistant {
                content,
                justification,
                highlighted_text,
                confidence,
                ..
            }) = session.conversation().messages().await.last().cloned()
            {
                print_answer(&content, &justification, &highlighted_text, confidence);
            }
        }
        AskOutcome::Failed => {
            if let Some(error) = session.conversation().error().await {
                println!("{}", error.red());
            }
        }
        AskOutcome::Rejected => {
            println!("{}", "A question is already being answered.".yellow());
        }
        AskOutcome::Superseded => {}
    }
}

fn print_answer(content: &str, justification: &str, highlighted_text: &str, confidence: f32) {
    let grade = Grade::from_ratio(confidence);
    let label = format!(
        "{} ({:.0}%)",
        grade.confidence_label(),
        confidence * 100.0
    );

    println!();
    for line in content.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
    println!(
        "{} {}",
        "Confidence:".bold(),
        emphasized(&label, grade.emphasis())
    );
    if !justification.is_empty() {
        println!("{} {}", "Why:".bold(), justification.bright_black());
    }
    if !highlighted_text.is_empty() {
        println!(
            "{} {}",
            "Source:".bold(),
            highlighted_text.bright_black().italic()
        );
    }
    println!();
}

fn print_suggestions() {
    println!("{}", "Try asking:".bold());
    for question in SUGGESTED_QUESTIONS {
        println!("  {}", question.bright_cyan());
    }
}

async fn clear_conversation(workbench: &Workbench) {
    let Some(session) = workbench.active_session().await else {
        println!("{}", "No document open. Use '/open <file>' first.".yellow());
        return;
    };
    session.conversation().clear().await;
    println!("{}", "Conversation cleared.".green());
}

async fn show_challenge(workbench: &Workbench) {
    let Some(session) = workbench.active_session().await else {
        println!("{}", "No document open. Use '/open <file>' first.".yellow());
        return;
    };
    let challenge = session.challenge();

    match challenge.phase().await {
        ChallengePhase::Idle => {
            if let Some(error) = challenge.error().await {
                println!("{}", error.red());
            }
            println!("{}", "Generating challenge questions...".bright_black());
            run_generation(challenge, false).await;
        }
        ChallengePhase::Generating => {
            println!(
                "{}",
                "Questions are still being generated; try again in a moment.".bright_black()
            );
        }
        ChallengePhase::Answering { .. } | ChallengePhase::Evaluating { .. } => {
            print_current_question(challenge).await;
        }
        ChallengePhase::Completed => print_completion_report(challenge).await,
    }
}

/// Runs a fetch (or reset-and-fetch) and reports where it landed.
async fn run_generation(challenge: &ChallengeEngine, reset: bool) {
    let outcome = if reset {
        challenge.reset().await
    } else {
        challenge.generate().await
    };
    match outcome {
        ChallengeOutcome::Advanced => {
            if matches!(challenge.phase().await, ChallengePhase::Answering { .. }) {
                print_current_question(challenge).await;
            } else {
                println!(
                    "{}",
                    "The backend returned no questions for this document.".yellow()
                );
            }
        }
        ChallengeOutcome::Failed => {
            if let Some(error) = challenge.error().await {
                println!("{}", error.red());
            }
        }
        ChallengeOutcome::Rejected | ChallengeOutcome::Superseded => {}
    }
}

async fn print_current_question(challenge: &ChallengeEngine) {
    let Some((index, question)) = challenge.current_question().await else {
        return;
    };
    let (_, total) = challenge.progress().await;
    let chip = format!("[{}]", question.difficulty);

    println!();
    println!("{}", format!("Question {} of {}", index + 1, total).bold());
    println!(
        "{} {}",
        emphasized(&chip, question.difficulty.emphasis()),
        question.question
    );
    println!("{}", "Answer with '/answer <text>'.".bright_black());
}

async fn answer(workbench: &Workbench, text: &str) {
    let Some(session) = workbench.active_session().await else {
        println!("{}", "No document open. Use '/open <file>' first.".yellow());
        return;
    };
    let challenge = session.challenge();

    // Bare '/answer' retries the text kept from a failed submission.
    let text = if text.is_empty() {
        match challenge.preserved_answer().await {
            Some(preserved) => preserved,
            None => {
                println!("{}", "Usage: /answer <your answer>".yellow());
                return;
            }
        }
    } else {
        text.to_string()
    };

    let Some((index, _)) = challenge.current_question().await else {
        println!(
            "{}",
            "No question is waiting for an answer. Run '/challenge'.".yellow()
        );
        return;
    };

    println!("{}", "Scoring...".bright_black());
    match challenge.submit(&text).await {
        ChallengeOutcome::Advanced => {
            if let Some(result) = challenge.results().await.get(index) {
                print_evaluation(result);
            }
            match challenge.phase().await {
                ChallengePhase::Completed => print_completion_report(challenge).await,
                ChallengePhase::Answering { .. } => print_current_question(challenge).await,
                _ => {}
            }
        }
        ChallengeOutcome::Failed => {
            if let Some(error) = challenge.error().await {
                println!("{}", error.red());
            }
            println!(
                "{}",
                "Your answer was kept; run '/answer' to retry it.".bright_black()
            );
        }
        ChallengeOutcome::Rejected => {
            println!(
                "{}",
                "No question is waiting for an answer. Run '/challenge'.".yellow()
            );
        }
        ChallengeOutcome::Superseded => {}
    }
}

fn print_evaluation(result: &ChallengeResult) {
    let grade = Grade::from_ratio(result.evaluation.score);
    let label = format!(
        "{:.0}% ({})",
        result.evaluation.score * 100.0,
        grade.score_label()
    );

    println!();
    println!("{} {}", "Score:".bold(), emphasized(&label, grade.emphasis()));
    for line in result.evaluation.feedback.lines() {
        println!("  {}", line.bright_blue());
    }
}

async fn print_completion_report(challenge: &ChallengeEngine) {
    let results = challenge.results().await;
    let aggregate = challenge.aggregate_score().await;
    let grade = Grade::from_ratio(aggregate);
    let overall = format!("{:.0}% ({})", aggregate * 100.0, grade.score_label());

    println!();
    println!("{}", "Challenge complete!".bright_green().bold());
    println!(
        "{} {}",
        "Overall:".bold(),
        emphasized(&overall, grade.emphasis())
    );
    for (number, result) in results.iter().enumerate() {
        println!(
            "  {}. [{}] {:.0}%  {}",
            number + 1,
            result.difficulty,
            result.evaluation.score * 100.0,
            result.question
        );
    }
    println!(
        "{}",
        "Run '/regenerate' for a fresh set of questions.".bright_black()
    );
    println!();
}

async fn regenerate(workbench: &Workbench) {
    let Some(session) = workbench.active_session().await else {
        println!("{}", "No document open. Use '/open <file>' first.".yellow());
        return;
    };
    println!("{}", "Generating a fresh question set...".bright_black());
    run_generation(session.challenge(), true).await;
}

async fn show_summary(workbench: &Workbench) {
    let Some(selection) = workbench.active().await else {
        println!("{}", "No document open. Use '/open <file>' first.".yellow());
        return;
    };
    println!("{}", selection.document.filename.bold());
    println!(
        "{}",
        format!(
            "Uploaded {}",
            format_upload_time(&selection.document.upload_time)
        )
        .bright_black()
    );
    println!();
    for line in selection.document.summary.lines() {
        println!("  {}", line);
    }
}

async fn show_history(workbench: &Workbench) {
    let entries = workbench.history_entries().await;
    if entries.is_empty() {
        println!("{}", "No documents opened yet.".bright_black());
        return;
    }
    let active = workbench.active().await;

    println!("{}", "Documents (newest first):".bold());
    for (number, entry) in entries.iter().enumerate() {
        let marker = if active
            .as_ref()
            .is_some_and(|selection| selection.session_id == entry.session_id)
        {
            "*".bright_green()
        } else {
            " ".normal()
        };
        println!(
            " {} {}. {} ({})",
            marker,
            number + 1,
            entry.document.filename,
            format_upload_time(&entry.document.upload_time).bright_black()
        );
    }
    println!(
        "{}",
        "Use '/select <n>' to switch or '/remove <n>' to delete.".bright_black()
    );
}

/// Resolves a 1-based `/history` entry number to its session.
async fn entry_at(workbench: &Workbench, raw: &str) -> Option<SessionId> {
    let entries = workbench.history_entries().await;
    if entries.is_empty() {
        println!("{}", "No documents opened yet.".bright_black());
        return None;
    }
    let number: usize = match raw.parse() {
        Ok(number) => number,
        Err(_) => {
            println!(
                "{}",
                format!("Give an entry number between 1 and {}.", entries.len()).yellow()
            );
            return None;
        }
    };
    if number == 0 || number > entries.len() {
        println!(
            "{}",
            format!("Give an entry number between 1 and {}.", entries.len()).yellow()
        );
        return None;
    }
    Some(entries[number - 1].session_id.clone())
}

async fn select_entry(workbench: &Workbench, raw: &str) {
    let Some(session_id) = entry_at(workbench, raw).await else {
        return;
    };
    match workbench.select(&session_id).await {
        Ok(()) => {
            if let Some(selection) = workbench.active().await {
                println!(
                    "{}",
                    format!("Switched to {}.", selection.document.filename).green()
                );
            }
        }
        Err(e) => println!("{}", e.to_string().red()),
    }
}

async fn remove_entry(workbench: &Workbench, raw: &str) {
    let Some(session_id) = entry_at(workbench, raw).await else {
        return;
    };
    workbench.remove(&session_id).await;
    println!("{}", "Removed.".green());
    if workbench.active().await.is_none() {
        println!(
            "{}",
            "No document selected; use '/open' or '/select'.".bright_black()
        );
    }
}

fn print_help() {
    println!("{}", "Commands".bold());
    println!(
        "  {}        upload a .pdf or .txt document",
        "/open <file>".bright_cyan()
    );
    println!(
        "  {}     ask about the open document (bare text works too)",
        "/ask <question>".bright_cyan()
    );
    println!(
        "  {}            starter questions to try",
        "/suggest".bright_cyan()
    );
    println!(
        "  {}              wipe the current conversation",
        "/clear".bright_cyan()
    );
    println!(
        "  {}          show or start the comprehension quiz",
        "/challenge".bright_cyan()
    );
    println!(
        "  {}      answer the current quiz question",
        "/answer <text>".bright_cyan()
    );
    println!(
        "  {}         discard the quiz and fetch new questions",
        "/regenerate".bright_cyan()
    );
    println!(
        "  {}            show the document summary again",
        "/summary".bright_cyan()
    );
    println!(
        "  {}            list previously opened documents",
        "/history".bright_cyan()
    );
    println!(
        "  {}         switch to a listed document",
        "/select <n>".bright_cyan()
    );
    println!(
        "  {}         forget a listed document",
        "/remove <n>".bright_cyan()
    );
    println!(
        "  {}                return to the upload prompt",
        "/new".bright_cyan()
    );
    println!("  {}          exit", "quit / exit".bright_cyan());
}
