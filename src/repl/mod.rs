use chrono::{ Local, Timelike };
use log::warn;
use std::error::Error;
use std::path::Path;
use tokio::io::{ AsyncBufReadExt, BufReader, Lines, Stdin };

use crate::api::BackendApi;
use crate::cli::Args;
use crate::export;
use crate::models::Role;
use crate::quiz::{ AiResponse, OptionFeedback, QuizAttempt, QuizQuestion };
use crate::registry;
use crate::store::ChatStore;

const HELP: &str = "\
Commands:
  /docs            list ingested documents
  /upload <path>   validate and ingest a .pdf/.txt/.md file (max 50MB)
  /delete <id>     purge a document (asks for confirmation)
  /level <l>       beginner | intermediate | advanced
  /mode <m>        quick | step-by-step | example-based | quiz
  /roadmap         show the active learning roadmap
  /export          save the last Q&A as an HTML file
  /new             start a fresh chat session
  /help            show this help
  /quit            exit
Anything else is sent to the tutor as a question.";

fn greeting() -> &'static str {
    let hour = Local::now().hour();
    if hour < 12 {
        "Good Morning"
    } else if hour < 17 {
        "Good Afternoon"
    } else {
        "Good Evening"
    }
}

type StdinLines = Lines<BufReader<Stdin>>;

/// Interactive terminal loop. Every failure prints a notice and drops
/// back to the prompt; nothing past startup is fatal.
pub async fn run_loop(
    args: &Args,
    backend: &dyn BackendApi,
    store: &mut ChatStore
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let student_name = store
        .session()
        .map(|s| s.student_name.clone())
        .unwrap_or_else(|| "there".to_string());
    println!("{}, {}. What's on your mind?", greeting(), student_name);
    println!("Type /help for commands.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, args, backend, store, &mut lines).await {
                break;
            }
            continue;
        }

        ask(args, backend, store, &mut lines, &line).await;
    }
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Returns false when the loop should exit.
async fn handle_command(
    command: &str,
    args: &Args,
    backend: &dyn BackendApi,
    store: &mut ChatStore,
    lines: &mut StdinLines
) -> bool {
    let (name, rest) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" => {
            return false;
        }
        "help" => println!("{}", HELP),
        "docs" => show_documents(backend, store).await,
        "upload" => upload_document(backend, store, rest, &args.subject).await,
        "delete" => delete_document(backend, store, rest, lines).await,
        "level" =>
            match rest.parse() {
                Ok(level) => {
                    store.set_level(level);
                    println!("Student level set to {}", level);
                }
                Err(e) => println!("⚠ {}", e),
            }
        "mode" =>
            match rest.parse() {
                Ok(mode) => {
                    store.set_mode(mode);
                    println!("Explanation mode set to {}", mode);
                }
                Err(e) => println!("⚠ {}", e),
            }
        "roadmap" => show_roadmap(store),
        "export" => export_last_exchange(store, Path::new(&args.export_dir)),
        "new" => new_session(args, backend, store).await,
        other => println!("⚠ Unknown command '/{}'. Type /help.", other),
    }
    true
}

async fn ask(
    args: &Args,
    backend: &dyn BackendApi,
    store: &mut ChatStore,
    lines: &mut StdinLines,
    question: &str
) {
    println!("Searching syllabus...");
    match store.send_message(backend, question).await {
        Ok(Some(AiResponse::Quiz(questions))) => run_quiz(questions, lines).await,
        Ok(Some(AiResponse::Prose(text))) => {
            println!("\n{}\n", text);
            if let Some(last) = store.messages().last() {
                if last.role == Role::Ai && !last.suggestions.is_empty() {
                    println!("Follow-ups you could ask:");
                    for suggestion in &last.suggestions {
                        println!("  • {}", suggestion);
                    }
                    println!();
                }
            }
            if !store.roadmap().is_empty() && store.active_topic().is_some() {
                println!("(A learning roadmap is ready — see /roadmap)\n");
            }
        }
        Ok(None) => println!("⚠ Nothing sent. Is a session active?"),
        Err(e) => {
            warn!("ask_question failed: {}", e);
            println!("⚠ Failed to fetch answer.");
        }
    }
}

/// Walk the quiz one question at a time, then grade it. Submission is
/// reachable only once every question has a selection.
async fn run_quiz(questions: Vec<QuizQuestion>, lines: &mut StdinLines) {
    println!("\nPractice Quiz — {} question(s). Answer with the option number.\n", questions.len());
    let mut attempt = QuizAttempt::new(questions);

    for index in 0..attempt.questions().len() {
        let question = attempt.questions()[index].clone();
        println!("{}. {}", index + 1, question.question);
        for (i, option) in question.options.iter().enumerate() {
            println!("   [{}] {}", i + 1, option);
        }

        loop {
            print_prompt();
            let Ok(Some(line)) = lines.next_line().await else {
                println!("⚠ Quiz abandoned.");
                return;
            };
            match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 && n <= question.options.len() => {
                    attempt.select(index, question.options[n - 1].clone());
                    break;
                }
                _ => println!("Pick a number between 1 and {}.", question.options.len()),
            }
        }
    }

    match attempt.submit() {
        Ok(score) => {
            println!("\nYour Score: {} / {}\n", score, attempt.questions().len());
            for (index, question) in attempt.questions().iter().enumerate() {
                println!("{}. {}", index + 1, question.question);
                for option in &question.options {
                    let marker = match attempt.feedback(index, option) {
                        OptionFeedback::Correct => "✔",
                        OptionFeedback::Wrong => "✘",
                        OptionFeedback::Selected | OptionFeedback::Neutral => " ",
                    };
                    println!("   {} {}", marker, option);
                }
            }
            println!();
        }
        // Unreachable: the walk above fills every selection.
        Err(e) => println!("⚠ {}", e),
    }
}

async fn show_documents(backend: &dyn BackendApi, store: &mut ChatStore) {
    match registry::refresh(backend, store).await {
        Ok(0) => println!("The vector store is currently empty. Upload syllabus material first."),
        Ok(count) => {
            println!("{} file(s) indexed:", count);
            for doc in store.documents() {
                println!(
                    "  {}  {}  ({} chunks, {})",
                    doc.doc_id,
                    doc.filename,
                    doc.chunk_count,
                    doc.uploaded_at.format("%b %e, %Y")
                );
            }
        }
        Err(e) => {
            warn!("list_documents failed: {}", e);
            println!("⚠ Could not load documents.");
        }
    }
}

async fn upload_document(
    backend: &dyn BackendApi,
    store: &mut ChatStore,
    path: &str,
    subject: &str
) {
    if path.is_empty() {
        println!("Usage: /upload <path>");
        return;
    }
    match registry::upload(backend, store, Path::new(path), subject).await {
        Ok(doc) =>
            println!(
                "Vector embeddings successfully generated! {} → {} chunks",
                doc.filename,
                doc.chunk_count
            ),
        Err(e) => println!("⚠ Ingestion failed: {}", e),
    }
}

async fn delete_document(
    backend: &dyn BackendApi,
    store: &mut ChatStore,
    doc_id: &str,
    lines: &mut StdinLines
) {
    if doc_id.is_empty() {
        println!("Usage: /delete <doc-id>");
        return;
    }
    let filename = store
        .documents()
        .iter()
        .find(|d| d.doc_id == doc_id)
        .map(|d| d.filename.clone())
        .unwrap_or_else(|| doc_id.to_string());

    println!("Purge {} from the vector store? [y/N]", filename);
    print_prompt();
    let confirmed = matches!(
        lines.next_line().await,
        Ok(Some(answer)) if answer.trim().eq_ignore_ascii_case("y")
    );
    if !confirmed {
        println!("Kept {}.", filename);
        return;
    }

    match registry::delete(backend, store, doc_id).await {
        Ok(()) => println!("Document purged."),
        Err(e) => println!("⚠ Failed to delete: {}", e),
    }
}

fn show_roadmap(store: &ChatStore) {
    if store.roadmap().is_empty() {
        println!("No roadmap yet. Ask to \"learn <topic>\" to generate one.");
        return;
    }
    if let Some(topic) = store.active_topic() {
        println!("Roadmap for {} (session time: {}):", topic, store.elapsed_session_time());
    }
    for (i, stage) in store.roadmap().iter().enumerate() {
        println!("  {}. {} ({}) — {}", i + 1, stage.title, stage.duration, stage.description);
    }
}

fn export_last_exchange(store: &ChatStore, dir: &Path) {
    let messages = store.messages();
    let Some(answer_pos) = messages.iter().rposition(|m| m.role == Role::Ai) else {
        println!("Nothing to export yet.");
        return;
    };
    let question = if answer_pos > 0 { messages[answer_pos - 1].content.as_str() } else { "Context" };

    match export::export_to_file(dir, question, &messages[answer_pos].content) {
        Ok(path) => println!("Exported to {}", path.display()),
        Err(e) => println!("⚠ Export failed: {}", e),
    }
}

async fn new_session(args: &Args, backend: &dyn BackendApi, store: &mut ChatStore) {
    let name = store
        .session()
        .map(|s| s.student_name.clone())
        .or_else(|| args.name.clone())
        .unwrap_or_else(|| "Student".to_string());

    match backend.create_session(&name, &args.subject).await {
        Ok(session) => {
            store.clear_history();
            println!("Welcome, {}! Fresh session started.", session.student_name);
            store.set_session(session);
        }
        Err(e) => {
            warn!("create_session failed: {}", e);
            println!("⚠ Could not connect to backend: {}", e);
        }
    }
}
