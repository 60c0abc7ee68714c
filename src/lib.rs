pub mod api;
pub mod cli;
pub mod export;
pub mod models;
pub mod quiz;
pub mod registry;
pub mod repl;
pub mod store;

use api::{ BackendApi, HttpBackend };
use cli::Args;
use log::info;
use std::error::Error;
use std::io::Write;
use store::ChatStore;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Backend URL: {}", args.backend_url);
    info!("Subject: {}", args.subject);
    info!("Student Level: {}", args.level);
    info!("Explanation Mode: {}", args.mode);
    info!("Export Directory: {}", args.export_dir);
    info!("-------------------------");

    let backend = HttpBackend::new(&args.backend_url)?;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => prompt_for_name()?,
    };

    let session = backend.create_session(&name, &args.subject).await?;
    println!("Welcome, {}!", session.student_name);

    let mut store = ChatStore::new(args.level, args.mode);
    store.set_session(session);

    repl::run_loop(&args, &backend, &mut store).await?;
    info!("Session time: {}", store.elapsed_session_time());
    Ok(())
}

fn prompt_for_name() -> Result<String, Box<dyn Error + Send + Sync>> {
    loop {
        print!("Please enter your name: ");
        std::io::stdout().flush()?;
        let mut name = String::new();
        let read = std::io::stdin().read_line(&mut name)?;
        if read == 0 {
            return Err("No name provided".into());
        }
        let name = name.trim();
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }
}
