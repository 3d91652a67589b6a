use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use parley_core::{
    AgentError, Conversation, ModelSummarizer, SessionManager, ToolDescription, ToolRegistry,
};
use parley_core::{config, providers, tools};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
mod onboard;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "parley - chat with a tool-using assistant from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Onboard,
    Chat {
        #[arg(short, long)]
        message: Option<String>,
        /// Named session, persisted under ~/.parley/sessions and resumed on the next run
        #[arg(short, long)]
        session: Option<String>,
    },
    /// List the tools the assistant can call
    Tools,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn build_registry() -> Result<Arc<ToolRegistry>> {
    let mut registry = ToolRegistry::new();
    tools::register_default_tools(&mut registry)?;
    Ok(Arc::new(registry))
}

/// Session ids become file names, so only `[A-Za-z0-9_-]` is accepted.
fn session_path(sessions_dir: &Path, session_id: &str) -> Result<PathBuf> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        anyhow::bail!(
            "Invalid session id '{}': use letters, digits, '-' or '_'",
            session_id
        );
    }
    Ok(sessions_dir.join(format!("{}.json", session_id)))
}

fn print_tools(tools: &[ToolDescription]) {
    println!("🛠️ Available tools:");
    for tool in tools {
        println!("  - {}: {}", style(&tool.name).white().bold(), tool.description);
    }
}

fn print_reply(reply: &str) {
    print!("{} ", style("🤖 AI:").green().bold());
    termimad::print_text(reply);
}

async fn save_session(manager: &SessionManager, session_id: &str, path: &Path) -> Result<()> {
    let conversation = match manager.export(session_id).await {
        Ok(conversation) => conversation,
        Err(AgentError::SessionNotFound(_)) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    conversation
        .save(path)
        .await
        .with_context(|| format!("Failed to save session to {}", path.display()))?;
    tracing::debug!("Saved session {} to {}", session_id, path.display());
    Ok(())
}

async fn run_repl(manager: &SessionManager, session_id: &str) -> Result<()> {
    println!("🚀 parley");
    println!("Available commands:");
    println!("  'quit'    - Exit the app");
    println!("  'clear'   - Clear conversation history");
    println!("  'summary' - Get conversation summary");
    println!("  'tools'   - List available tools");
    println!("{}", "-".repeat(50));

    let history_path = config::get_parley_dir().join("history.txt");
    let mut editor = DefaultEditor::new()?;
    let _ = editor.load_history(&history_path);

    loop {
        match editor.readline("\n💬 You: ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                match input.to_lowercase().as_str() {
                    "quit" | "exit" | "q" => {
                        println!("👋 Goodbye!");
                        break;
                    }
                    "clear" => {
                        manager.clear(session_id).await?;
                        println!("✅ Conversation history cleared!");
                    }
                    "summary" => {
                        let summary = manager.summary(session_id).await?;
                        println!("📋 Summary: {}", summary);
                    }
                    "tools" => print_tools(&manager.tools()),
                    _ => match manager.submit_turn(session_id, input).await {
                        Ok(reply) => print_reply(&reply),
                        Err(e) => eprintln!("❌ Error: {}", e),
                    },
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\n👋 Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("❌ Error: {}", e);
                break;
            }
        }
    }

    if config::ensure_parley_dir().is_ok() {
        let _ = editor.save_history(&history_path);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat {
                message: None,
                session: None,
            }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Tools => {
            print_tools(&build_registry()?.list_descriptions());
        }
        Commands::Chat { message, session } => {
            let config = config::load_config()?;
            let client = providers::create_client(&config)?;
            let registry = build_registry()?;

            let manager = SessionManager::new(client.clone(), registry, config.agent.clone())?
                .with_summarizer(Arc::new(ModelSummarizer::new(client)));

            let session_id = session
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let path = session_path(&config.sessions_dir, &session_id)?;

            if session.is_some() && path.exists() {
                let conversation = Conversation::load(&path).await?;
                println!(
                    "{} Resumed session '{}' ({} turns)",
                    style("→").green(),
                    session_id,
                    conversation.len()
                );
                manager.resume(&session_id, conversation).await?;
            }

            if let Some(msg) = message {
                println!("\n🤔 Processing...\n");
                match manager.submit_turn(&session_id, &msg).await {
                    Ok(reply) => println!("{}", reply),
                    Err(e) => {
                        eprintln!("❌ Error: {}", e);
                        if session.is_some() {
                            save_session(&manager, &session_id, &path).await?;
                        }
                        anyhow::bail!("Agent processing failed: {}", e);
                    }
                }
            } else {
                run_repl(&manager, &session_id).await?;
            }

            if session.is_some() {
                save_session(&manager, &session_id, &path).await?;
            }
        }
    }

    Ok(())
}
